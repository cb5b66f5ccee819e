mod common;

use std::path::Path;
use std::sync::{Arc, Mutex};

use reportflow::{
    Document, Error, ExportFormat, ExportState, Exporter, MeasurerKind, SectionFilter, SectionKind,
};

fn exporter() -> Exporter {
    Exporter::new(common::fonts(), MeasurerKind::Metrics)
}

fn leftover_temp_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .expect("read dir")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect()
}

#[test]
fn exports_each_format() {
    let dir = tempfile::tempdir().expect("tempdir");
    let document = Document::Abstract(common::abstract_doc(common::prose(2500)));
    let exporter = exporter();

    let reports = exporter.export_all(&document, dir.path()).expect("export all");
    assert_eq!(reports.len(), 3);
    for report in &reports {
        let written = std::fs::metadata(&report.path).expect("output exists").len();
        assert_eq!(written as usize, report.bytes);
        assert!(report.pages >= 1);
        assert_eq!(
            report.path.file_name().and_then(|n| n.to_str()),
            Some(format!("Smart_Irrigation_Controller_Abstract.{}", report.format).as_str())
        );
    }
    assert!(leftover_temp_files(dir.path()).is_empty());
    assert_eq!(exporter.state(), ExportState::Idle);
}

#[test]
fn listeners_see_every_phase() {
    let dir = tempfile::tempdir().expect("tempdir");
    let document = Document::Resume(common::resume());
    let exporter = exporter();
    let seen: Arc<Mutex<Vec<ExportState>>> = Arc::default();
    let sink = seen.clone();
    exporter.add_listener(move |format, state| {
        assert_eq!(format, ExportFormat::Html);
        sink.lock().expect("lock").push(state.clone());
    });

    exporter
        .export(&document, ExportFormat::Html, &dir.path().join("cv.html"))
        .expect("export");

    assert_eq!(
        *seen.lock().expect("lock"),
        vec![
            ExportState::Building,
            ExportState::Paginating,
            ExportState::Rendering,
            ExportState::Saving,
            ExportState::Idle,
        ]
    );
}

#[test]
fn concurrent_export_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let document = Document::Resume(common::resume());
    let exporter = exporter();
    let dest = dir.path().join("cv.pdf");

    let guard = exporter.try_begin().expect("first claim");
    assert!(exporter.is_busy());
    let err = exporter
        .export(&document, ExportFormat::Pdf, &dest)
        .expect_err("second export must be rejected");
    assert!(matches!(err, Error::ExportInProgress));
    assert!(!dest.exists());

    drop(guard);
    assert!(!exporter.is_busy());
    exporter
        .export(&document, ExportFormat::Pdf, &dest)
        .expect("export after release");
    assert!(dest.exists());
}

#[test]
fn failed_export_reports_and_returns_to_idle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let document = Document::Resume(common::resume());
    let exporter = exporter();
    let seen: Arc<Mutex<Vec<ExportState>>> = Arc::default();
    let sink = seen.clone();
    exporter.add_listener(move |_, state| sink.lock().expect("lock").push(state.clone()));

    let dest = dir.path().join("missing").join("cv.docx");
    let err = exporter
        .export(&document, ExportFormat::Docx, &dest)
        .expect_err("parent directory does not exist");
    assert!(matches!(err, Error::Io(_)));

    let seen = seen.lock().expect("lock");
    assert!(matches!(seen[seen.len() - 2], ExportState::Failed(_)));
    assert_eq!(seen[seen.len() - 1], ExportState::Idle);
    assert_eq!(exporter.state(), ExportState::Idle);
    assert!(!exporter.is_busy());
    assert!(leftover_temp_files(dir.path()).is_empty());
}

#[test]
fn filtered_export_has_fewer_pages() {
    let dir = tempfile::tempdir().expect("tempdir");
    let document = Document::Report(common::report());

    let full = exporter()
        .export(&document, ExportFormat::Html, &dir.path().join("full.html"))
        .expect("full export");
    let chapters = exporter()
        .with_filter(SectionFilter::Only(vec![SectionKind::Chapters]))
        .export(&document, ExportFormat::Html, &dir.path().join("chapters.html"))
        .expect("chapters export");

    assert!(chapters.pages < full.pages);
    let html = std::fs::read_to_string(&chapters.path).expect("read html");
    assert!(!html.contains("CERTIFICATE"));
}

#[test]
fn export_format_parses_names() {
    assert_eq!("PDF".parse::<ExportFormat>().ok(), Some(ExportFormat::Pdf));
    assert_eq!("htm".parse::<ExportFormat>().ok(), Some(ExportFormat::Html));
    assert_eq!(ExportFormat::Docx.to_string(), "docx");
    assert!(matches!("odt".parse::<ExportFormat>(), Err(Error::Config(_))));
}
