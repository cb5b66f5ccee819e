//! Export orchestration: build, paginate, render and save one document.
//!
//! An `Exporter` runs one export at a time. A second request while one is in
//! flight fails with `Error::ExportInProgress`; it is never queued. Output is
//! written to a temporary sibling and renamed into place, so a failed export
//! never leaves a partial file behind.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::builder::{self, SectionFilter};
use crate::config::MeasurerKind;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::fonts::FontSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Docx,
    Pdf,
    Html,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Docx, ExportFormat::Pdf, ExportFormat::Html];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Docx => "docx",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Html => "html",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docx" => Ok(ExportFormat::Docx),
            "pdf" => Ok(ExportFormat::Pdf),
            "html" | "htm" => Ok(ExportFormat::Html),
            other => Err(Error::Config(format!("unknown export format '{other}'"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    Building,
    Paginating,
    Rendering,
    Saving,
    Failed(String),
}

/// Outcome of a successful export.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportReport {
    pub format: ExportFormat,
    pub path: PathBuf,
    pub pages: usize,
    pub bytes: usize,
}

type Listener = Box<dyn Fn(ExportFormat, &ExportState) + Send + Sync>;

pub struct Exporter {
    fonts: Arc<FontSet>,
    measurer: MeasurerKind,
    filter: SectionFilter,
    busy: AtomicBool,
    state: Mutex<ExportState>,
    listeners: Mutex<Vec<Listener>>,
}

/// Holds the exporter's busy flag; dropping it returns the exporter to `Idle`.
pub struct ExportGuard<'a> {
    exporter: &'a Exporter,
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        *lock(&self.exporter.state) = ExportState::Idle;
        self.exporter.busy.store(false, Ordering::Release);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Temporary sibling of the destination; removed on drop unless persisted.
struct TempFile {
    path: PathBuf,
    persisted: bool,
}

impl TempFile {
    fn beside(dest: &Path) -> Self {
        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "export".to_string());
        let path = dest.with_file_name(format!(".{name}.{}.tmp", std::process::id()));
        TempFile {
            path,
            persisted: false,
        }
    }

    fn persist(mut self, dest: &Path) -> Result<()> {
        std::fs::rename(&self.path, dest)?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if !self.persisted && self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                log::warn!("Could not remove temporary file {}: {e}", self.path.display());
            }
        }
    }
}

impl Exporter {
    pub fn new(fonts: Arc<FontSet>, measurer: MeasurerKind) -> Self {
        Exporter {
            fonts,
            measurer,
            filter: SectionFilter::All,
            busy: AtomicBool::new(false),
            state: Mutex::new(ExportState::Idle),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn with_filter(mut self, filter: SectionFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Register a transition observer. Listeners run on the exporting thread
    /// and must not register further listeners.
    pub fn add_listener(&self, listener: impl Fn(ExportFormat, &ExportState) + Send + Sync + 'static) {
        lock(&self.listeners).push(Box::new(listener));
    }

    pub fn state(&self) -> ExportState {
        lock(&self.state).clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claim the exporter, or fail with `ExportInProgress` if it is taken.
    pub fn try_begin(&self) -> Result<ExportGuard<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("Export rejected: another export is in progress");
            return Err(Error::ExportInProgress);
        }
        Ok(ExportGuard { exporter: self })
    }

    fn transition(&self, format: ExportFormat, next: ExportState) {
        log::info!("Export {format}: {next:?}");
        *lock(&self.state) = next.clone();
        for listener in lock(&self.listeners).iter() {
            listener(format, &next);
        }
    }

    /// Export `document` to `dest`.
    pub fn export(&self, document: &Document, format: ExportFormat, dest: &Path) -> Result<ExportReport> {
        let guard = self.try_begin()?;
        let outcome = self.run(document, format, dest);
        if let Err(e) = &outcome {
            log::warn!("Export {format} to {} failed: {e}", dest.display());
            self.transition(format, ExportState::Failed(e.to_string()));
        }
        drop(guard);
        self.notify_idle(format);
        outcome
    }

    /// Export every format into `dir`, named after the document.
    pub fn export_all(&self, document: &Document, dir: &Path) -> Result<Vec<ExportReport>> {
        let stem = document.file_stem();
        ExportFormat::ALL
            .iter()
            .map(|&format| {
                let dest = dir.join(format!("{stem}.{}", format.extension()));
                self.export(document, format, &dest)
            })
            .collect()
    }

    fn notify_idle(&self, format: ExportFormat) {
        for listener in lock(&self.listeners).iter() {
            listener(format, &ExportState::Idle);
        }
    }

    fn run(&self, document: &Document, format: ExportFormat, dest: &Path) -> Result<ExportReport> {
        let t0 = Instant::now();

        self.transition(format, ExportState::Building);
        let blocks = builder::build(document, &self.filter);

        self.transition(format, ExportState::Paginating);
        let layout = crate::paginate_blocks(document, &blocks, self.measurer, &self.fonts);
        let t_layout = t0.elapsed();

        self.transition(format, ExportState::Rendering);
        let bytes = match format {
            ExportFormat::Docx => crate::render_docx(document, &layout)?,
            ExportFormat::Pdf => crate::render_pdf(document, &layout, &self.fonts)?,
            ExportFormat::Html => crate::render_html(document, &layout).into_bytes(),
        };
        let t_render = t0.elapsed();

        self.transition(format, ExportState::Saving);
        let temp = TempFile::beside(dest);
        std::fs::write(&temp.path, &bytes)?;
        temp.persist(dest)?;
        let t_total = t0.elapsed();

        log::info!(
            "Timing: layout={:.1}ms, render={:.1}ms, save={:.1}ms, total={:.1}ms (output {} bytes)",
            t_layout.as_secs_f64() * 1000.0,
            (t_render - t_layout).as_secs_f64() * 1000.0,
            (t_total - t_render).as_secs_f64() * 1000.0,
            t_total.as_secs_f64() * 1000.0,
            bytes.len(),
        );

        Ok(ExportReport {
            format,
            path: dest.to_path_buf(),
            pages: layout.pages.len(),
            bytes: bytes.len(),
        })
    }
}
