mod common;

use std::io::{Cursor, Read};

use reportflow::document::ChapterItem;
use reportflow::html::escape_html;
use reportflow::{Document, DocxDocument, Layout};

fn report_with_figure() -> Document {
    let mut report = common::report();
    report.chapters[0].items.push(ChapterItem::Diagram {
        image: common::png(64, 32),
        caption: "System <overview>".to_string(),
        width_percent: 60,
    });
    Document::Report(report)
}

fn zip_entry(bytes: &[u8], name: &str) -> Option<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("open docx");
    let mut file = archive.by_name(name).ok()?;
    let mut out = String::new();
    file.read_to_string(&mut out).expect("read entry");
    Some(out)
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

fn layout_of(document: &Document) -> Layout {
    common::paginate_with_metrics(document)
}

#[test]
fn html_has_one_box_per_page() {
    for document in [
        report_with_figure(),
        Document::Abstract(common::abstract_doc(common::prose(5000))),
        Document::Resume(common::resume()),
    ] {
        let layout = layout_of(&document);
        let html = reportflow::render_html(&document, &layout);
        assert_eq!(count(&html, r#"<div class="page""#), layout.pages.len());
    }
}

#[test]
fn html_escapes_text_and_inlines_images() {
    let document = report_with_figure();
    let html = reportflow::render_html(&document, &layout_of(&document));
    assert!(html.contains("Figure 1.1: System &lt;overview&gt;"));
    assert!(!html.contains("<overview>"));
    assert!(html.contains("data:image/png;base64,"));
}

#[test]
fn html_contents_links_to_chapter_anchors() {
    let document = report_with_figure();
    let html = reportflow::render_html(&document, &layout_of(&document));
    assert!(html.contains(r##"href="#chapter-1""##));
    assert!(html.contains(r#"id="chapter-1""#));
}

#[test]
fn html_numbers_only_body_pages() {
    let document = report_with_figure();
    let layout = layout_of(&document);
    let numbered = layout.pages.iter().filter(|p| p.number.is_some()).count();
    let html = reportflow::render_html(&document, &layout);
    assert_eq!(count(&html, r#"class="page-number""#), numbered);
    assert!(numbered > 0 && numbered < layout.pages.len());
}

#[test]
fn escape_html_covers_markup_characters() {
    assert_eq!(
        escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
        "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
    );
}

#[test]
fn docx_package_is_well_formed() {
    let document = report_with_figure();
    let layout = layout_of(&document);
    let bytes = reportflow::render_docx(&document, &layout).expect("docx");

    for part in [
        "[Content_Types].xml",
        "_rels/.rels",
        "word/document.xml",
        "word/styles.xml",
        "word/_rels/document.xml.rels",
        "word/footer1.xml",
    ] {
        let xml = zip_entry(&bytes, part).unwrap_or_else(|| panic!("missing {part}"));
        roxmltree::Document::parse(&xml).unwrap_or_else(|e| panic!("{part} is not XML: {e}"));
    }

    let mut archive = zip::ZipArchive::new(Cursor::new(&bytes[..])).expect("open docx");
    assert!(archive.by_name("word/media/image1.png").is_ok());
}

#[test]
fn docx_breaks_match_page_assignment() {
    let document = report_with_figure();
    let layout = layout_of(&document);
    let docx = DocxDocument::from_layout(&layout, &document.style_sheet(), &document.geometry());
    let bytes = docx.to_package().expect("docx");

    let xml = zip_entry(&bytes, "word/document.xml").expect("document.xml");
    let tree = roxmltree::Document::parse(&xml).expect("parse document.xml");
    let breaks = tree
        .descendants()
        .filter(|n| n.tag_name().name() == "pageBreakBefore")
        .count();
    let sections = tree
        .descendants()
        .filter(|n| n.tag_name().name() == "sectPr")
        .count();

    assert_eq!(sections, docx.sections.len());
    assert_eq!(breaks + sections, layout.pages.len());
}

#[test]
fn docx_without_numbered_pages_has_no_footer() {
    let document = Document::Resume(common::resume());
    let bytes = reportflow::render_docx(&document, &layout_of(&document)).expect("docx");
    assert!(zip_entry(&bytes, "word/footer1.xml").is_none());
    let xml = zip_entry(&bytes, "word/document.xml").expect("document.xml");
    assert!(xml.contains("JANE DOE"));
}

#[test]
fn pdf_page_count_matches_layout() {
    for document in [
        report_with_figure(),
        Document::Abstract(common::abstract_doc(common::prose(5000))),
        Document::Resume(common::resume()),
    ] {
        let layout = layout_of(&document);
        let bytes = reportflow::render_pdf(&document, &layout, &common::fonts()).expect("pdf");
        assert!(bytes.starts_with(b"%PDF-"));

        let text = String::from_utf8_lossy(&bytes);
        let pages = count(&text, "/Type /Page") - count(&text, "/Type /Pages");
        assert_eq!(pages, layout.pages.len(), "{} page count", document.kind_name());
    }
}

#[test]
fn pdf_embeds_figures() {
    let document = report_with_figure();
    let bytes = reportflow::render_pdf(&document, &layout_of(&document), &common::fonts()).expect("pdf");
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Subtype /Image"));
}

#[test]
fn docx_headings_keep_with_next() {
    let document = report_with_figure();
    let layout = layout_of(&document);
    let docx = DocxDocument::from_layout(&layout, &document.style_sheet(), &document.geometry());

    let heading = docx
        .paragraphs()
        .find(|p| p.plain_text() == "CERTIFICATE")
        .expect("certificate heading");
    assert!(heading.style.keep_next);
    assert!(heading.keep_lines);

    let breaks = docx.paragraphs().filter(|p| p.page_break_before).count();
    assert_eq!(breaks + docx.sections.len(), layout.pages.len());
    assert!(docx.has_footer());
    assert_eq!(docx.media.len(), 1);
}

#[test]
fn resume_photo_is_right_aligned_in_every_format() {
    let mut resume = common::resume();
    resume.personal.profile_pic = Some(common::png(30, 30));
    let document = Document::Resume(resume);
    let layout = layout_of(&document);

    let html = reportflow::render_html(&document, &layout);
    assert!(html.contains(r#"text-align:right"><img src="data:image/png;base64,"#));

    let bytes = reportflow::render_docx(&document, &layout).expect("docx");
    let xml = zip_entry(&bytes, "word/document.xml").expect("document.xml");
    let tree = roxmltree::Document::parse(&xml).expect("parse document.xml");
    let photo = tree
        .descendants()
        .find(|n| n.tag_name().name() == "drawing")
        .and_then(|d| d.ancestors().find(|n| n.tag_name().name() == "p"))
        .expect("photo paragraph");
    let jc = photo
        .descendants()
        .find(|n| n.tag_name().name() == "jc")
        .and_then(|n| n.attributes().find(|a| a.name() == "val"))
        .map(|a| a.value().to_string());
    assert_eq!(jc.as_deref(), Some("right"));

    let pdf = reportflow::render_pdf(&document, &layout, &common::fonts()).expect("pdf");
    assert!(String::from_utf8_lossy(&pdf).contains("/Subtype /Image"));
}
