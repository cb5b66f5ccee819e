pub mod builder;
pub mod config;
pub mod document;
pub mod docx;
mod error;
pub mod export;
pub mod flow;
pub mod fonts;
pub mod geometry;
pub mod html;
pub mod model;
pub mod pdf;
pub mod preview;
pub mod style;
pub mod text;

pub use builder::{SectionFilter, SectionKind};
pub use config::{Config, MeasurerKind};
pub use document::{Command, Document, DocumentStore};
pub use docx::DocxDocument;
pub use error::{Error, Result};
pub use export::{ExportFormat, ExportReport, ExportState, Exporter};
pub use flow::{BlockMeasurer, CharBudget, HeuristicMeasurer, MetricsMeasurer, paginate};
pub use fonts::FontSet;
pub use model::{ContentBlock, Layout, Page};
pub use preview::{Debouncer, PreviewSession};

use std::sync::Arc;
use std::time::Instant;

/// Fonts for the document's style sheet, searched in `config.font_dirs`
/// first and then in the platform font directories.
pub fn load_fonts(document: &Document, config: &Config) -> Arc<FontSet> {
    Arc::new(FontSet::load(&document.style_sheet().font_family, &config.font_dirs))
}

/// The height oracle pagination runs against for `document`.
pub fn measurer_for(
    document: &Document,
    kind: MeasurerKind,
    fonts: &Arc<FontSet>,
) -> Box<dyn BlockMeasurer> {
    match kind {
        MeasurerKind::Metrics => Box::new(MetricsMeasurer::new(document.style_sheet(), fonts.clone())),
        MeasurerKind::Heuristic => Box::new(HeuristicMeasurer::new(
            document.char_budget(),
            document.geometry().body.writable_height(),
        )),
    }
}

pub fn paginate_blocks(
    document: &Document,
    blocks: &[ContentBlock],
    kind: MeasurerKind,
    fonts: &Arc<FontSet>,
) -> Layout {
    let t0 = Instant::now();
    let measurer = measurer_for(document, kind, fonts);
    let layout = paginate(blocks, &document.geometry(), measurer.as_ref());
    log::info!(
        "Timing: paginate={:.1}ms ({} blocks -> {} pages, {:?} measurer)",
        t0.elapsed().as_secs_f64() * 1000.0,
        blocks.len(),
        layout.pages.len(),
        kind,
    );
    layout
}

/// Build and paginate in one step.
pub fn paginate_document(
    document: &Document,
    filter: &SectionFilter,
    kind: MeasurerKind,
    fonts: &Arc<FontSet>,
) -> Layout {
    let blocks = builder::build(document, filter);
    paginate_blocks(document, &blocks, kind, fonts)
}

pub fn render_html(document: &Document, layout: &Layout) -> String {
    html::render(layout, &document.geometry(), &document.style_sheet())
}

pub fn render_docx(document: &Document, layout: &Layout) -> Result<Vec<u8>> {
    DocxDocument::from_layout(layout, &document.style_sheet(), &document.geometry()).to_package()
}

pub fn render_pdf(document: &Document, layout: &Layout, fonts: &FontSet) -> Result<Vec<u8>> {
    pdf::render(layout, &document.geometry(), &document.style_sheet(), fonts)
}
