//! Document snapshot -> ordered content blocks.
//!
//! Building is pure: the same snapshot and filter always produce the same
//! blocks. Empty optional sections are dropped here, numbering and casing
//! are applied here, and missing required fields become bracketed
//! placeholders so a document can always be produced.

mod abstract_doc;
mod report;
mod resume;

use crate::document::Document;
use crate::model::ContentBlock;
use crate::style::Role;

/// Logical sections a builder can emit, across all document kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SectionKind {
    // report
    Cover,
    Certificate,
    Declaration,
    Acknowledgement,
    Abstract,
    Contents,
    Chapters,
    References,
    // abstract page
    Title,
    Keywords,
    Signatures,
    // resume
    Header,
    Summary,
    Experience,
    Education,
    Skills,
    Languages,
    Projects,
    Certifications,
    Awards,
    Interests,
    Custom,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SectionFilter {
    #[default]
    All,
    Only(Vec<SectionKind>),
}

impl SectionFilter {
    pub fn includes(&self, kind: SectionKind) -> bool {
        match self {
            SectionFilter::All => true,
            SectionFilter::Only(kinds) => kinds.contains(&kind),
        }
    }
}

pub fn build(document: &Document, filter: &SectionFilter) -> Vec<ContentBlock> {
    let blocks = match document {
        Document::Report(r) => report::build(r, filter),
        Document::Abstract(a) => abstract_doc::build(a, filter),
        Document::Resume(r) => resume::build(r, filter),
    };
    log::debug!("Built {} blocks for {} document", blocks.len(), document.kind_name());
    blocks
}

/// Trimmed non-blank lines of a free-text field.
pub(crate) fn non_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// One paragraph per non-blank line; blank lines are dropped.
pub(crate) fn paragraphs_from(
    text: &str,
    role: Role,
    justified: bool,
) -> impl Iterator<Item = ContentBlock> + '_ {
    non_blank_lines(text).map(move |line| ContentBlock::Paragraph {
        text: line.to_string(),
        role,
        indent_first_line: false,
        justified,
        lead: None,
        tail: None,
        continuation: false,
    })
}

/// `value` trimmed, or the placeholder when it is blank.
pub(crate) fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() { placeholder } else { trimmed }
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
