use super::{SectionFilter, SectionKind, is_blank, non_blank_lines};
use crate::document::AbstractDoc;
use crate::model::{ContentBlock, Region, SignatureBlock};
use crate::style::Role;

/// Gap the keywords line leaves above the signatures; kept when keywords are blank.
const SIGNATURE_DROP: f32 = 125.0;

pub(super) fn build(a: &AbstractDoc, filter: &SectionFilter) -> Vec<ContentBlock> {
    let mut out = vec![ContentBlock::Section {
        region: Region::FrontMatter,
        title: "Abstract".to_string(),
    }];

    if filter.includes(SectionKind::Title) {
        let title = if is_blank(&a.title) {
            "[Project Title]".to_string()
        } else {
            a.title.trim().to_uppercase()
        };
        out.push(ContentBlock::Heading {
            level: 0,
            text: title,
            subtitle: (!is_blank(&a.domain)).then(|| format!("({})", a.domain.trim())),
            role: Role::AbstractTitle,
            anchor: None,
        });
    }

    if filter.includes(SectionKind::Abstract) {
        out.push(ContentBlock::heading(1, "ABSTRACT", Role::AbstractHeading));
        out.extend(non_blank_lines(&a.abstract_text).map(|line| ContentBlock::Paragraph {
            text: line.to_string(),
            role: Role::AbstractText,
            indent_first_line: true,
            justified: true,
            lead: None,
            tail: None,
            continuation: false,
        }));
    }

    let keywords = filter.includes(SectionKind::Keywords) && !is_blank(&a.keywords);
    if keywords {
        out.push(ContentBlock::Paragraph {
            text: a.keywords.trim().to_string(),
            role: Role::Keywords,
            indent_first_line: false,
            justified: false,
            lead: Some("Keywords: ".to_string()),
            tail: None,
            continuation: false,
        });
    }

    let has_signatories =
        a.members.iter().any(|m| !is_blank(&m.name)) || !is_blank(&a.guide.name);
    if filter.includes(SectionKind::Signatures) && has_signatories {
        if !keywords {
            out.push(ContentBlock::spacer(SIGNATURE_DROP));
        }
        out.push(ContentBlock::Signature(SignatureBlock {
            members: a.members.clone(),
            guide: a.guide.clone(),
        }));
    }
    out
}
