use super::{SectionFilter, SectionKind, is_blank, non_blank_lines, or_placeholder, paragraphs_from};
use crate::document::{ChapterItem, Faculty, Report};
use crate::model::{Alignment, ContentBlock, Figure, ImageData, Region, Signatory, SignatoryGrid};
use crate::style::Role;

const LOGO_PERCENT: u8 = 18;

pub(super) fn build(r: &Report, filter: &SectionFilter) -> Vec<ContentBlock> {
    let mut out = Vec::new();
    if filter.includes(SectionKind::Cover) {
        cover(r, &mut out);
    }
    if filter.includes(SectionKind::Certificate) {
        certificate(r, &mut out);
    }
    if filter.includes(SectionKind::Declaration) {
        declaration(r, &mut out);
    }
    if filter.includes(SectionKind::Acknowledgement) && !is_blank(&r.acknowledgement) {
        titled_page("Acknowledgement", "ACKNOWLEDGEMENT", &r.acknowledgement, &mut out);
    }
    if filter.includes(SectionKind::Abstract) && !is_blank(&r.abstract_text) {
        titled_page("Abstract", "ABSTRACT", &r.abstract_text, &mut out);
    }
    if filter.includes(SectionKind::Contents) && r.include_contents {
        contents(r, filter, &mut out);
    }
    if filter.includes(SectionKind::Chapters) {
        for (ci, chapter) in r.chapters.iter().enumerate() {
            chapter_blocks(ci + 1, &chapter.title, &chapter.items, &mut out);
        }
    }
    if filter.includes(SectionKind::References) && !is_blank(&r.references) {
        references(&r.references, &mut out);
    }
    out
}

fn section(region: Region, title: &str) -> ContentBlock {
    ContentBlock::Section {
        region,
        title: title.to_string(),
    }
}

fn anchored(level: u8, text: impl Into<String>, role: Role, anchor: String) -> ContentBlock {
    ContentBlock::Heading {
        level,
        text: text.into(),
        subtitle: None,
        role,
        anchor: Some(anchor),
    }
}

fn logo(image: &ImageData) -> ContentBlock {
    ContentBlock::Figure(Figure {
        image: image.clone(),
        caption: None,
        width_percent: LOGO_PERCENT,
        aspect_ratio: image.aspect_ratio(),
        align: Alignment::Center,
    })
}

/// Member names as printed: uppercase, register number in parentheses.
fn member_names(r: &Report) -> Vec<String> {
    r.members
        .iter()
        .filter(|m| !is_blank(&m.name))
        .map(|m| {
            let name = m.name.trim().to_uppercase();
            if is_blank(&m.reg_no) {
                name
            } else {
                format!("{name} ({})", m.reg_no.trim())
            }
        })
        .collect()
}

fn degree(r: &Report) -> &str {
    if !is_blank(&r.degree_name) {
        r.degree_name.trim()
    } else {
        or_placeholder(&r.course, "[Degree]")
    }
}

fn with_address(name: &str, address: &str) -> String {
    if is_blank(address) {
        name.to_string()
    } else {
        format!("{name}, {}", address.trim())
    }
}

fn cover(r: &Report, out: &mut Vec<ContentBlock>) {
    out.push(section(Region::FrontMatter, "Cover"));
    if let Some(image) = &r.university_logo {
        out.push(logo(image));
    }
    let title = if is_blank(&r.project_title) {
        "[Project Title]".to_string()
    } else {
        r.project_title.trim().to_uppercase()
    };
    out.push(ContentBlock::heading(0, title, Role::CoverTitle));
    out.push(ContentBlock::paragraph(
        or_placeholder(&r.report_type, "MINI PROJECT REPORT").to_uppercase(),
        Role::CoverReportType,
    ));

    out.push(ContentBlock::paragraph("Submitted by", Role::CoverNote));
    let names = member_names(r);
    if names.is_empty() {
        out.push(ContentBlock::paragraph("[Member Names]", Role::CoverMember));
    }
    out.extend(names.into_iter().map(|n| ContentBlock::paragraph(n, Role::CoverMember)));

    out.push(ContentBlock::paragraph("Under the guidance of", Role::CoverGuidance));
    let guide = if is_blank(&r.guide.name) {
        "[Guide Name]".to_string()
    } else {
        r.guide.name.trim().to_uppercase()
    };
    out.push(ContentBlock::paragraph(guide, Role::CoverGuide));
    if !is_blank(&r.guide.designation) {
        out.push(ContentBlock::paragraph(r.guide.designation.trim(), Role::CoverDesignation));
    }
    if !is_blank(&r.department_name) {
        out.push(ContentBlock::paragraph(
            format!("Department of {}", r.department_name.trim()),
            Role::CoverInstitution,
        ));
    }
    if !is_blank(&r.college_name) {
        out.push(ContentBlock::paragraph(r.college_name.trim(), Role::CoverInstitution));
    }

    out.push(ContentBlock::paragraph("to", Role::CoverText));
    if !is_blank(&r.university_name) {
        out.push(ContentBlock::paragraph(
            format!("the {}", with_address(r.university_name.trim(), &r.college_address)),
            Role::CoverUniversity,
        ));
    }
    out.push(ContentBlock::paragraph(
        "in partial fulfillment of the requirements for the award of",
        Role::CoverText,
    ));
    out.push(ContentBlock::paragraph(degree(r), Role::CoverDegree));

    // Department and college sit at the foot of the cover.
    out.push(ContentBlock::Spacer {
        height: 0.0,
        stretch: true,
    });
    if !is_blank(&r.department_name) {
        out.push(ContentBlock::paragraph(
            format!("Department of {}", r.department_name.trim()),
            Role::CoverFooter,
        ));
    }
    if !is_blank(&r.college_name) {
        out.push(ContentBlock::paragraph(
            with_address(r.college_name.trim(), &r.college_address),
            Role::CoverInstitution,
        ));
    }
}

fn default_certificate_text(r: &Report) -> String {
    let names = member_names(r);
    let names = if names.is_empty() {
        "[Member Names]".to_string()
    } else {
        names.join(", ")
    };
    let university = or_placeholder(&r.university_name, "[University Name]");
    format!(
        "Certified that this report entitled '{}' is the report of {} presented by {} during the year ({}) in partial fulfilment of the requirements for the award of the Degree of {} of the {}.",
        or_placeholder(&r.project_title, "[Project Title]"),
        or_placeholder(&r.report_type, "mini project").to_lowercase(),
        names,
        or_placeholder(&r.academic_year, "[Year]"),
        degree(r),
        with_address(university, &r.college_address),
    )
}

fn default_declaration_text(r: &Report) -> String {
    let names: Vec<&str> = r
        .members
        .iter()
        .map(|m| m.name.trim())
        .filter(|n| !n.is_empty())
        .collect();
    let names = if names.is_empty() {
        "[Member Names]".to_string()
    } else {
        names.join(", ")
    };
    format!(
        "We, {}, hereby declare that the project entitled \"{}\" submitted in partial fulfillment for the award of the degree is a record of original work done by us under the guidance of {}.",
        names,
        or_placeholder(&r.project_title, "[Project Title]"),
        or_placeholder(&r.guide.name, "[Guide Name]"),
    )
}

fn signatory(faculty: &Faculty, role: &str, r: &Report) -> Option<Signatory> {
    if is_blank(&faculty.name) {
        return None;
    }
    let department = if is_blank(&faculty.department) {
        &r.department_name
    } else {
        &faculty.department
    };
    Some(Signatory {
        name: faculty.name.trim().to_string(),
        role: Some(format!("({role})")),
        designation: (!is_blank(&faculty.designation)).then(|| faculty.designation.trim().to_string()),
        department: (!is_blank(department)).then(|| format!("Department of {}", department.trim())),
        college: (!is_blank(&r.college_name)).then(|| r.college_name.trim().to_string()),
    })
}

fn certificate(r: &Report, out: &mut Vec<ContentBlock>) {
    out.push(section(Region::FrontMatter, "Certificate"));
    if !is_blank(&r.college_name) {
        out.push(ContentBlock::paragraph(
            with_address(r.college_name.trim(), &r.college_address).to_uppercase(),
            Role::InstitutionHeader,
        ));
    }
    if !is_blank(&r.department_name) {
        out.push(ContentBlock::paragraph(
            format!("DEPARTMENT OF {}", r.department_name.trim().to_uppercase()),
            Role::InstitutionHeader,
        ));
    }
    if let Some(image) = r.certificate_logo.as_ref().or(r.university_logo.as_ref()) {
        out.push(logo(image));
    }
    out.push(ContentBlock::heading(1, "CERTIFICATE", Role::CertificateTitle));

    let text = if is_blank(&r.certificate_text) {
        default_certificate_text(r)
    } else {
        r.certificate_text.clone()
    };
    out.extend(paragraphs_from(&text, Role::BodyText, true));

    out.push(ContentBlock::spacer(30.0));
    let hod_role = or_placeholder(&r.hod.designation, "HOD");
    let hod = signatory(&r.hod, hod_role, r).map(|s| Signatory {
        designation: None,
        ..s
    });
    out.push(ContentBlock::Signatories(SignatoryGrid {
        rows: vec![
            [
                signatory(&r.guide, "Project Guide", r),
                signatory(&r.coordinator1, "Project Coordinator", r),
            ],
            [signatory(&r.coordinator2, "Project Coordinator", r), hod],
        ],
        edge_aligned: false,
    }));
}

fn declaration(r: &Report, out: &mut Vec<ContentBlock>) {
    out.push(section(Region::FrontMatter, "Declaration"));
    out.push(ContentBlock::heading(1, "DECLARATION", Role::PageTitle));
    let text = if is_blank(&r.declaration_text) {
        default_declaration_text(r)
    } else {
        r.declaration_text.clone()
    };
    out.extend(paragraphs_from(&text, Role::BodyText, true));
    out.push(ContentBlock::Spacer {
        height: 40.0,
        stretch: true,
    });
    out.push(ContentBlock::Signatories(SignatoryGrid {
        rows: vec![[
            Some(Signatory {
                name: "Date :".to_string(),
                ..Default::default()
            }),
            Some(Signatory {
                name: "Signature :".to_string(),
                ..Default::default()
            }),
        ]],
        edge_aligned: true,
    }));
}

fn titled_page(section_title: &str, heading: &str, text: &str, out: &mut Vec<ContentBlock>) {
    out.push(section(Region::FrontMatter, section_title));
    out.push(ContentBlock::heading(1, heading, Role::PageTitle));
    out.extend(paragraphs_from(text, Role::BodyText, true));
}

fn chapter_anchor(chapter: usize) -> String {
    format!("chapter-{chapter}")
}

fn section_anchor(chapter: usize, text: usize) -> String {
    format!("section-{chapter}-{text}")
}

const REFERENCES_ANCHOR: &str = "references";

fn contents(r: &Report, filter: &SectionFilter, out: &mut Vec<ContentBlock>) {
    out.push(section(Region::FrontMatter, "Contents"));
    out.push(ContentBlock::heading(1, "CONTENTS", Role::PageTitle));
    if filter.includes(SectionKind::Chapters) {
        for (i, chapter) in r.chapters.iter().enumerate() {
            let c = i + 1;
            out.push(ContentBlock::TocEntry {
                text: format!("Chapter {c}: {}", chapter.title.trim().to_uppercase()),
                level: 1,
                anchor: chapter_anchor(c),
            });
            let titled = chapter.items.iter().filter_map(|item| match item {
                ChapterItem::Text { title, .. } => Some(title),
                ChapterItem::Diagram { .. } => None,
            });
            for (t, title) in titled.enumerate() {
                if is_blank(title) {
                    continue;
                }
                out.push(ContentBlock::TocEntry {
                    text: format!("{c}.{} {}", t + 1, title.trim()),
                    level: 2,
                    anchor: section_anchor(c, t + 1),
                });
            }
        }
    }
    if filter.includes(SectionKind::References) && !is_blank(&r.references) {
        out.push(ContentBlock::TocEntry {
            text: "References".to_string(),
            level: 1,
            anchor: REFERENCES_ANCHOR.to_string(),
        });
    }
}

fn chapter_blocks(c: usize, title: &str, items: &[ChapterItem], out: &mut Vec<ContentBlock>) {
    out.push(section(Region::Body, &format!("Chapter {c}")));
    out.push(anchored(1, format!("Chapter {c}"), Role::ChapterLabel, chapter_anchor(c)));
    out.push(ContentBlock::heading(1, title.trim().to_uppercase(), Role::ChapterTitle));

    // Text items and diagrams are numbered independently.
    let (mut text_count, mut fig_count) = (0, 0);
    for item in items {
        match item {
            ChapterItem::Text { title, content } => {
                text_count += 1;
                if !is_blank(title) {
                    out.push(anchored(
                        2,
                        format!("{c}.{text_count} {}", title.trim()),
                        Role::SectionTitle,
                        section_anchor(c, text_count),
                    ));
                }
                out.extend(non_blank_lines(content).map(|line| ContentBlock::Paragraph {
                    text: line.to_string(),
                    role: Role::ChapterText,
                    indent_first_line: true,
                    justified: true,
                    lead: None,
                    tail: None,
                    continuation: false,
                }));
            }
            ChapterItem::Diagram {
                image,
                caption,
                width_percent,
            } => {
                fig_count += 1;
                out.push(ContentBlock::Figure(Figure {
                    image: image.clone(),
                    caption: Some(format!("Figure {c}.{fig_count}: {}", caption.trim())),
                    width_percent: (*width_percent).clamp(1, 100),
                    aspect_ratio: image.aspect_ratio(),
                    align: Alignment::Center,
                }));
            }
        }
    }
}

fn references(text: &str, out: &mut Vec<ContentBlock>) {
    out.push(section(Region::Body, "References"));
    out.push(anchored(
        1,
        "REFERENCES",
        Role::ReferencesTitle,
        REFERENCES_ANCHOR.to_string(),
    ));
    for (i, line) in non_blank_lines(text).enumerate() {
        out.push(ContentBlock::paragraph(format!("[{}] {line}", i + 1), Role::Reference));
    }
}
