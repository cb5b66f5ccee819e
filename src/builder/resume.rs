use super::{SectionFilter, SectionKind, is_blank, non_blank_lines, paragraphs_from};
use crate::document::Resume;
use crate::model::{Alignment, ContentBlock, Figure, Region};
use crate::style::Role;

const ENTRY_GAP: f32 = 6.0;
/// Photo width as a share of the column.
const PHOTO_PERCENT: u8 = 20;
const BULLET: &str = "\u{2022} ";

fn joined(parts: &[&str], sep: &str) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

fn section_header(title: &str) -> ContentBlock {
    ContentBlock::heading(1, title.trim().to_uppercase(), Role::ResumeSection)
}

/// Entry line with an optional right-aligned run (dates, city).
fn entry(text: &str, tail: String, role: Role) -> ContentBlock {
    ContentBlock::Paragraph {
        text: text.trim().to_string(),
        role,
        indent_first_line: false,
        justified: false,
        lead: None,
        tail: (!tail.is_empty()).then_some(tail),
        continuation: false,
    }
}

fn bullet(lead: Option<&str>, text: String) -> ContentBlock {
    ContentBlock::Paragraph {
        text,
        role: Role::Bullet,
        indent_first_line: false,
        justified: true,
        lead: Some(match lead {
            Some(l) => format!("{BULLET}{l}"),
            None => BULLET.to_string(),
        }),
        tail: None,
        continuation: false,
    }
}

fn dates(start: &str, end: &str) -> String {
    if is_blank(start) && is_blank(end) {
        String::new()
    } else {
        format!("{} \u{2013} {}", start.trim(), end.trim())
    }
}

pub(super) fn build(r: &Resume, filter: &SectionFilter) -> Vec<ContentBlock> {
    let mut out = vec![ContentBlock::Section {
        region: Region::Body,
        title: "Resume".to_string(),
    }];
    let p = &r.personal;

    if filter.includes(SectionKind::Header) {
        if let Some(image) = &p.profile_pic {
            out.push(ContentBlock::Figure(Figure {
                image: image.clone(),
                caption: None,
                width_percent: PHOTO_PERCENT,
                aspect_ratio: image.aspect_ratio(),
                align: Alignment::Right,
            }));
        }
        let name = joined(&[p.first_name.as_str(), p.last_name.as_str()], " ");
        let name = if name.is_empty() {
            "[Your Name]".to_string()
        } else {
            name.to_uppercase()
        };
        out.push(ContentBlock::heading(0, name, Role::ResumeName));
        if !is_blank(&p.job_title) {
            out.push(ContentBlock::paragraph(
                p.job_title.trim().to_uppercase(),
                Role::ResumeJobTitle,
            ));
        }
        let mut links: Vec<&str> = vec![p.linkedin.as_str(), p.address.as_str()];
        links.extend(r.socials.iter().map(|s| s.url.as_str()));
        let contact = [
            joined(&[p.city.as_str(), p.country.as_str()], ", "),
            joined(&[p.email.as_str(), p.phone.as_str()], " | "),
            joined(&links, " | "),
        ];
        for line in contact.into_iter().filter(|l| !l.is_empty()) {
            out.push(ContentBlock::paragraph(line, Role::ResumeContact));
        }
    }

    if filter.includes(SectionKind::Summary) && !is_blank(&r.summary) {
        out.push(section_header("Professional Summary"));
        out.extend(paragraphs_from(&r.summary, Role::EntryText, true));
    }

    if filter.includes(SectionKind::Experience) && !r.experience.is_empty() {
        out.push(section_header("Experience"));
        for e in &r.experience {
            out.push(entry(&e.job_title, dates(&e.start_date, &e.end_date), Role::EntryTitle));
            out.push(entry(&e.employer, e.city.trim().to_string(), Role::EntrySubtitle));
            out.extend(non_blank_lines(&e.desc).map(|l| bullet(None, l.to_string())));
            out.push(ContentBlock::spacer(ENTRY_GAP));
        }
    }

    if filter.includes(SectionKind::Education) && !r.education.is_empty() {
        out.push(section_header("Education"));
        for e in &r.education {
            out.push(entry(&e.institution, dates(&e.start_date, &e.end_date), Role::EntryTitle));
            out.push(entry(&e.degree, e.city.trim().to_string(), Role::EntrySubtitle));
            if !is_blank(&e.score) {
                out.push(ContentBlock::paragraph(format!("Score: {}", e.score.trim()), Role::EntryText));
            }
            out.extend(paragraphs_from(&e.desc, Role::EntryText, true));
            out.push(ContentBlock::spacer(ENTRY_GAP));
        }
    }

    if filter.includes(SectionKind::Skills) && !r.skills.is_empty() {
        out.push(section_header("Skills"));
        for s in &r.skills {
            let level = if is_blank(&s.level) {
                String::new()
            } else {
                format!(" ({})", s.level.trim())
            };
            out.push(bullet(Some(s.name.trim()), level));
        }
    }

    if filter.includes(SectionKind::Languages) && !r.languages.is_empty() {
        out.push(section_header("Languages"));
        let text = r
            .languages
            .iter()
            .map(|l| {
                if is_blank(&l.proficiency) {
                    l.language.trim().to_string()
                } else {
                    format!("{} ({})", l.language.trim(), l.proficiency.trim())
                }
            })
            .collect::<Vec<_>>()
            .join("  \u{2022}  ");
        out.push(ContentBlock::paragraph(text, Role::EntryText));
    }

    if filter.includes(SectionKind::Projects) && !r.projects.is_empty() {
        out.push(section_header("Projects"));
        for pr in &r.projects {
            out.push(entry(&pr.title, pr.link.trim().to_string(), Role::EntryTitle));
            out.extend(paragraphs_from(&pr.desc, Role::EntryText, true));
        }
    }

    if filter.includes(SectionKind::Certifications) && !r.certifications.is_empty() {
        out.push(section_header("Certifications"));
        for c in &r.certifications {
            let mut text = joined(&[c.name.as_str(), c.issuer.as_str()], " \u{2013} ");
            if !is_blank(&c.date) {
                text.push_str(&format!(" ({})", c.date.trim()));
            }
            out.push(bullet(None, text));
        }
    }

    if filter.includes(SectionKind::Awards) && !r.awards.is_empty() {
        out.push(section_header("Awards"));
        for a in &r.awards {
            let desc = if is_blank(&a.desc) {
                String::new()
            } else {
                format!(" - {}", a.desc.trim())
            };
            out.push(bullet(Some(a.name.trim()), desc));
        }
    }

    if filter.includes(SectionKind::Interests) && !is_blank(&r.interests) {
        out.push(section_header("Interests"));
        out.extend(paragraphs_from(&r.interests, Role::EntryText, true));
    }

    if filter.includes(SectionKind::References) && !r.references.is_empty() {
        out.push(section_header("References"));
        for referee in &r.references {
            out.push(bullet(
                None,
                format!("{} ({})", referee.name.trim(), referee.contact.trim()),
            ));
        }
    }

    if filter.includes(SectionKind::Custom) {
        for c in r.custom.iter().filter(|c| !is_blank(&c.title) || !is_blank(&c.content)) {
            out.push(section_header(&c.title));
            out.extend(paragraphs_from(&c.content, Role::EntryText, true));
        }
    }
    out
}
