mod common;

use reportflow::document::{AbstractDoc, ChapterItem, Report, Resume};
use reportflow::model::{Alignment, ContentBlock, Region};
use reportflow::style::Role;
use reportflow::{Document, SectionFilter, SectionKind, builder};

fn build(document: Document) -> Vec<ContentBlock> {
    builder::build(&document, &SectionFilter::All)
}

fn section_titles(blocks: &[ContentBlock]) -> Vec<(Region, String)> {
    blocks
        .iter()
        .filter_map(|b| match b {
            ContentBlock::Section { region, title } => Some((*region, title.clone())),
            _ => None,
        })
        .collect()
}

fn paragraph_texts(blocks: &[ContentBlock], role: Role) -> Vec<String> {
    blocks
        .iter()
        .filter_map(|b| match b {
            ContentBlock::Paragraph { text, role: r, .. } if *r == role => Some(text.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn empty_report_gets_placeholders() {
    let blocks = build(Document::Report(Report::default()));
    let headings = common::heading_texts(blocks.iter());
    assert!(headings.contains(&"[Project Title]".to_string()));
    assert_eq!(paragraph_texts(&blocks, Role::CoverMember), vec!["[Member Names]"]);
    assert_eq!(paragraph_texts(&blocks, Role::CoverGuide), vec!["[Guide Name]"]);
}

#[test]
fn report_sections_in_order() {
    let blocks = build(Document::Report(common::report()));
    let titles: Vec<String> = section_titles(&blocks).into_iter().map(|(_, t)| t).collect();
    assert_eq!(
        titles,
        vec![
            "Cover",
            "Certificate",
            "Declaration",
            "Acknowledgement",
            "Abstract",
            "Contents",
            "Chapter 1",
            "Chapter 2",
            "Chapter 3",
            "References",
        ]
    );
    let regions: Vec<Region> = section_titles(&blocks).into_iter().map(|(r, _)| r).collect();
    assert!(regions[..6].iter().all(|r| *r == Region::FrontMatter));
    assert!(regions[6..].iter().all(|r| *r == Region::Body));
}

#[test]
fn blank_optional_sections_are_dropped() {
    let report = Report {
        acknowledgement: "  \n ".to_string(),
        abstract_text: String::new(),
        references: String::new(),
        include_contents: false,
        ..common::report()
    };
    let blocks = build(Document::Report(report));
    let titles: Vec<String> = section_titles(&blocks).into_iter().map(|(_, t)| t).collect();
    for dropped in ["Acknowledgement", "Abstract", "Contents", "References"] {
        assert!(!titles.iter().any(|t| t == dropped), "{dropped} should be omitted");
    }
}

#[test]
fn chapter_sections_and_figures_are_numbered_independently() {
    let mut report = common::report();
    report.chapters[1].items.insert(
        1,
        ChapterItem::Diagram {
            image: common::png(40, 20),
            caption: "Block diagram".to_string(),
            width_percent: 150,
        },
    );
    let blocks = build(Document::Report(report));

    let headings = common::heading_texts(blocks.iter());
    for expected in ["1.1 Background", "1.2 Objectives", "2.1 Architecture", "2.2 Hardware", "2.3 Firmware"] {
        assert!(headings.iter().any(|h| h == expected), "missing {expected}");
    }
    assert!(headings.iter().any(|h| h == "DESIGN"));

    let figure = blocks
        .iter()
        .find_map(|b| match b {
            ContentBlock::Figure(f) => Some(f),
            _ => None,
        })
        .expect("figure block");
    assert_eq!(figure.caption.as_deref(), Some("Figure 2.1: Block diagram"));
    assert_eq!(figure.width_percent, 100);
    assert!((figure.aspect_ratio - 0.5).abs() < 1e-6);
}

#[test]
fn contents_lists_chapters_sections_and_references() {
    let report = common::report();
    let expected = report.chapters.len()
        + report
            .chapters
            .iter()
            .map(|c| c.items.len())
            .sum::<usize>()
        + 1;
    let blocks = build(Document::Report(report));
    let entries: Vec<(&str, u8, &str)> = blocks
        .iter()
        .filter_map(|b| match b {
            ContentBlock::TocEntry { text, level, anchor } => {
                Some((text.as_str(), *level, anchor.as_str()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(entries.len(), expected);
    assert_eq!(entries[0], ("Chapter 1: INTRODUCTION", 1, "chapter-1"));
    assert_eq!(entries[1], ("1.1 Background", 2, "section-1-1"));
    assert_eq!(entries.last().map(|e| e.2), Some("references"));
}

#[test]
fn contents_page_numbers_resolve_after_pagination() {
    let document = Document::Report(common::report());
    let layout = common::paginate_with_metrics(&document);
    assert_eq!(layout.page_label("chapter-1"), Some(1));
    let ch2 = layout.page_label("chapter-2").expect("chapter 2 anchor");
    let refs = layout.page_label("references").expect("references anchor");
    assert!(ch2 > 1 && refs >= ch2);
}

#[test]
fn filter_restricts_sections() {
    let document = Document::Report(common::report());
    let blocks = builder::build(&document, &SectionFilter::Only(vec![SectionKind::Chapters]));
    let titles: Vec<String> = section_titles(&blocks).into_iter().map(|(_, t)| t).collect();
    assert_eq!(titles, vec!["Chapter 1", "Chapter 2", "Chapter 3"]);
    assert!(!blocks.iter().any(|b| b.role() == Some(Role::CoverTitle)));
}

#[test]
fn abstract_without_keywords_keeps_signature_drop() {
    let doc = AbstractDoc {
        keywords: String::new(),
        ..common::abstract_doc(common::prose(300))
    };
    let blocks = build(Document::Abstract(doc));
    let n = blocks.len();
    assert!(matches!(blocks[n - 1], ContentBlock::Signature(_)));
    assert!(matches!(blocks[n - 2], ContentBlock::Spacer { stretch: false, .. }));
}

#[test]
fn abstract_keywords_carry_bold_lead() {
    let blocks = build(Document::Abstract(common::abstract_doc(common::prose(300))));
    let keywords = blocks
        .iter()
        .find(|b| b.role() == Some(Role::Keywords))
        .expect("keywords paragraph");
    let ContentBlock::Paragraph { text, lead, .. } = keywords else {
        panic!("keywords should be a paragraph");
    };
    assert_eq!(lead.as_deref(), Some("Keywords: "));
    assert_eq!(text, "irrigation, sensors, embedded control");
}

#[test]
fn abstract_title_is_uppercased_with_domain_subtitle() {
    let blocks = build(Document::Abstract(common::abstract_doc(String::new())));
    let ContentBlock::Heading { text, subtitle, .. } = &blocks[1] else {
        panic!("title heading expected after the section marker");
    };
    assert_eq!(text, "SMART IRRIGATION CONTROLLER");
    assert_eq!(subtitle.as_deref(), Some("(Internet of Things)"));
}

#[test]
fn resume_skips_empty_sections() {
    let blocks = build(Document::Resume(common::resume()));
    let headings = common::heading_texts(blocks.iter());
    assert_eq!(
        headings,
        vec!["JANE DOE", "PROFESSIONAL SUMMARY", "EXPERIENCE", "EDUCATION", "SKILLS"]
    );
}

#[test]
fn resume_entries_put_dates_in_tail() {
    let blocks = build(Document::Resume(common::resume()));
    let title = blocks
        .iter()
        .find(|b| b.role() == Some(Role::EntryTitle))
        .expect("entry title");
    let ContentBlock::Paragraph { text, tail, .. } = title else {
        panic!("entry title should be a paragraph");
    };
    assert_eq!(text, "Firmware Engineer");
    assert_eq!(tail.as_deref(), Some("2021 \u{2013} Present"));
}

#[test]
fn empty_resume_still_builds() {
    let blocks = build(Document::Resume(Resume::default()));
    assert_eq!(common::heading_texts(blocks.iter()), vec!["[Your Name]"]);
}

#[test]
fn interleaved_text_and_figures_number_independently() {
    let mut report = common::report();
    let text = |title: &str| ChapterItem::Text {
        title: title.to_string(),
        content: "Body.".to_string(),
    };
    let figure = |caption: &str| ChapterItem::Diagram {
        image: common::png(10, 10),
        caption: caption.to_string(),
        width_percent: 50,
    };
    report.chapters[2].items = vec![text("Alpha"), figure("First"), text("Beta"), figure("Second")];
    let blocks = build(Document::Report(report));

    let labels: Vec<String> = blocks
        .iter()
        .skip_while(|b| !matches!(b, ContentBlock::Section { title, .. } if title == "Chapter 3"))
        .filter_map(|b| match b {
            ContentBlock::Heading { role: Role::SectionTitle, text, .. } => Some(text.clone()),
            ContentBlock::Figure(f) => f.caption.clone(),
            _ => None,
        })
        .collect();
    assert_eq!(
        labels,
        vec!["3.1 Alpha", "Figure 3.1: First", "3.2 Beta", "Figure 3.2: Second"]
    );
}

#[test]
fn abstract_without_keywords_or_signatories_has_no_signature_area() {
    let mut doc = AbstractDoc {
        keywords: String::new(),
        members: Vec::new(),
        ..common::abstract_doc(common::prose(300))
    };
    doc.guide.name.clear();
    let blocks = build(Document::Abstract(doc));
    assert!(!blocks.iter().any(|b| matches!(
        b,
        ContentBlock::Signature(_) | ContentBlock::Spacer { .. }
    )));
    assert!(!blocks.iter().any(|b| b.role() == Some(Role::Keywords)));
}

#[test]
fn resume_photo_leads_the_header_on_the_right() {
    let mut resume = common::resume();
    resume.personal.profile_pic = Some(common::png(30, 40));
    let blocks = build(Document::Resume(resume));

    let ContentBlock::Figure(photo) = &blocks[1] else {
        panic!("photo should follow the section marker");
    };
    assert_eq!(photo.align, Alignment::Right);
    assert_eq!(photo.caption, None);
    assert_eq!(photo.width_percent, 20);
    assert!((photo.aspect_ratio - 4.0 / 3.0).abs() < 1e-6);
    assert!(matches!(
        &blocks[2],
        ContentBlock::Heading { role: Role::ResumeName, .. }
    ));
}
