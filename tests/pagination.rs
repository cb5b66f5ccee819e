mod common;

use common::{FixedMeasurer, para, section};
use reportflow::document::AbstractDoc;
use reportflow::flow::split::{find_split_index, split_at_char};
use reportflow::flow::{FIT_EPSILON, split_paragraph};
use reportflow::geometry::GeometryProfile;
use reportflow::model::{ContentBlock, Region};
use reportflow::style::Role;
use reportflow::{Document, MeasurerKind, MetricsMeasurer, SectionFilter, builder, paginate};

fn fixed() -> FixedMeasurer {
    FixedMeasurer {
        per_char: 1.0,
        block: 30.0,
    }
}

fn heading(text: &str, anchor: Option<&str>) -> ContentBlock {
    ContentBlock::Heading {
        level: 1,
        text: text.to_string(),
        subtitle: None,
        role: Role::SectionTitle,
        anchor: anchor.map(str::to_string),
    }
}

#[test]
fn pagination_is_deterministic() {
    let document = Document::Report(common::report());
    let first = common::paginate_with_metrics(&document);
    let second = common::paginate_with_metrics(&document);
    assert_eq!(first, second);
    assert!(first.pages.len() > 5, "report should span several pages");
}

#[test]
fn no_content_is_lost_or_reordered() {
    for document in [
        Document::Report(common::report()),
        Document::Abstract(common::abstract_doc(common::prose(6000))),
        Document::Resume(common::resume()),
    ] {
        let blocks = builder::build(&document, &SectionFilter::All);
        let layout = common::paginate_with_metrics(&document);

        assert_eq!(
            common::joined_paragraphs(blocks.iter()),
            common::joined_paragraphs(layout.blocks()),
            "{} paragraphs changed during pagination",
            document.kind_name()
        );
        assert_eq!(
            common::heading_texts(blocks.iter()),
            common::heading_texts(layout.blocks())
        );
    }
}

#[test]
fn pages_stay_within_capacity_unless_flagged() {
    let document = Document::Report(common::report());
    let layout = common::paginate_with_metrics(&document);
    for (i, page) in layout.pages.iter().enumerate() {
        if !page.overflowed {
            assert!(
                page.used <= page.capacity + FIT_EPSILON,
                "page {} uses {}pt of {}pt",
                i + 1,
                page.used,
                page.capacity
            );
        }
    }
}

#[test]
fn empty_input_yields_one_page() {
    let layout = paginate(&[], &GeometryProfile::report(true), &fixed());
    assert_eq!(layout.pages.len(), 1);
    assert!(layout.pages[0].blocks.is_empty());
}

#[test]
fn heading_moves_to_keep_with_next_block() {
    let profile = GeometryProfile::abstract_page(false);
    let capacity = profile.body.writable_height();
    let filler = "x".repeat((capacity - 40.0) as usize);
    let blocks = vec![
        section(Region::Body),
        para(filler),
        heading("Next", None),
        para("y".repeat(100)),
    ];

    let layout = paginate(&blocks, &profile, &fixed());
    assert_eq!(layout.pages.len(), 2);
    assert!(layout.pages[1].blocks[0].is_heading());
    assert!(!layout.pages[0].blocks.iter().any(ContentBlock::is_heading));
}

#[test]
fn heading_stays_when_follower_cannot_fit_anywhere() {
    let profile = GeometryProfile::abstract_page(false);
    let capacity = profile.body.writable_height();
    let blocks = vec![
        section(Region::Body),
        para("x".repeat(100)),
        heading("Next", None),
        ContentBlock::spacer(capacity + 50.0),
    ];

    let layout = paginate(&blocks, &profile, &fixed());
    assert!(layout.pages[0].blocks.iter().any(ContentBlock::is_heading));
}

#[test]
fn section_markers_open_fresh_pages_and_number_body_only() {
    let blocks = vec![
        section(Region::FrontMatter),
        para("cover"),
        section(Region::FrontMatter),
        para("certificate"),
        section(Region::Body),
        heading("Chapter 1", Some("chapter-1")),
        para("intro"),
        section(Region::Body),
        heading("References", Some("references")),
        para("[1] ref"),
    ];

    let layout = paginate(&blocks, &GeometryProfile::report(false), &fixed());
    let numbers: Vec<Option<u32>> = layout.pages.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![None, None, Some(1), Some(2)]);
    assert_eq!(layout.page_label("chapter-1"), Some(1));
    assert_eq!(layout.page_label("references"), Some(2));
}

#[test]
fn leading_section_marker_does_not_leave_blank_page() {
    let blocks = vec![section(Region::FrontMatter), para("only")];
    let layout = paginate(&blocks, &GeometryProfile::report(false), &fixed());
    assert_eq!(layout.pages.len(), 1);
    assert_eq!(layout.pages[0].region, Region::FrontMatter);
    assert_eq!(layout.pages[0].number, None);
}

#[test]
fn long_paragraph_is_cut_after_a_sentence() {
    let profile = GeometryProfile::abstract_page(false);
    let capacity = profile.body.writable_height();
    let text = common::prose(1500);
    let blocks = vec![section(Region::Body), para(text.clone())];

    let layout = paginate(&blocks, &profile, &fixed());
    assert!(layout.pages.len() >= 3);

    let ContentBlock::Paragraph { text: head, continuation, .. } = &layout.pages[0].blocks[1] else {
        panic!("expected a paragraph fragment on page 1");
    };
    assert!(!continuation);
    assert!(head.ends_with('.'), "cut should follow a period: {head:?}");
    let n = head.chars().count() as f32;
    assert!(n <= capacity && n > capacity - 100.0);

    let ContentBlock::Paragraph { continuation, .. } = &layout.pages[1].blocks[0] else {
        panic!("expected a continuation on page 2");
    };
    assert!(continuation);
    assert_eq!(common::joined_paragraphs(layout.blocks()), vec![text]);
}

#[test]
fn oversized_atomic_block_gets_its_own_flagged_page() {
    let profile = GeometryProfile::abstract_page(false);
    let capacity = profile.body.writable_height();
    let blocks = vec![
        section(Region::Body),
        para("x".repeat(100)),
        ContentBlock::spacer(capacity * 2.0),
        para("after"),
    ];

    let layout = paginate(&blocks, &profile, &fixed());
    assert_eq!(layout.pages.len(), 3);
    assert!(!layout.pages[0].overflowed);
    assert!(layout.pages[1].overflowed);
    assert_eq!(layout.pages[1].blocks.len(), 1);
    assert!(!layout.pages[2].overflowed);
}

#[test]
fn heuristic_abstract_breaks_near_first_page_budget() {
    let mut doc = AbstractDoc {
        members: Vec::new(),
        keywords: String::new(),
        ..common::abstract_doc(common::prose(5000))
    };
    doc.guide.name.clear();
    let document = Document::Abstract(doc);
    let budget = document.char_budget();
    assert_eq!(budget.first_page, 1800);

    let layout = reportflow::paginate_document(
        &document,
        &SectionFilter::All,
        MeasurerKind::Heuristic,
        &common::fonts(),
    );
    assert!(layout.pages.len() >= 2);

    let first = layout.pages[0]
        .blocks
        .iter()
        .find_map(|b| match b {
            ContentBlock::Paragraph { text, .. } => Some(text.clone()),
            _ => None,
        })
        .expect("abstract text on page 1");
    let n = first.chars().count();
    assert!(n <= 1800 && n > 1700, "first page holds {n} chars");
    assert!(first.ends_with('.'));
}

#[test]
fn split_index_prefers_period_then_space() {
    let text = "Hello world. Next sentence follows here";
    assert_eq!(find_split_index(text, 20), 12);

    let text = "alpha beta gamma delta";
    assert_eq!(find_split_index(text, 13), 11);

    assert_eq!(find_split_index("abcdefghij", 5), 5);
    assert_eq!(find_split_index("short", 99), 5);
}

#[test]
fn split_index_only_looks_back_a_hundred_chars() {
    let text = format!("Intro. {}", "w".repeat(300));
    assert_eq!(find_split_index(&text, 250), 250);
}

#[test]
fn split_at_char_is_utf8_safe() {
    let (a, b) = split_at_char("héllo wörld", 7);
    assert_eq!(a, "héllo w");
    assert_eq!(b, "örld");
}

#[test]
fn split_paragraph_moves_lead_and_tail_to_first_fragment() {
    let block = ContentBlock::Paragraph {
        text: "one two three".to_string(),
        role: Role::Keywords,
        indent_first_line: true,
        justified: true,
        lead: Some("Keywords: ".to_string()),
        tail: Some("2024".to_string()),
        continuation: false,
    };

    assert!(split_paragraph(&block, 0).is_none());
    assert!(split_paragraph(&block, 13).is_none());

    let (head, rest) = split_paragraph(&block, 4).expect("split");
    let ContentBlock::Paragraph { text, lead, tail, continuation, .. } = head else {
        panic!("head is not a paragraph");
    };
    assert_eq!(text, "one ");
    assert_eq!(lead.as_deref(), Some("Keywords: "));
    assert_eq!(tail.as_deref(), Some("2024"));
    assert!(!continuation);

    let ContentBlock::Paragraph { text, lead, tail, continuation, role, .. } = rest else {
        panic!("rest is not a paragraph");
    };
    assert_eq!(text, "two three");
    assert!(lead.is_none() && tail.is_none());
    assert!(continuation);
    assert_eq!(role, Role::Keywords);
}

#[test]
fn heuristic_abstract_keeps_signature_with_short_text() {
    for chars in [600, 1000] {
        let document = Document::Abstract(common::abstract_doc(common::prose(chars)));
        assert_eq!(document.char_budget().first_page, 1100);

        let layout = reportflow::paginate_document(
            &document,
            &SectionFilter::All,
            MeasurerKind::Heuristic,
            &common::fonts(),
        );
        assert_eq!(layout.pages.len(), 1, "{chars} chars of text");
        let blocks = &layout.pages[0].blocks;
        assert!(blocks.iter().any(|b| matches!(b, ContentBlock::Signature(_))));
        assert!(blocks.iter().any(|b| b.role() == Some(Role::Keywords)));
    }
}

#[test]
fn heuristic_signature_trails_the_last_text_page() {
    let document = Document::Abstract(common::abstract_doc(common::prose(5000)));
    let layout = reportflow::paginate_document(
        &document,
        &SectionFilter::All,
        MeasurerKind::Heuristic,
        &common::fonts(),
    );
    assert_eq!(layout.pages.len(), 3);

    let signature_page = layout
        .pages
        .iter()
        .position(|p| p.blocks.iter().any(|b| matches!(b, ContentBlock::Signature(_))));
    assert_eq!(signature_page, Some(2));
    assert!(layout.pages[2]
        .blocks
        .iter()
        .any(|b| b.role() == Some(Role::AbstractText)));
}

#[test]
fn unbroken_text_wraps_and_splits_with_metrics() {
    let text = "x".repeat(20_000);
    let document = Document::Abstract(common::abstract_doc(String::new()));
    let measurer = MetricsMeasurer::new(document.style_sheet(), common::fonts());
    let blocks = vec![section(Region::Body), para(text.clone())];

    let layout = paginate(&blocks, &document.geometry(), &measurer);
    assert!(layout.pages.len() > 2, "got {} pages", layout.pages.len());
    assert!(layout.pages.iter().all(|p| !p.overflowed));
    assert_eq!(
        common::joined_paragraphs(layout.pages.iter().flat_map(|p| p.blocks.iter())),
        vec![text]
    );
}
