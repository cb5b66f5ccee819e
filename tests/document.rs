mod common;

use reportflow::document::{
    ChapterItem, ReportCommand, ReportField, ResumeCommand, ResumeEntry, ResumeList, Skill,
};
use reportflow::geometry::{BorderScope, GeometryProfile, pts_to_twips, twips_to_pts};
use reportflow::model::Region;
use reportflow::{Command, Document, DocumentStore, Error};

#[test]
fn snapshot_parses_from_json() {
    let json = r#"{
        "kind": "resume",
        "personal": { "first_name": "Jane", "last_name": "Doe" },
        "skills": [ { "name": "Rust" } ]
    }"#;
    let document = Document::from_json(json).expect("parse resume");
    let Document::Resume(resume) = &document else {
        panic!("expected a resume");
    };
    assert_eq!(resume.skills.len(), 1);
    assert!(!resume.show_border);
    assert_eq!(document.file_stem(), "Jane_Doe_Resume");
}

#[test]
fn report_defaults_fill_missing_fields() {
    let document = Document::from_json(r#"{ "kind": "report", "project_title": "Flood Watch" }"#)
        .expect("parse report");
    let Document::Report(report) = &document else {
        panic!("expected a report");
    };
    assert_eq!(report.chapters.len(), 6);
    assert!(report.show_border);
    assert_eq!(document.file_stem(), "Flood_Watch");
}

#[test]
fn unknown_kind_is_an_error() {
    let err = Document::from_json(r#"{ "kind": "letter" }"#).expect_err("unknown kind");
    assert!(matches!(err, Error::Json(_)));
}

#[test]
fn missing_image_file_is_an_error() {
    let json = r#"{
        "kind": "report",
        "chapters": [ { "title": "One", "items": [
            { "type": "diagram", "image": "/nonexistent/diagram.png" }
        ] } ]
    }"#;
    assert!(Document::from_json(json).is_err());
}

#[test]
fn commands_bump_version() {
    let mut store = DocumentStore::new(Document::Report(common::report()));
    assert_eq!(store.version(), 0);

    store
        .apply(Command::Report(ReportCommand::Set(
            ReportField::ProjectTitle,
            "Flood Watch".to_string(),
        )))
        .expect("set title");
    let version = store
        .apply(Command::Report(ReportCommand::AddItem {
            chapter: 2,
            item: ChapterItem::Text {
                title: "Future Work".to_string(),
                content: "More sensors.".to_string(),
            },
        }))
        .expect("add item");
    assert_eq!(version, 2);

    let Document::Report(report) = store.document() else {
        panic!("still a report");
    };
    assert_eq!(report.project_title, "Flood Watch");
    assert_eq!(report.chapters[2].items.len(), 2);
}

#[test]
fn invalid_command_leaves_snapshot_untouched() {
    let mut store = DocumentStore::new(Document::Report(common::report()));
    let before = store.document().clone();

    let err = store
        .apply(Command::Report(ReportCommand::RemoveItem {
            chapter: 0,
            index: 9,
        }))
        .expect_err("item index out of range");
    assert!(matches!(err, Error::InvalidCommand(_)));
    assert_eq!(store.version(), 0);
    assert_eq!(store.document(), &before);
}

#[test]
fn resume_lists_are_edited_by_index() {
    let mut store = DocumentStore::new(Document::Resume(common::resume()));
    store
        .apply(Command::Resume(ResumeCommand::Update {
            index: 1,
            entry: ResumeEntry::Skill(Skill {
                name: "C++".to_string(),
                level: "Intermediate".to_string(),
            }),
        }))
        .expect("update skill");
    store
        .apply(Command::Resume(ResumeCommand::Remove {
            list: ResumeList::Skills,
            index: 0,
        }))
        .expect("remove skill");

    let Document::Resume(resume) = store.document() else {
        panic!("still a resume");
    };
    assert_eq!(resume.skills.len(), 1);
    assert_eq!(resume.skills[0].name, "C++");

    assert!(store
        .apply(Command::Resume(ResumeCommand::Remove {
            list: ResumeList::Awards,
            index: 0,
        }))
        .is_err());
    assert_eq!(store.version(), 2);
}

#[test]
fn replace_swaps_document_kind() {
    let mut store = DocumentStore::new(Document::Report(common::report()));
    store
        .apply(Command::Replace(Document::Resume(common::resume())))
        .expect("replace");
    assert_eq!(store.document().kind_name(), "resume");
}

#[test]
fn report_geometry_has_binding_margin_and_first_page_border() {
    let profile = GeometryProfile::report(true);
    assert_eq!(profile.body.margin_left, 108.0);
    assert_eq!(profile.body.margin_right, 72.0);
    let border = profile.border.expect("border enabled");
    assert_eq!(border.scope, BorderScope::FirstPage);
    assert!(border.applies_to(0));
    assert!(!border.applies_to(1));
    assert!(GeometryProfile::report(false).border.is_none());
}

#[test]
fn resume_first_body_page_has_its_own_top_margin() {
    let profile = GeometryProfile::resume(false);
    let first = profile.geometry_for(Region::Body, 0);
    let later = profile.geometry_for(Region::Body, 1);
    assert_eq!(first.margin_top, 72.0);
    assert!(later.margin_top > first.margin_top);
    assert!(first.writable_height() > later.writable_height());
}

#[test]
fn twips_conversion() {
    assert_eq!(pts_to_twips(72.0), 1440);
    assert_eq!(twips_to_pts(240), 12.0);
    assert_eq!(pts_to_twips(-3.0), 0);
}

#[test]
fn snapshot_file_resolves_images_next_to_it() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir(dir.path().join("img")).expect("image dir");
    std::fs::write(dir.path().join("img/photo.png"), &common::png(8, 6).data[..]).expect("write photo");
    std::fs::write(dir.path().join("img/block.png"), &common::png(40, 20).data[..]).expect("write diagram");

    let resume_json = r#"{
        "kind": "resume",
        "personal": { "first_name": "Jane", "profile_pic": "img/photo.png" }
    }"#;
    let input = dir.path().join("resume.json");
    std::fs::write(&input, resume_json).expect("write resume");

    let Document::Resume(resume) = Document::open(&input).expect("open resume") else {
        panic!("expected a resume");
    };
    let photo = resume.personal.profile_pic.expect("photo loaded");
    assert_eq!((photo.pixel_width, photo.pixel_height), (8, 6));
    assert!(Document::from_json(resume_json).is_err(), "working directory has no img/");

    let report_json = r#"{
        "kind": "report",
        "chapters": [ { "title": "One", "items": [
            { "type": "diagram", "image": { "path": "img/block.png" } }
        ] } ]
    }"#;
    let Document::Report(report) = Document::from_json_in(report_json, dir.path()).expect("parse report")
    else {
        panic!("expected a report");
    };
    let ChapterItem::Diagram { image, .. } = &report.chapters[0].items[0] else {
        panic!("expected a diagram");
    };
    assert_eq!(image.pixel_width, 40);
}

#[test]
fn profile_pic_command_sets_and_clears_photo() {
    let mut store = DocumentStore::new(Document::Resume(common::resume()));
    store
        .apply(Command::Resume(ResumeCommand::SetProfilePic(Some(common::png(10, 10)))))
        .expect("set photo");
    let Document::Resume(resume) = store.document() else {
        panic!("still a resume");
    };
    assert!(resume.personal.profile_pic.is_some());

    store
        .apply(Command::Resume(ResumeCommand::SetProfilePic(None)))
        .expect("clear photo");
    let Document::Resume(resume) = store.document() else {
        panic!("still a resume");
    };
    assert!(resume.personal.profile_pic.is_none());
}
