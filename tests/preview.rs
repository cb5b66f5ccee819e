mod common;

use std::time::{Duration, Instant};

use reportflow::document::{AbstractCommand, AbstractField, ReportCommand};
use reportflow::{Command, Config, Debouncer, Document, DocumentStore, Error, PreviewSession};

fn session() -> PreviewSession {
    let store = DocumentStore::new(Document::Abstract(common::abstract_doc(common::prose(400))));
    let config = Config {
        debounce: Duration::from_millis(300),
        ..Config::default()
    };
    PreviewSession::new(store, common::fonts(), &config)
}

fn set_title(title: &str) -> Command {
    Command::Abstract(AbstractCommand::Set(AbstractField::Title, title.to_string()))
}

#[test]
fn debouncer_fires_once_after_quiet_period() {
    let t0 = Instant::now();
    let ms = Duration::from_millis;
    let mut d = Debouncer::new(ms(300));
    assert!(!d.fire(t0));

    d.trigger(t0);
    d.trigger(t0 + ms(100));
    d.trigger(t0 + ms(200));
    assert!(!d.fire(t0 + ms(350)));
    assert!(d.is_pending());
    assert_eq!(d.deadline(), Some(t0 + ms(500)));

    assert!(d.fire(t0 + ms(500)));
    assert!(!d.is_pending());
    assert!(!d.fire(t0 + ms(900)));
}

#[test]
fn burst_of_edits_rebuilds_once() {
    let t0 = Instant::now();
    let ms = Duration::from_millis;
    let mut s = session();

    s.apply(set_title("First"), t0).expect("edit");
    s.apply(set_title("Second"), t0 + ms(100)).expect("edit");
    s.apply(set_title("Final Title"), t0 + ms(200)).expect("edit");

    assert!(s.poll(t0 + ms(350)).is_none());
    assert_eq!(s.rebuilds(), 0);

    let html = s.poll(t0 + ms(500)).expect("rebuild after quiet period").to_string();
    assert!(html.contains("FINAL TITLE"));
    assert!(!html.contains("SECOND"));
    assert_eq!(s.rebuilds(), 1);
    assert_eq!(s.store().version(), 3);

    assert!(s.poll(t0 + ms(2000)).is_none());
    assert_eq!(s.rebuilds(), 1);
}

#[test]
fn rejected_edit_does_not_schedule_a_rebuild() {
    let mut s = session();
    let err = s
        .apply(
            Command::Abstract(AbstractCommand::RemoveMember(42)),
            Instant::now(),
        )
        .expect_err("index out of range");
    assert!(matches!(err, Error::InvalidCommand(_)));
    assert!(!s.is_pending());
    assert_eq!(s.store().version(), 0);
}

#[test]
fn wrong_kind_command_is_rejected() {
    let mut s = session();
    let err = s
        .apply(
            Command::Report(ReportCommand::AddChapter("Extra".to_string())),
            Instant::now(),
        )
        .expect_err("report command on an abstract");
    assert!(matches!(err, Error::InvalidCommand(_)));
}

#[test]
fn refresh_renders_immediately() {
    let mut s = session();
    let html = s.refresh().to_string();
    assert!(html.contains("SMART IRRIGATION CONTROLLER"));
    assert_eq!(s.rebuilds(), 1);
    assert_eq!(s.layout().pages.len(), 1);

    s.refresh();
    assert_eq!(s.rebuilds(), 1, "unchanged snapshot is not rebuilt");

    s.apply(set_title("Renamed"), Instant::now()).expect("edit");
    assert!(s.is_pending());
    s.refresh();
    assert!(!s.is_pending());
    assert_eq!(s.rebuilds(), 2);
    assert!(s.html().contains("RENAMED"));
}
