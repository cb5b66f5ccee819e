//! Debounced live preview.
//!
//! Edits go through the session; each one restarts the debounce timer, and
//! the HTML is rebuilt once the timer lapses with no further edits. The
//! caller owns the clock and passes `now` in, so the session never spawns a
//! thread or sleeps.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::builder::SectionFilter;
use crate::config::{Config, MeasurerKind};
use crate::document::{Command, DocumentStore};
use crate::error::Result;
use crate::fonts::FontSet;
use crate::model::Layout;

/// Timer-reset-on-event: every `trigger` pushes the deadline out by `delay`.
#[derive(Clone, Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True exactly once per burst of triggers, when `now` has reached the
    /// deadline of the latest one.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Debouncer::new(crate::config::DEFAULT_DEBOUNCE)
    }
}

pub struct PreviewSession {
    store: DocumentStore,
    fonts: Arc<FontSet>,
    measurer: MeasurerKind,
    filter: SectionFilter,
    debouncer: Debouncer,
    rendered_version: Option<u64>,
    layout: Layout,
    html: String,
    rebuilds: u64,
}

impl PreviewSession {
    pub fn new(store: DocumentStore, fonts: Arc<FontSet>, config: &Config) -> Self {
        PreviewSession {
            store,
            fonts,
            measurer: config.measurer,
            filter: SectionFilter::All,
            debouncer: Debouncer::new(config.debounce),
            rendered_version: None,
            layout: Layout::default(),
            html: String::new(),
            rebuilds: 0,
        }
    }

    pub fn with_filter(mut self, filter: SectionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Apply an edit and restart the debounce timer. A rejected command
    /// leaves the timer alone.
    pub fn apply(&mut self, cmd: Command, now: Instant) -> Result<u64> {
        let version = self.store.apply(cmd)?;
        self.debouncer.trigger(now);
        Ok(version)
    }

    /// Rebuild if the debounce deadline has passed. Returns the fresh HTML
    /// when a rebuild happened.
    pub fn poll(&mut self, now: Instant) -> Option<&str> {
        if !self.debouncer.fire(now) || self.is_current() {
            return None;
        }
        self.rebuild();
        Some(&self.html)
    }

    /// Rebuild immediately, cancelling any pending timer.
    pub fn refresh(&mut self) -> &str {
        self.debouncer.deadline = None;
        if !self.is_current() {
            self.rebuild();
        }
        &self.html
    }

    fn is_current(&self) -> bool {
        self.rendered_version == Some(self.store.version())
    }

    fn rebuild(&mut self) {
        let document = self.store.document();
        self.layout = crate::paginate_document(document, &self.filter, self.measurer, &self.fonts);
        self.html = crate::render_html(document, &self.layout);
        self.rendered_version = Some(self.store.version());
        self.rebuilds += 1;
        log::debug!(
            "Preview rebuilt: version {} -> {} pages",
            self.store.version(),
            self.layout.pages.len()
        );
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// How many times the preview has been rebuilt.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }
}
