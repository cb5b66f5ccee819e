//! Greedy first-fit pagination.
//!
//! Blocks are placed in order onto the current page until one does not fit.
//! Oversized paragraphs are cut at a sentence or word boundary, headings are
//! kept with the block that follows them when that can fit on an empty page,
//! and section markers open a fresh page in the requested region. There is no
//! backtracking: a block, once placed, stays where it is.

pub mod measure;
pub mod split;

pub use measure::{BlockMeasurer, CharBudget, HeuristicMeasurer, MetricsMeasurer};

use crate::geometry::GeometryProfile;
use crate::model::{ContentBlock, Layout, Page, Region};

/// Slack allowed when comparing accumulated heights against page capacity.
pub const FIT_EPSILON: f32 = 0.01;

/// Upper bound on pages a single paragraph may be spread across.
pub const MAX_PAGES_PER_RUN: usize = 512;

/// Assign `blocks` to pages. Never fails; content that cannot fit is still
/// placed and its page flagged `overflowed`. Input that produces nothing
/// still yields one empty page.
pub fn paginate<M: BlockMeasurer + ?Sized>(
    blocks: &[ContentBlock],
    profile: &GeometryProfile,
    measurer: &M,
) -> Layout {
    let mut flow = Flow::new(profile, measurer);
    for (i, block) in blocks.iter().enumerate() {
        match block {
            ContentBlock::Section { region, .. } => flow.open_section(*region, block.clone()),
            ContentBlock::Heading { .. } => {
                flow.keep_with_next(&blocks[i..]);
                flow.place_atomic(block.clone());
            }
            ContentBlock::Paragraph { .. } => flow.place_paragraph(block.clone()),
            _ => flow.place_atomic(block.clone()),
        }
    }
    flow.finish()
}

struct Flow<'a, M: ?Sized> {
    profile: &'a GeometryProfile,
    measurer: &'a M,
    layout: Layout,
    current: Page,
    body_sealed: u32,
}

impl<'a, M: BlockMeasurer + ?Sized> Flow<'a, M> {
    fn new(profile: &'a GeometryProfile, measurer: &'a M) -> Self {
        Flow {
            profile,
            measurer,
            layout: Layout::default(),
            current: blank_page(profile, Region::Body, 0),
            body_sealed: 0,
        }
    }

    fn blank(&self, region: Region) -> Page {
        blank_page(self.profile, region, self.body_sealed as usize)
    }

    /// Section markers are zero-height and do not count as content.
    fn has_content(&self) -> bool {
        self.current
            .blocks
            .iter()
            .any(|b| !matches!(b, ContentBlock::Section { .. }))
    }

    fn width(&self) -> f32 {
        self.current.geometry.writable_width()
    }

    fn fits(&self, need: f32) -> bool {
        self.current.used + need <= self.current.capacity + FIT_EPSILON
    }

    fn height(&self, block: &ContentBlock) -> f32 {
        self.measurer.measure(block, self.width()) + self.measurer.margin(block)
    }

    /// Capacity of the page a block would land on if it could not stay here.
    fn fresh_capacity(&self) -> f32 {
        if !self.has_content() {
            return self.current.capacity;
        }
        let region = self.current.region;
        let index = self.body_sealed as usize + usize::from(region == Region::Body);
        self.profile.geometry_for(region, index).writable_height()
    }

    fn push(&mut self, block: ContentBlock, height: f32) {
        self.current.used += height;
        self.current.blocks.push(block);
    }

    fn seal(&mut self, next_region: Region) {
        if self.current.region == Region::Body {
            self.body_sealed += 1;
            if self.profile.number_body_pages {
                self.current.number = Some(self.body_sealed);
            }
        }
        if let Some(number) = self.current.number {
            for block in &self.current.blocks {
                if let ContentBlock::Heading {
                    anchor: Some(anchor),
                    ..
                } = block
                {
                    self.layout.anchors.entry(anchor.clone()).or_insert(number);
                }
            }
        }
        if self.current.overflowed {
            log::warn!(
                "Page {} overflows its writable height ({:.1}pt used of {:.1}pt)",
                self.layout.pages.len() + 1,
                self.current.used,
                self.current.capacity
            );
        }
        let next = self.blank(next_region);
        let page = std::mem::replace(&mut self.current, next);
        self.layout.pages.push(page);
    }

    fn open_section(&mut self, region: Region, marker: ContentBlock) {
        if self.has_content() {
            self.seal(region);
        } else if self.current.region != region {
            let geometry = self.profile.geometry_for(region, self.body_sealed as usize);
            self.current.region = region;
            self.current.geometry = geometry;
            self.current.capacity = geometry.writable_height();
        }
        self.current.blocks.push(marker);
    }

    fn place_atomic(&mut self, block: ContentBlock) {
        let height = self.height(&block);
        if !self.fits(height) && self.has_content() {
            self.seal(self.current.region);
        }
        if !self.fits(height) {
            // Alone on an empty page and still too tall: place it whole.
            self.current.overflowed = true;
        }
        self.push(block, height);
    }

    /// Move a heading to the next page when it and the start of what follows
    /// it would not fit here but would fit on an empty page. `chain` starts at
    /// the heading.
    fn keep_with_next(&mut self, chain: &[ContentBlock]) {
        if !self.has_content() {
            return;
        }
        let fresh = self.fresh_capacity();
        let mut need = 0.0;
        for block in chain {
            match block {
                ContentBlock::Heading { .. } => need += self.height(block),
                ContentBlock::Section { .. } => break,
                follower => {
                    let full = self.height(follower);
                    need += if follower.is_splittable() && full > fresh + FIT_EPSILON {
                        self.measurer.lead_height(follower, self.width()) + self.measurer.margin(follower)
                    } else {
                        full
                    };
                    break;
                }
            }
        }
        if !self.fits(need) && need <= fresh + FIT_EPSILON {
            log::debug!("Moving heading to a new page to keep it with the next block");
            self.seal(self.current.region);
        }
    }

    fn place_paragraph(&mut self, block: ContentBlock) {
        let height = self.height(&block);
        if self.fits(height) {
            self.push(block, height);
            return;
        }
        if height <= self.fresh_capacity() + FIT_EPSILON {
            self.seal(self.current.region);
            self.push(block, height);
            return;
        }

        let mut rest = block;
        let mut pages = 0;
        loop {
            let height = self.height(&rest);
            if self.fits(height) {
                self.push(rest, height);
                return;
            }
            if pages >= MAX_PAGES_PER_RUN {
                log::warn!("Paragraph spans more than {MAX_PAGES_PER_RUN} pages; placing the remainder as-is");
                self.current.overflowed = true;
                self.push(rest, height);
                return;
            }

            let mut n = self.fit_chars(&rest);
            if n == 0 {
                if self.has_content() {
                    self.seal(self.current.region);
                    pages += 1;
                    continue;
                }
                n = 1;
            }
            let cut = match &rest {
                ContentBlock::Paragraph { text, .. } => split::find_split_index(text, n),
                _ => n,
            };
            let Some((head, tail)) = split_paragraph(&rest, cut) else {
                self.current.overflowed = true;
                self.push(rest, height);
                return;
            };
            let head_height = self.height(&head);
            if !self.fits(head_height) {
                self.current.overflowed = true;
            }
            self.push(head, head_height);
            self.seal(self.current.region);
            pages += 1;
            rest = tail;
        }
    }

    /// Largest char count of the paragraph's text whose prefix fits the
    /// remaining space. Binary search; measured height grows with length.
    fn fit_chars(&self, block: &ContentBlock) -> usize {
        let ContentBlock::Paragraph { text, .. } = block else {
            return 0;
        };
        let (mut lo, mut hi) = (0usize, text.chars().count().saturating_sub(1));
        while lo < hi {
            let mid = (lo + hi).div_ceil(2);
            let Some((head, _)) = split_paragraph(block, mid) else {
                break;
            };
            if self.fits(self.height(&head)) {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        lo
    }

    fn finish(mut self) -> Layout {
        if !self.current.blocks.is_empty() || self.layout.pages.is_empty() {
            self.seal(self.current.region);
        }
        self.layout
    }
}

fn blank_page(profile: &GeometryProfile, region: Region, body_index: usize) -> Page {
    let geometry = profile.geometry_for(region, body_index);
    Page {
        region,
        number: None,
        geometry,
        blocks: Vec::new(),
        used: 0.0,
        capacity: geometry.writable_height(),
        overflowed: false,
    }
}

/// Cut a paragraph after `n` chars of its text. The first fragment keeps the
/// lead and tail runs; the second is marked as a continuation. Returns `None`
/// when `n` is not strictly inside the text.
pub fn split_paragraph(block: &ContentBlock, n: usize) -> Option<(ContentBlock, ContentBlock)> {
    let ContentBlock::Paragraph {
        text,
        role,
        indent_first_line,
        justified,
        lead,
        tail,
        continuation,
    } = block
    else {
        return None;
    };
    if n == 0 || n >= text.chars().count() {
        return None;
    }
    let (prefix, remainder) = split::split_at_char(text, n);
    let head = ContentBlock::Paragraph {
        text: prefix.to_string(),
        role: *role,
        indent_first_line: *indent_first_line,
        justified: *justified,
        lead: lead.clone(),
        tail: tail.clone(),
        continuation: *continuation,
    };
    let rest = ContentBlock::Paragraph {
        text: remainder.to_string(),
        role: *role,
        indent_first_line: *indent_first_line,
        justified: *justified,
        lead: None,
        tail: None,
        continuation: true,
    };
    Some((head, rest))
}
