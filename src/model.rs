use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::geometry::PageGeometry;
use crate::style::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn mime(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
        }
    }
}

/// Decoded-enough image: raw file bytes plus the pixel size read from the header.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    pub data: Arc<[u8]>,
    pub format: ImageFormat,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl ImageData {
    /// Sniff the format and read the pixel size from the header. Only PNG and
    /// JPEG are accepted since those are the formats every adapter can embed.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let format = match image::guess_format(&bytes)? {
            image::ImageFormat::Png => ImageFormat::Png,
            image::ImageFormat::Jpeg => ImageFormat::Jpeg,
            other => return Err(Error::UnsupportedImage(format!("{other:?}"))),
        };
        let (pixel_width, pixel_height) = image::ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()?
            .into_dimensions()?;
        Ok(ImageData {
            data: Arc::from(bytes),
            format,
            pixel_width,
            pixel_height,
        })
    }

    pub fn open(path: &Path) -> Result<Self> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Height over width; 0.75 when the header reported a zero width.
    pub fn aspect_ratio(&self) -> f32 {
        if self.pixel_width == 0 {
            0.75
        } else {
            self.pixel_height as f32 / self.pixel_width as f32
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    /// Unnumbered preliminary pages.
    FrontMatter,
    /// Pages numbered from 1.
    Body,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Member {
    pub name: String,
    pub reg_no: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Guide {
    pub name: String,
    pub designation: String,
    pub department: String,
    pub college: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SignatureBlock {
    pub members: Vec<Member>,
    pub guide: Guide,
}

impl SignatureBlock {
    pub const MEMBERS_LABEL: &'static str = "GROUP MEMBERS";
    pub const GUIDE_LABEL: &'static str = "GUIDE";

    /// Left column: header, then one `NAME (REG)` line per named member.
    pub fn member_entries(&self) -> Vec<(String, Role)> {
        let mut out = vec![(Self::MEMBERS_LABEL.to_string(), Role::SignatureHeader)];
        for m in self.members.iter().filter(|m| !m.name.trim().is_empty()) {
            let name = m.name.trim().to_uppercase();
            let line = if m.reg_no.trim().is_empty() {
                name
            } else {
                format!("{name} ({})", m.reg_no.trim())
            };
            out.push((line, Role::SignatureText));
        }
        out
    }

    /// Right column: header, guide name, then whichever details are filled in.
    pub fn guide_entries(&self) -> Vec<(String, Role)> {
        let g = &self.guide;
        let mut out = vec![(Self::GUIDE_LABEL.to_string(), Role::SignatureHeader)];
        if !g.name.trim().is_empty() {
            out.push((g.name.trim().to_string(), Role::SignatureName));
        }
        for detail in [&g.designation, &g.department, &g.college] {
            if !detail.trim().is_empty() {
                out.push((detail.trim().to_string(), Role::SignatureText));
            }
        }
        out
    }
}

/// One cell of a signatory grid. Every line is optional except the name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Signatory {
    pub name: String,
    pub role: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub college: Option<String>,
}

impl Signatory {
    pub fn entries(&self) -> Vec<(String, Role)> {
        let mut out = vec![(self.name.clone(), Role::SignatoryName)];
        if let Some(role) = &self.role {
            out.push((role.clone(), Role::SignatoryRole));
        }
        for detail in [&self.designation, &self.department, &self.college]
            .into_iter()
            .flatten()
        {
            out.push((detail.clone(), Role::SignatoryDetail));
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SignatoryGrid {
    pub rows: Vec<[Option<Signatory>; 2]>,
    /// Left column flush left, right column flush right (declaration date/signature row).
    pub edge_aligned: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Figure {
    pub image: ImageData,
    pub caption: Option<String>,
    pub width_percent: u8,
    pub aspect_ratio: f32, // height / width
    /// Horizontal placement within the column; `Justify` reads as centred.
    pub align: Alignment,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ContentBlock {
    Heading {
        level: u8,
        text: String,
        subtitle: Option<String>,
        role: Role,
        anchor: Option<String>,
    },
    Paragraph {
        text: String,
        role: Role,
        indent_first_line: bool,
        justified: bool,
        lead: Option<String>,
        tail: Option<String>,
        continuation: bool,
    },
    Figure(Figure),
    Signature(SignatureBlock),
    Signatories(SignatoryGrid),
    Spacer {
        height: f32, // points
        stretch: bool,
    },
    Section {
        region: Region,
        title: String,
    },
    TocEntry {
        text: String,
        level: u8,
        anchor: String,
    },
}

impl ContentBlock {
    pub fn heading(level: u8, text: impl Into<String>, role: Role) -> Self {
        ContentBlock::Heading {
            level,
            text: text.into(),
            subtitle: None,
            role,
            anchor: None,
        }
    }

    pub fn paragraph(text: impl Into<String>, role: Role) -> Self {
        ContentBlock::Paragraph {
            text: text.into(),
            role,
            indent_first_line: false,
            justified: false,
            lead: None,
            tail: None,
            continuation: false,
        }
    }

    pub fn spacer(height: f32) -> Self {
        ContentBlock::Spacer {
            height,
            stretch: false,
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, ContentBlock::Heading { .. })
    }

    /// Only paragraphs may be cut across a page boundary.
    pub fn is_splittable(&self) -> bool {
        matches!(self, ContentBlock::Paragraph { .. })
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            ContentBlock::Heading { role, .. } | ContentBlock::Paragraph { role, .. } => Some(*role),
            _ => None,
        }
    }
}

/// A page produced by the flow engine. `used` and `capacity` are in points.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub region: Region,
    pub number: Option<u32>,
    pub geometry: PageGeometry,
    pub blocks: Vec<ContentBlock>,
    pub used: f32,
    pub capacity: f32,
    pub overflowed: bool,
}

impl Page {
    pub fn label(&self) -> Option<String> {
        self.number.map(|n| n.to_string())
    }

    /// Space left before the writable height is exhausted (never negative).
    pub fn remaining(&self) -> f32 {
        (self.capacity - self.used).max(0.0)
    }
}

/// Pagination result shared by every render adapter.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Layout {
    pub pages: Vec<Page>,
    /// Heading anchor -> body page number it landed on.
    pub anchors: BTreeMap<String, u32>,
}

impl Layout {
    pub fn page_label(&self, anchor: &str) -> Option<u32> {
        self.anchors.get(anchor).copied()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &ContentBlock> {
        self.pages.iter().flat_map(|p| p.blocks.iter())
    }
}
