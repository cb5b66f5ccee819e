//! The formatting contract shared by the measurers and every render adapter.
//!
//! Sizes are in half-points and spacings in twips, the units WordprocessingML
//! uses, so the DOCX writer can emit them verbatim while the PDF and HTML
//! adapters convert to points.

use crate::geometry::twips_to_pts;
use crate::model::Alignment;

pub const DEFAULT_FONT: &str = "Times New Roman";

/// Line spacing in 240ths of a line.
pub const LINE_SINGLE: u32 = 240;
pub const LINE_RESUME: u32 = 276;
pub const LINE_REPORT: u32 = 360;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    // report cover
    CoverTitle,
    CoverReportType,
    CoverNote,
    CoverGuidance,
    CoverMember,
    CoverGuide,
    CoverDesignation,
    CoverInstitution,
    CoverText,
    CoverUniversity,
    CoverDegree,
    CoverFooter,
    // report front matter
    InstitutionHeader,
    CertificateTitle,
    PageTitle,
    BodyText,
    TocLine,
    // report body
    ChapterLabel,
    ChapterTitle,
    SectionTitle,
    ChapterText,
    Caption,
    ReferencesTitle,
    Reference,
    // signatures and grids
    SignatureHeader,
    SignatureText,
    SignatureName,
    SignatoryName,
    SignatoryRole,
    SignatoryDetail,
    // abstract
    AbstractTitle,
    AbstractHeading,
    AbstractText,
    Keywords,
    // resume
    ResumeName,
    ResumeJobTitle,
    ResumeContact,
    ResumeSection,
    EntryTitle,
    EntrySubtitle,
    EntryText,
    Bullet,
    PageNumber,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub size: u32, // half-points
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub align: Alignment,
    pub before: u32, // twips
    pub after: u32,  // twips
    pub first_line: u32,
    pub keep_next: bool,
    pub shaded: bool,
}

impl TextStyle {
    const fn body(size: u32) -> Self {
        TextStyle {
            size,
            bold: false,
            italic: false,
            underline: false,
            align: Alignment::Left,
            before: 0,
            after: 0,
            first_line: 0,
            keep_next: false,
            shaded: false,
        }
    }

    const fn bold(self) -> Self {
        TextStyle { bold: true, ..self }
    }

    const fn italic(self) -> Self {
        TextStyle {
            italic: true,
            ..self
        }
    }

    const fn underline(self) -> Self {
        TextStyle {
            underline: true,
            ..self
        }
    }

    const fn center(self) -> Self {
        TextStyle {
            align: Alignment::Center,
            ..self
        }
    }

    const fn justify(self) -> Self {
        TextStyle {
            align: Alignment::Justify,
            ..self
        }
    }

    const fn space(self, before: u32, after: u32) -> Self {
        TextStyle {
            before,
            after,
            ..self
        }
    }

    const fn keep_next(self) -> Self {
        TextStyle {
            keep_next: true,
            ..self
        }
    }

    pub fn font_size(&self) -> f32 {
        self.size as f32 / 2.0
    }

    pub fn space_before(&self) -> f32 {
        twips_to_pts(self.before)
    }

    pub fn space_after(&self) -> f32 {
        twips_to_pts(self.after)
    }

    pub fn first_line_indent(&self) -> f32 {
        twips_to_pts(self.first_line)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SheetKind {
    Report,
    Abstract,
    Resume,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StyleSheet {
    pub kind: SheetKind,
    pub font_family: String,
    pub line: u32,
}

impl StyleSheet {
    pub fn report() -> Self {
        StyleSheet {
            kind: SheetKind::Report,
            font_family: DEFAULT_FONT.to_string(),
            line: LINE_REPORT,
        }
    }

    pub fn abstract_page() -> Self {
        StyleSheet {
            kind: SheetKind::Abstract,
            font_family: DEFAULT_FONT.to_string(),
            line: LINE_SINGLE,
        }
    }

    pub fn resume() -> Self {
        StyleSheet {
            kind: SheetKind::Resume,
            font_family: DEFAULT_FONT.to_string(),
            line: LINE_RESUME,
        }
    }

    /// Line pitch multiplier relative to the font's natural line height.
    pub fn line_factor(&self) -> f32 {
        self.line as f32 / LINE_SINGLE as f32
    }

    pub fn style(&self, role: Role) -> TextStyle {
        use Role::*;
        let base = TextStyle::body(24);
        match role {
            CoverTitle => TextStyle::body(32).bold().center().space(0, 600),
            CoverReportType => TextStyle::body(28).bold().center().space(0, 600),
            CoverNote => base.italic().center().space(0, 120),
            CoverGuidance => base.italic().center().space(360, 200),
            CoverMember => base.bold().center().space(0, 60),
            CoverGuide => TextStyle::body(28).bold().center().space(0, 60),
            CoverDesignation => base.italic().center().space(0, 60),
            CoverInstitution => base.bold().italic().center().space(0, 60),
            CoverText => base.center().space(0, 120),
            CoverUniversity => base.bold().center().space(0, 120),
            CoverDegree => base.center().space(0, 480),
            CoverFooter => TextStyle::body(26).bold().center().space(480, 60),

            InstitutionHeader => TextStyle::body(26).bold().center().space(0, 60),
            CertificateTitle => TextStyle::body(28)
                .bold()
                .center()
                .space(0, 480)
                .keep_next(),
            PageTitle => TextStyle::body(32)
                .bold()
                .underline()
                .center()
                .space(0, 480)
                .keep_next(),
            BodyText => base.justify().space(0, 200),
            TocLine => base.space(0, 60),

            ChapterLabel => TextStyle::body(32)
                .bold()
                .center()
                .space(0, 120)
                .keep_next(),
            ChapterTitle => TextStyle::body(32)
                .bold()
                .center()
                .space(0, 360)
                .keep_next(),
            SectionTitle => TextStyle::body(28).bold().space(240, 120).keep_next(),
            ChapterText => TextStyle {
                first_line: 720,
                ..base.justify().space(0, 120)
            },
            Caption => TextStyle::body(22).italic().center().space(0, 360),
            ReferencesTitle => TextStyle::body(32)
                .bold()
                .center()
                .space(0, 360)
                .keep_next(),
            Reference => base.space(0, 120),

            SignatureHeader => base.bold().underline(),
            SignatureText => base,
            SignatureName => base.bold(),
            SignatoryName => TextStyle::body(22).bold(),
            SignatoryRole => TextStyle::body(20).italic(),
            SignatoryDetail => TextStyle::body(20),

            AbstractTitle => TextStyle::body(32)
                .bold()
                .underline()
                .center()
                .space(0, 720)
                .keep_next(),
            AbstractHeading => TextStyle::body(28)
                .bold()
                .underline()
                .space(0, 240)
                .keep_next(),
            AbstractText => TextStyle {
                first_line: 720,
                ..base.justify().space(0, 480)
            },
            Keywords => base.space(0, 2500),

            ResumeName => TextStyle::body(32).bold().center(),
            ResumeJobTitle => base.center().space(50, 0),
            ResumeContact => TextStyle::body(20).center().space(50, 200),
            ResumeSection => TextStyle {
                shaded: true,
                ..TextStyle::body(28).bold().space(240, 120).keep_next()
            },
            EntryTitle => base.bold().keep_next(),
            EntrySubtitle => base.italic().space(0, 50),
            EntryText => base.justify().space(0, 120),
            Bullet => base.justify().space(0, 40),
            PageNumber => TextStyle::body(20).center(),
        }
    }
}
