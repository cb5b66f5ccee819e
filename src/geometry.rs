use crate::model::Region;

pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;

const INCH: f32 = 72.0;

pub fn twips_to_pts(twips: u32) -> f32 {
    twips as f32 / 20.0
}

pub fn pts_to_twips(pts: f32) -> u32 {
    (pts * 20.0).round().max(0.0) as u32
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub page_width: f32, // points
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl PageGeometry {
    pub fn a4(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        PageGeometry {
            page_width: A4_WIDTH,
            page_height: A4_HEIGHT,
            margin_top: top,
            margin_bottom: bottom,
            margin_left: left,
            margin_right: right,
        }
    }

    pub fn writable_height(&self) -> f32 {
        self.page_height - self.margin_top - self.margin_bottom
    }

    pub fn writable_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    pub fn with_top(self, margin_top: f32) -> Self {
        PageGeometry { margin_top, ..self }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorderScope {
    FirstPage,
    AllPages,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorderStyle {
    Single,
    Double,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageBorder {
    pub scope: BorderScope,
    pub style: BorderStyle,
    pub inset: f32, // distance from the page edge, points
}

impl PageBorder {
    pub fn applies_to(&self, page_index: usize) -> bool {
        match self.scope {
            BorderScope::FirstPage => page_index == 0,
            BorderScope::AllPages => true,
        }
    }
}

/// Page geometry for one document kind: front matter and body variants,
/// with an optional different top margin on the first body page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryProfile {
    pub front_matter: PageGeometry,
    pub body: PageGeometry,
    pub body_first_top: Option<f32>,
    pub border: Option<PageBorder>,
    pub number_body_pages: bool,
}

impl GeometryProfile {
    /// Reports: 1" top/bottom/right, 1.5" binding margin on the left.
    /// Front matter shares the body margins; only the body is numbered.
    pub fn report(show_border: bool) -> Self {
        let page = PageGeometry::a4(INCH, INCH, INCH, 1.5 * INCH);
        GeometryProfile {
            front_matter: page,
            body: page,
            body_first_top: None,
            border: show_border.then_some(PageBorder {
                scope: BorderScope::FirstPage,
                style: BorderStyle::Double,
                inset: 24.0,
            }),
            number_body_pages: true,
        }
    }

    pub fn abstract_page(show_border: bool) -> Self {
        let page = PageGeometry::a4(INCH, INCH, INCH, INCH);
        GeometryProfile {
            front_matter: page,
            body: page,
            body_first_top: None,
            border: show_border.then_some(PageBorder {
                scope: BorderScope::AllPages,
                style: BorderStyle::Double,
                inset: 24.0,
            }),
            number_body_pages: false,
        }
    }

    /// Resumes keep the header on page one; later pages start 1.2" down.
    pub fn resume(show_border: bool) -> Self {
        let page = PageGeometry::a4(1.2 * INCH, INCH, INCH, INCH);
        GeometryProfile {
            front_matter: page,
            body: page,
            body_first_top: Some(INCH),
            border: show_border.then_some(PageBorder {
                scope: BorderScope::AllPages,
                style: BorderStyle::Single,
                inset: 24.0,
            }),
            number_body_pages: false,
        }
    }

    /// Geometry for the next page in `region`; `body_index` counts body pages
    /// already opened.
    pub fn geometry_for(&self, region: Region, body_index: usize) -> PageGeometry {
        match region {
            Region::FrontMatter => self.front_matter,
            Region::Body => match self.body_first_top {
                Some(top) if body_index == 0 => self.body.with_top(top),
                _ => self.body,
            },
        }
    }
}

