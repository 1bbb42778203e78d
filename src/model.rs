use crate::engine::RenderContext;
use crate::style::{CellStyle, FontStyle};

/// One table cell. A `width` above zero fixes the width in points; otherwise a
/// `width_percent` above zero takes that fraction of the row's available
/// width; with neither set the cell shares whatever is left.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    pub text: String,
    pub style: CellStyle,
    pub width: f32,
    pub width_percent: f32,
}

impl Cell {
    pub fn new(text: impl Into<String>, style: Option<CellStyle>) -> Self {
        let mut cell = Cell {
            text: text.into(),
            ..Cell::default()
        };
        cell.set_style(style);
        cell
    }

    pub fn set_style(&mut self, style: Option<CellStyle>) {
        self.style = style.map(CellStyle::resolved).unwrap_or_default();
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    pub fn with_width_percent(mut self, percent: f32) -> Self {
        self.width_percent = percent;
        self
    }
}

/// Space around a rendered row. Non-positive sides have no effect.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Spacing {
    pub top: f32,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Spacing {
    pub fn new(top: f32, left: f32, right: f32, bottom: f32) -> Self {
        Spacing {
            top,
            left,
            right,
            bottom,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn resolve(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "landscape" | "l" => Orientation::Landscape,
            _ => Orientation::Portrait,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Paper {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
}

impl Paper {
    pub fn resolve(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "a3" => Paper::A3,
            "a4" => Paper::A4,
            "a5" => Paper::A5,
            "letter" => Paper::Letter,
            "legal" => Paper::Legal,
            "tabloid" => Paper::Tabloid,
            _ => Paper::A4,
        }
    }

    /// Portrait (width, height) in points.
    pub fn size(self) -> (f32, f32) {
        match self {
            Paper::A3 => (841.89, 1190.55),
            Paper::A4 => (595.28, 841.89),
            Paper::A5 => (420.94, 595.28),
            Paper::Letter => (612.0, 792.0),
            Paper::Legal => (612.0, 1008.0),
            Paper::Tabloid => (792.0, 1224.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageMargin {
    pub top: f32,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
}

impl PageMargin {
    pub fn new(top: f32, left: f32, right: f32, bottom: f32) -> Self {
        PageMargin {
            top,
            left,
            right,
            bottom,
        }
    }
}

impl Default for PageMargin {
    // 1 cm on three sides, 2 cm at the bottom where pages break.
    fn default() -> Self {
        PageMargin::new(28.35, 28.35, 28.35, 56.7)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PageLayout {
    pub orientation: Orientation,
    pub paper: Paper,
    pub margin: Option<PageMargin>,
    pub default_font_style: Option<FontStyle>,
}

impl PageLayout {
    pub fn new(orientation: Orientation, paper: Paper) -> Self {
        PageLayout {
            orientation,
            paper,
            ..PageLayout::default()
        }
    }

    pub fn with_margin(mut self, margin: PageMargin) -> Self {
        self.margin = Some(margin);
        self
    }

    pub fn with_default_font_style(mut self, style: FontStyle) -> Self {
        self.default_font_style = Some(style);
        self
    }

    /// Oriented page size in points.
    pub fn page_size(&self) -> (f32, f32) {
        let (w, h) = self.paper.size();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    pub fn margins(&self) -> PageMargin {
        self.margin.unwrap_or_default()
    }
}

/// Page and body dimensions as reported by the engine for the current page.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PageGeometry {
    pub page_height: f32,
    pub page_width: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub body_height: f32,
    pub body_width: f32,
}

impl PageGeometry {
    pub fn from_engine(engine: &impl RenderContext) -> Self {
        let (page_width, page_height) = engine.page_size();
        let (left, top, right, bottom) = engine.margins();
        PageGeometry {
            page_height,
            page_width,
            margin_top: top,
            margin_bottom: bottom,
            margin_left: left,
            margin_right: right,
            body_height: page_height - top - bottom,
            body_width: page_width - left - right,
        }
    }
}
