//! Style values and their defaulting rules.
//!
//! Every constructor here produces a fully resolved value: invalid or absent
//! input silently falls back to a fixed default, so a renderer never has to
//! deal with a half-specified style.

use crate::engine::RenderContext;

pub const DEFAULT_FONT_SIZE: f32 = 12.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Parse `#RRGGBB` / `RRGGBB`. Anything else yields `None`.
    pub fn from_hex(val: &str) -> Option<Self> {
        let val = val.trim();
        let val = val.strip_prefix('#').unwrap_or(val);
        if val.len() != 6 || !val.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&val[0..2], 16).ok()?;
        let g = u8::from_str_radix(&val[2..4], 16).ok()?;
        let b = u8::from_str_radix(&val[4..6], 16).ok()?;
        Some(Color { r, g, b })
    }

    /// Components scaled to the 0.0..=1.0 range PDF color operators use.
    pub(crate) fn to_unit(self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontFamily {
    Courier,
    #[default]
    Helvetica,
    Times,
    Symbol,
    NotoSansTC,
    NotoSansSC,
}

impl FontFamily {
    pub const ALL: [FontFamily; 6] = [
        FontFamily::Courier,
        FontFamily::Helvetica,
        FontFamily::Times,
        FontFamily::Symbol,
        FontFamily::NotoSansTC,
        FontFamily::NotoSansSC,
    ];

    /// Case-insensitive lookup; unrecognized names resolve to Helvetica.
    pub fn resolve(name: &str) -> Self {
        let key: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "courier" => FontFamily::Courier,
            "helvetica" => FontFamily::Helvetica,
            "times" => FontFamily::Times,
            "symbol" => FontFamily::Symbol,
            "notosanstc" => FontFamily::NotoSansTC,
            "notosanssc" => FontFamily::NotoSansSC,
            _ => FontFamily::Helvetica,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FontFamily::Courier => "Courier",
            FontFamily::Helvetica => "Helvetica",
            FontFamily::Times => "Times",
            FontFamily::Symbol => "Symbol",
            FontFamily::NotoSansTC => "NotoSansTC",
            FontFamily::NotoSansSC => "NotoSansSC",
        }
    }
}

impl From<&str> for FontFamily {
    fn from(name: &str) -> Self {
        FontFamily::resolve(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontStyle {
    pub family: FontFamily,
    pub size: f32,
    pub line_height: f32,
    pub color: Color,
    pub bold: bool,
    pub strikeout: bool,
    pub underline: bool,
}

impl Default for FontStyle {
    fn default() -> Self {
        FontStyle::new(FontFamily::Helvetica, 0.0, 0.0, None, false, false, false)
    }
}

impl FontStyle {
    /// Size <= 0 becomes 12, line height <= 0 becomes the resolved size and a
    /// missing color becomes black.
    pub fn new(
        family: impl Into<FontFamily>,
        size: f32,
        line_height: f32,
        color: Option<Color>,
        bold: bool,
        strikeout: bool,
        underline: bool,
    ) -> Self {
        let mut style = FontStyle {
            family: family.into(),
            size: DEFAULT_FONT_SIZE,
            line_height: DEFAULT_FONT_SIZE,
            color: Color::BLACK,
            bold,
            strikeout,
            underline,
        };
        style.set_size(size);
        style.set_line_height(line_height);
        style.set_color(color);
        style
    }

    pub fn set_family(&mut self, family: impl Into<FontFamily>) {
        self.family = family.into();
    }

    pub fn set_size(&mut self, size: f32) {
        self.size = if size > 0.0 { size } else { DEFAULT_FONT_SIZE };
    }

    /// Must run after the size is settled, since the fallback is the size.
    pub fn set_line_height(&mut self, line_height: f32) {
        self.line_height = if line_height > 0.0 {
            line_height
        } else {
            self.size
        };
    }

    pub fn set_color(&mut self, color: Option<Color>) {
        self.color = color.unwrap_or(Color::BLACK);
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn with_strikeout(mut self, strikeout: bool) -> Self {
        self.strikeout = strikeout;
        self
    }

    pub fn with_underline(mut self, underline: bool) -> Self {
        self.underline = underline;
        self
    }

    /// Re-applies the defaulting rules to a value whose public fields may
    /// have been edited directly. Resolving a resolved style is a no-op.
    pub fn resolved(mut self) -> Self {
        let (size, line_height) = (self.size, self.line_height);
        self.set_size(size);
        self.set_line_height(line_height);
        self
    }

    /// Selects this font and its color as the engine's current text state.
    pub fn apply(&self, engine: &mut impl RenderContext) {
        engine.set_font(self.family, &self.emphasis_code(), self.size);
        engine.set_text_color(self.color);
    }

    /// Emphasis flags in engine syntax: a subset of "BSU", in that order.
    pub fn emphasis_code(&self) -> String {
        let mut code = String::with_capacity(3);
        if self.bold {
            code.push('B');
        }
        if self.strikeout {
            code.push('S');
        }
        if self.underline {
            code.push('U');
        }
        code
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BorderStyle {
    pub top: bool,
    pub left: bool,
    pub right: bool,
    pub bottom: bool,
    /// `None` keeps whatever draw color the engine currently has.
    pub color: Option<Color>,
}

impl BorderStyle {
    pub fn new(top: bool, left: bool, right: bool, bottom: bool, color: Option<Color>) -> Self {
        BorderStyle {
            top,
            left,
            right,
            bottom,
            color,
        }
    }

    pub fn all(color: Option<Color>) -> Self {
        BorderStyle::new(true, true, true, true, color)
    }

    /// Builds a border from engine letters, e.g. "TB". Unknown letters are
    /// ignored, so "1" or "" both mean no sides.
    pub fn from_code(code: &str, color: Option<Color>) -> Self {
        let mut border = BorderStyle {
            color,
            ..BorderStyle::default()
        };
        for c in code.chars() {
            match c.to_ascii_uppercase() {
                'T' => border.top = true,
                'L' => border.left = true,
                'R' => border.right = true,
                'B' => border.bottom = true,
                _ => {}
            }
        }
        border
    }

    pub fn apply_color(&self, engine: &mut impl RenderContext) {
        if let Some(color) = self.color {
            engine.set_draw_color(color);
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.top || self.left || self.right || self.bottom)
    }

    /// Active sides in engine syntax: a subset of "TLRB", in that order.
    pub fn code(&self) -> String {
        let mut code = String::with_capacity(4);
        if self.top {
            code.push('T');
        }
        if self.left {
            code.push('L');
        }
        if self.right {
            code.push('R');
        }
        if self.bottom {
            code.push('B');
        }
        code
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl HAlign {
    /// Case-insensitive; unrecognized names resolve to Left.
    pub fn resolve(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => HAlign::Left,
            "center" | "centre" | "c" => HAlign::Center,
            "right" | "r" => HAlign::Right,
            _ => HAlign::Left,
        }
    }

    pub fn code(self) -> char {
        match self {
            HAlign::Left => 'L',
            HAlign::Center => 'C',
            HAlign::Right => 'R',
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VAlign {
    #[default]
    Top,
    Middle,
    Bottom,
    Baseline,
}

impl VAlign {
    /// Case-insensitive; unrecognized names resolve to Top.
    pub fn resolve(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "top" | "t" => VAlign::Top,
            "middle" | "m" => VAlign::Middle,
            "bottom" | "b" => VAlign::Bottom,
            "baseline" | "a" => VAlign::Baseline,
            _ => VAlign::Top,
        }
    }

    pub fn code(self) -> char {
        match self {
            VAlign::Top => 'T',
            VAlign::Middle => 'M',
            VAlign::Bottom => 'B',
            VAlign::Baseline => 'A',
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CellStyle {
    pub font: FontStyle,
    pub border: BorderStyle,
    /// `None` means the cell is not filled.
    pub fill: Option<Color>,
    pub h_align: HAlign,
    pub v_align: VAlign,
}

impl CellStyle {
    /// A missing font or border is replaced by its fully defaulted value;
    /// the fill color is taken as given.
    pub fn new(
        font: Option<FontStyle>,
        border: Option<BorderStyle>,
        fill: Option<Color>,
        h_align: HAlign,
        v_align: VAlign,
    ) -> Self {
        CellStyle {
            font: font.map(FontStyle::resolved).unwrap_or_default(),
            border: border.unwrap_or_default(),
            fill,
            h_align,
            v_align,
        }
    }

    pub fn resolved(self) -> Self {
        CellStyle {
            font: self.font.resolved(),
            ..self
        }
    }

    /// Configures font, fill and border color ahead of a cell draw.
    pub fn apply(&self, engine: &mut impl RenderContext) {
        self.font.apply(engine);
        if let Some(fill) = self.fill {
            engine.set_fill_color(fill);
        }
        self.border.apply_color(engine);
    }

    /// Two-character alignment code: horizontal letter then vertical letter.
    pub fn align_code(&self) -> String {
        let mut code = String::with_capacity(2);
        code.push(self.h_align.code());
        code.push(self.v_align.code());
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert_eq!(Color::from_hex("#FF8000"), Some(Color::rgb(255, 128, 0)));
        assert_eq!(Color::from_hex("00ff00"), Some(Color::rgb(0, 255, 0)));
        assert_eq!(Color::from_hex("auto"), None);
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("zz0000"), None);
    }

    #[test]
    fn family_names_ignore_case_and_spaces() {
        assert_eq!(FontFamily::resolve("times"), FontFamily::Times);
        assert_eq!(FontFamily::resolve("Noto Sans TC"), FontFamily::NotoSansTC);
        assert_eq!(FontFamily::resolve("Comic Sans"), FontFamily::Helvetica);
        for family in FontFamily::ALL {
            assert_eq!(FontFamily::resolve(family.name()), family);
        }
    }

    #[test]
    fn border_code_round_trips_through_letters() {
        let border = BorderStyle::from_code("bt", None);
        assert!(border.top && border.bottom && !border.left && !border.right);
        assert_eq!(border.code(), "TB");
        assert!(BorderStyle::from_code("1", None).is_empty());
    }
}
