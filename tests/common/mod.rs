#![allow(dead_code)]

use tablestyle_pdf::{Color, Error, FontFamily, FontStyle, HAlign, RenderContext};

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    DrawColor(Color),
    FillColor(Color),
    TextColor(Color),
    Font {
        family: FontFamily,
        emphasis: String,
        size: f32,
    },
    Cell {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        line_height: f32,
        text: String,
        border: String,
        align: String,
        fill: bool,
    },
    Write {
        line_height: f32,
        text: String,
    },
    Link {
        line_height: f32,
        text: String,
        url: String,
    },
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        flow: bool,
    },
    WriteAligned {
        width: f32,
        line_height: f32,
        text: String,
        align: HAlign,
    },
    AdvanceLine(f32),
    SetX(f32),
    AddPage,
}

/// Records every drawing call. Cells measure one line per `\n`-separated
/// line of text; images without a height come out square.
pub struct RecordingEngine {
    pub page: (f32, f32),
    /// (left, top, right, bottom)
    pub margins: (f32, f32, f32, f32),
    pub x: f32,
    pub y: f32,
    pub calls: Vec<Call>,
}

impl RecordingEngine {
    pub fn new(page_width: f32, page_height: f32, margin: f32) -> Self {
        RecordingEngine {
            page: (page_width, page_height),
            margins: (margin, margin, margin, margin),
            x: margin,
            y: margin,
            calls: Vec::new(),
        }
    }

    /// An engine whose body is exactly `body_width` wide behind 20pt margins.
    pub fn with_body_width(body_width: f32) -> Self {
        RecordingEngine::new(body_width + 40.0, 800.0, 20.0)
    }

    pub fn cells(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Cell { .. }))
            .collect()
    }

    pub fn cell_widths(&self) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Cell { width, .. } => Some(*width),
                _ => None,
            })
            .collect()
    }
}

impl RenderContext for RecordingEngine {
    fn set_draw_color(&mut self, color: Color) {
        self.calls.push(Call::DrawColor(color));
    }

    fn set_fill_color(&mut self, color: Color) {
        self.calls.push(Call::FillColor(color));
    }

    fn set_text_color(&mut self, color: Color) {
        self.calls.push(Call::TextColor(color));
    }

    fn set_font(&mut self, family: FontFamily, emphasis: &str, size: f32) {
        self.calls.push(Call::Font {
            family,
            emphasis: emphasis.to_string(),
            size,
        });
    }

    fn measure_cell(&mut self, font: &FontStyle, _width: f32, text: &str) -> f32 {
        font.line_height * text.split('\n').count() as f32
    }

    fn draw_cell(
        &mut self,
        width: f32,
        height: f32,
        line_height: f32,
        text: &str,
        border: &str,
        align: &str,
        fill: bool,
    ) {
        self.calls.push(Call::Cell {
            x: self.x,
            y: self.y,
            width,
            height,
            line_height,
            text: text.to_string(),
            border: border.to_string(),
            align: align.to_string(),
            fill,
        });
        self.x += width;
    }

    fn write(&mut self, line_height: f32, text: &str) {
        self.calls.push(Call::Write {
            line_height,
            text: text.to_string(),
        });
    }

    fn write_link(&mut self, line_height: f32, text: &str, url: &str) {
        self.calls.push(Call::Link {
            line_height,
            text: text.to_string(),
            url: url.to_string(),
        });
    }

    fn draw_image(
        &mut self,
        data: &[u8],
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        flow: bool,
    ) -> Result<f32, Error> {
        if data.is_empty() {
            return Err(Error::Pdf("empty image".into()));
        }
        let height = if height > 0.0 { height } else { width };
        self.calls.push(Call::Image {
            x,
            y,
            width,
            height,
            flow,
        });
        if flow {
            self.y = y + height;
        }
        Ok(height)
    }

    fn write_aligned(&mut self, width: f32, line_height: f32, text: &str, align: HAlign) {
        self.calls.push(Call::WriteAligned {
            width,
            line_height,
            text: text.to_string(),
            align,
        });
    }

    fn page_size(&self) -> (f32, f32) {
        self.page
    }

    fn margins(&self) -> (f32, f32, f32, f32) {
        self.margins
    }

    fn advance_line(&mut self, height: f32) {
        self.calls.push(Call::AdvanceLine(height));
        self.x = self.margins.0;
        self.y += height;
    }

    fn set_x(&mut self, x: f32) {
        self.calls.push(Call::SetX(x));
        self.x = x;
    }

    fn cursor(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    fn add_page(&mut self) {
        self.calls.push(Call::AddPage);
        self.x = self.margins.0;
        self.y = self.margins.1;
    }
}
