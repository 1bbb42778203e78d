use std::path::Path;

use log::debug;

use crate::engine::RenderContext;
use crate::error::Error;
use crate::model::{Cell, PageGeometry, PageLayout, Spacing};
use crate::pdf::PdfEngine;
use crate::style::{FontStyle, HAlign};
use crate::table::{RenderedRow, render_row};

/// A drawing engine plus the page geometry and default font the style layer
/// works against. The first page is started on construction.
pub struct Document<R: RenderContext> {
    engine: R,
    layout: PageLayout,
    default_font_style: FontStyle,
    geometry: PageGeometry,
}

impl<R: RenderContext> Document<R> {
    /// Page size and margins come from the engine; the layout contributes the
    /// default font style. A missing layout means portrait A4 with defaults.
    pub fn new(engine: R, layout: Option<PageLayout>) -> Self {
        let layout = layout.unwrap_or_default();
        let default_font_style = layout
            .default_font_style
            .map(FontStyle::resolved)
            .unwrap_or_default();
        let mut doc = Document {
            engine,
            layout,
            default_font_style,
            geometry: PageGeometry::default(),
        };
        doc.add_page();
        doc
    }

    pub fn add_page(&mut self) {
        self.engine.add_page();
        self.refresh_geometry();
    }

    fn refresh_geometry(&mut self) {
        self.geometry = PageGeometry::from_engine(&self.engine);
        debug!(
            "Page body {:.2}x{:.2}pt",
            self.geometry.body_width, self.geometry.body_height
        );
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn default_font_style(&self) -> &FontStyle {
        &self.default_font_style
    }

    pub fn set_default_font_style(&mut self, style: FontStyle) {
        self.default_font_style = style.resolved();
    }

    fn font_or_default(&self, style: Option<&FontStyle>) -> FontStyle {
        style.copied().unwrap_or(self.default_font_style)
    }

    /// Flows `text` from the cursor in `style` (or the default font).
    pub fn write_text(&mut self, text: &str, style: Option<&FontStyle>) {
        let style = self.font_or_default(style);
        style.apply(&mut self.engine);
        self.engine.write(style.line_height, text);
    }

    /// Writes each line of `text` aligned across the body width, each
    /// followed by a line break.
    pub fn write_text_box(&mut self, text: &str, align: HAlign, style: Option<&FontStyle>) {
        let style = self.font_or_default(style);
        style.apply(&mut self.engine);
        for line in text.split('\n') {
            self.engine
                .write_aligned(0.0, style.line_height, line, align);
            self.engine.advance_line(style.line_height);
        }
    }

    /// Flows `text` like `write_text`, linking it to `url`.
    pub fn write_link(&mut self, text: &str, url: &str, style: Option<&FontStyle>) {
        let style = self.font_or_default(style);
        style.apply(&mut self.engine);
        self.engine.write_link(style.line_height, text, url);
    }

    /// Reads an image file and places it like `write_image_bytes`.
    pub fn write_image(
        &mut self,
        path: &Path,
        width: f32,
        height: f32,
        flow: bool,
    ) -> Result<f32, Error> {
        let bytes = std::fs::read(path)?;
        debug!("Placing image {}", path.display());
        self.write_image_bytes(&bytes, width, height, flow)
    }

    /// Places an encoded image at the left margin and the current line. A
    /// non-positive `width` spans the body width; a non-positive `height`
    /// keeps the aspect ratio. With `flow` the cursor moves below the image.
    /// Returns the placed height.
    pub fn write_image_bytes(
        &mut self,
        bytes: &[u8],
        width: f32,
        height: f32,
        flow: bool,
    ) -> Result<f32, Error> {
        let width = if width > 0.0 {
            width
        } else {
            self.geometry.body_width
        };
        let (_, y) = self.engine.cursor();
        self.engine
            .draw_image(bytes, self.geometry.margin_left, y, width, height, flow)
    }

    pub fn line_break(&mut self, style: Option<&FontStyle>) {
        let style = self.font_or_default(style);
        self.engine.advance_line(style.line_height);
    }

    /// Lays out and draws one table row against the current body width.
    pub fn write_table(&mut self, cells: &[Cell], spacing: Option<&Spacing>) -> RenderedRow {
        render_row(&mut self.engine, &self.geometry, cells, spacing)
    }

    pub fn engine(&self) -> &R {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut R {
        &mut self.engine
    }

    pub fn into_engine(self) -> R {
        self.engine
    }
}

impl Document<PdfEngine> {
    /// A document backed by the PDF engine, sized from `layout`.
    pub fn pdf(layout: Option<PageLayout>) -> Self {
        let layout = layout.unwrap_or_default();
        Document::new(PdfEngine::new(&layout), Some(layout))
    }

    pub fn to_bytes(self) -> Result<Vec<u8>, Error> {
        self.engine.finish()
    }

    pub fn to_file(self, path: &Path) -> Result<(), Error> {
        self.engine.save(path)
    }
}
