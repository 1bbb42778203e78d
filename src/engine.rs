use crate::error::Error;
use crate::style::{Color, FontFamily, FontStyle, HAlign};

/// The drawing engine the style layer configures and draws through.
///
/// An engine holds mutable "current" state (font, colors, cursor), so call
/// order matters: the font must be set before the text that uses it is drawn.
/// Coordinates are in points from the page's top-left corner.
pub trait RenderContext {
    fn set_draw_color(&mut self, color: Color);
    fn set_fill_color(&mut self, color: Color);
    fn set_text_color(&mut self, color: Color);

    /// `emphasis` is a subset of "BSU" (bold, strikeout, underline).
    fn set_font(&mut self, family: FontFamily, emphasis: &str, size: f32);

    /// Height `text` needs in a cell `width` wide when set in `font`, without
    /// drawing anything or touching the current font.
    fn measure_cell(&mut self, font: &FontStyle, width: f32, text: &str) -> f32;

    /// Draws a bordered, optionally filled, multi-line cell box `height` tall
    /// at the cursor and moves the cursor right by `width`. `border` is a
    /// subset of "TLRB", `align` a horizontal letter from "LCR" followed by a
    /// vertical one from "TMBA"; the vertical letter places the text block
    /// inside the box.
    #[allow(clippy::too_many_arguments)]
    fn draw_cell(
        &mut self,
        width: f32,
        height: f32,
        line_height: f32,
        text: &str,
        border: &str,
        align: &str,
        fill: bool,
    );

    /// Flows text from the cursor, wrapping at the right margin.
    fn write(&mut self, line_height: f32, text: &str);

    /// Same as `write`, with every written piece linking to `url`.
    fn write_link(&mut self, line_height: f32, text: &str, url: &str);

    /// Writes one line at the left margin aligned within `width`; zero means
    /// the body width.
    fn write_aligned(&mut self, width: f32, line_height: f32, text: &str, align: HAlign);

    /// Places an encoded image (PNG, JPEG, ...) with its top-left corner at
    /// (`x`, `y`). A non-positive `height` keeps the image's aspect ratio.
    /// With `flow` the cursor moves down by the image height. Returns the
    /// placed height.
    fn draw_image(
        &mut self,
        data: &[u8],
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        flow: bool,
    ) -> Result<f32, Error>;

    /// (width, height) of the current page.
    fn page_size(&self) -> (f32, f32);

    /// (left, top, right, bottom).
    fn margins(&self) -> (f32, f32, f32, f32);

    /// Moves to the left margin and down by `height`.
    fn advance_line(&mut self, height: f32);

    fn set_x(&mut self, x: f32);

    fn cursor(&self) -> (f32, f32);

    fn add_page(&mut self);
}
