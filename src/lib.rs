mod document;
mod engine;
mod error;
mod fonts;
pub mod markup;
mod model;
mod pdf;
mod style;
pub mod table;

pub use document::Document;
pub use engine::RenderContext;
pub use error::Error;
pub use fonts::FONT_PATH_VAR;
pub use model::{Cell, Orientation, PageGeometry, PageLayout, PageMargin, Paper, Spacing};
pub use pdf::{CELL_MARGIN, PdfEngine};
pub use style::{
    BorderStyle, CellStyle, Color, DEFAULT_FONT_SIZE, FontFamily, FontStyle, HAlign, VAlign,
};
pub use table::{RenderedRow, ResolvedRow, WidthKind};

use std::path::Path;

/// Renders a parsed sheet to PDF bytes.
pub fn render_sheet(sheet: &markup::Sheet) -> Result<Vec<u8>, Error> {
    let mut doc = Document::pdf(Some(sheet.layout));
    sheet.render_into(&mut doc)?;
    doc.to_bytes()
}

pub fn convert_markup_to_pdf(input: &Path, output: &Path) -> Result<(), Error> {
    let sheet = markup::parse(input)?;
    let bytes = render_sheet(&sheet)?;
    log::info!("Writing {} bytes to {}", bytes.len(), output.display());
    std::fs::write(output, bytes).map_err(Error::Io)
}
