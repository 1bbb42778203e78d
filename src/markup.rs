//! XML sheet descriptions.
//!
//! A `<sheet>` lists text, links, images, line breaks, table rows and page
//! breaks in drawing order. Style attributes are optional and go through the same silent
//! defaulting as the style constructors: an unknown family or a size that
//! does not parse just falls back.

use std::path::{Path, PathBuf};

use crate::document::Document;
use crate::engine::RenderContext;
use crate::error::Error;
use crate::model::{Cell, Orientation, PageLayout, PageMargin, Paper, Spacing};
use crate::style::{BorderStyle, CellStyle, Color, FontStyle, HAlign, VAlign};

const FONT_ATTRS: &[&str] = &[
    "family",
    "size",
    "line-height",
    "color",
    "bold",
    "strikeout",
    "underline",
];

#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Text {
        text: String,
        font: Option<FontStyle>,
    },
    TextBox {
        text: String,
        align: HAlign,
        font: Option<FontStyle>,
    },
    Link {
        text: String,
        url: String,
        font: Option<FontStyle>,
    },
    /// `src` is relative to the working directory, or to the sheet file when
    /// parsed with [`parse`].
    Image {
        src: PathBuf,
        width: f32,
        height: f32,
        flow: bool,
    },
    LineBreak {
        font: Option<FontStyle>,
    },
    Row {
        cells: Vec<Cell>,
        spacing: Option<Spacing>,
    },
    PageBreak,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    pub layout: PageLayout,
    pub blocks: Vec<Block>,
}

impl Sheet {
    /// Replays the blocks against `doc` in order. Stops at the first image
    /// that cannot be read.
    pub fn render_into<R: RenderContext>(&self, doc: &mut Document<R>) -> Result<(), Error> {
        for block in &self.blocks {
            match block {
                Block::Text { text, font } => doc.write_text(text, font.as_ref()),
                Block::TextBox { text, align, font } => {
                    doc.write_text_box(text, *align, font.as_ref())
                }
                Block::Link { text, url, font } => doc.write_link(text, url, font.as_ref()),
                Block::Image {
                    src,
                    width,
                    height,
                    flow,
                } => {
                    doc.write_image(src, *width, *height, *flow)?;
                }
                Block::LineBreak { font } => doc.line_break(font.as_ref()),
                Block::Row { cells, spacing } => {
                    doc.write_table(cells, spacing.as_ref());
                }
                Block::PageBreak => doc.add_page(),
            }
        }
        Ok(())
    }
}

fn attr_f32(node: roxmltree::Node, name: &str) -> Option<f32> {
    node.attribute(name)
        .and_then(|v| v.trim().parse::<f32>().ok())
}

fn attr_flag(node: roxmltree::Node, name: &str) -> bool {
    node.attribute(name).is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        )
    })
}

fn attr_color(node: roxmltree::Node, name: &str) -> Option<Color> {
    node.attribute(name).and_then(Color::from_hex)
}

fn has_any(node: roxmltree::Node, names: &[&str]) -> bool {
    names.iter().any(|n| node.attribute(*n).is_some())
}

fn node_text(node: roxmltree::Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// `None` when the element carries no font attribute at all.
fn font_style(node: roxmltree::Node) -> Option<FontStyle> {
    if !has_any(node, FONT_ATTRS) {
        return None;
    }
    Some(FontStyle::new(
        node.attribute("family").unwrap_or(""),
        attr_f32(node, "size").unwrap_or(0.0),
        attr_f32(node, "line-height").unwrap_or(0.0),
        attr_color(node, "color"),
        attr_flag(node, "bold"),
        attr_flag(node, "strikeout"),
        attr_flag(node, "underline"),
    ))
}

fn parse_cell(node: roxmltree::Node) -> Cell {
    let border = has_any(node, &["border", "border-color"]).then(|| {
        BorderStyle::from_code(
            node.attribute("border").unwrap_or(""),
            attr_color(node, "border-color"),
        )
    });
    let style = CellStyle::new(
        font_style(node),
        border,
        attr_color(node, "fill"),
        HAlign::resolve(node.attribute("align").unwrap_or("")),
        VAlign::resolve(node.attribute("valign").unwrap_or("")),
    );
    Cell::new(node_text(node), Some(style))
        .with_width(attr_f32(node, "width").unwrap_or(0.0))
        .with_width_percent(attr_f32(node, "percent").unwrap_or(0.0))
}

fn parse_row(node: roxmltree::Node) -> Block {
    let spacing = has_any(node, &["top", "left", "right", "bottom"]).then(|| {
        Spacing::new(
            attr_f32(node, "top").unwrap_or(0.0),
            attr_f32(node, "left").unwrap_or(0.0),
            attr_f32(node, "right").unwrap_or(0.0),
            attr_f32(node, "bottom").unwrap_or(0.0),
        )
    });
    let cells = node
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "cell")
        .map(parse_cell)
        .collect();
    Block::Row { cells, spacing }
}

fn parse_margin(node: roxmltree::Node) -> PageMargin {
    let defaults = PageMargin::default();
    PageMargin::new(
        attr_f32(node, "top").unwrap_or(defaults.top),
        attr_f32(node, "left").unwrap_or(defaults.left),
        attr_f32(node, "right").unwrap_or(defaults.right),
        attr_f32(node, "bottom").unwrap_or(defaults.bottom),
    )
}

pub fn parse_str(xml: &str) -> Result<Sheet, Error> {
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();
    if root.tag_name().name() != "sheet" {
        return Err(Error::InvalidMarkup(format!(
            "expected <sheet> root element, found <{}>",
            root.tag_name().name()
        )));
    }

    let mut layout = PageLayout::new(
        Orientation::resolve(root.attribute("orientation").unwrap_or("")),
        Paper::resolve(root.attribute("paper").unwrap_or("")),
    );
    let mut blocks = Vec::new();

    for node in root.children().filter(|n| n.is_element()) {
        match node.tag_name().name() {
            "margin" => layout.margin = Some(parse_margin(node)),
            "font" => layout.default_font_style = Some(font_style(node).unwrap_or_default()),
            "text" => blocks.push(Block::Text {
                text: node_text(node),
                font: font_style(node),
            }),
            "textbox" => blocks.push(Block::TextBox {
                text: node_text(node),
                align: HAlign::resolve(node.attribute("align").unwrap_or("")),
                font: font_style(node),
            }),
            "link" => blocks.push(Block::Link {
                text: node_text(node),
                url: node.attribute("href").unwrap_or("").to_string(),
                font: font_style(node),
            }),
            "image" => {
                let Some(src) = node.attribute("src") else {
                    return Err(Error::InvalidMarkup("<image> needs a src attribute".into()));
                };
                blocks.push(Block::Image {
                    src: PathBuf::from(src),
                    width: attr_f32(node, "width").unwrap_or(0.0),
                    height: attr_f32(node, "height").unwrap_or(0.0),
                    flow: node.attribute("flow").is_none() || attr_flag(node, "flow"),
                });
            }
            "br" => blocks.push(Block::LineBreak {
                font: font_style(node),
            }),
            "row" => blocks.push(parse_row(node)),
            "page" => blocks.push(Block::PageBreak),
            other => log::warn!("Ignoring unknown element <{other}>"),
        }
    }

    Ok(Sheet { layout, blocks })
}

/// Parses a sheet file. Relative image sources resolve against the file's
/// directory.
pub fn parse(path: &Path) -> Result<Sheet, Error> {
    let xml = std::fs::read_to_string(path)?;
    let mut sheet = parse_str(&xml)?;
    if let Some(dir) = path.parent() {
        for block in &mut sheet.blocks {
            if let Block::Image { src, .. } = block
                && src.is_relative()
            {
                *src = dir.join(&*src);
            }
        }
    }
    Ok(sheet)
}
