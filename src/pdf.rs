use std::collections::HashMap;
use std::path::Path;

use pdf_writer::types::{ActionType, AnnotationType};
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::engine::RenderContext;
use crate::error::Error;
use crate::fonts::{FontEntry, load_font};
use crate::model::{PageLayout, PageMargin};
use crate::style::{Color, FontFamily, FontStyle, HAlign};

/// Horizontal gap between a cell's edge and its text.
pub const CELL_MARGIN: f32 = 2.835;

const BORDER_WIDTH: f32 = 0.567;

/// A decoded raster image, stored as zlib-compressed RGB plus an optional
/// alpha mask.
struct ImageEntry {
    pdf_name: String,
    pixel_width: u32,
    pixel_height: u32,
    rgb: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

fn decode_image(data: &[u8], pdf_name: String) -> Result<ImageEntry, Error> {
    let rgba = image::load_from_memory(data)?.to_rgba8();
    let (pixel_width, pixel_height) = rgba.dimensions();
    let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

    let rgb: Vec<u8> = rgba
        .pixels()
        .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
        .collect();
    let alpha = has_alpha.then(|| {
        let alpha: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
        miniz_oxide::deflate::compress_to_vec_zlib(&alpha, 6)
    });
    Ok(ImageEntry {
        pdf_name,
        pixel_width,
        pixel_height,
        rgb: miniz_oxide::deflate::compress_to_vec_zlib(&rgb, 6),
        alpha,
    })
}

struct LinkAnnotation {
    rect: Rect,
    url: String,
}

/// A `RenderContext` that records drawing operations into PDF content
/// streams, one per page, and assembles the file on `finish`.
pub struct PdfEngine {
    page_width: f32,
    page_height: f32,
    margin: PageMargin,
    pages: Vec<Content>,
    /// Link annotations, indexed like `pages`.
    links: Vec<Vec<LinkAnnotation>>,
    images: Vec<ImageEntry>,
    x: f32,
    y: f32,
    draw_color: Color,
    fill_color: Color,
    text_color: Color,
    font_size: f32,
    underline: bool,
    strikeout: bool,
    current_font: Option<usize>,
    fonts: Vec<FontEntry>,
    font_index: HashMap<(FontFamily, bool), usize>,
}

impl PdfEngine {
    /// Creates an engine with no pages yet.
    pub fn new(layout: &PageLayout) -> Self {
        let (page_width, page_height) = layout.page_size();
        let margin = layout.margins();
        PdfEngine {
            page_width,
            page_height,
            margin,
            pages: Vec::new(),
            links: Vec::new(),
            images: Vec::new(),
            x: margin.left,
            y: margin.top,
            draw_color: Color::BLACK,
            fill_color: Color::BLACK,
            text_color: Color::BLACK,
            font_size: crate::style::DEFAULT_FONT_SIZE,
            underline: false,
            strikeout: false,
            current_font: None,
            fonts: Vec::new(),
            font_index: HashMap::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn content(&mut self) -> &mut Content {
        if self.pages.is_empty() {
            self.add_page();
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn pdf_y(&self, y: f32) -> f32 {
        self.page_height - y
    }

    fn font(&mut self, family: FontFamily, bold: bool) -> usize {
        if let Some(&idx) = self.font_index.get(&(family, bold)) {
            return idx;
        }
        let idx = self.fonts.len();
        self.fonts
            .push(load_font(family, bold, format!("F{}", idx + 1)));
        self.font_index.insert((family, bold), idx);
        idx
    }

    fn current_font(&mut self) -> usize {
        match self.current_font {
            Some(idx) => idx,
            None => {
                let idx = self.font(FontFamily::Helvetica, false);
                self.current_font = Some(idx);
                idx
            }
        }
    }

    fn text_width(&mut self, text: &str) -> f32 {
        let idx = self.current_font();
        self.fonts[idx].text_width(text, self.font_size)
    }

    /// Shows one line of text with its baseline at `baseline` (top-down).
    fn show_line(&mut self, x: f32, baseline: f32, text: &str, width: f32) {
        let idx = self.current_font();
        let bytes = self.fonts[idx].encode(text);
        let pdf_name = self.fonts[idx].pdf_name.clone();
        let size = self.font_size;
        let (r, g, b) = self.text_color.to_unit();
        let y = self.pdf_y(baseline);
        let (underline, strikeout) = (self.underline, self.strikeout);

        let content = self.content();
        content
            .set_fill_rgb(r, g, b)
            .begin_text()
            .set_font(Name(pdf_name.as_bytes()), size)
            .next_line(x, y)
            .show(Str(&bytes))
            .end_text();

        let mut rules = Vec::new();
        if underline {
            rules.push(y - size * 0.1);
        }
        if strikeout {
            rules.push(y + size * 0.3);
        }
        for rule_y in rules {
            content
                .set_stroke_rgb(r, g, b)
                .set_line_width(size * 0.05)
                .move_to(x, rule_y)
                .line_to(x + width, rule_y)
                .stroke();
        }
    }

    /// Writes one line starting at the cursor and moves the cursor past it.
    /// Returns the placed box as (x, top, width).
    fn place_line(&mut self, line_height: f32, text: &str) -> (f32, f32, f32) {
        let width = self.text_width(text);
        let (x, top) = (self.x, self.y);
        let baseline = top + 0.5 * line_height + 0.3 * self.font_size;
        self.show_line(x, baseline, text, width);
        self.x += width;
        (x, top, width)
    }

    /// Flows `text` from the cursor, breaking lines between words at the
    /// right margin. Spaces are kept and measured, except where a line
    /// breaks. Returns every placed piece as (x, top, width).
    fn flow_text(&mut self, line_height: f32, text: &str) -> Vec<(f32, f32, f32)> {
        let right = self.page_width - self.margin.right;
        let mut placed = Vec::new();
        for (i, paragraph) in text.split('\n').enumerate() {
            if i > 0 {
                self.advance_line(line_height);
            }
            let mut line = String::new();
            for piece in paragraph.split_inclusive(' ') {
                let candidate = format!("{line}{piece}");
                if self.x + self.text_width(candidate.trim_end()) <= right {
                    line = candidate;
                    continue;
                }
                if !line.trim().is_empty() {
                    let shown = line.trim_end().to_string();
                    placed.push(self.place_line(line_height, &shown));
                    self.advance_line(line_height);
                } else if self.x > self.margin.left {
                    self.advance_line(line_height);
                }
                line = piece.trim_start().to_string();
            }
            if !line.is_empty() {
                placed.push(self.place_line(line_height, &line));
            }
        }
        placed
    }

    fn add_image(&mut self, data: &[u8]) -> Result<usize, Error> {
        let idx = self.images.len();
        let entry = decode_image(data, format!("Im{}", idx + 1))?;
        log::debug!(
            "Decoded image {} ({}x{} px, alpha: {})",
            entry.pdf_name,
            entry.pixel_width,
            entry.pixel_height,
            entry.alpha.is_some()
        );
        self.images.push(entry);
        Ok(idx)
    }

    /// Assembles catalog, page tree, content streams, link annotations,
    /// images and fonts.
    pub fn finish(self) -> Result<Vec<u8>, Error> {
        let PdfEngine {
            page_width,
            page_height,
            mut pages,
            mut links,
            images,
            fonts,
            ..
        } = self;
        if pages.is_empty() {
            pages.push(Content::new());
        }
        links.resize_with(pages.len(), Vec::new);
        let page_count = i32::try_from(pages.len())
            .map_err(|_| Error::Pdf(format!("too many pages: {}", pages.len())))?;

        let mut pdf = Pdf::new();
        let mut next_id = 1;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };

        let catalog_id = alloc();
        let pages_id = alloc();
        let page_ids: Vec<Ref> = (0..pages.len()).map(|_| alloc()).collect();

        let font_refs: Vec<(String, Ref)> = fonts
            .iter()
            .map(|font| (font.pdf_name.clone(), font.write(&mut pdf, &mut alloc)))
            .collect();

        let mut image_refs: Vec<(String, Ref)> = Vec::with_capacity(images.len());
        for img in &images {
            let (Ok(w), Ok(h)) = (
                i32::try_from(img.pixel_width),
                i32::try_from(img.pixel_height),
            ) else {
                return Err(Error::Pdf(format!("image {} is too large", img.pdf_name)));
            };
            let mask_ref = img.alpha.as_ref().map(|alpha| {
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w);
                mask.height(h);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                mask_ref
            });
            let xobj_ref = alloc();
            let mut xobj = pdf.image_xobject(xobj_ref, &img.rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w);
            xobj.height(h);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = mask_ref {
                xobj.s_mask(mask_ref);
            }
            image_refs.push((img.pdf_name.clone(), xobj_ref));
        }

        let annot_refs: Vec<Vec<Ref>> = links
            .iter()
            .map(|page_links| {
                page_links
                    .iter()
                    .map(|link| {
                        let annot_ref = alloc();
                        let mut annot = pdf.annotation(annot_ref);
                        annot
                            .subtype(AnnotationType::Link)
                            .rect(link.rect)
                            .border(0.0, 0.0, 0.0, None);
                        annot
                            .action()
                            .action_type(ActionType::Uri)
                            .uri(Str(link.url.as_bytes()));
                        annot_ref
                    })
                    .collect()
            })
            .collect();

        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id)
            .kids(page_ids.iter().copied())
            .count(page_count);

        for ((content, &page_id), page_annots) in pages.into_iter().zip(&page_ids).zip(&annot_refs) {
            let content_id = alloc();
            pdf.stream(content_id, &content.finish());

            let mut page = pdf.page(page_id);
            page.media_box(Rect::new(0.0, 0.0, page_width, page_height))
                .parent(pages_id)
                .contents(content_id);
            if !page_annots.is_empty() {
                page.annotations(page_annots.iter().copied());
            }
            let mut resources = page.resources();
            {
                let mut font_dict = resources.fonts();
                for (name, font_ref) in &font_refs {
                    font_dict.pair(Name(name.as_bytes()), *font_ref);
                }
            }
            if !image_refs.is_empty() {
                let mut xobjects = resources.x_objects();
                for (name, xobj_ref) in &image_refs {
                    xobjects.pair(Name(name.as_bytes()), *xobj_ref);
                }
            }
        }

        log::debug!(
            "Wrote {page_count} page(s), {} font(s), {} image(s)",
            font_refs.len(),
            image_refs.len()
        );
        Ok(pdf.finish())
    }

    pub fn save(self, path: &Path) -> Result<(), Error> {
        let bytes = self.finish()?;
        std::fs::write(path, bytes).map_err(Error::Io)
    }
}

impl RenderContext for PdfEngine {
    fn set_draw_color(&mut self, color: Color) {
        self.draw_color = color;
    }

    fn set_fill_color(&mut self, color: Color) {
        self.fill_color = color;
    }

    fn set_text_color(&mut self, color: Color) {
        self.text_color = color;
    }

    fn set_font(&mut self, family: FontFamily, emphasis: &str, size: f32) {
        let idx = self.font(family, emphasis.contains('B'));
        self.current_font = Some(idx);
        self.font_size = size;
        self.strikeout = emphasis.contains('S');
        self.underline = emphasis.contains('U');
    }

    fn measure_cell(&mut self, font: &FontStyle, width: f32, text: &str) -> f32 {
        let idx = self.font(font.family, font.bold);
        let entry = &self.fonts[idx];
        let lines = wrap_text(text, width - 2.0 * CELL_MARGIN, |s| {
            entry.text_width(s, font.size)
        });
        font.line_height * lines.len() as f32
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
        let idx = self.current_font();
        let size = self.font_size;
        let lines = {
            let font = &self.fonts[idx];
            wrap_text(text, width - 2.0 * CELL_MARGIN, |s| font.text_width(s, size))
        };
        let block = line_height * lines.len() as f32;
        let height = height.max(block);
        let (x, y) = (self.x, self.y);
        let top = self.pdf_y(y);
        let bottom = self.pdf_y(y + height);

        if fill {
            let (r, g, b) = self.fill_color.to_unit();
            self.content()
                .set_fill_rgb(r, g, b)
                .rect(x, bottom, width, height)
                .fill_nonzero();
        }

        if !border.is_empty() {
            let (r, g, b) = self.draw_color.to_unit();
            let content = self.content();
            content.set_stroke_rgb(r, g, b).set_line_width(BORDER_WIDTH);
            for side in border.chars() {
                let ((x1, y1), (x2, y2)) = match side {
                    'T' => ((x, top), (x + width, top)),
                    'L' => ((x, top), (x, bottom)),
                    'R' => ((x + width, top), (x + width, bottom)),
                    'B' => ((x, bottom), (x + width, bottom)),
                    _ => continue,
                };
                content.move_to(x1, y1).line_to(x2, y2).stroke();
            }
        }

        let mut codes = align.chars();
        let h_code = codes.next().unwrap_or('L');
        let v_code = codes.next().unwrap_or('T');
        let block_top = y + match v_code {
            'M' => (height - block) / 2.0,
            'B' | 'A' => height - block,
            _ => 0.0,
        };
        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let line_top = block_top + i as f32 * line_height;
            let text_w = self.text_width(line);
            let tx = match h_code {
                'C' => x + (width - text_w) / 2.0,
                'R' => x + width - CELL_MARGIN - text_w,
                _ => x + CELL_MARGIN,
            };
            let baseline = match v_code {
                'M' => line_top + 0.5 * line_height + 0.3 * size,
                'B' => line_top + line_height - 0.2 * size,
                'A' => line_top + line_height,
                _ => line_top + 0.8 * size,
            };
            self.show_line(tx, baseline, line, text_w);
        }

        self.x = x + width;
    }

    fn write(&mut self, line_height: f32, text: &str) {
        self.flow_text(line_height, text);
    }

    fn write_link(&mut self, line_height: f32, text: &str, url: &str) {
        let placed = self.flow_text(line_height, text);
        let annotations: Vec<LinkAnnotation> = placed
            .into_iter()
            .map(|(x, top, width)| LinkAnnotation {
                rect: Rect::new(x, self.pdf_y(top + line_height), x + width, self.pdf_y(top)),
                url: url.to_string(),
            })
            .collect();
        if let Some(page) = self.links.last_mut() {
            page.extend(annotations);
        }
    }

    fn write_aligned(&mut self, width: f32, line_height: f32, text: &str, align: HAlign) {
        let width = if width > 0.0 {
            width
        } else {
            self.page_width - self.margin.left - self.margin.right
        };
        let left = self.margin.left;
        let text_w = self.text_width(text);
        let tx = match align {
            HAlign::Left => left,
            HAlign::Center => left + (width - text_w) / 2.0,
            HAlign::Right => left + width - text_w,
        };
        let baseline = self.y + 0.5 * line_height + 0.3 * self.font_size;
        self.show_line(tx, baseline, text, text_w);
        self.x = tx + text_w;
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
        let idx = self.add_image(data)?;
        let img = &self.images[idx];
        let (pw, ph) = (img.pixel_width as f32, img.pixel_height as f32);
        let (width, height) = match (width > 0.0, height > 0.0) {
            (true, true) => (width, height),
            (true, false) => (width, width * ph / pw),
            (false, true) => (height * pw / ph, height),
            (false, false) => (pw, ph),
        };
        let name = img.pdf_name.clone();
        let bottom = self.pdf_y(y + height);
        self.content()
            .save_state()
            .transform([width, 0.0, 0.0, height, x, bottom])
            .x_object(Name(name.as_bytes()))
            .restore_state();
        if flow {
            self.y = y + height;
        }
        Ok(height)
    }

    fn page_size(&self) -> (f32, f32) {
        (self.page_width, self.page_height)
    }

    fn margins(&self) -> (f32, f32, f32, f32) {
        (
            self.margin.left,
            self.margin.top,
            self.margin.right,
            self.margin.bottom,
        )
    }

    fn advance_line(&mut self, height: f32) {
        self.x = self.margin.left;
        self.y += height;
    }

    fn set_x(&mut self, x: f32) {
        self.x = x;
    }

    fn cursor(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    fn add_page(&mut self) {
        self.pages.push(Content::new());
        self.links.push(Vec::new());
        self.x = self.margin.left;
        self.y = self.margin.top;
        log::debug!("Started page {}", self.pages.len());
    }
}

/// Splits on newlines, then fills each line greedily with whole words.
/// Words wider than `max_width` are broken between characters. A
/// non-positive `max_width` disables wrapping. Always yields at least one
/// (possibly empty) line.
pub(crate) fn wrap_text(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        if max_width <= 0.0 {
            lines.push(paragraph.to_string());
            continue;
        }
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };
            if measure(&candidate) <= max_width {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if measure(word) <= max_width {
                line.push_str(word);
                continue;
            }
            for c in word.chars() {
                line.push(c);
                if measure(&line) > max_width && line.chars().count() > 1 {
                    line.pop();
                    lines.push(std::mem::take(&mut line));
                    line.push(c);
                }
            }
        }
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_chars(s: &str) -> f32 {
        s.chars().count() as f32
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_text("aa bb cc dd", 5.0, by_chars);
        assert_eq!(lines, vec!["aa bb", "cc dd"]);
    }

    #[test]
    fn keeps_explicit_newlines_and_blank_lines() {
        let lines = wrap_text("one\n\ntwo", 10.0, by_chars);
        assert_eq!(lines, vec!["one", "", "two"]);
    }

    #[test]
    fn breaks_words_wider_than_the_cell() {
        let lines = wrap_text("abcdefg", 3.0, by_chars);
        assert_eq!(lines, vec!["abc", "def", "g"]);
    }

    #[test]
    fn zero_width_does_not_wrap() {
        assert_eq!(wrap_text("a b c", 0.0, by_chars), vec!["a b c"]);
        assert_eq!(wrap_text("", 10.0, by_chars), vec![""]);
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn courier(size: f32, line_height: f32) -> FontStyle {
        FontStyle::new(FontFamily::Courier, size, line_height, None, false, false, false)
    }

    #[test]
    fn cell_height_counts_wrapped_lines() {
        let mut engine = PdfEngine::new(&PageLayout::default());
        engine.add_page();
        // Courier is 6pt per char at 10pt; 40pt less margins fits 5 chars.
        let height = engine.measure_cell(&courier(10.0, 12.0), 40.0, "abcde fghij");
        assert_eq!(height, 24.0);
        engine.set_font(FontFamily::Courier, "", 10.0);
        engine.draw_cell(40.0, height, 12.0, "abcde fghij", "TLRB", "LT", false);
        assert_eq!(engine.cursor().0, 28.35 + 40.0);
    }

    #[test]
    fn short_cell_box_stretches_to_the_row_height() {
        let layout = PageLayout::default().with_margin(PageMargin::new(40.0, 40.0, 40.0, 40.0));
        let mut engine = PdfEngine::new(&layout);
        engine.add_page();
        engine.set_font(FontFamily::Courier, "", 10.0);
        engine.set_fill_color(Color::WHITE);
        engine.draw_cell(40.0, 36.0, 12.0, "ab", "", "LB", true);
        let content = engine.pages.remove(0).finish();
        assert!(contains(&content, b" 40 36 re"));
    }

    #[test]
    fn links_are_recorded_on_the_current_page() {
        let mut engine = PdfEngine::new(&PageLayout::default());
        engine.add_page();
        engine.set_font(FontFamily::Courier, "", 10.0);
        engine.write_link(12.0, "docs", "https://example.com/docs");
        assert_eq!(engine.links.len(), 1);
        let link = &engine.links[0][0];
        assert_eq!(link.url, "https://example.com/docs");
        assert!((link.rect.x2 - link.rect.x1 - 24.0).abs() < 1e-3);
    }
}
