use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::OnceLock;

use pdf_writer::{Name, Pdf, Rect, Ref, Str};
use ttf_parser::{Face, GlyphId};

use crate::style::FontFamily;

/// Environment variable holding extra font directories.
pub const FONT_PATH_VAR: &str = "TABLESTYLE_FONTS";

pub(crate) enum FontProgram {
    /// One of the PDF base-14 fonts, shown with WinAnsi bytes.
    Standard {
        base_font: &'static str,
        widths_1000: Vec<f32>,
    },
    /// A TrueType/OpenType file embedded as a CID font, shown with glyph ids.
    Embedded {
        ps_name: String,
        data: Vec<u8>,
        face_index: u32,
        cff: bool,
        /// Shown code -> (glyph id, first char drawn with it).
        used: BTreeMap<u16, (u16, char)>,
    },
}

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) program: FontProgram,
}

/// (lowercase family name, bold) -> (file path, face index within TTC)
type FontLookup = HashMap<(String, bool), (PathBuf, u32)>;

static FONT_INDEX: OnceLock<FontLookup> = OnceLock::new();

fn font_family_name(face: &Face) -> Option<String> {
    // ID 1 (Family), not ID 16, so "Noto Sans TC" is not merged with siblings.
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

fn read_font_style(data: &[u8], face_index: u32) -> Option<(String, bool)> {
    let face = Face::parse(data, face_index).ok()?;
    let family = font_family_name(&face)?;
    Some((family, face.is_bold()))
}

fn font_directories() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    if let Ok(val) = std::env::var(FONT_PATH_VAR) {
        let sep = if cfg!(windows) { ';' } else { ':' };
        for part in val.split(sep) {
            let trimmed = part.trim();
            if !trimmed.is_empty() {
                dirs.push(PathBuf::from(trimmed));
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend([
            "/usr/share/fonts".into(),
            "/usr/local/share/fonts".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        } else {
            dirs.push("C:\\Windows\\Fonts".into());
        }
    }

    dirs
}

fn scan_font_dirs() -> FontLookup {
    let mut index = FontLookup::new();

    let mut stack: Vec<PathBuf> = font_directories();
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            let is_collection = match path.extension().and_then(|e| e.to_str()) {
                Some("ttf" | "otf" | "TTF" | "OTF") => false,
                Some("ttc" | "TTC") => true,
                _ => continue,
            };
            let Ok(data) = std::fs::read(&path) else {
                continue;
            };
            let face_count = if is_collection {
                ttf_parser::fonts_in_collection(&data).unwrap_or(1)
            } else {
                1
            };
            for face_idx in 0..face_count {
                if let Some((family, bold)) = read_font_style(&data, face_idx) {
                    index
                        .entry((family.to_lowercase(), bold))
                        .or_insert((path.clone(), face_idx));
                }
            }
        }
    }
    log::debug!("Indexed {} font faces", index.len());
    index
}

fn get_font_index() -> &'static FontLookup {
    FONT_INDEX.get_or_init(scan_font_dirs)
}

/// (file, face index, is the face bold). A bold request falls back to the
/// regular face when no bold face is installed.
fn lookup_face(index: &FontLookup, family_name: &str, bold: bool) -> Option<(PathBuf, u32, bool)> {
    let key = family_name.to_lowercase();
    if let Some((path, face_index)) = index.get(&(key.clone(), bold)) {
        return Some((path.clone(), *face_index, bold));
    }
    if !bold {
        return None;
    }
    let (path, face_index) = index.get(&(key, false))?;
    log::debug!("No bold face for {family_name}, embedding the regular one");
    Some((path.clone(), *face_index, false))
}

fn find_font_file(family_name: &str, bold: bool) -> Option<(PathBuf, u32, bool)> {
    lookup_face(get_font_index(), family_name, bold)
}

fn embedded_ps_name(family_name: &str, bold_face: bool) -> String {
    let base = family_name.replace(' ', "");
    if bold_face { format!("{base}-Bold") } else { base }
}

/// Code a glyph is shown with under Identity-H. TrueType outlines are
/// addressed by glyph id; a CID-keyed CFF font by the CID its charset assigns
/// to the glyph, and a name-keyed one by glyph id again.
fn glyph_code(face: &Face, gid: GlyphId, cff: bool) -> u16 {
    if !cff {
        return gid.0;
    }
    face.tables()
        .cff
        .as_ref()
        .and_then(|table| table.glyph_cid(gid))
        .unwrap_or(gid.0)
}

/// UTF-8 to WinAnsi bytes; characters without a WinAnsi code are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .filter_map(|c| match c as u32 {
            0x0020..=0x007E => Some(c as u8),
            0x00A0..=0x00FF => Some(c as u8),
            0x20AC => Some(0x80),
            0x201A => Some(0x82),
            0x201E => Some(0x84),
            0x2026 => Some(0x85),
            0x2018 => Some(0x91),
            0x2019 => Some(0x92),
            0x201C => Some(0x93),
            0x201D => Some(0x94),
            0x2022 => Some(0x95),
            0x2013 => Some(0x96),
            0x2014 => Some(0x97),
            0x2122 => Some(0x99),
            _ => None,
        })
        .collect()
}

/// Approximate Helvetica widths at 1000 units/em for WinAnsi chars 32..=255.
fn helvetica_widths() -> Vec<f32> {
    (32u8..=255u8)
        .map(|b| match b {
            32 => 278.0,
            33..=47 => 333.0,
            48..=57 => 556.0,
            58..=64 => 333.0,
            73 | 74 => 278.0,
            77 => 833.0,
            65..=90 => 667.0,
            91..=96 => 333.0,
            102 | 105 | 106 | 108 | 116 => 278.0,
            109 | 119 => 833.0,
            97..=122 => 556.0,
            _ => 556.0,
        })
        .collect()
}

/// Approximate Times-Roman widths, same layout as `helvetica_widths`.
fn times_widths() -> Vec<f32> {
    (32u8..=255u8)
        .map(|b| match b {
            32 => 250.0,
            33..=47 => 333.0,
            48..=57 => 500.0,
            58..=64 => 278.0,
            73 => 333.0,
            74 => 389.0,
            77 => 889.0,
            65..=90 => 667.0,
            91..=96 => 333.0,
            102 | 105 | 106 | 108 | 116 => 278.0,
            109 => 778.0,
            119 => 722.0,
            97..=122 => 472.0,
            _ => 500.0,
        })
        .collect()
}

fn standard_font(family: FontFamily, bold: bool) -> (&'static str, Vec<f32>) {
    let (base_font, widths) = match (family, bold) {
        (FontFamily::Courier, false) => ("Courier", vec![600.0; 224]),
        (FontFamily::Courier, true) => ("Courier-Bold", vec![600.0; 224]),
        (FontFamily::Times, false) => ("Times-Roman", times_widths()),
        (FontFamily::Times, true) => ("Times-Bold", times_widths()),
        (FontFamily::Symbol, _) => ("Symbol", vec![600.0; 224]),
        (_, false) => ("Helvetica", helvetica_widths()),
        (_, true) => ("Helvetica-Bold", helvetica_widths()),
    };
    // Bold faces run roughly 5% wider than the approximations above.
    let widths = if bold && family != FontFamily::Courier {
        widths.into_iter().map(|w| w * 1.05).collect()
    } else {
        widths
    };
    (base_font, widths)
}

fn embedded_family_name(family: FontFamily) -> Option<&'static str> {
    match family {
        FontFamily::NotoSansTC => Some("Noto Sans TC"),
        FontFamily::NotoSansSC => Some("Noto Sans SC"),
        _ => None,
    }
}

/// Loads the program for a family. Families that need an installed font file
/// fall back to Helvetica when none is found.
pub(crate) fn load_font(family: FontFamily, bold: bool, pdf_name: String) -> FontEntry {
    let program = embedded_family_name(family)
        .and_then(|name| {
            let loaded = find_font_file(name, bold).and_then(|(path, face_index, bold_face)| {
                let data = std::fs::read(&path).ok()?;
                let face = Face::parse(&data, face_index).ok()?;
                let cff = face.tables().cff.is_some();
                log::debug!("Embedding {name} bold={bold_face} from {}", path.display());
                Some(FontProgram::Embedded {
                    ps_name: embedded_ps_name(name, bold_face),
                    data,
                    face_index,
                    cff,
                    used: BTreeMap::new(),
                })
            });
            if loaded.is_none() {
                log::warn!("Font not found: {name} bold={bold} - using Helvetica");
            }
            loaded
        })
        .unwrap_or_else(|| {
            let (base_font, widths_1000) = standard_font(family, bold);
            FontProgram::Standard {
                base_font,
                widths_1000,
            }
        });
    FontEntry { pdf_name, program }
}

impl FontEntry {
    /// Advance width of `text` at `size` points.
    pub(crate) fn text_width(&self, text: &str, size: f32) -> f32 {
        match &self.program {
            FontProgram::Standard { widths_1000, .. } => {
                let units: f32 = to_winansi_bytes(text)
                    .into_iter()
                    .map(|b| widths_1000.get((b - 32) as usize).copied().unwrap_or(556.0))
                    .sum();
                units / 1000.0 * size
            }
            FontProgram::Embedded {
                data, face_index, ..
            } => {
                let Ok(face) = Face::parse(data, *face_index) else {
                    return text.chars().count() as f32 * size * 0.5;
                };
                let units_per_em = face.units_per_em() as f32;
                let units: f32 = text
                    .chars()
                    .map(|c| {
                        face.glyph_index(c)
                            .and_then(|gid| face.glyph_hor_advance(gid))
                            .map(|adv| adv as f32)
                            .unwrap_or(units_per_em / 2.0)
                    })
                    .sum();
                units / units_per_em * size
            }
        }
    }

    /// Bytes for a `Tj` operand. Embedded fonts record the glyphs they show
    /// so widths and the ToUnicode map can be written at the end.
    pub(crate) fn encode(&mut self, text: &str) -> Vec<u8> {
        match &mut self.program {
            FontProgram::Standard { .. } => to_winansi_bytes(text),
            FontProgram::Embedded {
                data,
                face_index,
                cff,
                used,
                ..
            } => {
                let face = Face::parse(data, *face_index).ok();
                let mut out = Vec::with_capacity(text.len() * 2);
                for c in text.chars() {
                    let Some(face) = face.as_ref() else {
                        out.extend_from_slice(&[0, 0]);
                        continue;
                    };
                    let gid = face.glyph_index(c).unwrap_or(GlyphId(0));
                    let code = glyph_code(face, gid, *cff);
                    if gid.0 != 0 {
                        used.entry(code).or_insert((gid.0, c));
                    }
                    out.extend_from_slice(&code.to_be_bytes());
                }
                out
            }
        }
    }

    /// Writes the font's objects and returns the reference to its font dict.
    pub(crate) fn write(&self, pdf: &mut Pdf, alloc: &mut impl FnMut() -> Ref) -> Ref {
        let font_ref = alloc();
        match &self.program {
            FontProgram::Standard { base_font, .. } => {
                let mut font = pdf.type1_font(font_ref);
                font.base_font(Name(base_font.as_bytes()));
                if *base_font != "Symbol" {
                    font.encoding_predefined(Name(b"WinAnsiEncoding"));
                }
            }
            FontProgram::Embedded {
                ps_name,
                data,
                face_index,
                cff,
                used,
            } => {
                if !write_cid_font(pdf, font_ref, alloc, ps_name, data, *face_index, *cff, used) {
                    log::warn!("Could not re-parse {ps_name} while writing - using Helvetica");
                    pdf.type1_font(font_ref)
                        .base_font(Name(b"Helvetica"))
                        .encoding_predefined(Name(b"WinAnsiEncoding"));
                }
            }
        }
        font_ref
    }
}

#[allow(clippy::too_many_arguments)]
fn write_cid_font(
    pdf: &mut Pdf,
    font_ref: Ref,
    alloc: &mut impl FnMut() -> Ref,
    ps_name: &str,
    data: &[u8],
    face_index: u32,
    cff: bool,
    used: &BTreeMap<u16, (u16, char)>,
) -> bool {
    let Ok(face) = Face::parse(data, face_index) else {
        return false;
    };
    let Ok(data_len) = i32::try_from(data.len()) else {
        return false;
    };
    let cid_ref = alloc();
    let descriptor_ref = alloc();
    let data_ref = alloc();
    let cmap_ref = alloc();

    let units = face.units_per_em() as f32;
    let scale = |v: f32| v / units * 1000.0;
    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        scale(bb.x_min as f32),
        scale(bb.y_min as f32),
        scale(bb.x_max as f32),
        scale(bb.y_max as f32),
    );
    let cap_height = face
        .capital_height()
        .map(|h| scale(h as f32))
        .unwrap_or(700.0);

    if cff {
        pdf.stream(data_ref, data)
            .pair(Name(b"Subtype"), Name(b"OpenType"));
    } else {
        pdf.stream(data_ref, data).pair(Name(b"Length1"), data_len);
    }

    {
        let mut descriptor = pdf.font_descriptor(descriptor_ref);
        descriptor
            .name(Name(ps_name.as_bytes()))
            .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
            .bbox(bbox)
            .italic_angle(0.0)
            .ascent(scale(face.ascender() as f32))
            .descent(scale(face.descender() as f32))
            .cap_height(cap_height)
            .stem_v(80.0);
        if cff {
            descriptor.font_file3(data_ref);
        } else {
            descriptor.font_file2(data_ref);
        }
    }

    {
        let mut d = pdf.indirect(cid_ref).dict();
        d.pair(Name(b"Type"), Name(b"Font"));
        d.pair(
            Name(b"Subtype"),
            Name(if cff { b"CIDFontType0".as_slice() } else { b"CIDFontType2".as_slice() }),
        );
        d.pair(Name(b"BaseFont"), Name(ps_name.as_bytes()));
        d.insert(Name(b"CIDSystemInfo"))
            .dict()
            .pair(Name(b"Registry"), Str(b"Adobe"))
            .pair(Name(b"Ordering"), Str(b"Identity"))
            .pair(Name(b"Supplement"), 0i32);
        d.pair(Name(b"FontDescriptor"), descriptor_ref);
        if !cff {
            d.pair(Name(b"CIDToGIDMap"), Name(b"Identity"));
        }
        let mut widths = d.insert(Name(b"W")).array();
        let advances = code_widths(used, |gid| {
            face.glyph_hor_advance(GlyphId(gid)).map(|a| scale(a as f32))
        });
        for (code, adv) in advances {
            widths.item(code as i32);
            widths.push().array().item(adv);
        }
    }

    pdf.stream(cmap_ref, to_unicode_cmap(used).as_bytes());

    {
        let mut d = pdf.indirect(font_ref).dict();
        d.pair(Name(b"Type"), Name(b"Font"));
        d.pair(Name(b"Subtype"), Name(b"Type0"));
        d.pair(Name(b"BaseFont"), Name(ps_name.as_bytes()));
        d.pair(Name(b"Encoding"), Name(b"Identity-H"));
        d.insert(Name(b"DescendantFonts")).array().item(cid_ref);
        d.pair(Name(b"ToUnicode"), cmap_ref);
    }
    true
}

/// `/W` entries keyed by shown code; each advance comes from the code's glyph.
fn code_widths(
    used: &BTreeMap<u16, (u16, char)>,
    advance: impl Fn(u16) -> Option<f32>,
) -> Vec<(u16, f32)> {
    used.iter()
        .map(|(&code, &(gid, _))| (code, advance(gid).unwrap_or(1000.0)))
        .collect()
}

fn to_unicode_cmap(used: &BTreeMap<u16, (u16, char)>) -> String {
    let mut out = String::new();
    out.push_str("/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n");
    out.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> def\n");
    out.push_str("/CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n");
    out.push_str("1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

    let entries: Vec<(u16, char)> = used.iter().map(|(&code, &(_, c))| (code, c)).collect();
    for chunk in entries.chunks(100) {
        out.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (code, c) in chunk {
            let mut units = [0u16; 2];
            let hex: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{u:04X}"))
                .collect();
            out.push_str(&format!("<{code:04X}> <{hex}>\n"));
        }
        out.push_str("endbfchar\n");
    }

    out.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winansi_keeps_latin1_and_drops_cjk() {
        assert_eq!(to_winansi_bytes("Aé"), vec![b'A', 0xE9]);
        assert_eq!(to_winansi_bytes("\u{2014}"), vec![0x97]);
        assert!(to_winansi_bytes("中文").is_empty());
    }

    #[test]
    fn courier_is_monospaced() {
        let font = load_font(FontFamily::Courier, false, "F1".into());
        assert!((font.text_width("iiii", 10.0) - 24.0).abs() < 1e-4);
        assert!((font.text_width("MMMM", 10.0) - 24.0).abs() < 1e-4);
    }

    #[test]
    fn bold_helvetica_is_wider() {
        let regular = load_font(FontFamily::Helvetica, false, "F1".into());
        let bold = load_font(FontFamily::Helvetica, true, "F2".into());
        assert!(bold.text_width("Total", 12.0) > regular.text_width("Total", 12.0));
    }

    #[test]
    fn cmap_lists_each_glyph() {
        let mut used = BTreeMap::new();
        used.insert(0x0102, (0x0102, '中'));
        used.insert(0x0003, (0x0003, ' '));
        let cmap = to_unicode_cmap(&used);
        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.contains("<0102> <4E2D>"));
        assert!(cmap.contains("<0003> <0020>"));
    }

    #[test]
    fn cid_keyed_codes_drive_widths_and_unicode_map() {
        // A CID-keyed face where glyph 7 carries CID 0x0500.
        let mut used = BTreeMap::new();
        used.insert(0x0500, (7, '中'));
        let widths = code_widths(&used, |gid| (gid == 7).then_some(920.0));
        assert_eq!(widths, vec![(0x0500, 920.0)]);

        let cmap = to_unicode_cmap(&used);
        assert!(cmap.contains("<0500> <4E2D>"));
        assert!(!cmap.contains("<0007>"));
    }

    #[test]
    fn glyph_without_advance_gets_full_em() {
        let mut used = BTreeMap::new();
        used.insert(3, (3, 'x'));
        assert_eq!(code_widths(&used, |_| None), vec![(3, 1000.0)]);
    }

    fn index_with(entries: &[(&str, bool, &str)]) -> FontLookup {
        entries
            .iter()
            .map(|(family, bold, path)| ((family.to_string(), *bold), (PathBuf::from(path), 0)))
            .collect()
    }

    #[test]
    fn missing_bold_face_falls_back_to_regular_and_says_so() {
        let index = index_with(&[("noto sans tc", false, "/fonts/NotoSansTC-Regular.otf")]);
        let (path, _, bold_face) = lookup_face(&index, "Noto Sans TC", true).unwrap();
        assert_eq!(path, PathBuf::from("/fonts/NotoSansTC-Regular.otf"));
        assert!(!bold_face);
        assert_eq!(embedded_ps_name("Noto Sans TC", bold_face), "NotoSansTC");
    }

    #[test]
    fn installed_bold_face_keeps_the_bold_name() {
        let index = index_with(&[
            ("noto sans sc", false, "/fonts/NotoSansSC-Regular.otf"),
            ("noto sans sc", true, "/fonts/NotoSansSC-Bold.otf"),
        ]);
        let (path, _, bold_face) = lookup_face(&index, "Noto Sans SC", true).unwrap();
        assert_eq!(path, PathBuf::from("/fonts/NotoSansSC-Bold.otf"));
        assert!(bold_face);
        assert_eq!(embedded_ps_name("Noto Sans SC", bold_face), "NotoSansSC-Bold");
        assert!(lookup_face(&index, "Noto Sans JP", false).is_none());
    }
}
