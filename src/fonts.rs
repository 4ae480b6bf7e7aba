use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

use crate::error::Error;

/// Glyph-advance lookup used by wrapping, justification and centring.
pub trait TextMeasure {
    /// Advance of `ch` in 1000-units of the em.
    fn char_width_1000(&self, ch: char) -> f32;

    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    fn space_width(&self, font_size: f32) -> f32 {
        self.char_width_1000(' ') * font_size / 1000.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontId {
    Regular,
    Bold,
}

impl FontId {
    pub(crate) fn pdf_name(self) -> &'static str {
        match self {
            FontId::Regular => "F1",
            FontId::Bold => "F2",
        }
    }
}

#[derive(Clone, Debug)]
struct TrueTypeData {
    data: Vec<u8>,
    face_index: u32,
    ps_name: String,
    char_to_gid: HashMap<char, u16>,
}

#[derive(Clone, Debug)]
pub struct FontEntry {
    base_font: &'static str,
    widths_1000: Vec<f32>,
    char_widths_1000: Option<HashMap<char, f32>>,
    truetype: Option<TrueTypeData>,
}

impl TextMeasure for FontEntry {
    /// Uses the per-char table of a loaded font file, falls back to the WinAnsi
    /// table (always the only source for the base-14 fonts).
    fn char_width_1000(&self, ch: char) -> f32 {
        if let Some(ref map) = self.char_widths_1000 {
            if let Some(&w) = map.get(&ch) {
                return w;
            }
        }
        let byte = winansi_or_fallback(ch);
        self.widths_1000[(byte - 32) as usize]
    }
}

impl FontEntry {
    /// Built-in Helvetica or Helvetica-Bold, no embedding needed.
    pub fn helvetica(bold: bool) -> Self {
        FontEntry {
            base_font: if bold { "Helvetica-Bold" } else { "Helvetica" },
            widths_1000: helvetica_widths(bold),
            char_widths_1000: None,
            truetype: None,
        }
    }

    /// Load a TrueType/OpenType file; its advances drive all measurement.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let data = std::fs::read(path).map_err(|e| Error::Font {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(data, 0).map_err(|reason| Error::Font {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn from_bytes(data: Vec<u8>, face_index: u32) -> Result<Self, String> {
        let face = Face::parse(&data, face_index).map_err(|e| e.to_string())?;
        let units = face.units_per_em() as f32;
        let advance = |gid: ttf_parser::GlyphId| {
            face.glyph_hor_advance(gid)
                .map(|adv| adv as f32 / units * 1000.0)
                .unwrap_or(0.0)
        };

        let widths_1000: Vec<f32> = (32u8..=255u8)
            .map(|byte| {
                face.glyph_index(winansi_to_char(byte))
                    .map(advance)
                    .unwrap_or(0.0)
            })
            .collect();

        let mut char_to_gid = HashMap::new();
        let mut char_widths_1000 = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables.into_iter().filter(|s| s.is_unicode()) {
                subtable.codepoints(|cp| {
                    let Some(ch) = char::from_u32(cp) else {
                        return;
                    };
                    if let Some(gid) = subtable.glyph_index(cp) {
                        char_to_gid.entry(ch).or_insert(gid.0);
                        char_widths_1000.entry(ch).or_insert_with(|| advance(gid));
                    }
                });
            }
        }

        let ps_name = font_family_name(&face)
            .unwrap_or_else(|| "EmbeddedFont".to_string())
            .replace(' ', "");

        log::debug!(
            "Loaded font {ps_name}: {} mapped chars, {} units/em",
            char_to_gid.len(),
            units,
        );

        Ok(FontEntry {
            base_font: "Embedded",
            widths_1000,
            char_widths_1000: Some(char_widths_1000),
            truetype: Some(TrueTypeData {
                data,
                face_index,
                ps_name,
                char_to_gid,
            }),
        })
    }

    pub fn is_embedded(&self) -> bool {
        self.truetype.is_some()
    }
}

fn font_family_name(face: &Face) -> Option<String> {
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

/// Font files to use instead of Helvetica. Unset entries keep the built-in face.
#[derive(Clone, Debug, Default)]
pub struct FontConfig {
    pub regular: Option<PathBuf>,
    pub bold: Option<PathBuf>,
}

impl FontConfig {
    /// Read `VULNTRACK_FONT_REGULAR` and `VULNTRACK_FONT_BOLD`.
    pub fn from_env() -> Self {
        let path_var = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        FontConfig {
            regular: path_var("VULNTRACK_FONT_REGULAR"),
            bold: path_var("VULNTRACK_FONT_BOLD"),
        }
    }
}

/// The regular/bold pair a report is laid out and embedded with.
#[derive(Clone, Debug)]
pub struct FontSet {
    pub regular: FontEntry,
    pub bold: FontEntry,
}

impl Default for FontSet {
    fn default() -> Self {
        FontSet {
            regular: FontEntry::helvetica(false),
            bold: FontEntry::helvetica(true),
        }
    }
}

impl FontSet {
    pub fn load(config: &FontConfig) -> Result<Self, Error> {
        let load = |path: &Option<PathBuf>, bold: bool| match path {
            Some(p) => FontEntry::from_file(p),
            None => Ok(FontEntry::helvetica(bold)),
        };
        Ok(FontSet {
            regular: load(&config.regular, false)?,
            bold: load(&config.bold, true)?,
        })
    }

    pub fn get(&self, id: FontId) -> &FontEntry {
        match id {
            FontId::Regular => &self.regular,
            FontId::Bold => &self.bold,
        }
    }
}

/// Windows-1252 (WinAnsi) byte to Unicode char mapping.
/// Bytes 0x80-0x9F are remapped; all others map directly to their Unicode codepoint.
fn winansi_to_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => byte as char,
    }
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// WinAnsi byte for `c`; whitespace outside the code page becomes a space and
/// any other unmappable char a `?`. Always >= 32.
fn winansi_or_fallback(c: char) -> u8 {
    match char_to_winansi(c) {
        0 if c.is_whitespace() => b' ',
        0 => b'?',
        b => b,
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars().map(winansi_or_fallback).collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    out
}

// Adobe AFM advances for printable ASCII (0x20..=0x7E).
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0x30
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 0x50
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 0x60
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 0x70
];

const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0x30
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 0x50
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // 0x60
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 0x70
];

/// Helvetica widths at 1000 units/em for WinAnsi chars 32..=255.
fn helvetica_widths(bold: bool) -> Vec<f32> {
    let ascii = if bold {
        &HELVETICA_BOLD_ASCII
    } else {
        &HELVETICA_ASCII
    };
    // (regular, bold) for the upper half of the code page.
    let pick = |r: u16, b: u16| if bold { b } else { r };
    (32u8..=255u8)
        .map(|byte| {
            let w = match byte {
                0x20..=0x7E => ascii[(byte - 0x20) as usize],
                0x82 | 0x91 | 0x92 => pick(222, 278),
                0x84 | 0x93 | 0x94 => pick(333, 500),
                0x85 | 0x89 | 0x8C | 0x97 | 0x99 | 0xC6 => 1000,
                0x8A | 0x9F | 0xDD | 0xDE => 667,
                0x8E => 611,
                0x88 | 0x8B | 0x98 | 0x9B | 0xA1 | 0xA8 | 0xAD | 0xAF | 0xB2 | 0xB3 | 0xB4
                | 0xB8 | 0xB9 => 333,
                0x95 => 350,
                0x9A | 0xE7 => pick(500, 556),
                0x9C => 944,
                0x9E => 500,
                0xA0 | 0xB7 => 278,
                0xA6 => pick(260, 280),
                0xA9 | 0xAE => 737,
                0xAA => 370,
                0xAC | 0xB1 | 0xD7 | 0xF7 => 584,
                0xB0 => 400,
                0xB5 | 0xB6 => pick(556, 611),
                0xBA => 365,
                0xBC..=0xBE => 834,
                0xBF | 0xDF | 0xF8 => 611,
                0xC0..=0xC5 => pick(667, 722),
                0xC7 | 0xD0 | 0xD1 | 0xD9..=0xDC => 722,
                0xC8..=0xCB => 667,
                0xCC..=0xCF | 0xEC..=0xEF => 278,
                0xD2..=0xD6 | 0xD8 => 778,
                0xE6 => 889,
                0xF0..=0xF6 | 0xF9..=0xFC | 0xFE => pick(556, 611),
                0xFD | 0xFF => pick(500, 556),
                _ => 556,
            };
            w as f32
        })
        .collect()
}

/// Embed a TrueType/OpenType font as a CIDFont (Type0 composite) with Identity-H encoding.
/// The font data is subsetted to only include glyphs used in the document.
/// Returns the char -> subset glyph id map used to encode text.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    tt: &TrueTypeData,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<HashMap<char, u16>, Error> {
    let face = Face::parse(&tt.data, tt.face_index).map_err(|e| Error::Pdf(e.to_string()))?;
    let descriptor_ref = alloc();
    let data_ref = alloc();

    let units = face.units_per_em() as f32;
    let ascent = face.ascender() as f32 / units * 1000.0;
    let descent = face.descender() as f32 / units * 1000.0;
    let cap_height = face
        .capital_height()
        .map(|h| h as f32 / units * 1000.0)
        .unwrap_or(700.0);

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        bb.x_min as f32 / units * 1000.0,
        bb.y_min as f32 / units * 1000.0,
        bb.x_max as f32 / units * 1000.0,
        bb.y_max as f32 / units * 1000.0,
    );

    let used: Vec<(char, u16)> = used_chars
        .iter()
        .filter_map(|&ch| tt.char_to_gid.get(&ch).map(|&gid| (ch, gid)))
        .collect();

    let mut remapper = subsetter::GlyphRemapper::new();
    for &(_, gid) in &used {
        remapper.remap(gid);
    }

    // Content streams must address glyphs in whichever program is embedded.
    let (subset_data, remapped) = match subsetter::subset(&tt.data, tt.face_index, &remapper) {
        Ok(data) => (data, true),
        Err(e) => {
            log::warn!("Font subsetting failed for {}: {e}, embedding full font", tt.ps_name);
            (tt.data.clone(), false)
        }
    };
    let embedded_gid = |gid: u16| {
        if remapped {
            remapper.get(gid).unwrap_or(0)
        } else {
            gid
        }
    };

    let mut char_to_gid = HashMap::new();
    let mut gid_widths: Vec<(u16, f32)> = Vec::new();
    for &(ch, gid) in &used {
        let new_gid = embedded_gid(gid);
        char_to_gid.insert(ch, new_gid);
        let w = face
            .glyph_hor_advance(ttf_parser::GlyphId(gid))
            .map(|adv| adv as f32 / units * 1000.0)
            .unwrap_or(0.0);
        gid_widths.push((new_gid, w));
    }
    gid_widths.sort_by_key(|&(gid, _)| gid);
    gid_widths.dedup_by_key(|&mut (gid, _)| gid);

    let data_len = i32::try_from(subset_data.len())
        .map_err(|_| Error::Pdf(format!("font {} too large to embed", tt.ps_name)))?;
    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = tt.ps_name.as_bytes();

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(ascent)
        .descent(descent)
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let cid_font_ref = alloc();
    let system_info = pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    };
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name));
        cid.system_info(system_info);
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let tounicode_ref = alloc();
    let cmap_name = format!("{}-UTF16", tt.ps_name);
    let mut cmap = pdf_writer::types::UnicodeCmap::new(
        Name(cmap_name.as_bytes()),
        pdf_writer::types::SystemInfo {
            registry: pdf_writer::Str(b"Adobe"),
            ordering: pdf_writer::Str(b"Identity"),
            supplement: 0,
        },
    );
    for (&ch, &new_gid) in &char_to_gid {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Ok(char_to_gid)
}

/// A font written into the output PDF.
pub(crate) struct RegisteredFont {
    pub(crate) pdf_name: &'static str,
    pub(crate) font_ref: Ref,
    pub(crate) char_to_gid: Option<HashMap<char, u16>>,
}

impl RegisteredFont {
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

pub(crate) fn register_font(
    pdf: &mut Pdf,
    id: FontId,
    entry: &FontEntry,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<RegisteredFont, Error> {
    let t0 = std::time::Instant::now();
    let font_ref = alloc();

    let char_to_gid = match &entry.truetype {
        Some(tt) => Some(embed_truetype(pdf, font_ref, tt, used_chars, alloc)?),
        None => {
            pdf.type1_font(font_ref)
                .base_font(Name(entry.base_font.as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            None
        }
    };

    log::debug!(
        "register_font: {:?} ({} chars) → {:.1}ms",
        id,
        used_chars.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(RegisteredFont {
        pdf_name: id.pdf_name(),
        font_ref,
        char_to_gid,
    })
}
