use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FontVariant {
    pub bold: bool,
    pub italic: bool,
}

impl FontVariant {
    pub const REGULAR: FontVariant = FontVariant {
        bold: false,
        italic: false,
    };

    pub fn new(bold: bool, italic: bool) -> Self {
        FontVariant { bold, italic }
    }

    fn index(self) -> usize {
        (self.bold as usize) | ((self.italic as usize) << 1)
    }

    fn base14_name(self) -> &'static str {
        match (self.bold, self.italic) {
            (false, false) => "Times-Roman",
            (true, false) => "Times-Bold",
            (false, true) => "Times-Italic",
            (true, true) => "Times-BoldItalic",
        }
    }

    const ALL: [FontVariant; 4] = [
        FontVariant {
            bold: false,
            italic: false,
        },
        FontVariant {
            bold: true,
            italic: false,
        },
        FontVariant {
            bold: false,
            italic: true,
        },
        FontVariant {
            bold: true,
            italic: true,
        },
    ];
}

// Adobe core-font advance widths for ASCII 32..=126, 1000 units/em.
#[rustfmt::skip]
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    278, 278, 564, 564, 564, 444, 921,
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
    333, 278, 333, 469, 500, 333,
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
    480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 570, 570, 570, 500, 930,
    722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944,
    722, 778, 611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667,
    333, 278, 333, 581, 500, 333,
    500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833,
    556, 500, 556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444,
    394, 220, 394, 520,
];

#[rustfmt::skip]
const TIMES_ITALIC: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 675, 675, 675, 500, 920,
    611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833,
    667, 722, 611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556,
    389, 278, 389, 422, 500, 333,
    500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722,
    500, 500, 500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389,
    400, 275, 400, 541,
];

#[rustfmt::skip]
const TIMES_BOLD_ITALIC: [u16; 95] = [
    250, 389, 555, 500, 500, 833, 778, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 570, 570, 570, 500, 832,
    667, 667, 667, 722, 667, 667, 722, 778, 389, 500, 667, 611, 889,
    722, 722, 611, 722, 667, 556, 611, 722, 667, 889, 667, 611, 611,
    333, 278, 333, 570, 500, 333,
    500, 500, 444, 500, 444, 333, 500, 556, 278, 278, 500, 278, 778,
    556, 500, 500, 500, 389, 389, 278, 556, 444, 667, 500, 444, 389,
    348, 220, 348, 570,
];

/// Times New Roman vertical metrics (hhea), shared by the built-in faces.
const TIMES_LINE_H_RATIO: f32 = 1.149;
const TIMES_ASCENDER_RATIO: f32 = 0.891;

fn builtin_widths(variant: FontVariant) -> Vec<f32> {
    let ascii = match (variant.bold, variant.italic) {
        (false, false) => &TIMES_ROMAN,
        (true, false) => &TIMES_BOLD,
        (false, true) => &TIMES_ITALIC,
        (true, true) => &TIMES_BOLD_ITALIC,
    };
    (32u8..=255u8)
        .map(|b| match b {
            32..=126 => ascii[(b - 32) as usize] as f32,
            0x85 | 0x97 => 1000.0, // ellipsis, em dash
            0x91 | 0x92 => 333.0,
            0x93 | 0x94 => if variant.bold { 500.0 } else { 444.0 },
            0x95 => 350.0, // bullet
            0x96 => 500.0,
            0xA0 => 250.0,
            0xC0..=0xDE => 722.0,
            _ => 500.0,
        })
        .collect()
}

/// A TrueType/OpenType program found on disk, kept for PDF embedding.
pub(crate) struct FontProgram {
    pub(crate) name: String,
    pub(crate) data: Arc<[u8]>,
    pub(crate) face_index: u32,
}

/// Advance widths and vertical metrics of one face.
pub struct FontFace {
    variant: FontVariant,
    widths_1000: Vec<f32>, // WinAnsi 32..=255
    line_h_ratio: f32,
    ascender_ratio: f32,
    pub(crate) program: Option<FontProgram>,
}

impl FontFace {
    fn builtin(variant: FontVariant) -> Self {
        FontFace {
            variant,
            widths_1000: builtin_widths(variant),
            line_h_ratio: TIMES_LINE_H_RATIO,
            ascender_ratio: TIMES_ASCENDER_RATIO,
            program: None,
        }
    }

    fn from_program(variant: FontVariant, program: FontProgram) -> Option<Self> {
        let face = Face::parse(&program.data, program.face_index).ok()?;
        let units = face.units_per_em() as f32;
        let widths_1000 = (32u8..=255u8)
            .map(|byte| {
                face.glyph_index(winansi_to_char(byte))
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .map(|adv| adv as f32 / units * 1000.0)
                    .unwrap_or(500.0)
            })
            .collect();
        let line_gap = face.line_gap() as f32;
        let line_h_ratio = (face.ascender() as f32 - face.descender() as f32 + line_gap) / units;
        let ascender_ratio = face.ascender() as f32 / units;
        Some(FontFace {
            variant,
            widths_1000,
            line_h_ratio,
            ascender_ratio,
            program: Some(program),
        })
    }

    /// Characters outside WinAnsi fall back to an average width.
    pub fn char_width_1000(&self, ch: char) -> f32 {
        let byte = char_to_winansi(ch);
        if byte >= 32 {
            self.widths_1000[(byte - 32) as usize]
        } else {
            500.0
        }
    }

    pub fn word_width(&self, word: &str, font_size: f32) -> f32 {
        word.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    pub fn space_width(&self, font_size: f32) -> f32 {
        self.char_width_1000(' ') * font_size / 1000.0
    }

    pub fn line_height(&self, font_size: f32) -> f32 {
        font_size * self.line_h_ratio
    }

    pub fn ascent(&self, font_size: f32) -> f32 {
        font_size * self.ascender_ratio
    }
}

/// Regular, bold, italic and bold-italic faces of one family.
pub struct FontSet {
    family: String,
    faces: [FontFace; 4],
}

impl FontSet {
    /// Built-in Times metrics; rendered with the PDF base-14 Times faces.
    pub fn builtin() -> Self {
        FontSet {
            family: "Times".to_string(),
            faces: FontVariant::ALL.map(FontFace::builtin),
        }
    }

    /// Look the family up in `extra_dirs` and the platform font directories.
    /// Each missing variant falls back to the built-in Times face.
    pub fn load(family: &str, extra_dirs: &[PathBuf]) -> Self {
        let t0 = std::time::Instant::now();
        let index = scan_font_dirs(&font_directories(extra_dirs));
        let faces = FontVariant::ALL.map(|variant| {
            find_font_file(&index, family, variant)
                .and_then(|(path, face_index)| load_program(&path, family, face_index))
                .and_then(|program| FontFace::from_program(variant, program))
                .unwrap_or_else(|| {
                    log::warn!(
                        "Font not found: {family} bold={} italic={}, using built-in Times metrics",
                        variant.bold,
                        variant.italic
                    );
                    FontFace::builtin(variant)
                })
        });
        log::debug!(
            "FontSet::load({family}) {:.1}ms",
            t0.elapsed().as_secs_f64() * 1000.0
        );
        FontSet {
            family: family.to_string(),
            faces,
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn face(&self, variant: FontVariant) -> &FontFace {
        &self.faces[variant.index()]
    }
}

/// (lowercase family name, bold, italic) -> (file path, face index within TTC)
type FontLookup = HashMap<(String, bool, bool), (PathBuf, u32)>;

fn font_family_name(face: &Face) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
        .find_map(|name| name.to_string())
}

fn font_directories(extra: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = extra.to_vec();

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
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
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

fn is_font_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("ttf" | "otf" | "ttc")
    )
}

fn scan_font_dirs(dirs: &[PathBuf]) -> FontLookup {
    let t0 = std::time::Instant::now();
    let mut index = FontLookup::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut files_scanned = 0u32;

    let mut stack: Vec<PathBuf> = dirs.to_vec();
    while let Some(dir) = stack.pop() {
        if !visited.insert(dir.clone()) {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if !is_font_file(&path) {
                continue;
            }
            files_scanned += 1;
            let Ok(file) = std::fs::File::open(&path) else {
                continue;
            };
            // SAFETY: font files are opened read-only and not modified while mapped.
            let Ok(data) = (unsafe { Mmap::map(&file) }) else {
                continue;
            };
            let face_count = ttf_parser::fonts_in_collection(&data).unwrap_or(1);
            for face_index in 0..face_count {
                let Ok(face) = Face::parse(&data, face_index) else {
                    continue;
                };
                if let Some(family) = font_family_name(&face) {
                    index
                        .entry((family.to_lowercase(), face.is_bold(), face.is_italic()))
                        .or_insert((path.clone(), face_index));
                }
            }
        }
    }

    log::info!(
        "Font scan: {:.1}ms, {} files parsed -> {} entries",
        t0.elapsed().as_secs_f64() * 1000.0,
        files_scanned,
        index.len(),
    );
    index
}

/// Exact style match only: a regular face standing in for bold would
/// measure too narrow.
fn find_font_file(index: &FontLookup, family: &str, variant: FontVariant) -> Option<(PathBuf, u32)> {
    index
        .get(&(family.to_lowercase(), variant.bold, variant.italic))
        .cloned()
}

fn load_program(path: &Path, family: &str, face_index: u32) -> Option<FontProgram> {
    let file = std::fs::File::open(path).ok()?;
    // SAFETY: see scan_font_dirs; the bytes are copied out before the map drops.
    let map = unsafe { Mmap::map(&file) }.ok()?;
    Some(FontProgram {
        name: family.to_string(),
        data: Arc::from(&map[..]),
        face_index,
    })
}

/// Windows-1252 (WinAnsi) byte to Unicode char mapping.
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
        0x0020..=0x007E => c as u8,
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

/// Convert text to WinAnsi bytes for base-14 fonts; unmappable chars are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(char_to_winansi)
        .filter(|&b| b != 0)
        .collect()
}

/// Encode text as big-endian 2-byte glyph IDs for CIDFont content streams.
fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.extend_from_slice(&gid.to_be_bytes());
    }
    out
}

/// A face registered in one PDF file.
pub(crate) struct PdfFont {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    char_to_gid: Option<HashMap<char, u16>>,
}

impl PdfFont {
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

fn identity_system_info() -> pdf_writer::types::SystemInfo<'static> {
    pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    }
}

/// Embed a TrueType/OpenType program as a Type0 font with Identity-H encoding,
/// subset to the characters the document uses.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    program: &FontProgram,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Option<HashMap<char, u16>> {
    let face = Face::parse(&program.data, program.face_index).ok()?;
    let units = face.units_per_em() as f32;
    let scale = |v: f32| v / units * 1000.0;

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        scale(bb.x_min as f32),
        scale(bb.y_min as f32),
        scale(bb.x_max as f32),
        scale(bb.y_max as f32),
    );

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    let mut gid_widths: Vec<(u16, f32)> = Vec::new();
    let mut chars: Vec<char> = used_chars.iter().copied().collect();
    chars.sort_unstable();
    for ch in chars {
        if let Some(gid) = face.glyph_index(ch) {
            let new_gid = remapper.remap(gid.0);
            char_to_gid.insert(ch, new_gid);
            let adv = face.glyph_hor_advance(gid).unwrap_or(0) as f32;
            gid_widths.push((new_gid, scale(adv)));
        }
    }
    gid_widths.sort_by_key(|&(gid, _)| gid);
    gid_widths.dedup_by_key(|&mut (gid, _)| gid);

    let subset = subsetter::subset(&program.data, program.face_index, &remapper)
        .unwrap_or_else(|e| {
            log::warn!("Font subsetting failed for {}: {e}, embedding full font", program.name);
            program.data.to_vec()
        });

    let ps_name = program.name.replace(' ', "");
    let descriptor_ref = alloc();
    let data_ref = alloc();
    let cid_font_ref = alloc();
    let tounicode_ref = alloc();

    let data_len = i32::try_from(subset.len()).ok()?;
    pdf.stream(data_ref, &subset).pair(Name(b"Length1"), data_len);

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(scale(face.ascender() as f32))
        .descent(scale(face.descender() as f32))
        .cap_height(face.capital_height().map_or(700.0, |h| scale(h as f32)))
        .stem_v(80.0)
        .font_file2(data_ref);

    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(identity_system_info());
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

    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), identity_system_info());
    for (&ch, &gid) in &char_to_gid {
        cmap.pair(gid, ch);
    }
    pdf.stream(tounicode_ref, cmap.finish().as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Some(char_to_gid)
}

/// Register `face` under `pdf_name`, embedding its program when one was found
/// and falling back to the matching base-14 Times face otherwise.
pub(crate) fn register_font(
    pdf: &mut Pdf,
    face: &FontFace,
    pdf_name: String,
    alloc: &mut impl FnMut() -> Ref,
    used_chars: &HashSet<char>,
) -> PdfFont {
    let t0 = std::time::Instant::now();
    let font_ref = alloc();

    let char_to_gid = face
        .program
        .as_ref()
        .and_then(|program| embed_truetype(pdf, font_ref, program, used_chars, alloc));

    if char_to_gid.is_none() {
        let base = face.variant.base14_name();
        pdf.type1_font(font_ref)
            .base_font(Name(base.as_bytes()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    log::debug!(
        "register_font: {pdf_name} bold={} italic={} embedded={} {:.1}ms",
        face.variant.bold,
        face.variant.italic,
        char_to_gid.is_some(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    PdfFont {
        pdf_name,
        font_ref,
        char_to_gid,
    }
}
