//! Font metrics and font objects for the destination document.
//!
//! Built-in Type1 fonts are referenced by name with WinAnsi encoding and
//! approximate width tables. Font files are embedded whole as Type0 fonts
//! with a CIDFontType2 descendant, Identity-H encoding, per-glyph widths and
//! a ToUnicode map so the output stays searchable.

use crate::error::ComposerError;
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use marginalia_traits::{FontSource, SharedResourceData};
use marginalia_types::BuiltinFont;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use ttf_parser::Face;

/// Glyphs per `beginbfchar` section; the CMap format caps sections at 100.
const BFCHAR_CHUNK: usize = 100;

/// Identifies a font registered with a [`FontRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum FaceKey {
    Builtin(BuiltinFont),
    Embedded(usize),
}

#[derive(Debug, Clone, Copy)]
struct Glyph {
    id: u16,
    /// Advance width in 1/1000 em.
    width: f32,
}

struct EmbeddedFont {
    base_name: String,
    data: SharedResourceData,
    units_per_em: f32,
    ascent: f32,
    descent: f32,
    cap_height: f32,
    bbox: [f32; 4],
    glyphs: FxHashMap<char, Glyph>,
    /// Glyphs actually drawn, with the char they were drawn for.
    used: BTreeMap<u16, (char, f32)>,
}

impl EmbeddedFont {
    fn parse(name: &str, data: SharedResourceData) -> Result<Self, ComposerError> {
        let face = Face::parse(&data, 0)
            .map_err(|e| ComposerError::Font(format!("cannot parse font '{name}': {e}")))?;
        let units = face.units_per_em() as f32;
        let scale = |v: i16| v as f32 / units * 1000.0;
        let bb = face.global_bounding_box();
        let font = Self {
            base_name: postscript_name(name),
            units_per_em: units,
            ascent: scale(face.ascender()),
            descent: scale(face.descender()),
            cap_height: face.capital_height().map(scale).unwrap_or(700.0),
            bbox: [scale(bb.x_min), scale(bb.y_min), scale(bb.x_max), scale(bb.y_max)],
            glyphs: FxHashMap::default(),
            used: BTreeMap::new(),
            data,
        };
        Ok(font)
    }

    fn glyph(&mut self, ch: char) -> Glyph {
        if let Some(glyph) = self.glyphs.get(&ch) {
            return *glyph;
        }
        // The bytes were validated in `parse`, a failure here leaves .notdef.
        let glyph = Face::parse(&self.data, 0)
            .ok()
            .and_then(|face| {
                let id = face.glyph_index(ch)?;
                let advance = face.glyph_hor_advance(id).unwrap_or(0);
                Some(Glyph {
                    id: id.0,
                    width: advance as f32 / self.units_per_em * 1000.0,
                })
            })
            .unwrap_or(Glyph { id: 0, width: 0.0 });
        self.glyphs.insert(ch, glyph);
        glyph
    }
}

/// The fonts drawn with so far, and their metrics.
#[derive(Default)]
pub(crate) struct FontRegistry {
    embedded: Vec<EmbeddedFont>,
    by_name: FxHashMap<String, usize>,
    used_builtin: Vec<BuiltinFont>,
}

impl FontRegistry {
    pub(crate) fn register(&mut self, source: &FontSource) -> Result<FaceKey, ComposerError> {
        match source {
            FontSource::Builtin(font) => Ok(FaceKey::Builtin(*font)),
            FontSource::File { name, data } => {
                if let Some(&index) = self.by_name.get(name) {
                    return Ok(FaceKey::Embedded(index));
                }
                let font = EmbeddedFont::parse(name, data.clone())?;
                log::debug!("Embedding font '{}' ({} bytes)", name, data.len());
                let index = self.embedded.len();
                self.embedded.push(font);
                self.by_name.insert(name.clone(), index);
                Ok(FaceKey::Embedded(index))
            }
        }
    }

    /// Bold companion of a registered face; embedded fonts have none.
    pub(crate) fn bold(key: FaceKey) -> FaceKey {
        match key {
            FaceKey::Builtin(font) => FaceKey::Builtin(font.bold()),
            other => other,
        }
    }

    /// Monospace companion; embedded fonts keep their own glyphs so that
    /// characters outside WinAnsi stay visible.
    pub(crate) fn monospace(key: FaceKey) -> FaceKey {
        match key {
            FaceKey::Builtin(_) => FaceKey::Builtin(BuiltinFont::Courier),
            other => other,
        }
    }

    /// Advance width of `text` at `size`, in points. Control characters have
    /// no width.
    pub(crate) fn measure(&mut self, key: FaceKey, text: &str, size: f32) -> f32 {
        let units: f32 = match key {
            FaceKey::Builtin(font) => text
                .chars()
                .filter(|c| !c.is_control())
                .map(|c| builtin_width(font, c))
                .sum(),
            FaceKey::Embedded(index) => match self.embedded.get_mut(index) {
                Some(font) => text
                    .chars()
                    .filter(|c| !c.is_control())
                    .map(|c| font.glyph(c).width)
                    .sum(),
                None => 0.0,
            },
        };
        units * size / 1000.0
    }

    /// Encodes `text` for a `Tj` operand and records the glyphs as used.
    pub(crate) fn encode(&mut self, key: FaceKey, text: &str) -> Object {
        match key {
            FaceKey::Builtin(font) => {
                if !self.used_builtin.contains(&font) {
                    self.used_builtin.push(font);
                }
                let bytes = text
                    .chars()
                    .filter(|c| !c.is_control())
                    .map(|c| char_to_winansi(c).unwrap_or(b'?'))
                    .collect();
                Object::String(bytes, StringFormat::Literal)
            }
            FaceKey::Embedded(index) => {
                let mut bytes = Vec::with_capacity(text.len() * 2);
                if let Some(font) = self.embedded.get_mut(index) {
                    for ch in text.chars().filter(|c| !c.is_control()) {
                        let glyph = font.glyph(ch);
                        font.used.entry(glyph.id).or_insert((ch, glyph.width));
                        bytes.extend_from_slice(&glyph.id.to_be_bytes());
                    }
                }
                Object::String(bytes, StringFormat::Hexadecimal)
            }
        }
    }

    /// Name of the font in the shared `/Font` resource dictionary.
    pub(crate) fn resource_name(key: FaceKey) -> String {
        match key {
            FaceKey::Builtin(BuiltinFont::Helvetica) => "F1".to_string(),
            FaceKey::Builtin(BuiltinFont::HelveticaBold) => "F2".to_string(),
            FaceKey::Builtin(BuiltinFont::Courier) => "F3".to_string(),
            FaceKey::Embedded(index) => format!("E{}", index + 1),
        }
    }

    /// Writes every used font into `doc` and returns the `/Font` dictionary.
    pub(crate) fn write_fonts(&self, doc: &mut Document) -> Result<Dictionary, ComposerError> {
        let mut fonts = Dictionary::new();
        for &font in &self.used_builtin {
            let id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(Self::resource_name(FaceKey::Builtin(font)), id);
        }
        for (index, font) in self.embedded.iter().enumerate() {
            if font.used.is_empty() {
                continue;
            }
            let id = write_embedded(doc, font)?;
            fonts.set(Self::resource_name(FaceKey::Embedded(index)), id);
        }
        Ok(fonts)
    }
}

fn write_embedded(doc: &mut Document, font: &EmbeddedFont) -> Result<lopdf::ObjectId, ComposerError> {
    let file_id = doc.add_object(Stream::new(
        dictionary! { "Length1" => font.data.len() as i64 },
        font.data.to_vec(),
    ));
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => Object::Name(font.base_name.clone().into_bytes()),
        "Flags" => 32,
        "FontBBox" => font.bbox.iter().map(|v| Object::Real(*v)).collect::<Vec<_>>(),
        "ItalicAngle" => 0,
        "Ascent" => font.ascent,
        "Descent" => font.descent,
        "CapHeight" => font.cap_height,
        "StemV" => 80,
        "FontFile2" => file_id,
    });

    let mut widths = Vec::with_capacity(font.used.len() * 2);
    for (gid, (_, width)) in &font.used {
        widths.push(Object::Integer(*gid as i64));
        widths.push(Object::Array(vec![Object::Real(*width)]));
    }
    let descendant_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => Object::Name(font.base_name.clone().into_bytes()),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => 1000,
        "W" => widths,
        "CIDToGIDMap" => "Identity",
    });

    let cmap_id = doc.add_object(Stream::new(dictionary! {}, to_unicode_cmap(&font.used).into_bytes()));
    Ok(doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => Object::Name(font.base_name.clone().into_bytes()),
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(descendant_id)],
        "ToUnicode" => cmap_id,
    }))
}

fn to_unicode_cmap(used: &BTreeMap<u16, (char, f32)>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    let entries: Vec<(&u16, &(char, f32))> = used.iter().filter(|(gid, _)| **gid != 0).collect();
    for chunk in entries.chunks(BFCHAR_CHUNK) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (gid, (ch, _)) in chunk {
            let mut units = [0u16; 2];
            let hex: String = ch
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{u:04X}"))
                .collect();
            cmap.push_str(&format!("<{gid:04X}> <{hex}>\n"));
        }
        cmap.push_str("endbfchar\n");
    }
    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap
}

/// Keeps the characters a PDF name can hold without escaping.
fn postscript_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if cleaned.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        cleaned
    }
}

/// Maps a char to its Windows-1252 byte.
pub(crate) fn char_to_winansi(c: char) -> Option<u8> {
    let byte = match c as u32 {
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
        _ => return None,
    };
    Some(byte)
}

/// Approximate advance widths in 1/1000 em. Characters outside WinAnsi
/// are drawn as `?` and measured as such.
fn builtin_width(font: BuiltinFont, c: char) -> f32 {
    let byte = char_to_winansi(c).unwrap_or(b'?');
    match font {
        BuiltinFont::Courier => 600.0,
        BuiltinFont::Helvetica => match byte {
            b' ' => 278.0,
            b'0'..=b'9' => 556.0,
            b'I' | b'J' => 278.0,
            b'M' => 833.0,
            b'W' => 944.0,
            b'A'..=b'Z' => 667.0,
            b'f' | b'i' | b'j' | b'l' | b't' => 278.0,
            b'r' => 333.0,
            b'm' | b'w' => 833.0,
            b'a'..=b'z' => 556.0,
            b'!'..=b'/' | b':'..=b'@' | b'['..=b'`' | b'{'..=b'~' => 333.0,
            _ => 556.0,
        },
        BuiltinFont::HelveticaBold => match byte {
            b' ' => 278.0,
            b'0'..=b'9' => 556.0,
            b'I' => 278.0,
            b'J' => 556.0,
            b'M' => 833.0,
            b'W' => 944.0,
            b'A'..=b'Z' => 722.0,
            b'i' | b'j' | b'l' => 278.0,
            b'f' | b't' => 333.0,
            b'r' => 389.0,
            b'm' => 889.0,
            b'w' => 778.0,
            b'a'..=b'z' => 611.0,
            b'!'..=b'/' | b':'..=b'@' | b'['..=b'`' | b'{'..=b'~' => 333.0,
            _ => 611.0,
        },
    }
}
