//! Resolution of the configured font name into something drawable.

use marginalia_traits::{FontSource, ResourceProvider};
use marginalia_types::{BuiltinFont, FontClass};

/// Extensions tried, in order, when a font is given by bare name.
const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];
const KNOWN_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc"];

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFont {
    pub source: FontSource,
    /// Width class used by the capacity heuristics.
    pub class: FontClass,
}

impl Default for ResolvedFont {
    fn default() -> Self {
        Self::builtin(BuiltinFont::Helvetica)
    }
}

impl ResolvedFont {
    pub fn builtin(font: BuiltinFont) -> Self {
        Self {
            source: FontSource::Builtin(font),
            class: FontClass::Latin,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == FontSource::Builtin(BuiltinFont::Helvetica)
    }
}

/// Resolves `name` to a built-in font or a font file loaded through
/// `provider`. A missing or unreadable font falls back to Helvetica.
///
/// File fonts are classed [`FontClass::Cjk`]: a custom font is almost always
/// configured to get glyphs the built-in fonts lack.
pub fn resolve_font(name: Option<&str>, provider: Option<&dyn ResourceProvider>) -> ResolvedFont {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return ResolvedFont::default();
    };
    if let Some(font) = BuiltinFont::from_name(name) {
        return ResolvedFont::builtin(font);
    }
    let Some(provider) = provider else {
        log::warn!("Font '{name}' is not built in and no font directory is configured, using Helvetica");
        return ResolvedFont::default();
    };

    for candidate in candidates(name) {
        if !provider.exists(&candidate) {
            continue;
        }
        match provider.load(&candidate) {
            Ok(data) => {
                if let Err(e) = ttf_parser::Face::parse(&data, 0) {
                    log::warn!("Font file '{candidate}' is not a usable TrueType/OpenType font ({e}), using Helvetica");
                    return ResolvedFont::default();
                }
                log::debug!("Resolved font '{name}' to '{candidate}' via {}", provider.name());
                return ResolvedFont {
                    source: FontSource::File {
                        name: font_name(&candidate),
                        data,
                    },
                    class: FontClass::Cjk,
                };
            }
            Err(e) => {
                log::warn!("Failed to load font '{candidate}': {e}, using Helvetica");
                return ResolvedFont::default();
            }
        }
    }
    log::warn!("Font '{name}' not found via {}, using Helvetica", provider.name());
    ResolvedFont::default()
}

fn candidates(name: &str) -> Vec<String> {
    let has_extension = std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| KNOWN_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(e)));
    let mut candidates = vec![name.to_string()];
    if !has_extension {
        candidates.extend(FONT_EXTENSIONS.iter().map(|ext| format!("{name}.{ext}")));
    }
    candidates
}

/// File stem of a resource path.
fn font_name(path: &str) -> String {
    std::path::Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}
