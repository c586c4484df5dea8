use serde::{Deserialize, Serialize};

/// Width class of a font, used by character-count heuristics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontClass {
    #[default]
    Latin,
    /// Dense full-width glyphs, as found in CJK fonts.
    Cjk,
}

/// The standard Type1 fonts every PDF viewer ships.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinFont {
    #[default]
    Helvetica,
    HelveticaBold,
    Courier,
}

impl BuiltinFont {
    /// The `/BaseFont` name.
    pub fn base_font(self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::HelveticaBold => "Helvetica-Bold",
            BuiltinFont::Courier => "Courier",
        }
    }

    /// Looks up a font by its base name or its short alias (`helv`, `hebo`, `cour`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "helv" | "helvetica" => Some(BuiltinFont::Helvetica),
            "hebo" | "helvetica-bold" => Some(BuiltinFont::HelveticaBold),
            "cour" | "courier" => Some(BuiltinFont::Courier),
            _ => None,
        }
    }

    pub fn bold(self) -> Self {
        match self {
            BuiltinFont::Helvetica | BuiltinFont::HelveticaBold => BuiltinFont::HelveticaBold,
            BuiltinFont::Courier => BuiltinFont::Courier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_aliases() {
        assert_eq!(BuiltinFont::from_name("helv"), Some(BuiltinFont::Helvetica));
        assert_eq!(BuiltinFont::from_name("Helvetica-Bold"), Some(BuiltinFont::HelveticaBold));
        assert_eq!(BuiltinFont::from_name("COUR"), Some(BuiltinFont::Courier));
        assert_eq!(BuiltinFont::from_name("NotoSansSC"), None);
    }

    #[test]
    fn bold_variant() {
        assert_eq!(BuiltinFont::Helvetica.bold(), BuiltinFont::HelveticaBold);
        assert_eq!(BuiltinFont::Courier.bold(), BuiltinFont::Courier);
    }
}
