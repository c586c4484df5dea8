use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How explanation text is drawn beside the source page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Plain text through the text-box primitive.
    #[default]
    Text,
    /// Markdown converted to HTML and drawn through the HTML-box primitive.
    Markdown,
    /// Only the widened source page; no explanation is drawn.
    EmptyRight,
}

impl RenderMode {
    /// Rich modes reserve extra vertical space for block spacing.
    pub fn is_rich(self) -> bool {
        matches!(self, RenderMode::Markdown)
    }

    pub fn draws_explanation(self) -> bool {
        !matches!(self, RenderMode::EmptyRight)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RenderMode::Text => "text",
            RenderMode::Markdown => "markdown",
            RenderMode::EmptyRight => "empty_right",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown render mode '{0}' (expected text, markdown or empty_right)")]
pub struct ParseRenderModeError(pub String);

impl FromStr for RenderMode {
    type Err = ParseRenderModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(RenderMode::Text),
            "markdown" | "md" => Ok(RenderMode::Markdown),
            "empty_right" | "empty-right" => Ok(RenderMode::EmptyRight),
            _ => Err(ParseRenderModeError(s.to_string())),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
