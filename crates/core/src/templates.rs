//! The stylesheet handed to the HTML box in markdown mode.

use crate::error::ComposeError;
use handlebars::Handlebars;
use serde::Serialize;

const CSS_TEMPLATE: &str = r#"body { font-size: {{font_size}}pt; line-height: {{line_spacing}}; font-family: "{{font_family}}"; }
pre, code { font-size: {{code_size}}pt; }
body, p, h1, h2, h3, h4, h5, h6, ul, ol, pre, table { margin: 0; }
p { margin-bottom: 1pt; }
"#;

/// Smallest font size used for code, in points.
const MIN_CODE_SIZE: f32 = 8.0;

/// Template values. Numbers are preformatted so `1.4` stays `1.4` instead
/// of its widened `f64` expansion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CssParams {
    pub font_size: String,
    pub line_spacing: String,
    pub font_family: String,
    pub code_size: String,
}

impl CssParams {
    pub fn new(font_size: f32, line_spacing: f32, font_family: impl Into<String>) -> Self {
        Self {
            font_size: font_size.to_string(),
            line_spacing: line_spacing.to_string(),
            font_family: font_family.into(),
            code_size: (font_size - 1.0).max(MIN_CODE_SIZE).to_string(),
        }
    }
}

/// Handlebars registry for the column stylesheet, built once per composer.
#[derive(Debug)]
pub struct CssTemplate {
    registry: Handlebars<'static>,
}

impl Default for CssTemplate {
    fn default() -> Self {
        Self::new()
    }
}

impl CssTemplate {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        // CSS is not HTML; quotes in font names must survive.
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);
        Self { registry }
    }

    pub fn render(&self, params: &CssParams) -> Result<String, ComposeError> {
        Ok(self.registry.render_template(CSS_TEMPLATE, params)?)
    }
}
