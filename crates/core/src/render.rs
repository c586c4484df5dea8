//! Drawing one text fragment into one column, per render mode.

use crate::fonts::ResolvedFont;
use crate::markdown::markdown_to_html;
use crate::options::ComposeOptions;
use marginalia_layout::{FlowStyle, LayoutTuning};
use marginalia_traits::{
    DestinationDocument, DocumentError, HtmlBoxFit, SourceDocument, TextBoxFit, TextStyle,
};
use marginalia_types::{PageHandle, Rect, RenderMode};

/// Everything a composition run shares between pages: validated options,
/// the resolved font and the rendered stylesheet.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub font_size: f32,
    pub line_spacing: f32,
    pub column_padding: f32,
    pub mode: RenderMode,
    pub font: ResolvedFont,
    pub css: String,
    pub tuning: LayoutTuning,
}

impl RenderContext {
    pub fn new(options: &ComposeOptions, font: ResolvedFont, css: String) -> Self {
        Self {
            font_size: options.font_size,
            line_spacing: options.line_spacing,
            column_padding: options.column_padding,
            mode: options.render_mode,
            font,
            css,
            tuning: options.tuning.clone(),
        }
    }

    /// Style the layout heuristics see.
    pub fn flow_style(&self) -> FlowStyle {
        FlowStyle::new(self.font_size, self.line_spacing, self.mode).with_font_class(self.font.class)
    }

    /// Style of body text drawn through the text box.
    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            font: self.font.source.clone(),
            font_size: self.font_size,
            line_spacing: self.line_spacing,
        }
    }
}

/// What the destination told us about a fragment it drew.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    TextBox(TextBoxFit),
    HtmlBox(HtmlBoxFit),
}

pub trait FragmentRenderer {
    fn render<S, D>(
        &self,
        dst: &mut D,
        page: PageHandle,
        rect: Rect,
        fragment: &str,
        ctx: &RenderContext,
    ) -> Result<RenderOutcome, DocumentError>
    where
        S: SourceDocument,
        D: DestinationDocument<S>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl FragmentRenderer for TextRenderer {
    fn render<S, D>(
        &self,
        dst: &mut D,
        page: PageHandle,
        rect: Rect,
        fragment: &str,
        ctx: &RenderContext,
    ) -> Result<RenderOutcome, DocumentError>
    where
        S: SourceDocument,
        D: DestinationDocument<S>,
    {
        let fit = dst.insert_text_box(page, rect, fragment, &ctx.text_style())?;
        Ok(RenderOutcome::TextBox(fit))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl FragmentRenderer for MarkdownRenderer {
    fn render<S, D>(
        &self,
        dst: &mut D,
        page: PageHandle,
        rect: Rect,
        fragment: &str,
        ctx: &RenderContext,
    ) -> Result<RenderOutcome, DocumentError>
    where
        S: SourceDocument,
        D: DestinationDocument<S>,
    {
        let html = markdown_to_html(fragment);
        let fit = dst.insert_html_box(page, rect, &html, &ctx.css, &ctx.font.source)?;
        Ok(RenderOutcome::HtmlBox(fit))
    }
}
