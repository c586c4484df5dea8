use crate::error::ComposeError;
use crate::fonts::{ResolvedFont, resolve_font};
use crate::options::ComposeOptions;
use crate::page::PageRenderer;
use crate::render::RenderContext;
use crate::report::CompositionReport;
use crate::templates::{CssParams, CssTemplate};
use marginalia_traits::{DestinationDocument, ResourceProvider, SourceDocument};
use marginalia_types::ExplanationMap;

/// Drives a whole source document through the page renderer.
///
/// Built once per set of options; the resolved font and the stylesheet are
/// shared by every page and every document it composes.
#[derive(Debug)]
pub struct DocumentComposer {
    options: ComposeOptions,
    ctx: RenderContext,
}

impl DocumentComposer {
    /// Validates `options` and resolves the configured font through
    /// `provider`, if one is given.
    pub fn new(options: ComposeOptions, provider: Option<&dyn ResourceProvider>) -> Result<Self, ComposeError> {
        options.validate()?;
        let font = resolve_font(options.font.as_deref(), provider);
        let css = CssTemplate::new().render(&CssParams::new(
            options.font_size,
            options.line_spacing,
            font.source.name(),
        ))?;
        let ctx = RenderContext::new(&options, font, css);
        Ok(Self { options, ctx })
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    pub fn font(&self) -> &ResolvedFont {
        &self.ctx.font
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    /// Renders every page of `src` into `dst`, in order. Pages without an
    /// explanation get only the widened copy.
    pub fn compose<S, D>(
        &self,
        src: &mut S,
        dst: &mut D,
        explanations: &ExplanationMap,
    ) -> Result<CompositionReport, ComposeError>
    where
        S: SourceDocument,
        D: DestinationDocument<S>,
    {
        let page_count = src.page_count();
        if page_count == 0 {
            return Err(ComposeError::SourceUnreadable("document has no pages".to_string()));
        }
        if let Some((&index, _)) = explanations.range(page_count..).next() {
            log::warn!(
                "Explanations from page index {index} on have no source page (document has {page_count} pages)"
            );
        }
        log::info!(
            "Composing {page_count} pages, {} with explanations, mode {}",
            explanations.range(..page_count).filter(|(_, t)| !t.trim().is_empty()).count(),
            self.ctx.mode
        );

        let renderer = PageRenderer::new(&self.ctx);
        let mut report = CompositionReport::default();
        for page_index in 0..page_count {
            let explanation = explanations.get(&page_index).map(String::as_str);
            let page = renderer.render_page::<S, D>(dst, src, page_index, explanation)?;
            log::info!(
                "Page {}: {} columns, {} continuation pages",
                page_index + 1,
                page.columns,
                page.continuation_pages
            );
            report.pages.push(page);
        }
        report.output_pages = dst.page_count();
        Ok(report)
    }
}
