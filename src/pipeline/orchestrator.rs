use marginalia_core::{ComposeError, ComposeOptions, CompositionReport, DocumentComposer, ExplanationMap, ResolvedFont};
use marginalia_pdf_composer::{LopdfDestination, LopdfSource};
use marginalia_traits::{DestinationDocument, SourceDocument};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;

/// A composed document and what happened while composing it.
#[derive(Debug)]
pub struct ComposedDocument {
    pub bytes: Vec<u8>,
    pub report: CompositionReport,
}

/// Composes PDF files with the lopdf backend.
///
/// Holds no per-document state, so one composer can serve any number of
/// documents, from any number of threads.
#[derive(Debug)]
pub struct Composer {
    inner: DocumentComposer,
}

impl Composer {
    pub(crate) fn new(inner: DocumentComposer) -> Self {
        Self { inner }
    }

    pub fn options(&self) -> &ComposeOptions {
        self.inner.options()
    }

    pub fn font(&self) -> &ResolvedFont {
        self.inner.font()
    }

    /// The backend-independent composer, for callers with their own documents.
    pub fn document_composer(&self) -> &DocumentComposer {
        &self.inner
    }

    /// Composes the PDF in `pdf` and returns the output bytes.
    pub fn compose_bytes(
        &self,
        pdf: &[u8],
        explanations: &ExplanationMap,
    ) -> Result<ComposedDocument, ComposeError> {
        let start = Instant::now();
        let mut src =
            LopdfSource::from_bytes(pdf).map_err(|e| ComposeError::SourceUnreadable(e.to_string()))?;
        let mut dst = LopdfDestination::new();
        let report = self.inner.compose(&mut src, &mut dst, explanations)?;
        let bytes = dst.save().map_err(ComposeError::Output)?;
        log::info!(
            "Composed {} source pages into {} pages ({} bytes) in {:.2?}",
            src.page_count(),
            report.output_pages,
            bytes.len(),
            start.elapsed()
        );
        Ok(ComposedDocument { bytes, report })
    }

    /// Reads `input`, composes it and writes the result to `output`.
    pub fn compose_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        explanations: &ExplanationMap,
        output: Q,
    ) -> Result<CompositionReport, ComposeError> {
        let input = input.as_ref();
        let pdf = fs::read(input).map_err(|e| {
            ComposeError::Io(io::Error::new(
                e.kind(),
                format!("Failed to read PDF from '{}': {}", input.display(), e),
            ))
        })?;
        let composed = self.compose_bytes(&pdf, explanations)?;
        fs::write(output.as_ref(), &composed.bytes)?;
        Ok(composed.report)
    }
}

/// Composes `pdf` with `options` in one call.
pub fn compose_pdf(
    pdf: &[u8],
    explanations: &ExplanationMap,
    options: ComposeOptions,
) -> Result<(Vec<u8>, CompositionReport), ComposeError> {
    let composer = super::ComposerBuilder::new().with_options(options).build()?;
    let ComposedDocument { bytes, report } = composer.compose_bytes(pdf, explanations)?;
    Ok((bytes, report))
}
