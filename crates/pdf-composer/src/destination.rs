use crate::copier::ObjectCopier;
use crate::error::ComposerError;
use crate::fonts::{FaceKey, FontRegistry};
use crate::html::{layout_html, Faces, HtmlLayout};
use crate::source::LopdfSource;
use crate::text::wrap_text;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use marginalia_traits::{
    DestinationDocument, DocumentError, FontSource, HtmlBoxFit, TextBlock, TextBoxFit, TextStyle,
};
use marginalia_types::{PageHandle, Rect};
use rustc_hash::FxHashMap;

/// Fraction of the font size between the top of a line and its baseline.
const ASCENT_RATIO: f32 = 0.8;

#[derive(Debug, Default)]
struct PageState {
    width: f32,
    height: f32,
    ops: Vec<Operation>,
    xobjects: Vec<(String, ObjectId)>,
    blocks: Vec<TextBlock>,
}

impl PageState {
    /// Converts a top-left `y` into PDF user space.
    fn flip(&self, y: f32) -> f32 {
        self.height - y
    }

    fn show_text(&mut self, fonts: &mut FontRegistry, face: FaceKey, size: f32, x: f32, baseline: f32, text: &str) {
        let y = self.flip(baseline);
        let encoded = fonts.encode(face, text);
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new(
            "Tf",
            vec![Object::Name(FontRegistry::resource_name(face).into_bytes()), size.into()],
        ));
        self.ops.push(Operation::new("Td", vec![x.into(), y.into()]));
        self.ops.push(Operation::new("Tj", vec![encoded]));
        self.ops.push(Operation::new("ET", vec![]));
    }
}

/// A PDF being built with lopdf.
///
/// Pages are kept as operation lists until [`DestinationDocument::save`],
/// which writes the page tree and one font dictionary shared by all pages.
pub struct LopdfDestination {
    doc: Document,
    pages: Vec<PageState>,
    fonts: FontRegistry,
    /// Form XObjects already made from source pages, by (source id, index).
    forms: FxHashMap<(usize, usize), ObjectId>,
    /// Object id translation per source document.
    id_maps: FxHashMap<usize, FxHashMap<ObjectId, ObjectId>>,
}

impl Default for LopdfDestination {
    fn default() -> Self {
        Self::new()
    }
}

impl LopdfDestination {
    pub fn new() -> Self {
        Self {
            doc: Document::with_version("1.7"),
            pages: Vec::new(),
            fonts: FontRegistry::default(),
            forms: FxHashMap::default(),
            id_maps: FxHashMap::default(),
        }
    }

    fn page_mut(&mut self, page: PageHandle) -> Result<&mut PageState, ComposerError> {
        self.pages
            .get_mut(page.index())
            .ok_or(ComposerError::UnknownPage(page))
    }

    fn source_form(&mut self, source: &LopdfSource, index: usize) -> Result<ObjectId, ComposerError> {
        if let Some(id) = self.forms.get(&(source.id(), index)) {
            return Ok(*id);
        }
        let page_id = source.page_id(index)?;
        let content = source.document().get_page_content(page_id)?;
        let [x0, y0, x1, y1] = source.media_box(page_id);

        let id_map = self.id_maps.entry(source.id()).or_default();
        let mut copier = ObjectCopier::new(source.document(), &mut self.doc, id_map);
        let resources = match source.resources(page_id) {
            Some(resources) => copier.copy_value(resources)?,
            None => Object::Dictionary(Dictionary::new()),
        };

        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![x0.into(), y0.into(), x1.into(), y1.into()],
                "Resources" => resources,
            },
            content,
        );
        let form_id = self.doc.add_object(form);
        self.forms.insert((source.id(), index), form_id);
        log::debug!("Created form XObject {form_id:?} for source page {index}");
        Ok(form_id)
    }

    fn finish(mut self) -> Result<Vec<u8>, ComposerError> {
        let pages_id = self.doc.new_object_id();
        let fonts = self.fonts.write_fonts(&mut self.doc)?;
        let font_dict_id = self.doc.add_object(fonts);

        let mut kids = Vec::with_capacity(self.pages.len());
        for page in std::mem::take(&mut self.pages) {
            let content = Content {
                operations: page.ops,
            }
            .encode()?;
            let content_id = self.doc.add_object(Stream::new(dictionary! {}, content));

            let mut xobjects = Dictionary::new();
            for (name, id) in &page.xobjects {
                xobjects.set(name.as_str(), *id);
            }
            let page_id = self.doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), page.width.into(), page.height.into()],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => font_dict_id,
                    "XObject" => xobjects,
                },
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        self.doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        self.doc.prune_objects();
        self.doc.renumber_objects();
        self.doc.compress();

        let mut buffer = Vec::new();
        self.doc.save_to(&mut buffer)?;
        log::debug!("Saved {count} pages ({} bytes)", buffer.len());
        Ok(buffer)
    }
}

impl DestinationDocument<LopdfSource> for LopdfDestination {
    fn new_page(&mut self, width: f32, height: f32) -> Result<PageHandle, DocumentError> {
        if !(width > 0.0 && height > 0.0) {
            return Err(ComposerError::Other(format!("invalid page size {width}x{height}")).into());
        }
        self.pages.push(PageState {
            width,
            height,
            ..PageState::default()
        });
        Ok(PageHandle::new(self.pages.len() - 1))
    }

    fn show_source_page(
        &mut self,
        page: PageHandle,
        rect: Rect,
        source: &LopdfSource,
        index: usize,
    ) -> Result<(), DocumentError> {
        self.page_mut(page)?;
        let form_id = self.source_form(source, index)?;
        let media = source.media_rect(source.page_id(index)?);
        let sx = if media.width() > 0.0 { rect.width() / media.width() } else { 1.0 };
        let sy = if media.height() > 0.0 { rect.height() / media.height() } else { 1.0 };

        let state = self.page_mut(page)?;
        let name = format!("P{}", state.xobjects.len() + 1);
        let tx = rect.x0 - media.x0 * sx;
        let ty = state.flip(rect.y1) - media.y0 * sy;
        state.ops.push(Operation::new("q", vec![]));
        state.ops.push(Operation::new(
            "cm",
            vec![sx.into(), 0.into(), 0.into(), sy.into(), tx.into(), ty.into()],
        ));
        state.ops.push(Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]));
        state.ops.push(Operation::new("Q", vec![]));
        state.xobjects.push((name, form_id));
        Ok(())
    }

    fn insert_text_box(
        &mut self,
        page: PageHandle,
        rect: Rect,
        text: &str,
        style: &TextStyle,
    ) -> Result<TextBoxFit, DocumentError> {
        self.page_mut(page)?;
        let face = self.fonts.register(&style.font)?;
        let size = style.font_size;
        let line_height = size * style.line_spacing.max(1.0);

        let fonts = &mut self.fonts;
        let lines = wrap_text(text, rect.width(), |s| fonts.measure(face, s, size));

        let state = self
            .pages
            .get_mut(page.index())
            .ok_or(ComposerError::UnknownPage(page))?;
        for (i, line) in lines.iter().enumerate() {
            let top = rect.y0 + i as f32 * line_height;
            if top + size > rect.y1 {
                let rest = &text[line.start..];
                if rest.trim().is_empty() {
                    return Ok(TextBoxFit::AllDrawn);
                }
                return Ok(TextBoxFit::StoppedAt {
                    offset: line.start,
                    overflow_width: self.fonts.measure(face, rest, size),
                });
            }
            let content = line.slice(text);
            if content.is_empty() {
                continue;
            }
            state.show_text(&mut self.fonts, face, size, rect.x0, top + size * ASCENT_RATIO, content);
            state.blocks.push(TextBlock {
                bbox: Rect::new(rect.x0, top, rect.x0 + line.width, top + line_height),
                text: content.to_string(),
            });
        }
        Ok(TextBoxFit::AllDrawn)
    }

    fn insert_html_box(
        &mut self,
        page: PageHandle,
        rect: Rect,
        html: &str,
        css: &str,
        font: &FontSource,
    ) -> Result<HtmlBoxFit, DocumentError> {
        self.page_mut(page)?;
        let base = self.fonts.register(font)?;
        let HtmlLayout {
            segments,
            rules,
            blocks,
            drawn_text,
            clipped,
        } = layout_html(html, css, rect, Faces::for_base(base), &mut self.fonts)?;

        let state = self
            .pages
            .get_mut(page.index())
            .ok_or(ComposerError::UnknownPage(page))?;
        for segment in &segments {
            state.show_text(
                &mut self.fonts,
                segment.face,
                segment.size,
                segment.x,
                segment.baseline,
                &segment.text,
            );
        }
        for rule in &rules {
            let y = state.flip(rule.y);
            state.ops.push(Operation::new("w", vec![Object::Real(0.5)]));
            state.ops.push(Operation::new("m", vec![rule.x0.into(), y.into()]));
            state.ops.push(Operation::new("l", vec![rule.x1.into(), y.into()]));
            state.ops.push(Operation::new("S", vec![]));
        }
        state.blocks.extend(blocks);
        Ok(if clipped {
            HtmlBoxFit::Clipped { drawn_text }
        } else {
            HtmlBoxFit::AllDrawn
        })
    }

    fn text_blocks(&self, page: PageHandle) -> Result<Vec<TextBlock>, DocumentError> {
        self.pages
            .get(page.index())
            .map(|state| state.blocks.clone())
            .ok_or_else(|| DocumentError::UnknownPage(page))
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn save(self) -> Result<Vec<u8>, DocumentError> {
        Ok(self.finish()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_dummy_pdf, to_bytes};
    use marginalia_traits::SourceDocument;
    use marginalia_types::BuiltinFont;

    fn style(size: f32) -> TextStyle {
        TextStyle {
            font: FontSource::Builtin(BuiltinFont::Helvetica),
            font_size: size,
            line_spacing: 1.0,
        }
    }

    fn page_text(bytes: &[u8], page: u32) -> String {
        let doc = Document::load_mem(bytes).unwrap();
        let page_id = *doc.get_pages().get(&page).unwrap();
        String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
    }

    #[test]
    fn source_page_is_drawn_as_form() {
        let source = LopdfSource::from_document(create_dummy_pdf(2, 612.0, 792.0, "Original"));
        let mut dest = LopdfDestination::new();
        let page = dest.new_page(612.0 * 3.0, 792.0).unwrap();
        dest.show_source_page(page, Rect::new(0.0, 0.0, 612.0, 792.0), &source, 1)
            .unwrap();

        let bytes = dest.save().unwrap();
        let content = page_text(&bytes, 1);
        assert!(content.contains("/P1 Do"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn same_source_page_reuses_its_form() {
        let source = LopdfSource::from_document(create_dummy_pdf(1, 612.0, 792.0, "Original"));
        let mut dest = LopdfDestination::new();
        let rect = Rect::new(0.0, 0.0, 612.0, 792.0);
        let first = dest.new_page(1836.0, 792.0).unwrap();
        dest.show_source_page(first, rect, &source, 0).unwrap();
        let second = dest.new_page(1836.0, 792.0).unwrap();
        dest.show_source_page(second, rect, &source, 0).unwrap();
        assert_eq!(dest.forms.len(), 1);
        assert_eq!(dest.page_count(), 2);
    }

    #[test]
    fn text_box_reports_no_overflow_when_it_fits() {
        let mut dest = LopdfDestination::new();
        let page = dest.new_page(600.0, 800.0).unwrap();
        let rect = Rect::new(10.0, 10.0, 300.0, 200.0);
        let fit = dest
            .insert_text_box(page, rect, "Short note", &style(12.0))
            .unwrap();
        assert_eq!(fit, TextBoxFit::AllDrawn);
        let blocks = dest.text_blocks(page).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "Short note");
        assert_eq!(blocks[0].bbox.y0, 10.0);
    }

    #[test]
    fn text_box_reports_overflow_width() {
        let mut dest = LopdfDestination::new();
        let page = dest.new_page(600.0, 800.0).unwrap();
        // Room for exactly two 10pt lines.
        let rect = Rect::new(0.0, 0.0, 100.0, 25.0);
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda";
        let fit = dest
            .insert_text_box(page, rect, text, &style(10.0))
            .unwrap();
        assert!(fit.overflow_width() > 0.0);
        let blocks = dest.text_blocks(page).unwrap();
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| b.bbox.y1 <= 25.0));

        // Drawing stopped right where the third line starts.
        let TextBoxFit::StoppedAt { offset: stopped, .. } = fit else {
            panic!("expected a stop offset, got {fit:?}");
        };
        let drawn: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(text[..stopped].split_whitespace().collect::<Vec<_>>(), drawn.join(" ").split_whitespace().collect::<Vec<_>>());
        assert!(!text[stopped..].starts_with(' '));
    }

    #[test]
    fn narrow_glyphs_stop_at_the_first_undrawn_word() {
        let mut dest = LopdfDestination::new();
        let page = dest.new_page(600.0, 800.0).unwrap();
        let rect = Rect::new(0.0, 0.0, 120.0, 45.0);
        let text: String = (0..200).map(|i| format!("fil{i}jt ")).collect();
        let fit = dest.insert_text_box(page, rect, &text, &style(10.0)).unwrap();

        let TextBoxFit::StoppedAt { offset: stopped, .. } = fit else {
            panic!("expected a stop offset, got {fit:?}");
        };
        let drawn: String = dest
            .text_blocks(page)
            .unwrap()
            .iter()
            .map(|b| b.text.clone())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(
            drawn.split_whitespace().count(),
            text[..stopped].split_whitespace().count()
        );
        assert!(text[stopped..].starts_with("fil"));
    }

    #[test]
    fn trailing_whitespace_is_not_overflow() {
        let mut dest = LopdfDestination::new();
        let page = dest.new_page(600.0, 800.0).unwrap();
        let rect = Rect::new(0.0, 0.0, 300.0, 12.0);
        let fit = dest
            .insert_text_box(page, rect, "one line\n\n   \n", &style(10.0))
            .unwrap();
        assert_eq!(fit, TextBoxFit::AllDrawn);
    }

    #[test]
    fn html_box_records_blocks_past_the_rect() {
        let mut dest = LopdfDestination::new();
        let page = dest.new_page(600.0, 800.0).unwrap();
        let rect = Rect::new(0.0, 0.0, 200.0, 60.0);
        let html = format!("<p>{}</p>", "lorem ipsum ".repeat(100));
        let fit = dest
            .insert_html_box(page, rect, &html, "body { font-size: 10pt; }", &FontSource::default())
            .unwrap();
        let blocks = dest.text_blocks(page).unwrap();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].bbox.y1 > 60.0);

        let HtmlBoxFit::Clipped { drawn_text } = fit else {
            panic!("expected a clipped box, got {fit:?}");
        };
        let drawn_words = drawn_text.split_whitespace().count();
        assert!(drawn_words > 0 && drawn_words < 200, "{drawn_words} words drawn");
        assert!(drawn_text.starts_with("lorem ipsum"));
    }

    #[test]
    fn html_box_that_fits_says_so() {
        let mut dest = LopdfDestination::new();
        let page = dest.new_page(600.0, 800.0).unwrap();
        let fit = dest
            .insert_html_box(
                page,
                Rect::new(0.0, 0.0, 300.0, 300.0),
                "<ul><li>one</li><li>two</li></ul>",
                "body { font-size: 10pt; }",
                &FontSource::default(),
            )
            .unwrap();
        assert_eq!(fit, HtmlBoxFit::AllDrawn);
    }

    #[test]
    fn html_box_rejects_malformed_markup() {
        let mut dest = LopdfDestination::new();
        let page = dest.new_page(600.0, 800.0).unwrap();
        let result = dest.insert_html_box(
            page,
            Rect::new(0.0, 0.0, 200.0, 60.0),
            "<p>a <b>b</p>",
            "",
            &FontSource::default(),
        );
        assert!(matches!(result, Err(DocumentError::Markup(_))));
    }

    #[test]
    fn unknown_page_is_an_error() {
        let dest = LopdfDestination::new();
        let result = dest.text_blocks(PageHandle::new(3));
        assert!(matches!(result, Err(DocumentError::UnknownPage(_))));
    }

    #[test]
    fn saved_output_loads_back() {
        let source_bytes = to_bytes(create_dummy_pdf(1, 400.0, 500.0, "Original"));
        let source = LopdfSource::from_bytes(&source_bytes).unwrap();
        let geometry = source.page_geometry(0).unwrap();

        let mut dest = LopdfDestination::new();
        let page = dest.new_page(geometry.width * 3.0, geometry.height).unwrap();
        dest.show_source_page(page, Rect::new(0.0, 0.0, 400.0, 500.0), &source, 0)
            .unwrap();
        dest.insert_text_box(page, Rect::new(425.0, 40.0, 700.0, 400.0), "Explanation", &style(11.0))
            .unwrap();

        let bytes = dest.save().unwrap();
        let reloaded = LopdfSource::from_bytes(&bytes).unwrap();
        assert_eq!(reloaded.page_count(), 1);
        assert_eq!(reloaded.page_geometry(0).unwrap().width, 1200.0);
        assert!(page_text(&bytes, 1).contains("(Explanation) Tj"));
    }
}
