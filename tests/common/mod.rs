pub mod pdf_assertions;

use lopdf::content::{Content, Operation};
use lopdf::{Document as LopdfDocument, Object, Stream, StringFormat, dictionary};
use marginalia::{ComposeOptions, CompositionReport, ExplanationMap, compose_pdf};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A source PDF with `num_pages` pages of the given size, each showing
/// "`text_prefix` N". `rotation` is applied to every page.
pub fn create_dummy_pdf(num_pages: u32, width: f32, height: f32, text_prefix: &str, rotation: i64) -> Vec<u8> {
    let mut doc = LopdfDocument::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Times-Roman",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut page_ids = vec![];
    for i in 1..=num_pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), (height - 72.0).into()]),
                Operation::new(
                    "Tj",
                    vec![Object::String(format!("{text_prefix} {i}").into_bytes(), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
            "Rotate" => rotation,
        });
        page_ids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => num_pages as i64,
        }
        .into(),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Deterministic text of numbered words, so no two slices are equal.
pub fn numbered_words(chars: usize) -> String {
    let mut text = String::with_capacity(chars + 16);
    let mut i = 0;
    while text.len() < chars {
        text.push_str(&format!("word{i} "));
        i += 1;
    }
    text.truncate(chars);
    text
}

pub fn explanations(entries: &[(usize, &str)]) -> ExplanationMap {
    entries.iter().map(|(i, t)| (*i, t.to_string())).collect()
}

/// Wrapper around a composed PDF with helper methods
pub struct ComposedPdf {
    pub bytes: Vec<u8>,
    pub doc: LopdfDocument,
    pub report: CompositionReport,
}

impl ComposedPdf {
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Save PDF to a file for manual debugging
    #[allow(dead_code)]
    pub fn save_for_debug(&self, name: &str) -> std::io::Result<()> {
        std::fs::write(format!("test_output_{}.pdf", name), &self.bytes)
    }
}

/// Composes `source` with `options` and loads the result back.
pub fn compose(
    source: &[u8],
    map: &ExplanationMap,
    options: ComposeOptions,
) -> Result<ComposedPdf, Box<dyn std::error::Error>> {
    let (bytes, report) = compose_pdf(source, map, options)?;
    let doc = LopdfDocument::load_mem(&bytes)?;
    Ok(ComposedPdf { bytes, doc, report })
}
