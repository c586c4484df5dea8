use lopdf::content::Content;
use lopdf::{Document as LopdfDocument, Object};
use std::collections::BTreeSet;

/// The strings shown with `Tj` on a page (1-based), in drawing order.
///
/// Text drawn by the composer sits directly in the page content; the copied
/// source page is a Form XObject and does not show up here.
pub fn page_strings(doc: &LopdfDocument, page_number: u32) -> Vec<String> {
    let Some(page_id) = doc.get_pages().get(&page_number).copied() else {
        return Vec::new();
    };
    let Ok(content) = doc.get_page_content(page_id) else {
        return Vec::new();
    };
    let Ok(content) = Content::decode(&content) else {
        return Vec::new();
    };
    content
        .operations
        .iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| match op.operands.first() {
            Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        })
        .collect()
}

pub fn page_text(doc: &LopdfDocument, page_number: u32) -> String {
    page_strings(doc, page_number).join("\n")
}

/// `(width, height)` of a page's MediaBox.
pub fn page_size(doc: &LopdfDocument, page_number: u32) -> Option<(f32, f32)> {
    let page_id = doc.get_pages().get(&page_number).copied()?;
    let page = doc.get_dictionary(page_id).ok()?;
    let media = page.get(b"MediaBox").ok()?.as_array().ok()?;
    let number = |o: &Object| o.as_float().ok().or_else(|| o.as_i64().ok().map(|v| v as f32));
    let values: Vec<f32> = media.iter().filter_map(number).collect();
    match values.as_slice() {
        [x0, y0, x1, y1] => Some((x1 - x0, y1 - y0)),
        _ => None,
    }
}

/// BaseFont names of every font dictionary in the document.
pub fn font_names(doc: &LopdfDocument) -> BTreeSet<String> {
    doc.objects
        .values()
        .filter_map(|object| object.as_dict().ok())
        .filter(|dict| {
            dict.get(b"Type")
                .and_then(Object::as_name)
                .is_ok_and(|name| name == b"Font")
        })
        .filter_map(|dict| dict.get(b"BaseFont").and_then(Object::as_name).ok())
        .map(|name| String::from_utf8_lossy(name).into_owned())
        .collect()
}

/// Assert that a page (1-based) shows specific text
#[macro_export]
macro_rules! assert_page_contains_text {
    ($pdf:expr, $page:expr, $text:expr) => {
        let extracted = $crate::common::pdf_assertions::page_text(&$pdf.doc, $page);
        assert!(
            extracted.contains($text),
            "Page {} should contain '{}', but its text was:\n{}",
            $page,
            $text,
            extracted
        );
    };
}

/// Assert that a page (1-based) shows no composed text at all
#[macro_export]
macro_rules! assert_page_has_no_text {
    ($pdf:expr, $page:expr) => {
        let strings = $crate::common::pdf_assertions::page_strings(&$pdf.doc, $page);
        assert!(strings.is_empty(), "Page {} should have no text, found {:?}", $page, strings);
    };
}

/// Assert the number of pages in a PDF
#[macro_export]
macro_rules! assert_pdf_page_count {
    ($pdf:expr, $count:expr) => {
        assert_eq!(
            $pdf.page_count(),
            $count,
            "Expected {} pages, got {}",
            $count,
            $pdf.page_count()
        );
    };
}
