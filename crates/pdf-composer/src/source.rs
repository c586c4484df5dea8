use crate::error::ComposerError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use marginalia_traits::{DocumentError, SourceDocument};
use marginalia_types::{PageGeometry, Rect};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Page attributes may be inherited through at most this many `/Parent` links.
const MAX_INHERITANCE_DEPTH: usize = 32;

const LETTER: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

static NEXT_SOURCE_ID: AtomicUsize = AtomicUsize::new(1);

/// A PDF opened for reading with lopdf.
pub struct LopdfSource {
    doc: Document,
    pages: Vec<ObjectId>,
    id: usize,
}

impl LopdfSource {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        Document::load_mem(bytes)
            .map(Self::from_document)
            .map_err(|e| DocumentError::Load(e.to_string()))
    }

    pub fn from_document(doc: Document) -> Self {
        let pages = doc.get_pages().into_values().collect();
        Self {
            doc,
            pages,
            id: NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Process-unique identity, used to key per-source caches.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub(crate) fn page_id(&self, index: usize) -> Result<ObjectId, ComposerError> {
        self.pages
            .get(index)
            .copied()
            .ok_or(ComposerError::PageOutOfRange {
                index,
                count: self.pages.len(),
            })
    }

    /// Looks `key` up on the page, then on its ancestors.
    pub(crate) fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut dict: &Dictionary = self.doc.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(value) = dict.get(key) {
                return Some(value);
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    /// The page's MediaBox as `[x0, y0, x1, y1]`, normalized so that
    /// `x0 <= x1` and `y0 <= y1`. Letter size when missing or malformed.
    pub(crate) fn media_box(&self, page_id: ObjectId) -> [f32; 4] {
        let Some(value) = self.inherited(page_id, b"MediaBox") else {
            return LETTER;
        };
        let values: Option<Vec<f32>> = self
            .resolve(value)
            .as_array()
            .ok()
            .map(|items| items.iter().filter_map(|o| self.resolve(o).as_float().ok()).collect());
        match values.as_deref() {
            Some([a, b, c, d]) => [a.min(*c), b.min(*d), a.max(*c), b.max(*d)],
            _ => LETTER,
        }
    }

    pub(crate) fn media_rect(&self, page_id: ObjectId) -> Rect {
        let [x0, y0, x1, y1] = self.media_box(page_id);
        Rect::new(x0, y0, x1, y1)
    }

    /// The page's resource dictionary, possibly inherited.
    pub(crate) fn resources(&self, page_id: ObjectId) -> Option<Object> {
        self.inherited(page_id, b"Resources").cloned()
    }

    pub(crate) fn rotation(&self, page_id: ObjectId) -> i32 {
        self.inherited(page_id, b"Rotate")
            .and_then(|o| self.resolve(o).as_i64().ok())
            .unwrap_or(0) as i32
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            other => other,
        }
    }
}

impl SourceDocument for LopdfSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_geometry(&self, index: usize) -> Result<PageGeometry, DocumentError> {
        let page_id = self.page_id(index)?;
        let rect = self.media_rect(page_id);
        Ok(PageGeometry::new(rect.width(), rect.height()).with_rotation(self.rotation(page_id)))
    }

    fn set_rotation(&mut self, index: usize, degrees: i32) -> Result<(), DocumentError> {
        let page_id = self.page_id(index)?;
        let page = self
            .doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(ComposerError::from)?;
        page.set("Rotate", degrees.rem_euclid(360) as i64);
        Ok(())
    }
}
