use lopdf::{Document, Object, ObjectId};
use rustc_hash::FxHashMap;

/// Deep-copies objects from one document into another.
///
/// The id map is borrowed so that objects shared between several source
/// pages, fonts in particular, are copied once per destination.
pub(crate) struct ObjectCopier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    id_map: &'a mut FxHashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    pub(crate) fn new(
        source: &'a Document,
        target: &'a mut Document,
        id_map: &'a mut FxHashMap<ObjectId, ObjectId>,
    ) -> Self {
        Self {
            source,
            target,
            id_map,
        }
    }

    pub(crate) fn copy_object(&mut self, source_id: ObjectId) -> Result<ObjectId, lopdf::Error> {
        if let Some(target_id) = self.id_map.get(&source_id) {
            return Ok(*target_id);
        }

        // Reserve the id before recursing so reference cycles terminate.
        let new_id = self.target.add_object(Object::Null);
        self.id_map.insert(source_id, new_id);

        let obj = self.source.get_object(source_id)?.clone();
        let new_obj = self.copy_value(obj)?;

        match self.target.objects.get_mut(&new_id) {
            Some(slot) => *slot = new_obj,
            None => return Err(lopdf::Error::ObjectNotFound(new_id)),
        }
        Ok(new_id)
    }

    /// Copies an inline value, following every reference it holds.
    ///
    /// `/Parent` links are dropped: they point back into the source page
    /// tree, which is never wanted in the destination.
    pub(crate) fn copy_value(&mut self, obj: Object) -> Result<Object, lopdf::Error> {
        match obj {
            Object::Reference(id) => Ok(Object::Reference(self.copy_object(id)?)),
            Object::Array(items) => Ok(Object::Array(
                items
                    .into_iter()
                    .map(|o| self.copy_value(o))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Object::Dictionary(mut dict) => {
                dict.remove(b"Parent");
                for (_, value) in dict.iter_mut() {
                    *value = self.copy_value(std::mem::replace(value, Object::Null))?;
                }
                Ok(Object::Dictionary(dict))
            }
            Object::Stream(mut stream) => {
                stream.dict.remove(b"Parent");
                for (_, value) in stream.dict.iter_mut() {
                    *value = self.copy_value(std::mem::replace(value, Object::Null))?;
                }
                Ok(Object::Stream(stream))
            }
            other => Ok(other),
        }
    }
}
