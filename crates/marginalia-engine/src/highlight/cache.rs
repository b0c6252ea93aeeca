use std::collections::HashMap;

use uuid::Uuid;

use crate::models::Anchor;

/// In-memory store of every anchor the highlighter has rendered or restored.
///
/// Keyed by highlight id; saving an anchor with a known id replaces it. Only the
/// highlighter mutates the cache, callers get read access.
#[derive(Debug, Clone, Default)]
pub struct AnnotationCache {
    anchors: HashMap<Uuid, Anchor>,
}

impl AnnotationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn save(&mut self, anchor: Anchor) {
        self.anchors.insert(anchor.id(), anchor);
    }

    pub(crate) fn save_all(&mut self, anchors: impl IntoIterator<Item = Anchor>) {
        for anchor in anchors {
            self.save(anchor);
        }
    }

    pub(crate) fn remove(&mut self, id: &Uuid) -> Option<Anchor> {
        self.anchors.remove(id)
    }

    /// Drop everything, returning the ids that were cached
    pub(crate) fn remove_all(&mut self) -> Vec<Uuid> {
        self.anchors.drain().map(|(id, _)| id).collect()
    }

    pub fn get(&self, id: &Uuid) -> Option<&Anchor> {
        self.anchors.get(id)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.anchors.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Class names recorded for `id`, if it is cached
    pub fn class_names(&self, id: &Uuid) -> Option<Vec<String>> {
        self.get(id).map(|anchor| anchor.class_names().to_vec())
    }
}
