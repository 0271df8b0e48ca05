//! Selection model and point hit-testing

use airmark_model::{Annotation, AnnotationId, Document, Rect};

/// Identity of an annotation: the page it lives on plus its id.
///
/// Replay commands hold these instead of references so that the same
/// logical annotation is affected even after its list has been replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnnotationRef {
    pub page: usize,
    pub id: AnnotationId,
}

impl AnnotationRef {
    pub fn new(page: usize, id: AnnotationId) -> Self {
        Self { page, id }
    }

    pub fn resolve<'a>(&self, document: &'a Document) -> Option<&'a Annotation> {
        document.page(self.page)?.find(self.id)
    }

    pub fn resolve_mut<'a>(&self, document: &'a mut Document) -> Option<&'a mut Annotation> {
        document.page_mut(self.page)?.find_mut(self.id)
    }
}

/// Top-most hittable annotation on `page` containing the point.
pub fn hit_test(document: &Document, page: usize, x: f32, y: f32) -> Option<&Annotation> {
    document.page(page)?.annotation_at(x, y)
}

/// Set of selected annotations, kept in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    entries: Vec<AnnotationRef>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: AnnotationId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    /// Adds `entry` unless its id is already present. Returns whether it was added.
    pub fn insert(&mut self, entry: AnnotationRef) -> bool {
        if self.contains(entry.id) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn refs(&self) -> &[AnnotationRef] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnnotationRef> {
        self.entries.iter()
    }

    /// The selected annotation when exactly one is selected.
    pub fn single(&self) -> Option<AnnotationRef> {
        match self.entries.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Hit-test `page` at the point and add the result to the selection.
    ///
    /// An id is assigned to the hit annotation if it has none. Returns true
    /// only when the selection grew.
    pub fn extend_at(&mut self, document: &mut Document, page: usize, x: f32, y: f32) -> bool {
        let Some(target) = document.page_mut(page) else {
            return false;
        };
        let Some(index) = target.annotation_index_at(x, y) else {
            return false;
        };

        let candidate = &mut target.annotations[index];
        if candidate.id.is_some_and(|id| self.contains(id)) {
            return false;
        }
        let id = candidate.ensure_id();
        self.insert(AnnotationRef::new(page, id))
    }

    /// Drop entries whose annotation is no longer in the document.
    pub fn retain_existing(&mut self, document: &Document) {
        self.entries.retain(|entry| entry.resolve(document).is_some());
    }

    pub fn rects(&self, document: &Document) -> Vec<Rect> {
        self.entries.iter().filter_map(|entry| entry.resolve(document)).map(|a| a.rect).collect()
    }

    pub fn contents(&self, document: &Document) -> Vec<Option<String>> {
        self.entries
            .iter()
            .filter_map(|entry| entry.resolve(document))
            .map(|a| a.contents.clone())
            .collect()
    }
}
