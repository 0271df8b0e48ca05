use serde::{Deserialize, Serialize};

pub type AnnotationId = uuid::Uuid;

pub fn new_annotation_id() -> AnnotationId {
    AnnotationId::new_v4()
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: usize, page_count: usize },
}

/// Axis-aligned rectangle in page space: lower-left corner plus extent.
///
/// Origin is the bottom-left of the page, Y grows upward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn upper_right(&self) -> (f32, f32) {
        (self.x + self.width, self.y + self.height)
    }

    /// Inclusive containment. Negative extents are treated like their mirrored positive form.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        let (urx, ury) = self.upper_right();
        let (min_x, max_x) = (self.x.min(urx), self.x.max(urx));
        let (min_y, max_y) = (self.y.min(ury), self.y.max(ury));
        x >= min_x && x <= max_x && y >= min_y && y <= max_y
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const RED: Color = Color { r: 1.0, g: 0.0, b: 0.0 };
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };
    pub const LIGHT_GREY: Color = Color { r: 0.8, g: 0.8, b: 0.8 };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationKind {
    Square,
    Circle,
    FreeText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationStyle {
    pub stroke: Option<Color>,
    pub fill: Option<Color>,
    pub border_width: f32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self { stroke: Some(Color::BLACK), fill: None, border_width: 1.0 }
    }
}

/// Pre-rendered appearance payload (a content stream). Opaque to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    pub stream: String,
}

impl Appearance {
    pub fn new(stream: impl Into<String>) -> Self {
        Self { stream: stream.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub id: Option<AnnotationId>,
    pub kind: AnnotationKind,
    pub rect: Rect,
    #[serde(default)]
    pub contents: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub style: AnnotationStyle,
    #[serde(default)]
    pub appearance: Option<Appearance>,
}

impl Annotation {
    /// An annotation without an id; one is assigned when it is first selected or deleted.
    pub fn new(kind: AnnotationKind, rect: Rect) -> Self {
        Self {
            id: None,
            kind,
            rect,
            contents: None,
            hidden: false,
            read_only: false,
            style: AnnotationStyle::default(),
            appearance: None,
        }
    }

    pub fn with_generated_id(mut self) -> Self {
        self.id = Some(new_annotation_id());
        self
    }

    pub fn with_contents(mut self, contents: impl Into<String>) -> Self {
        self.contents = Some(contents.into());
        self
    }

    pub fn with_style(mut self, style: AnnotationStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_appearance(mut self, appearance: Appearance) -> Self {
        self.appearance = Some(appearance);
        self
    }

    /// Returns the id, assigning a fresh one first if absent.
    pub fn ensure_id(&mut self) -> AnnotationId {
        *self.id.get_or_insert_with(new_annotation_id)
    }

    pub fn is_same_entity(&self, id: AnnotationId) -> bool {
        self.id == Some(id)
    }

    /// Hidden or read-only annotations never take part in hit-testing.
    pub fn is_hittable(&self) -> bool {
        !self.hidden && !self.read_only
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl Default for PageSize {
    fn default() -> Self {
        Self { width_pt: 612.0, height_pt: 792.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub size: PageSize,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Page {
    /// Index of the top-most hittable annotation containing the point.
    ///
    /// Later entries are drawn on top, so the scan runs last to first.
    pub fn annotation_index_at(&self, x: f32, y: f32) -> Option<usize> {
        self.annotations
            .iter()
            .rposition(|annotation| annotation.is_hittable() && annotation.rect.contains(x, y))
    }

    pub fn annotation_at(&self, x: f32, y: f32) -> Option<&Annotation> {
        self.annotation_index_at(x, y).map(|index| &self.annotations[index])
    }

    pub fn find(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|annotation| annotation.is_same_entity(id))
    }

    pub fn find_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|annotation| annotation.is_same_entity(id))
    }

    /// Give every annotation on the page an id.
    pub fn ensure_ids(&mut self) {
        for annotation in &mut self.annotations {
            annotation.ensure_id();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    pub fn with_blank_pages(count: usize) -> Self {
        Self { pages: (0..count).map(|_| Page::default()).collect() }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.get_mut(index)
    }

    /// Swap in a new annotation list for a page and hand back the previous one.
    pub fn replace_annotations(
        &mut self,
        index: usize,
        annotations: Vec<Annotation>,
    ) -> Result<Vec<Annotation>, ModelError> {
        let page_count = self.page_count();
        let page =
            self.pages.get_mut(index).ok_or(ModelError::PageOutOfRange { page: index, page_count })?;
        Ok(std::mem::replace(&mut page.annotations, annotations))
    }

    pub fn annotation_count(&self) -> usize {
        self.pages.iter().map(|page| page.annotations.len()).sum()
    }
}
