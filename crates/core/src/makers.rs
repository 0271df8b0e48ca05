//! Construction of new box, ellipse and text annotations
//!
//! Every maker returns a fully formed annotation with a generated id and a
//! pre-rendered appearance stream. The commands in [`crate::command`] decide
//! where it goes.

use crate::appearance;
use crate::config::EditorConfig;
use airmark_model::{Annotation, AnnotationKind, AnnotationStyle, Appearance, Color, Rect};

fn outlined_style(config: &EditorConfig) -> AnnotationStyle {
    AnnotationStyle {
        stroke: Some(Color::RED),
        fill: Some(Color::LIGHT_GREY),
        border_width: config.border_width,
    }
}

/// Red-bordered, grey-filled rectangle with empty contents.
pub fn make_box(rect: Rect, config: &EditorConfig) -> Annotation {
    let style = outlined_style(config);
    let stream = appearance::box_stream(rect, &style, "", &config.text);
    Annotation::new(AnnotationKind::Square, rect)
        .with_generated_id()
        .with_contents("")
        .with_style(style)
        .with_appearance(Appearance::new(stream))
}

/// Ellipse inscribed in `rect`, widened so `text` fits on one line.
pub fn make_ellipse(rect: Rect, text: &str, config: &EditorConfig) -> Annotation {
    let width = rect.width.max(config.text.text_width(text));
    let rect = Rect::new(rect.x, rect.y, width, rect.height);
    let style = outlined_style(config);
    let stream = appearance::ellipse_stream(rect, &style, text, &config.text);
    Annotation::new(AnnotationKind::Circle, rect)
        .with_generated_id()
        .with_contents(text)
        .with_style(style)
        .with_appearance(Appearance::new(stream))
}

/// Borderless text box. Without an explicit size it is fitted to one line of `text`.
pub fn make_text(x: f32, y: f32, size: Option<(f32, f32)>, text: &str, config: &EditorConfig) -> Annotation {
    let (width, height) =
        size.unwrap_or_else(|| (config.text.text_width(text), config.text.line_height()));
    let rect = Rect::new(x, y, width, height);
    let style = AnnotationStyle { stroke: None, fill: Some(Color::LIGHT_GREY), border_width: 0.0 };
    let stream = appearance::free_text_stream(rect, &style, text, &config.text);
    Annotation::new(AnnotationKind::FreeText, rect)
        .with_generated_id()
        .with_contents(text)
        .with_style(style)
        .with_appearance(Appearance::new(stream))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_keeps_requested_rect() {
        let config = EditorConfig::default();
        let annotation = make_box(Rect::new(10.0, 10.0, 50.0, 20.0), &config);
        assert_eq!(annotation.rect, Rect::new(10.0, 10.0, 50.0, 20.0));
        assert_eq!(annotation.kind, AnnotationKind::Square);
        assert!(annotation.id.is_some());
        assert_eq!(annotation.style.border_width, 6.0);
        assert!(annotation.appearance.is_some());
    }

    #[test]
    fn test_ellipse_widens_for_long_text() {
        let config = EditorConfig::default();
        let text = "a fairly long label";
        let annotation = make_ellipse(Rect::new(0.0, 0.0, 10.0, 30.0), text, &config);
        assert_eq!(annotation.rect.width, config.text.text_width(text));
        assert_eq!(annotation.rect.height, 30.0);
        assert_eq!(annotation.contents.as_deref(), Some(text));
    }

    #[test]
    fn test_ellipse_keeps_width_when_text_fits() {
        let config = EditorConfig::default();
        let annotation = make_ellipse(Rect::new(0.0, 0.0, 400.0, 30.0), "hi", &config);
        assert_eq!(annotation.rect.width, 400.0);
    }

    #[test]
    fn test_text_sized_to_contents_or_box() {
        let config = EditorConfig::default();
        let fitted = make_text(5.0, 6.0, None, "abc", &config);
        assert_eq!(fitted.rect, Rect::new(5.0, 6.0, config.text.text_width("abc"), 20.0));
        assert!(fitted.style.stroke.is_none());

        let boxed = make_text(5.0, 6.0, Some((100.0, 40.0)), "abc", &config);
        assert_eq!(boxed.rect, Rect::new(5.0, 6.0, 100.0, 40.0));
    }
}
