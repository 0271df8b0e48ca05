//! Appearance streams for annotations
//!
//! New annotations get a small pre-rendered content stream so that viewers
//! can draw them without regenerating anything. When an annotation's text
//! changes, an [`AppearanceRewriter`] keeps that stream consistent with the
//! new contents.
//!
//! The engine treats the rewrite as a side effect: failures are logged by the
//! caller and never turn a successful text change into a failed command.

use crate::config::TextMetrics;
use airmark_model::{Annotation, AnnotationStyle, Color, Rect};
use std::fmt::Write as _;
use std::ops::Range;

/// Errors raised while rewriting an appearance stream
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppearanceError {
    #[error("unterminated string starting at byte {0}")]
    UnterminatedString(usize),
    #[error("unbalanced array closing at byte {0}")]
    UnbalancedArray(usize),
}

/// Collaborator that rewrites an annotation's appearance to match new text.
pub trait AppearanceRewriter {
    fn rewrite(&self, annotation: &mut Annotation, text: &str) -> Result<(), AppearanceError>;
}

/// Replaces the operand of every `Tj` and every string inside `TJ` arrays.
///
/// Annotations without an appearance are left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextOperatorRewriter;

impl AppearanceRewriter for TextOperatorRewriter {
    fn rewrite(&self, annotation: &mut Annotation, text: &str) -> Result<(), AppearanceError> {
        let Some(appearance) = annotation.appearance.as_mut() else {
            return Ok(());
        };
        appearance.stream = replace_shown_text(&appearance.stream, text)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Str(Range<usize>),
    ArrayStart,
    ArrayEnd,
    Word(&'a str),
}

/// Rewrite the text-showing operands of a content stream.
pub fn replace_shown_text(stream: &str, text: &str) -> Result<String, AppearanceError> {
    let tokens = tokenize(stream)?;
    let mut targets: Vec<Range<usize>> = Vec::new();
    let mut array_starts: Vec<usize> = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        match token {
            Token::ArrayStart => array_starts.push(index),
            Token::ArrayEnd => {
                array_starts.pop();
            }
            Token::Word("Tj") => {
                if let Some(Token::Str(span)) = index.checked_sub(1).map(|i| &tokens[i]) {
                    targets.push(span.clone());
                }
            }
            Token::Word("TJ") => {
                if let Some(Token::ArrayEnd) = index.checked_sub(1).map(|i| &tokens[i]) {
                    let start = matching_array_start(&tokens, index - 1);
                    targets.extend(tokens[start..index].iter().filter_map(|t| match t {
                        Token::Str(span) => Some(span.clone()),
                        _ => None,
                    }));
                }
            }
            _ => {}
        }
    }

    let replacement = literal_string(text);
    let mut output = String::with_capacity(stream.len());
    let mut cursor = 0;
    for span in targets {
        if span.start < cursor {
            continue;
        }
        output.push_str(&stream[cursor..span.start]);
        output.push_str(&replacement);
        cursor = span.end;
    }
    output.push_str(&stream[cursor..]);
    Ok(output)
}

fn matching_array_start(tokens: &[Token<'_>], end: usize) -> usize {
    let mut depth = 0usize;
    for index in (0..=end).rev() {
        match tokens[index] {
            Token::ArrayEnd => depth += 1,
            Token::ArrayStart => {
                depth -= 1;
                if depth == 0 {
                    return index;
                }
            }
            _ => {}
        }
    }
    0
}

fn tokenize(stream: &str) -> Result<Vec<Token<'_>>, AppearanceError> {
    let bytes = stream.as_bytes();
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b if b.is_ascii_whitespace() => i += 1,
            b'%' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'(' => {
                let end = literal_string_end(bytes, i)?;
                tokens.push(Token::Str(i..end));
                i = end;
            }
            b'<' if bytes.get(i + 1) == Some(&b'<') => {
                tokens.push(Token::Word("<<"));
                i += 2;
            }
            b'>' if bytes.get(i + 1) == Some(&b'>') => {
                tokens.push(Token::Word(">>"));
                i += 2;
            }
            b'<' => {
                let end = bytes[i..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map(|offset| i + offset + 1)
                    .ok_or(AppearanceError::UnterminatedString(i))?;
                tokens.push(Token::Str(i..end));
                i = end;
            }
            b'[' => {
                depth += 1;
                tokens.push(Token::ArrayStart);
                i += 1;
            }
            b']' => {
                if depth == 0 {
                    return Err(AppearanceError::UnbalancedArray(i));
                }
                depth -= 1;
                tokens.push(Token::ArrayEnd);
                i += 1;
            }
            _ => {
                let start = i;
                while i < bytes.len() && !is_delimiter(bytes[i]) {
                    i += 1;
                }
                if start == i {
                    // A lone delimiter such as `)` or `{`
                    i += 1;
                }
                tokens.push(Token::Word(&stream[start..i]));
            }
        }
    }

    Ok(tokens)
}

fn is_delimiter(byte: u8) -> bool {
    byte.is_ascii_whitespace() || b"()<>[]{}/%".contains(&byte)
}

/// Byte offset one past the `)` closing the literal string that opens at `start`.
fn literal_string_end(bytes: &[u8], start: usize) -> Result<usize, AppearanceError> {
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(AppearanceError::UnterminatedString(start))
}

/// Encode `text` as a literal string operand, escaping delimiters.
pub fn literal_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('(');
    for ch in text.chars() {
        match ch {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(ch);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out.push(')');
    out
}

fn fmt_num(value: f32) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

fn set_color(out: &mut String, color: Color, operator: &str) {
    let _ = writeln!(out, "{} {} {} {operator}", fmt_num(color.r), fmt_num(color.g), fmt_num(color.b));
}

fn show_text(out: &mut String, x: f32, y: f32, text: &str, color: Color, metrics: &TextMetrics) {
    out.push_str("BT\n");
    let _ = writeln!(out, "/Helv {} Tf", fmt_num(metrics.font_size));
    set_color(out, color, "rg");
    let _ = writeln!(out, "{} {} Td", fmt_num(x), fmt_num(y));
    let _ = writeln!(out, "{} Tj", literal_string(text));
    out.push_str("ET\n");
}

fn paint_operator(style: &AnnotationStyle) -> &'static str {
    match (style.fill.is_some(), style.stroke.is_some()) {
        (true, true) => "B",
        (true, false) => "f",
        (false, true) => "S",
        (false, false) => "n",
    }
}

fn begin_paint(out: &mut String, style: &AnnotationStyle) {
    out.push_str("q\n");
    let _ = writeln!(out, "{} w", fmt_num(style.border_width));
    if let Some(fill) = style.fill {
        set_color(out, fill, "rg");
    }
    if let Some(stroke) = style.stroke {
        set_color(out, stroke, "RG");
    }
}

/// Rectangle outline and fill with the contents centred vertically.
pub fn box_stream(rect: Rect, style: &AnnotationStyle, text: &str, metrics: &TextMetrics) -> String {
    let mut out = String::new();
    begin_paint(&mut out, style);
    let _ = writeln!(
        out,
        "{} {} {} {} re",
        fmt_num(rect.x),
        fmt_num(rect.y),
        fmt_num(rect.width),
        fmt_num(rect.height)
    );
    let _ = writeln!(out, "{}", paint_operator(style));
    let text_color = style.stroke.unwrap_or(Color::BLACK);
    let baseline = rect.y + rect.height * 0.5 - metrics.font_size * 0.5;
    show_text(&mut out, rect.x, baseline, text, text_color, metrics);
    out.push_str("Q\n");
    out
}

/// Ellipse inscribed in `rect`, drawn as four Bezier quadrants.
pub fn ellipse_stream(
    rect: Rect,
    style: &AnnotationStyle,
    text: &str,
    metrics: &TextMetrics,
) -> String {
    let (x, y, w, h) = (rect.x, rect.y, rect.width, rect.height);
    let mut out = String::new();
    begin_paint(&mut out, style);

    let point = |px: f32, py: f32| format!("{} {}", fmt_num(px), fmt_num(py));
    let _ = writeln!(out, "{} m", point(x, y + h * 0.5));
    let quadrants = [
        [(x, y + h * 0.75), (x + w * 0.25, y + h), (x + w * 0.5, y + h)],
        [(x + w * 0.75, y + h), (x + w, y + h * 0.75), (x + w, y + h * 0.5)],
        [(x + w, y + h * 0.25), (x + w * 0.75, y), (x + w * 0.5, y)],
        [(x + w * 0.25, y), (x, y + h * 0.25), (x, y + h * 0.5)],
    ];
    for [c1, c2, end] in quadrants {
        let _ = writeln!(out, "{} {} {} c", point(c1.0, c1.1), point(c2.0, c2.1), point(end.0, end.1));
    }
    let _ = writeln!(out, "{}", paint_operator(style));

    let baseline = y + h * 0.5 - metrics.font_size * 0.5;
    show_text(&mut out, x + style.border_width, baseline, text, Color::BLACK, metrics);
    out.push_str("Q\n");
    out
}

/// Filled text box without a border.
pub fn free_text_stream(
    rect: Rect,
    style: &AnnotationStyle,
    text: &str,
    metrics: &TextMetrics,
) -> String {
    let mut out = String::new();
    out.push_str("q\n");
    if let Some(fill) = style.fill {
        set_color(&mut out, fill, "rg");
        let _ = writeln!(
            out,
            "{} {} {} {} re",
            fmt_num(rect.x),
            fmt_num(rect.y),
            fmt_num(rect.width),
            fmt_num(rect.height)
        );
        out.push_str("f\n");
    }
    let baseline = rect.y + rect.height * 0.5 - metrics.font_size * 0.5;
    show_text(&mut out, rect.x, baseline, text, Color::RED, metrics);
    out.push_str("Q\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use airmark_model::{Appearance, AnnotationKind};

    #[test]
    fn test_tj_operand_is_replaced() {
        let stream = "BT\n/Helv 16 Tf\n10 10 Td\n(old text) Tj\nET\n";
        let rewritten = replace_shown_text(stream, "new").unwrap();
        assert_eq!(rewritten, "BT\n/Helv 16 Tf\n10 10 Td\n(new) Tj\nET\n");
    }

    #[test]
    fn test_tj_array_strings_are_replaced() {
        let stream = "BT [(Hel) -20 (lo)] TJ ET";
        let rewritten = replace_shown_text(stream, "x").unwrap();
        assert_eq!(rewritten, "BT [(x) -20 (x)] TJ ET");
    }

    #[test]
    fn test_nested_and_escaped_parentheses() {
        let stream = r"(a (nested) \) string) Tj (untouched)";
        let rewritten = replace_shown_text(stream, "b(c").unwrap();
        assert_eq!(rewritten, r"(b\(c) Tj (untouched)");
    }

    #[test]
    fn test_hex_string_operand_is_replaced() {
        let stream = "<48656c6c6f> Tj";
        assert_eq!(replace_shown_text(stream, "hi").unwrap(), "(hi) Tj");
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        let err = replace_shown_text("BT (broken Tj ET", "x").unwrap_err();
        assert_eq!(err, AppearanceError::UnterminatedString(3));
    }

    #[test]
    fn test_unbalanced_array_is_an_error() {
        let err = replace_shown_text("(a) ] TJ", "x").unwrap_err();
        assert_eq!(err, AppearanceError::UnbalancedArray(4));
    }

    #[test]
    fn test_generated_box_stream_can_be_rewritten() {
        let metrics = TextMetrics::default();
        let style = AnnotationStyle { stroke: Some(Color::RED), fill: Some(Color::LIGHT_GREY), border_width: 6.0 };
        let stream = box_stream(Rect::new(10.0, 10.0, 50.0, 20.0), &style, "", &metrics);
        assert!(stream.contains("10 10 50 20 re"));
        assert!(stream.contains("() Tj"));
        assert!(stream.contains("\nB\n"));

        let mut annotation = Annotation::new(AnnotationKind::Square, Rect::new(10.0, 10.0, 50.0, 20.0))
            .with_appearance(Appearance::new(stream));
        TextOperatorRewriter.rewrite(&mut annotation, "Hello").unwrap();
        let appearance = annotation.appearance.unwrap();
        assert!(appearance.stream.contains("(Hello) Tj"));
    }

    #[test]
    fn test_rewriter_ignores_missing_appearance() {
        let mut annotation = Annotation::new(AnnotationKind::Circle, Rect::new(0.0, 0.0, 1.0, 1.0));
        assert!(TextOperatorRewriter.rewrite(&mut annotation, "x").is_ok());
        assert!(annotation.appearance.is_none());
    }

    #[test]
    fn test_ellipse_stream_has_four_curves() {
        let style = AnnotationStyle::default();
        let stream = ellipse_stream(Rect::new(0.0, 0.0, 40.0, 20.0), &style, "hi", &TextMetrics::default());
        assert_eq!(stream.matches(" c\n").count(), 4);
        assert!(stream.starts_with("q\n"));
        assert!(stream.contains("(hi) Tj"));
    }
}
