use std::path::PathBuf;

use crate::{
    clock::Millis,
    emotion::Emotion,
    garden::INK,
    render::{Canvas, GradientStop, Paint, TextAlign, TextStyle},
    types::{Rect, Rgba, Vec2},
};

use super::{Aspect, ExportError, ExportResult, ExportSink, Typeface, rasterize_card};

const PADDING: f32 = 80.0;
const LINE_HEIGHT: f32 = 1.6;
const WATERMARK_BOTTOM: f32 = 40.0;

/// Four-stop background for the thought card, light to saturated and back.
pub fn thought_gradient(emotion: Emotion) -> [Rgba; 4] {
    let hex = |v: u32| Rgba::rgb8((v >> 16) as u8, (v >> 8) as u8, v as u8);
    let [a, b, c, d] = match emotion {
        Emotion::Joy => [0xFFF9F0, 0xFFE4B0, 0xFFF0E0, 0xFFFAF5],
        Emotion::Peace => [0xF5FFF8, 0xC4E8DC, 0xE8FFF0, 0xF8FFFA],
        Emotion::Melancholy => [0xF0F8FF, 0xB4D4E8, 0xE0F0FF, 0xF5FAFF],
        Emotion::Anxiety => [0xFFFAF5, 0xE8D4C4, 0xFFF5E8, 0xFFFCF8],
        Emotion::Anger => [0xFFF5F5, 0xE8B4B4, 0xFFE8E8, 0xFFFAFA],
        Emotion::Love => [0xFFF5F8, 0xF0C4D8, 0xFFE8F0, 0xFFFAFC],
        Emotion::Confusion => [0xFAF5FF, 0xD4C4E8, 0xF0E8FF, 0xFCFAFF],
    };
    [hex(a), hex(b), hex(c), hex(d)]
}

fn text_size(aspect: Aspect) -> f32 {
    match aspect {
        Aspect::Square => 36.0,
        Aspect::Story => 48.0,
    }
}

/// Greedy word wrap against the face's measured widths. Explicit newlines
/// are kept; words wider than a line are split between characters.
pub fn wrap_text(text: &str, max_width: f32, size: f32, face: &dyn Typeface) -> Vec<String> {
    let fits = |line: &str| face.measure(line, size) <= max_width;
    let mut lines = Vec::new();
    for paragraph in text.trim().lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };
            if fits(&candidate) {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            for ch in word.chars() {
                line.push(ch);
                if line.chars().count() > 1 && !fits(&line) {
                    line.pop();
                    lines.push(std::mem::take(&mut line));
                    line.push(ch);
                }
            }
        }
        lines.push(line);
    }
    lines
}

/// Diagonal gradient running top-left to bottom-right across the whole card.
fn diagonal(width: f32, height: f32, colors: [Rgba; 4]) -> Paint {
    let center = Vec2::new(width / 2.0, height / 2.0);
    let half = (width + height) * std::f32::consts::FRAC_1_SQRT_2 / 2.0;
    let dir = Vec2::new(1.0, 1.0).normalize();
    Paint::linear(
        center - dir * half,
        center + dir * half,
        vec![
            GradientStop::new(0.0, colors[0]),
            GradientStop::new(0.3, colors[1]),
            GradientStop::new(0.7, colors[2]),
            GradientStop::new(1.0, colors[3]),
        ],
    )
}

pub fn draw_thought_card(
    canvas: &mut dyn Canvas,
    content: &str,
    emotion: Emotion,
    aspect: Aspect,
    face: &dyn Typeface,
) {
    let (width, height) = aspect.size();
    canvas.fill_rect(
        Rect::new(0.0, 0.0, width, height),
        &diagonal(width, height, thought_gradient(emotion)),
    );

    let size = text_size(aspect);
    let lines = wrap_text(content, width - 2.0 * PADDING, size, face);
    let leading = size * LINE_HEIGHT;
    let block = leading * lines.len() as f32;
    let first_baseline = (height - block) / 2.0 + leading / 2.0 + size * 0.35;
    let style = TextStyle::new(size, INK).align(TextAlign::Center);
    for (i, line) in lines.iter().enumerate() {
        canvas.fill_text(
            line,
            Vec2::new(width / 2.0, first_baseline + i as f32 * leading),
            &style,
        );
    }

    canvas.fill_text(
        "udyāna",
        Vec2::new(width / 2.0, height - WATERMARK_BOTTOM),
        &TextStyle::new(14.0, INK.with_alpha(0.3)).align(TextAlign::Center),
    );
}

/// Renders the draft as a share card. Blank content exports nothing; a
/// missing typeface is an error.
pub fn export_thought(
    content: &str,
    emotion: Emotion,
    aspect: Aspect,
    now: Millis,
    face: Option<&dyn Typeface>,
    sink: &mut dyn ExportSink,
) -> ExportResult<Option<PathBuf>> {
    if content.trim().is_empty() {
        return Ok(None);
    }
    let face = face.ok_or(ExportError::NoFont)?;
    let card = rasterize_card(format!("udyana-{aspect}-{now}.png"), aspect, face, |canvas| {
        draw_thought_card(canvas, content, emotion, aspect, face)
    })?;
    sink.deliver(&card).map(Some)
}
