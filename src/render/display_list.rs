use super::{BlendMode, Canvas, Paint, Path, TextStyle, Transform};
use crate::types::{Rect, Vec2};

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Save,
    Restore,
    Transform(Transform),
    Blend(BlendMode),
    Clip(Rect),
    Fill { path: Path, paint: Paint },
    Stroke { path: Path, paint: Paint, width: f32 },
    Text { text: String, at: Vec2, style: TextStyle },
}

/// Records every call so a frame can be inspected or replayed elsewhere.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayList {
    width: f32,
    height: f32,
    ops: Vec<DrawOp>,
}

impl DisplayList {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn fills(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Fill { .. }))
            .count()
    }

    pub fn strokes(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Stroke { .. }))
            .count()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn replay(&self, canvas: &mut dyn Canvas) {
        for op in &self.ops {
            match op {
                DrawOp::Save => canvas.save(),
                DrawOp::Restore => canvas.restore(),
                DrawOp::Transform(t) => canvas.transform(*t),
                DrawOp::Blend(mode) => canvas.set_blend(*mode),
                DrawOp::Clip(rect) => canvas.clip_rect(*rect),
                DrawOp::Fill { path, paint } => canvas.fill_path(path, paint),
                DrawOp::Stroke { path, paint, width } => canvas.stroke_path(path, paint, *width),
                DrawOp::Text { text, at, style } => canvas.fill_text(text, *at, style),
            }
        }
    }
}

impl Canvas for DisplayList {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn save(&mut self) {
        self.ops.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        self.ops.push(DrawOp::Restore);
    }

    fn transform(&mut self, t: Transform) {
        self.ops.push(DrawOp::Transform(t));
    }

    fn set_blend(&mut self, mode: BlendMode) {
        self.ops.push(DrawOp::Blend(mode));
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.ops.push(DrawOp::Clip(rect));
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint) {
        self.ops.push(DrawOp::Fill {
            path: path.clone(),
            paint: paint.clone(),
        });
    }

    fn stroke_path(&mut self, path: &Path, paint: &Paint, width: f32) {
        self.ops.push(DrawOp::Stroke {
            path: path.clone(),
            paint: paint.clone(),
            width,
        });
    }

    fn fill_text(&mut self, text: &str, at: Vec2, style: &TextStyle) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            at,
            style: style.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PixelCanvas;
    use crate::types::Rgba;

    fn sample(canvas: &mut dyn Canvas) {
        canvas.save();
        canvas.translate(4.0, 4.0);
        canvas.fill_rect(Rect::new(0.0, 0.0, 6.0, 6.0), &Paint::Solid(Rgba::rgb8(200, 40, 40)));
        canvas.restore();
        canvas.fill_text("hi", Vec2::new(1.0, 1.0), &TextStyle::new(11.0, Rgba::WHITE));
    }

    #[test]
    fn records_in_call_order() {
        let mut list = DisplayList::new(16.0, 16.0);
        sample(&mut list);
        assert_eq!(list.ops()[0], DrawOp::Save);
        assert!(matches!(list.ops()[1], DrawOp::Transform(_)));
        assert_eq!(list.fills(), 1);
        assert_eq!(list.texts().collect::<Vec<_>>(), vec!["hi"]);
    }

    #[test]
    fn replay_matches_direct_drawing() {
        let mut list = DisplayList::new(16.0, 16.0);
        sample(&mut list);

        let mut direct = PixelCanvas::new(16, 16).unwrap();
        sample(&mut direct);
        let mut replayed = PixelCanvas::new(16, 16).unwrap();
        list.replay(&mut replayed);

        assert_eq!(direct.pixel(6, 6), replayed.pixel(6, 6));
        assert_eq!(direct.labels(), replayed.labels());
    }
}
