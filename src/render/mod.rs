//! Drawing surfaces.
//!
//! Scene code (flowers, garden, export cards) draws against [`Canvas`]; the
//! terminal view and exported cards rasterize through [`PixelCanvas`] and
//! tests record into a [`DisplayList`].

mod display_list;
mod path;
mod pixels;

use crate::types::{Rect, Rgba, Vec2};

pub use display_list::{DisplayList, DrawOp};
pub use path::{Path, PathOp, Polyline};
pub use pixels::{Label, PixelCanvas};

/// 2D affine transform, column layout as in the HTML canvas:
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translate(x: f32, y: f32) -> Self {
        Self {
            e: x,
            f: y,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    pub fn rotate(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// The returned transform applies `local` first, then `self`.
    pub fn then_local(&self, local: &Transform) -> Transform {
        Transform {
            a: self.a * local.a + self.c * local.b,
            b: self.b * local.a + self.d * local.b,
            c: self.a * local.c + self.c * local.d,
            d: self.b * local.c + self.d * local.d,
            e: self.a * local.e + self.c * local.f + self.e,
            f: self.b * local.e + self.d * local.f + self.f,
        }
    }

    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    pub fn inverse(&self) -> Option<Transform> {
        let det = self.determinant();
        if det.abs() < 1e-12 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        Some(Transform {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    /// Geometric mean scale, used to size strokes and tessellation.
    pub fn scale_factor(&self) -> f32 {
        self.determinant().abs().sqrt()
    }

    /// Axis-aligned bounds of a transformed rectangle.
    pub fn map_rect(&self, rect: &Rect) -> Rect {
        let corners = [
            self.apply(Vec2::new(rect.x, rect.y)),
            self.apply(Vec2::new(rect.right(), rect.y)),
            self.apply(Vec2::new(rect.x, rect.bottom())),
            self.apply(Vec2::new(rect.right(), rect.bottom())),
        ];
        let min_x = corners.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
        let min_y = corners.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
        let max_y = corners.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
    #[default]
    SourceOver,
    Screen,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgba,
}

impl GradientStop {
    pub fn new(offset: f32, color: Rgba) -> Self {
        Self { offset, color }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    Linear {
        start: Vec2,
        end: Vec2,
        stops: Vec<GradientStop>,
    },
    Radial {
        center: Vec2,
        inner: f32,
        outer: f32,
        stops: Vec<GradientStop>,
    },
}

impl Paint {
    pub fn linear(start: Vec2, end: Vec2, stops: Vec<GradientStop>) -> Self {
        Paint::Linear { start, end, stops }
    }

    pub fn radial(center: Vec2, inner: f32, outer: f32, stops: Vec<GradientStop>) -> Self {
        Paint::Radial {
            center,
            inner,
            outer,
            stops,
        }
    }

    /// Color at a point in the paint's own coordinate space.
    pub fn color_at(&self, p: Vec2) -> Rgba {
        match self {
            Paint::Solid(color) => *color,
            Paint::Linear { start, end, stops } => {
                let axis = *end - *start;
                let len_sq = axis.length_sq();
                let t = if len_sq <= f32::EPSILON {
                    0.0
                } else {
                    let rel = p - *start;
                    (rel.x * axis.x + rel.y * axis.y) / len_sq
                };
                sample_stops(stops, t)
            }
            Paint::Radial {
                center,
                inner,
                outer,
                stops,
            } => {
                let span = outer - inner;
                let t = if span.abs() <= f32::EPSILON {
                    1.0
                } else {
                    (p.distance(*center) - inner) / span
                };
                sample_stops(stops, t)
            }
        }
    }
}

/// Premultiplied interpolation so fades toward transparent keep their hue.
fn sample_stops(stops: &[GradientStop], t: f32) -> Rgba {
    let Some(first) = stops.first() else {
        return Rgba::TRANSPARENT;
    };
    let t = t.clamp(0.0, 1.0);
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if t <= hi.offset {
            let span = hi.offset - lo.offset;
            let local = if span <= f32::EPSILON {
                1.0
            } else {
                (t - lo.offset) / span
            };
            return lerp_premultiplied(lo.color, hi.color, local);
        }
    }
    stops[stops.len() - 1].color
}

fn lerp_premultiplied(from: Rgba, to: Rgba, t: f32) -> Rgba {
    let a = from.a + (to.a - from.a) * t;
    if a <= f32::EPSILON {
        return Rgba::TRANSPARENT;
    }
    let channel = |f: f32, g: f32| (f * from.a + (g * to.a - f * from.a) * t) / a;
    Rgba {
        r: channel(from.r, to.r),
        g: channel(from.g, to.g),
        b: channel(from.b, to.b),
        a,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub color: Rgba,
    pub align: TextAlign,
    pub bold: bool,
    pub italic: bool,
}

impl TextStyle {
    pub fn new(size: f32, color: Rgba) -> Self {
        Self {
            size,
            color,
            align: TextAlign::Left,
            bold: false,
            italic: false,
        }
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }
}

pub trait Canvas {
    /// Surface size in its own device units.
    fn size(&self) -> (f32, f32);

    fn save(&mut self);

    fn restore(&mut self);

    /// Concatenates `t` onto the current transform.
    fn transform(&mut self, t: Transform);

    fn set_blend(&mut self, mode: BlendMode);

    /// Intersects the clip with `rect`, given in current user space.
    fn clip_rect(&mut self, rect: Rect);

    fn fill_path(&mut self, path: &Path, paint: &Paint);

    fn stroke_path(&mut self, path: &Path, paint: &Paint, width: f32);

    fn fill_text(&mut self, text: &str, at: Vec2, style: &TextStyle);

    fn translate(&mut self, x: f32, y: f32) {
        self.transform(Transform::translate(x, y));
    }

    fn rotate(&mut self, angle: f32) {
        self.transform(Transform::rotate(angle));
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.transform(Transform::scale(sx, sy));
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        self.fill_path(&Path::rect(rect), paint);
    }

    fn stroke_rect(&mut self, rect: Rect, paint: &Paint, width: f32) {
        self.stroke_path(&Path::rect(rect), paint, width);
    }
}
