use super::{BlendMode, Canvas, Paint, Path, Polyline, TextStyle, Transform};
use crate::types::{Rect, Rgba, Vec2};

const SUBSAMPLES: usize = 4;
const FLATTEN_TOLERANCE: f32 = 1.0;
const MIN_STROKE_WIDTH: f32 = 0.6;

/// Text the rasterizer cannot draw itself; the host overlays it.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub text: String,
    pub at: Vec2,
    pub style: TextStyle,
}

#[derive(Clone, Copy, Debug)]
struct State {
    transform: Transform,
    blend: BlendMode,
    clip: Rect,
}

#[derive(Clone, Copy, Debug)]
struct Edge {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    dir: i32,
}

impl Edge {
    fn new(a: Vec2, b: Vec2) -> Option<Self> {
        if (a.y - b.y).abs() < f32::EPSILON {
            return None;
        }
        let (top, bottom, dir) = if a.y < b.y { (a, b, 1) } else { (b, a, -1) };
        Some(Self {
            x0: top.x,
            y0: top.y,
            x1: bottom.x,
            y1: bottom.y,
            dir,
        })
    }

    fn x_at(&self, y: f32) -> f32 {
        self.x0 + (y - self.y0) * (self.x1 - self.x0) / (self.y1 - self.y0)
    }
}

/// Anti-aliased RGB raster with nonzero fill rule.
#[derive(Debug)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
    state: State,
    stack: Vec<State>,
    labels: Vec<Label>,
}

impl PixelCanvas {
    /// `None` for a zero-sized surface.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let len = (width as usize).checked_mul(height as usize)?;
        Some(Self {
            width,
            height,
            pixels: vec![Rgba::rgb8(0, 0, 0); len],
            state: State {
                transform: Transform::IDENTITY,
                blend: BlendMode::SourceOver,
                clip: Rect::new(0.0, 0.0, width as f32, height as f32),
            },
            stack: Vec::new(),
            labels: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        debug_assert!(x < self.width && y < self.height, "pixel() out of bounds");
        self.pixels[(y as usize) * (self.width as usize) + (x as usize)]
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Hands the recorded labels to whoever typesets them.
    pub fn take_labels(&mut self) -> Vec<Label> {
        std::mem::take(&mut self.labels)
    }

    /// Source-over composite of a single device pixel, outside the clip and
    /// blend state. Out-of-range coordinates are ignored.
    pub fn plot(&mut self, x: i64, y: i64, color: Rgba, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let alpha = (color.a * coverage).clamp(0.0, 1.0);
        let idx = y as usize * self.width as usize + x as usize;
        let dst = self.pixels[idx];
        self.pixels[idx] = Rgba {
            r: dst.r + (color.r - dst.r) * alpha,
            g: dst.g + (color.g - dst.g) * alpha,
            b: dst.b + (color.b - dst.b) * alpha,
            a: 1.0,
        };
    }

    /// Row-major RGBA bytes, fully opaque.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in &self.pixels {
            let (r, g, b) = pixel.to_rgb8();
            bytes.extend_from_slice(&[r, g, b, 255]);
        }
        bytes
    }

    /// Resets pixels, labels and drawing state.
    pub fn clear(&mut self, color: Rgba) {
        let opaque = color.with_alpha(1.0);
        self.pixels.fill(opaque);
        self.labels.clear();
        self.stack.clear();
        self.state = State {
            transform: Transform::IDENTITY,
            blend: BlendMode::SourceOver,
            clip: Rect::new(0.0, 0.0, self.width as f32, self.height as f32),
        };
    }

    fn blend_pixel(&mut self, x: usize, y: usize, color: Rgba, coverage: f32) {
        let alpha = (color.a * coverage).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let idx = y * self.width as usize + x;
        let dst = self.pixels[idx];
        let src = match self.state.blend {
            BlendMode::SourceOver => color,
            BlendMode::Screen => Rgba {
                r: 1.0 - (1.0 - color.r) * (1.0 - dst.r),
                g: 1.0 - (1.0 - color.g) * (1.0 - dst.g),
                b: 1.0 - (1.0 - color.b) * (1.0 - dst.b),
                a: 1.0,
            },
        };
        self.pixels[idx] = Rgba {
            r: dst.r + (src.r - dst.r) * alpha,
            g: dst.g + (src.g - dst.g) * alpha,
            b: dst.b + (src.b - dst.b) * alpha,
            a: 1.0,
        };
    }

    fn rasterize(&mut self, polygons: &[Vec<Vec2>], paint: &Paint) {
        let clip = self.state.clip;
        if clip.is_empty() || polygons.is_empty() {
            return;
        }
        let Some(inverse) = self.state.transform.inverse() else {
            return;
        };

        let mut edges = Vec::new();
        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for polygon in polygons {
            for (i, &a) in polygon.iter().enumerate() {
                if !a.x.is_finite() || !a.y.is_finite() {
                    return;
                }
                min_x = min_x.min(a.x);
                min_y = min_y.min(a.y);
                max_x = max_x.max(a.x);
                max_y = max_y.max(a.y);
                let b = polygon[(i + 1) % polygon.len()];
                edges.extend(Edge::new(a, b));
            }
        }
        if edges.is_empty() {
            return;
        }

        let y_start = min_y.max(clip.y).floor().max(0.0) as i64;
        let y_end = (max_y.min(clip.bottom()).ceil() as i64).min(self.height as i64);
        let x_lo = min_x.max(clip.x).max(0.0);
        let x_hi = max_x.min(clip.right()).min(self.width as f32);
        if y_start >= y_end || x_lo >= x_hi {
            return;
        }
        let x_base = x_lo.floor() as usize;
        let span_len = (x_hi.ceil() as usize).saturating_sub(x_base);
        let mut coverage = vec![0.0f32; span_len];
        let mut crossings: Vec<(f32, i32)> = Vec::new();
        let step = 1.0 / SUBSAMPLES as f32;

        for py in y_start..y_end {
            coverage.fill(0.0);
            for s in 0..SUBSAMPLES {
                let sy = py as f32 + (s as f32 + 0.5) * step;
                if sy < clip.y || sy >= clip.bottom() {
                    continue;
                }
                crossings.clear();
                for edge in &edges {
                    if sy >= edge.y0 && sy < edge.y1 {
                        crossings.push((edge.x_at(sy), edge.dir));
                    }
                }
                crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

                let mut winding = 0;
                let mut span_start = 0.0;
                for &(x, dir) in &crossings {
                    let before = winding;
                    winding += dir;
                    if before == 0 && winding != 0 {
                        span_start = x;
                    } else if before != 0 && winding == 0 {
                        accumulate_span(&mut coverage, x_base, span_start.max(x_lo), x.min(x_hi), step);
                    }
                }
            }

            for (i, cov) in coverage.iter().copied().enumerate() {
                if cov <= 0.0 {
                    continue;
                }
                let px = x_base + i;
                let color = match paint {
                    Paint::Solid(color) => *color,
                    _ => paint.color_at(inverse.apply(Vec2::new(px as f32 + 0.5, py as f32 + 0.5))),
                };
                self.blend_pixel(px, py as usize, color, cov.min(1.0));
            }
        }
    }
}

fn accumulate_span(coverage: &mut [f32], x_base: usize, from: f32, to: f32, weight: f32) {
    if to <= from {
        return;
    }
    let first = from.floor() as usize;
    let last = to.ceil() as usize;
    for px in first..last {
        let Some(slot) = px.checked_sub(x_base).and_then(|i| coverage.get_mut(i)) else {
            continue;
        };
        let overlap = to.min(px as f32 + 1.0) - from.max(px as f32);
        if overlap > 0.0 {
            *slot += overlap * weight;
        }
    }
}

fn signed_area(points: &[Vec2]) -> f32 {
    let mut area = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        area += a.x * b.y - b.x * a.y;
    }
    area * 0.5
}

/// Outline of a stroked polyline as positively wound quads (plus round-ish
/// joins for wide strokes), so overlaps never cancel under nonzero filling.
fn stroke_outline(line: &Polyline, half: f32) -> Vec<Vec<Vec2>> {
    let mut out = Vec::new();
    let points = &line.points;
    let mut segments: Vec<(Vec2, Vec2)> = points.windows(2).map(|w| (w[0], w[1])).collect();
    if line.closed && points.len() > 2 {
        segments.push((points[points.len() - 1], points[0]));
    }
    for (a, b) in segments {
        let dir = b - a;
        if dir.length_sq() < 1e-12 {
            continue;
        }
        let n = dir.normalize().perp() * half;
        let mut quad = vec![a + n, b + n, b - n, a - n];
        if signed_area(&quad) < 0.0 {
            quad.reverse();
        }
        out.push(quad);
    }
    if half >= 1.0 {
        for &p in points {
            let joint: Vec<Vec2> = (0..8)
                .map(|k| {
                    let angle = k as f32 * std::f32::consts::FRAC_PI_4;
                    p + Vec2::new(angle.cos(), angle.sin()) * half
                })
                .collect();
            out.push(joint);
        }
    }
    out
}

impl Canvas for PixelCanvas {
    fn size(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32)
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn transform(&mut self, t: Transform) {
        self.state.transform = self.state.transform.then_local(&t);
    }

    fn set_blend(&mut self, mode: BlendMode) {
        self.state.blend = mode;
    }

    fn clip_rect(&mut self, rect: Rect) {
        let device = self.state.transform.map_rect(&rect);
        self.state.clip = self.state.clip.intersect(&device);
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint) {
        let polygons: Vec<Vec<Vec2>> = path
            .flatten(&self.state.transform, FLATTEN_TOLERANCE)
            .into_iter()
            .map(|line| line.points)
            .filter(|points| points.len() > 2)
            .collect();
        self.rasterize(&polygons, paint);
    }

    fn stroke_path(&mut self, path: &Path, paint: &Paint, width: f32) {
        let device_width = (width * self.state.transform.scale_factor()).max(MIN_STROKE_WIDTH);
        let polygons: Vec<Vec<Vec2>> = path
            .flatten(&self.state.transform, FLATTEN_TOLERANCE)
            .iter()
            .flat_map(|line| stroke_outline(line, device_width / 2.0))
            .collect();
        self.rasterize(&polygons, paint);
    }

    fn fill_text(&mut self, text: &str, at: Vec2, style: &TextStyle) {
        let anchor = self.state.transform.apply(at);
        let clip = self.state.clip;
        if anchor.x < clip.x || anchor.x > clip.right() || anchor.y < clip.y || anchor.y > clip.bottom() {
            return;
        }
        let mut style = style.clone();
        style.size *= self.state.transform.scale_factor();
        self.labels.push(Label {
            text: text.to_string(),
            at: anchor,
            style,
        });
    }
}
