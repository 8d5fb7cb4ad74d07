use std::f32::consts::TAU;

use super::Transform;
use crate::types::{Rect, Vec2};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathOp {
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadTo(Vec2, Vec2),
    CubicTo(Vec2, Vec2, Vec2),
    /// Clockwise (screen space) from `start` to `end`, radians. Joins the
    /// current point with a straight line when a subpath is open.
    Arc {
        center: Vec2,
        radius: f32,
        start: f32,
        end: f32,
    },
    Close,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    ops: Vec<PathOp>,
}

/// One flattened subpath in device space.
#[derive(Clone, Debug, PartialEq)]
pub struct Polyline {
    pub points: Vec<Vec2>,
    pub closed: bool,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[PathOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.ops.push(PathOp::MoveTo(Vec2::new(x, y)));
        self
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.ops.push(PathOp::LineTo(Vec2::new(x, y)));
        self
    }

    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) -> &mut Self {
        self.ops
            .push(PathOp::QuadTo(Vec2::new(cx, cy), Vec2::new(x, y)));
        self
    }

    pub fn cubic_to(&mut self, c1: Vec2, c2: Vec2, to: Vec2) -> &mut Self {
        self.ops.push(PathOp::CubicTo(c1, c2, to));
        self
    }

    pub fn arc(&mut self, center: Vec2, radius: f32, start: f32, end: f32) -> &mut Self {
        self.ops.push(PathOp::Arc {
            center,
            radius,
            start,
            end,
        });
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.ops.push(PathOp::Close);
        self
    }

    pub fn circle(center: Vec2, radius: f32) -> Self {
        let mut path = Path::new();
        path.arc(center, radius, 0.0, TAU).close();
        path
    }

    pub fn rect(rect: Rect) -> Self {
        let mut path = Path::new();
        path.move_to(rect.x, rect.y)
            .line_to(rect.right(), rect.y)
            .line_to(rect.right(), rect.bottom())
            .line_to(rect.x, rect.bottom())
            .close();
        path
    }

    /// Flattens into device-space polylines. `tolerance` is roughly the
    /// longest allowed segment in device units.
    pub fn flatten(&self, transform: &Transform, tolerance: f32) -> Vec<Polyline> {
        let tolerance = tolerance.max(0.05);
        let scale = transform.scale_factor();
        let mut out = Vec::new();
        let mut current: Vec<Vec2> = Vec::new();
        let mut cursor: Option<Vec2> = None;

        let finish = |points: &mut Vec<Vec2>, closed: bool, out: &mut Vec<Polyline>| {
            if points.len() > 1 {
                out.push(Polyline {
                    points: std::mem::take(points),
                    closed,
                });
            } else {
                points.clear();
            }
        };

        for op in &self.ops {
            match *op {
                PathOp::MoveTo(p) => {
                    finish(&mut current, false, &mut out);
                    current.push(transform.apply(p));
                    cursor = Some(p);
                }
                PathOp::LineTo(p) => {
                    current.push(transform.apply(p));
                    cursor = Some(p);
                }
                PathOp::QuadTo(c, p) => {
                    let from = cursor.unwrap_or(c);
                    if cursor.is_none() {
                        current.push(transform.apply(from));
                    }
                    let hull = (from.distance(c) + c.distance(p)) * scale;
                    let steps = segment_count(hull, tolerance);
                    for i in 1..=steps {
                        let t = i as f32 / steps as f32;
                        let a = from.lerp(c, t);
                        let b = c.lerp(p, t);
                        current.push(transform.apply(a.lerp(b, t)));
                    }
                    cursor = Some(p);
                }
                PathOp::CubicTo(c1, c2, p) => {
                    let from = cursor.unwrap_or(c1);
                    if cursor.is_none() {
                        current.push(transform.apply(from));
                    }
                    let hull = (from.distance(c1) + c1.distance(c2) + c2.distance(p)) * scale;
                    let steps = segment_count(hull, tolerance);
                    for i in 1..=steps {
                        let t = i as f32 / steps as f32;
                        current.push(transform.apply(cubic_point(from, c1, c2, p, t)));
                    }
                    cursor = Some(p);
                }
                PathOp::Arc {
                    center,
                    radius,
                    start,
                    end,
                } => {
                    let radius = radius.abs();
                    let first = center + Vec2::new(start.cos(), start.sin()) * radius;
                    current.push(transform.apply(first));
                    let sweep = end - start;
                    let steps = segment_count(sweep.abs() * radius * scale, tolerance).max(4);
                    for i in 1..=steps {
                        let angle = start + sweep * i as f32 / steps as f32;
                        let p = center + Vec2::new(angle.cos(), angle.sin()) * radius;
                        current.push(transform.apply(p));
                    }
                    cursor = Some(center + Vec2::new(end.cos(), end.sin()) * radius);
                }
                PathOp::Close => {
                    finish(&mut current, true, &mut out);
                    cursor = None;
                }
            }
        }
        finish(&mut current, false, &mut out);
        out
    }
}

fn segment_count(length: f32, tolerance: f32) -> usize {
    if !length.is_finite() {
        return 1;
    }
    ((length / tolerance).ceil() as usize).clamp(1, 128)
}

fn cubic_point(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let mt = 1.0 - t;
    p0 * (mt * mt * mt) + p1 * (3.0 * mt * mt * t) + p2 * (3.0 * mt * t * t) + p3 * (t * t * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod flatten {
        use super::*;

        #[test]
        fn rect_is_one_closed_polyline() {
            let lines = Path::rect(Rect::new(0.0, 0.0, 4.0, 2.0)).flatten(&Transform::IDENTITY, 1.0);
            assert_eq!(lines.len(), 1);
            assert!(lines[0].closed);
            assert_eq!(lines[0].points.len(), 4);
        }

        #[test]
        fn circle_points_lie_on_radius() {
            let lines = Path::circle(Vec2::new(5.0, 5.0), 3.0).flatten(&Transform::IDENTITY, 0.5);
            assert_eq!(lines.len(), 1);
            for p in &lines[0].points {
                assert!((p.distance(Vec2::new(5.0, 5.0)) - 3.0).abs() < 1e-3);
            }
        }

        #[test]
        fn cubic_ends_at_target() {
            let mut path = Path::new();
            path.move_to(0.0, 0.0).cubic_to(
                Vec2::new(8.0, -6.0),
                Vec2::new(14.0, -4.0),
                Vec2::new(15.0, 0.0),
            );
            let lines = path.flatten(&Transform::scale(2.0, 2.0), 1.0);
            let last = *lines[0].points.last().unwrap();
            assert!(last.distance(Vec2::new(30.0, 0.0)) < 1e-4);
            assert!(!lines[0].closed);
        }

        #[test]
        fn arc_continues_from_current_point() {
            let mut path = Path::new();
            path.move_to(0.0, 0.0)
                .arc(Vec2::new(7.0, 0.0), 4.0, 0.0, TAU);
            let lines = path.flatten(&Transform::IDENTITY, 1.0);
            assert_eq!(lines[0].points[0], Vec2::ZERO);
            assert!(lines[0].points[1].distance(Vec2::new(11.0, 0.0)) < 1e-4);
        }

        #[test]
        fn lone_move_is_dropped() {
            let mut path = Path::new();
            path.move_to(1.0, 1.0);
            assert!(path.flatten(&Transform::IDENTITY, 1.0).is_empty());
        }
    }
}
