use std::f32::consts::TAU;

use crate::{
    config,
    emotion::{Palette, ShapeFamily},
    render::{BlendMode, Canvas, GradientStop, Paint, Path},
    types::{Rgba, Vec2},
};

use super::layout::SimulationNode;

/// One step of a petal outline, in multiples of the flower radius. Every
/// outline starts at the flower center and closes back to it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PetalStep {
    Line(f32, f32),
    Cubic([f32; 6]),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PetalOutline {
    Steps(&'static [PetalStep]),
    /// Round petal floating off the center.
    Orb,
}

use PetalStep::{Cubic, Line};

const PETAL_TABLE: &[(ShapeFamily, &[PetalStep])] = &[
    (
        ShapeFamily::Radiance,
        &[Line(0.5, -0.2), Line(1.5, 0.0), Line(0.5, 0.2)],
    ),
    (
        ShapeFamily::Lotus,
        &[
            Cubic([0.8, -0.6, 1.4, -0.4, 1.5, 0.0]),
            Cubic([1.4, 0.4, 0.8, 0.6, 0.0, 0.0]),
        ],
    ),
    (
        ShapeFamily::Willow,
        &[
            Cubic([0.5, -0.1, 1.8, -0.1, 2.0, 0.0]),
            Cubic([1.8, 0.1, 0.5, 0.1, 0.0, 0.0]),
        ],
    ),
    (
        ShapeFamily::Aster,
        &[Line(1.0, -0.06), Line(2.2, 0.0), Line(1.0, 0.06)],
    ),
    (
        ShapeFamily::Flame,
        &[
            Line(0.6, -0.4),
            Line(1.2, -0.2),
            Line(1.6, 0.0),
            Line(1.2, 0.2),
            Line(0.6, 0.4),
        ],
    ),
    (
        ShapeFamily::Heart,
        &[
            Cubic([0.5, -0.8, 1.5, -0.8, 1.5, -0.12]),
            Line(1.3, 0.0),
            Line(1.5, 0.12),
            Cubic([1.5, 0.8, 0.5, 0.8, 0.0, 0.0]),
        ],
    ),
    (
        ShapeFamily::Fragment,
        &[Line(0.4, -0.3), Line(1.4, 0.1), Line(0.5, 0.5)],
    ),
];

pub fn petal_outline(shape: ShapeFamily) -> PetalOutline {
    PETAL_TABLE
        .iter()
        .find(|(family, _)| *family == shape)
        .map(|(_, steps)| PetalOutline::Steps(*steps))
        .unwrap_or(PetalOutline::Orb)
}

pub fn petal_path(outline: PetalOutline, r: f32) -> Path {
    let mut path = Path::new();
    match outline {
        PetalOutline::Steps(steps) => {
            path.move_to(0.0, 0.0);
            for step in steps {
                match *step {
                    Line(x, y) => {
                        path.line_to(x * r, y * r);
                    }
                    Cubic([x1, y1, x2, y2, x, y]) => {
                        path.cubic_to(
                            Vec2::new(x1 * r, y1 * r),
                            Vec2::new(x2 * r, y2 * r),
                            Vec2::new(x * r, y * r),
                        );
                    }
                }
            }
        }
        PetalOutline::Orb => {
            path.arc(Vec2::new(0.7 * r, 0.0), 0.4 * r, 0.0, TAU);
        }
    }
    path.close();
    path
}

fn hex_alpha(byte: u8) -> f32 {
    byte as f32 / 255.0
}

/// Draws one flower centered on the node. Output depends only on the node,
/// `time` and the palette.
pub fn draw_flower(canvas: &mut dyn Canvas, node: &SimulationNode, time: f32, palette: &Palette) {
    let color = palette.color(node.emotion);
    let pulse = 1.0 + (time * config::PULSE_RATE + node.pulse_phase).sin() * config::PULSE_AMPLITUDE;
    let r = node.radius * pulse;

    canvas.save();
    canvas.translate(node.pos.x, node.pos.y);

    draw_glow(canvas, color, r);

    let petal = petal_path(petal_outline(node.emotion.shape()), r);
    let fill = Paint::linear(
        Vec2::ZERO,
        Vec2::new(1.5 * r, 0.0),
        vec![
            GradientStop::new(0.0, color),
            GradientStop::new(1.0, color.with_alpha(hex_alpha(0x44))),
        ],
    );
    let outline = Paint::Solid(color.with_alpha(hex_alpha(0xAA)));
    let petals = node.petals.max(1);
    for i in 0..petals {
        canvas.save();
        canvas.rotate(i as f32 * TAU / petals as f32 + time * config::SPIN_RATE);
        canvas.fill_path(&petal, &fill);
        canvas.stroke_path(&petal, &outline, 1.0);
        canvas.restore();
    }

    let disk_radius = r * config::CENTER_DISK_FACTOR;
    let disk = Path::circle(Vec2::ZERO, disk_radius);
    canvas.fill_path(
        &disk,
        &Paint::radial(
            Vec2::ZERO,
            0.0,
            disk_radius,
            vec![GradientStop::new(0.0, Rgba::WHITE), GradientStop::new(1.0, color)],
        ),
    );
    canvas.stroke_path(&disk, &Paint::Solid(Rgba::WHITE), 2.0);

    canvas.restore();
}

fn draw_glow(canvas: &mut dyn Canvas, color: Rgba, r: f32) {
    let reach = r * config::GLOW_RADIUS_FACTOR;
    canvas.save();
    canvas.set_blend(BlendMode::Screen);
    canvas.fill_path(
        &Path::circle(Vec2::ZERO, reach),
        &Paint::radial(
            Vec2::ZERO,
            0.0,
            reach,
            vec![
                GradientStop::new(0.0, color.with_alpha(hex_alpha(0x66))),
                GradientStop::new(0.3, color.with_alpha(hex_alpha(0x22))),
                GradientStop::new(1.0, color.with_alpha(0.0)),
            ],
        ),
    );
    canvas.restore();
}
