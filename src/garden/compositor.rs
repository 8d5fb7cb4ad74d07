use crate::{
    config,
    emotion::{Emotion, Palette},
    render::{Canvas, GradientStop, Paint, Path, TextAlign, TextStyle},
    store::ThoughtRecord,
    types::{Rect, Rgba, Vec2},
};

use super::flower::draw_flower;
use super::layout::{GardenLayout, SimulationNode};

pub const BACKGROUND: Rgba = Rgba::rgb8(0xFD, 0xF9, 0xF6);
pub const INK: Rgba = Rgba::rgb8(0x3D, 0x3A, 0x38);
pub const EMPTY_MESSAGE: &str = "waiting for your first bloom";

const FLOW_STROKE: Rgba = Rgba::rgba8(232, 164, 196, 0.03);
const WASH_INNER: Rgba = Rgba::rgba8(232, 164, 196, 0.05);
const WASH_MIDDLE: Rgba = Rgba::rgba8(196, 176, 232, 0.03);
const LEGEND_INK: Rgba = Rgba::rgba8(61, 58, 56, 0.6);

/// The garden while it is open: node set, animation clock and palette.
pub struct Garden {
    layout: GardenLayout,
    palette: Palette,
    time: f32,
}

impl Garden {
    pub fn new(layout: GardenLayout, palette: Palette) -> Self {
        Self {
            layout,
            palette,
            time: 0.0,
        }
    }

    pub fn load(&mut self, records: &[ThoughtRecord]) {
        self.layout.initialize(records);
        self.time = 0.0;
        tracing::info!(blooms = records.len(), "garden loaded");
    }

    pub fn layout(&self) -> &GardenLayout {
        &self.layout
    }

    pub fn nodes(&self) -> &[SimulationNode] {
        self.layout.nodes()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    pub fn size(&self) -> (f32, f32) {
        self.layout.size()
    }

    /// Runs the simulation without drawing, as for a headless export.
    pub fn settle(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.layout.tick();
        }
    }

    /// Advances the clock and the simulation by one step and draws the frame
    /// in the layout's coordinate space.
    pub fn frame(&mut self, canvas: &mut dyn Canvas) {
        self.time += config::FRAME_TIME_STEP;
        let (width, height) = self.layout.size();

        canvas.fill_rect(Rect::new(0.0, 0.0, width, height), &Paint::Solid(BACKGROUND));
        draw_background_flow(canvas, width, height, self.time);

        if self.layout.is_empty() {
            draw_empty_state(canvas, width, height);
            return;
        }

        self.layout.tick();
        let nodes = self.layout.nodes();
        draw_connections(canvas, nodes, &self.palette);
        for node in nodes {
            draw_flower(canvas, node, self.time, &self.palette);
        }
        draw_legend(canvas, nodes, &self.palette, width, height);
    }

    pub fn emotion_counts(&self) -> Vec<(Emotion, usize)> {
        emotion_counts(self.nodes())
    }

    pub fn dominant_emotion(&self) -> Emotion {
        dominant_emotion(&self.emotion_counts())
    }
}

/// Distinct emotions in order of first appearance.
pub fn legend_emotions(nodes: &[SimulationNode]) -> Vec<Emotion> {
    let mut seen = Vec::new();
    for node in nodes {
        if !seen.contains(&node.emotion) {
            seen.push(node.emotion);
        }
    }
    seen
}

/// Node count per emotion, in order of first appearance.
pub fn emotion_counts(nodes: &[SimulationNode]) -> Vec<(Emotion, usize)> {
    legend_emotions(nodes)
        .into_iter()
        .map(|emotion| {
            let count = nodes.iter().filter(|n| n.emotion == emotion).count();
            (emotion, count)
        })
        .collect()
}

/// Starts from the default emotion; a later candidate only wins with a
/// strictly larger count.
pub fn dominant_emotion(counts: &[(Emotion, usize)]) -> Emotion {
    let count_of = |emotion: Emotion| {
        counts
            .iter()
            .find(|(e, _)| *e == emotion)
            .map_or(0, |(_, count)| *count)
    };
    counts
        .iter()
        .fold(Emotion::DEFAULT, |best, &(candidate, count)| {
            if count > count_of(best) { candidate } else { best }
        })
}

pub fn draw_background_flow(canvas: &mut dyn Canvas, width: f32, height: f32, time: f32) {
    let stroke = Paint::Solid(FLOW_STROKE);
    for i in 0..config::FLOW_LINES {
        let y_base = height * (0.1 + i as f32 * 0.1);
        let mut path = Path::new();
        path.move_to(0.0, y_base);
        let mut x = 0.0;
        while x <= width {
            let y = y_base + (x * 0.005 + time * 0.3 + i as f32).sin() * config::FLOW_AMPLITUDE;
            path.line_to(x, y);
            x += config::FLOW_STEP_PX;
        }
        canvas.stroke_path(&path, &stroke, 1.0);
    }

    let center = Vec2::new(width / 2.0, height / 2.0);
    let wash = Paint::radial(
        center,
        0.0,
        width.max(height) * 0.8,
        vec![
            GradientStop::new(0.0, WASH_INNER),
            GradientStop::new(0.6, WASH_MIDDLE),
            GradientStop::new(1.0, WASH_MIDDLE.with_alpha(0.0)),
        ],
    );
    canvas.fill_rect(Rect::new(0.0, 0.0, width, height), &wash);
}

pub fn draw_connections(canvas: &mut dyn Canvas, nodes: &[SimulationNode], palette: &Palette) {
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            if a.emotion != b.emotion {
                continue;
            }
            let dist = a.pos.distance(b.pos);
            if dist >= config::CONNECTION_DISTANCE {
                continue;
            }
            let opacity = (1.0 - dist / config::CONNECTION_DISTANCE) * config::CONNECTION_MAX_OPACITY;
            let mid = a.pos.midpoint(b.pos);
            let mut path = Path::new();
            path.move_to(a.pos.x, a.pos.y).quad_to(
                mid.x,
                mid.y - dist * config::CONNECTION_BOW,
                b.pos.x,
                b.pos.y,
            );
            canvas.stroke_path(&path, &Paint::Solid(palette.color(a.emotion).with_alpha(opacity)), 1.0);
        }
    }
}

pub fn draw_legend(
    canvas: &mut dyn Canvas,
    nodes: &[SimulationNode],
    palette: &Palette,
    width: f32,
    height: f32,
) {
    let emotions = legend_emotions(nodes);
    if emotions.is_empty() {
        return;
    }
    let y = height - config::LEGEND_BOTTOM_OFFSET;
    let start_x = (width - emotions.len() as f32 * config::LEGEND_SLOT_WIDTH) / 2.0;
    let label = TextStyle::new(11.0, LEGEND_INK).align(TextAlign::Center);
    for (i, emotion) in emotions.iter().enumerate() {
        let x = start_x + i as f32 * config::LEGEND_SLOT_WIDTH + config::LEGEND_SLOT_WIDTH / 2.0;
        canvas.fill_path(
            &Path::circle(Vec2::new(x, y), config::LEGEND_DOT_RADIUS),
            &Paint::Solid(palette.color(*emotion)),
        );
        canvas.fill_text(emotion.label(), Vec2::new(x, y + 20.0), &label);
    }
}

fn draw_empty_state(canvas: &mut dyn Canvas, width: f32, height: f32) {
    canvas.fill_text(
        EMPTY_MESSAGE,
        Vec2::new(width / 2.0, height / 2.0),
        &TextStyle::new(18.0, INK.with_alpha(0.6))
            .align(TextAlign::Center)
            .italic(),
    );
}
