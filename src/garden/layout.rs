use std::f32::consts::TAU;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    config,
    emotion::Emotion,
    spatial::NeighborGrid,
    store::{ThoughtId, ThoughtRecord},
    types::Vec2,
};

/// Golden angle, spreads the separation axes of coincident pairs.
const SEPARATION_TURN: f32 = 2.399_963;

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationNode {
    pub id: ThoughtId,
    pub emotion: Emotion,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub petals: usize,
    pub pulse_phase: f32,
    pub chars: usize,
}

pub fn node_radius(chars: usize) -> f32 {
    config::NODE_RADIUS_BASE
        + (chars as f32 / config::NODE_RADIUS_CHARS_PER_PX).min(config::NODE_RADIUS_GROWTH_CAP)
}

pub fn petal_count(chars: usize) -> usize {
    (chars / config::PETALS_CHARS_PER_PETAL + config::PETALS_MIN)
        .clamp(config::PETALS_MIN, config::PETALS_MAX)
}

fn attractor(width: f32, height: f32, emotion: Emotion) -> Vec2 {
    let (cx, cy) = emotion.center();
    Vec2::new(
        width * config::TARGET_INSET_RATIO + cx * width * config::TARGET_SPAN_RATIO,
        height * config::TARGET_INSET_RATIO + cy * height * config::TARGET_SPAN_RATIO,
    )
}

fn clamp_axis(value: f32, lo: f32, hi: f32) -> f32 {
    if lo > hi {
        (lo + hi) / 2.0
    } else {
        value.clamp(lo, hi)
    }
}

/// Force-directed placement of preserved thoughts.
///
/// Each node is pulled toward its emotion's attractor and pushed away from
/// any node closer than twice their combined radii. Forces for a tick are
/// computed from one position snapshot and then integrated together.
pub struct GardenLayout {
    width: f32,
    height: f32,
    nodes: Vec<SimulationNode>,
    grid: NeighborGrid,
    positions: Vec<Vec2>,
    forces: Vec<Vec2>,
    rng: StdRng,
}

impl GardenLayout {
    pub fn new(width: f32, height: f32, rng: StdRng) -> Self {
        Self {
            width,
            height,
            nodes: Vec::new(),
            grid: NeighborGrid::new(
                2.0 * config::REPULSION_RADIUS_FACTOR * config::NODE_RADIUS_MAX,
            ),
            positions: Vec::new(),
            forces: Vec::new(),
            rng,
        }
    }

    pub fn from_entropy(width: f32, height: f32) -> Self {
        Self::new(width, height, StdRng::from_entropy())
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn nodes(&self) -> &[SimulationNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Replaces the node set with fresh nodes seeded near their attractors.
    pub fn initialize(&mut self, records: &[ThoughtRecord]) {
        let padding = config::CANVAS_PADDING_RATIO * self.width.min(self.height);
        let span_x = self.width - 2.0 * padding;
        let span_y = self.height - 2.0 * padding;

        self.nodes.clear();
        for record in records {
            let (cx, cy) = record.emotion.center();
            let jitter_x = (self.rng.r#gen::<f32>() - 0.5) * config::INITIAL_SPREAD;
            let jitter_y = (self.rng.r#gen::<f32>() - 0.5) * config::INITIAL_SPREAD;
            let chars = record.content.chars().count();
            self.nodes.push(SimulationNode {
                id: record.id,
                emotion: record.emotion,
                pos: Vec2::new(
                    padding + (cx + jitter_x) * span_x,
                    padding + (cy + jitter_y) * span_y,
                ),
                vel: Vec2::ZERO,
                radius: node_radius(chars),
                petals: petal_count(chars),
                pulse_phase: self.rng.gen_range(0.0..TAU),
                chars,
            });
        }
        tracing::debug!(nodes = self.nodes.len(), "garden layout seeded");
    }

    /// Attractor point for an emotion on this canvas.
    pub fn target(&self, emotion: Emotion) -> Vec2 {
        attractor(self.width, self.height, emotion)
    }

    pub fn tick(&mut self) {
        if self.nodes.is_empty() {
            return;
        }
        self.accumulate_forces();
        self.integrate();
    }

    fn accumulate_forces(&mut self) {
        self.positions.clear();
        self.positions.extend(self.nodes.iter().map(|n| n.pos));
        self.grid.rebuild(&self.positions);

        let (width, height) = (self.width, self.height);
        self.forces.clear();
        self.forces.extend(
            self.nodes
                .iter()
                .map(|node| (attractor(width, height, node.emotion) - node.pos) * config::SPRING_GAIN),
        );

        for (i, j) in self.grid.candidate_pairs(&self.positions) {
            let (a, b) = (&self.nodes[i], &self.nodes[j]);
            let min_dist = config::REPULSION_RADIUS_FACTOR * (a.radius + b.radius);
            let delta = self.positions[i] - self.positions[j];
            let dist = delta.length();
            if dist >= min_dist {
                continue;
            }
            let push = if dist > 1e-4 {
                delta * ((min_dist - dist) / dist * config::REPULSION_GAIN)
            } else {
                let axis = Vec2::new(1.0, 0.0).rotate((i + j) as f32 * SEPARATION_TURN);
                axis * (min_dist * config::REPULSION_GAIN)
            };
            self.forces[i] += push;
            self.forces[j] -= push;
        }
    }

    fn integrate(&mut self) {
        let (width, height) = (self.width, self.height);
        for (node, force) in self.nodes.iter_mut().zip(self.forces.iter()) {
            node.vel += *force;
            node.vel = node.vel * config::VELOCITY_DAMPING;
            node.pos += node.vel;

            let r = node.radius;
            node.pos.x = clamp_axis(
                node.pos.x,
                r + config::EDGE_MARGIN_X,
                width - r - config::EDGE_MARGIN_X,
            );
            node.pos.y = clamp_axis(
                node.pos.y,
                r + config::EDGE_MARGIN_Y,
                height - r - config::EDGE_MARGIN_Y,
            );
        }
    }
}
