//! The garden view: a force layout that keeps preserved thoughts clustered
//! by emotion, the procedural flower drawn for each one and the compositor
//! that assembles a frame.

mod compositor;
mod flower;
mod layout;

pub use compositor::{
    dominant_emotion, draw_background_flow, draw_connections, draw_legend, emotion_counts,
    legend_emotions, Garden, BACKGROUND, EMPTY_MESSAGE, INK,
};
pub use flower::{draw_flower, petal_outline, petal_path, PetalOutline, PetalStep};
pub use layout::{node_radius, petal_count, GardenLayout, SimulationNode};
