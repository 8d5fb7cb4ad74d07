use std::collections::HashMap;

use crate::types::Vec2;

/// Uniform bucket grid over node positions.
///
/// With a cell at least as large as the widest interaction distance, every
/// pair that can interact lies in the same or an adjacent cell.
#[derive(Debug)]
pub struct NeighborGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl NeighborGrid {
    pub fn new(cell_size: f32) -> Self {
        assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "cell_size must be positive and finite"
        );
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn rebuild(&mut self, positions: &[Vec2]) {
        self.cells.clear();
        for (idx, pos) in positions.iter().enumerate() {
            let key = self.cell_key(*pos);
            self.cells.entry(key).or_default().push(idx);
        }
    }

    /// Indices in the 3x3 block around `pos`, ascending.
    pub fn near(&self, pos: Vec2, out: &mut Vec<usize>) {
        out.clear();
        let (cx, cy) = self.cell_key(pos);
        for dy in -1..=1 {
            for dx in -1..=1 {
                if let Some(indices) = self.cells.get(&(cx + dx, cy + dy)) {
                    out.extend_from_slice(indices);
                }
            }
        }
        out.sort_unstable();
    }

    /// Every candidate pair `(i, j)` with `i < j`, in a stable order.
    pub fn candidate_pairs(&self, positions: &[Vec2]) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        let mut near = Vec::new();
        for (i, pos) in positions.iter().enumerate() {
            self.near(*pos, &mut near);
            pairs.extend(near.iter().filter(|&&j| j > i).map(|&j| (i, j)));
        }
        pairs
    }

    fn cell_key(&self, pos: Vec2) -> (i32, i32) {
        let cx = (pos.x / self.cell_size).floor() as i32;
        let cy = (pos.y / self.cell_size).floor() as i32;
        (cx, cy)
    }
}
