use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};

use crate::{
    render::{Label, PixelCanvas, TextAlign},
    types::Rgba,
};

pub const UPPER_HALF: char = '▀';

pub fn color_for(rgba: Rgba) -> Color {
    let (r, g, b) = rgba.to_rgb8();
    Color::Rgb(r, g, b)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

/// Terminal cells for a pixel canvas two rows tall per cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CellGrid {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl CellGrid {
    pub fn from_canvas(canvas: &PixelCanvas) -> Self {
        let width = canvas.width().min(u16::MAX as u32) as u16;
        let height = (canvas.height() / 2).min(u16::MAX as u32) as u16;
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for row in 0..height as u32 {
            for x in 0..width as u32 {
                cells.push(Cell {
                    ch: UPPER_HALF,
                    fg: color_for(canvas.pixel(x, row * 2)),
                    bg: color_for(canvas.pixel(x, row * 2 + 1)),
                });
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y as usize * self.width as usize + x as usize)
    }

    /// Writes label text over the picture, keeping the cell's lower color as
    /// background. Text that runs off the grid is cut.
    pub fn overlay(&mut self, labels: &[Label]) {
        for label in labels {
            let len = label.text.chars().count() as f32;
            let start = match label.style.align {
                TextAlign::Left => label.at.x,
                TextAlign::Center => label.at.x - len / 2.0,
                TextAlign::Right => label.at.x - len,
            };
            let row = (label.at.y / 2.0).floor();
            if row < 0.0 || row >= self.height as f32 {
                continue;
            }
            let row = row as usize;
            let fg = color_for(label.style.color.with_alpha(1.0));
            for (i, ch) in label.text.chars().enumerate() {
                let col = (start + i as f32).round();
                if col < 0.0 || col >= self.width as f32 {
                    continue;
                }
                let idx = row * self.width as usize + col as usize;
                let cell = &mut self.cells[idx];
                cell.ch = ch;
                cell.fg = fg;
            }
        }
    }

    pub fn to_lines(&self) -> Vec<Line<'static>> {
        if self.width == 0 {
            return Vec::new();
        }
        self.cells
            .chunks(self.width as usize)
            .map(|row| {
                let spans: Vec<Span> = row
                    .iter()
                    .map(|cell| {
                        Span::styled(cell.ch.to_string(), Style::default().fg(cell.fg).bg(cell.bg))
                    })
                    .collect();
                Line::from(spans)
            })
            .collect()
    }
}
