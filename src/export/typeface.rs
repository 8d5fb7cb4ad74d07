use std::path::{Path, PathBuf};

use fontdue::{
    Font, FontSettings,
    layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle as GlyphStyle},
};

use crate::render::{Label, PixelCanvas, TextAlign};
use crate::types::Rgba;

/// Horizontal shear applied to italic labels.
const ITALIC_SLANT: f32 = 0.2;

/// Overrides the configured font.
pub const FONT_ENV: &str = "UDYANA_FONT";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Text metrics and glyph compositing for raster cards.
pub trait Typeface {
    /// Inked width of `text` set at `size` pixels.
    fn measure(&self, text: &str, size: f32) -> f32;

    /// Draws `label` with its baseline at `label.at.y`.
    fn draw(&self, canvas: &mut PixelCanvas, label: &Label);
}

pub struct CardFont {
    font: Font,
}

impl CardFont {
    pub fn load(path: &Path) -> Option<Self> {
        let bytes = std::fs::read(path).ok()?;
        let font = Font::from_bytes(bytes, FontSettings::default()).ok()?;
        tracing::debug!(path = %path.display(), "card font loaded");
        Some(Self { font })
    }

    /// First usable font out of the configured path, `UDYANA_FONT`, then a
    /// handful of common system locations.
    pub fn discover(configured: Option<&Path>) -> Option<Self> {
        if let Some(path) = configured {
            if let Some(font) = Self::load(path) {
                return Some(font);
            }
            tracing::warn!(path = %path.display(), "configured font could not be loaded");
        }
        let found = std::env::var_os(FONT_ENV)
            .map(PathBuf::from)
            .into_iter()
            .chain(SYSTEM_FONTS.iter().map(PathBuf::from))
            .find_map(|path| Self::load(&path));
        if found.is_none() {
            tracing::warn!("no font found; card export is unavailable");
        }
        found
    }

    fn layout(&self, text: &str, size: f32, x: f32, y: f32) -> Layout {
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings {
            x,
            y,
            ..LayoutSettings::default()
        });
        layout.append(&[&self.font], &GlyphStyle::new(text, size, 0));
        layout
    }
}

impl Typeface for CardFont {
    fn measure(&self, text: &str, size: f32) -> f32 {
        let layout = self.layout(text, size, 0.0, 0.0);
        let mut min_x = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        for glyph in layout.glyphs() {
            min_x = min_x.min(glyph.x);
            max_x = max_x.max(glyph.x + glyph.width as f32);
        }
        if min_x.is_finite() && max_x.is_finite() {
            (max_x - min_x).max(0.0)
        } else {
            0.0
        }
    }

    fn draw(&self, canvas: &mut PixelCanvas, label: &Label) {
        let size = label.style.size;
        if size <= 0.0 || label.text.trim().is_empty() {
            return;
        }
        let x = match label.style.align {
            TextAlign::Left => label.at.x,
            TextAlign::Center => label.at.x - self.measure(&label.text, size) / 2.0,
            TextAlign::Right => label.at.x - self.measure(&label.text, size),
        };
        let ascent = self
            .font
            .horizontal_line_metrics(size)
            .map_or(size * 0.8, |metrics| metrics.ascent);
        let layout = self.layout(&label.text, size, x, label.at.y - ascent);

        // Faux bold: a second pass nudged to the right.
        let passes: &[f32] = if label.style.bold {
            &[0.0, (size / 24.0).max(1.0)]
        } else {
            &[0.0]
        };
        let slant = if label.style.italic { ITALIC_SLANT } else { 0.0 };
        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let (metrics, bitmap) = self.font.rasterize_indexed(glyph.key.glyph_index, glyph.key.px);
            for &dx in passes {
                let origin = (glyph.x + dx, glyph.y);
                blend_glyph(canvas, origin, label.at.y, slant, metrics.width, &bitmap, label.style.color);
            }
        }
    }
}

/// Rows are sheared by `slant` pixels per pixel above `baseline`.
fn blend_glyph(
    canvas: &mut PixelCanvas,
    origin: (f32, f32),
    baseline: f32,
    slant: f32,
    width: usize,
    bitmap: &[u8],
    color: Rgba,
) {
    if width == 0 {
        return;
    }
    for (row, line) in bitmap.chunks(width).enumerate() {
        let y = origin.1 + row as f32;
        let shift = (baseline - y) * slant;
        let (px, py) = ((origin.0 + shift).floor() as i64, y.floor() as i64);
        for (col, &alpha) in line.iter().enumerate() {
            if alpha > 0 {
                canvas.plot(px + col as i64, py, color, alpha as f32 / 255.0);
            }
        }
    }
}
