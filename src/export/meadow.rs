use std::path::PathBuf;

use chrono::{Local, TimeZone};

use crate::{
    clock::Millis,
    config,
    emotion::{Emotion, Palette},
    garden::{dominant_emotion, draw_flower, emotion_counts, Garden, SimulationNode, BACKGROUND, INK},
    render::{Canvas, GradientStop, Paint, Path, TextAlign, TextStyle},
    types::{Rect, Rgba, Vec2},
};

use super::{Aspect, ExportError, ExportResult, ExportSink, Typeface, rasterize_card};

const MARGIN: f32 = 100.0;
const PORTRAIT_TOP: f32 = 180.0;
const STATS_SHOWN: usize = 4;

const BORDER_PINK: Rgba = Rgba::rgb8(0xE8, 0xA4, 0xC4);
const BORDER_BLUSH: Rgba = Rgba::rgb8(0xFF, 0xF0, 0xF5);
const BORDER_LILAC: Rgba = Rgba::rgb8(0xC4, 0xB0, 0xE8);

/// Numbers printed on the meadow card.
#[derive(Clone, Debug, PartialEq)]
pub struct MeadowSummary {
    pub blooms: usize,
    pub total_chars: usize,
    pub counts: Vec<(Emotion, usize)>,
    pub dominant: Emotion,
}

impl MeadowSummary {
    pub fn from_nodes(nodes: &[SimulationNode]) -> Self {
        let counts = emotion_counts(nodes);
        Self {
            blooms: nodes.len(),
            total_chars: nodes.iter().map(|n| n.chars).sum(),
            dominant: dominant_emotion(&counts),
            counts,
        }
    }
}

impl Aspect {
    fn portrait_height(self) -> f32 {
        match self {
            Aspect::Square => 500.0,
            Aspect::Story => 850.0,
        }
    }

    fn footer_offset(self) -> f32 {
        match self {
            Aspect::Square => 180.0,
            Aspect::Story => 300.0,
        }
    }
}

fn hex_alpha(byte: u8) -> f32 {
    byte as f32 / 255.0
}

fn format_date(at: Millis) -> String {
    Local
        .timestamp_millis_opt(at)
        .single()
        .map(|dt| dt.format("%-m/%-d/%Y").to_string())
        .unwrap_or_default()
}

/// Draws the meadow map. `source` is the logical canvas the nodes live in.
pub fn draw_meadow_card(
    canvas: &mut dyn Canvas,
    nodes: &[SimulationNode],
    palette: &Palette,
    source: (f32, f32),
    aspect: Aspect,
    date: &str,
) {
    let (width, height) = aspect.size();
    let summary = MeadowSummary::from_nodes(nodes);
    let aura = palette.color(summary.dominant);

    canvas.fill_rect(Rect::new(0.0, 0.0, width, height), &Paint::Solid(BACKGROUND));

    let border = Paint::linear(
        Vec2::ZERO,
        Vec2::new(width, height),
        vec![
            GradientStop::new(0.0, BORDER_PINK),
            GradientStop::new(0.5, BORDER_BLUSH),
            GradientStop::new(1.0, BORDER_LILAC),
        ],
    );
    canvas.stroke_rect(Rect::new(20.0, 20.0, width - 40.0, height - 40.0), &border, 40.0);
    canvas.stroke_rect(
        Rect::new(60.0, 60.0, width - 120.0, height - 120.0),
        &Paint::Solid(INK.with_alpha(0.1)),
        1.0,
    );

    canvas.fill_text(
        "your meadow map",
        Vec2::new(MARGIN, 120.0),
        &TextStyle::new(42.0, INK),
    );
    canvas.fill_text(
        &summary.dominant.label().to_uppercase(),
        Vec2::new(width - MARGIN, 115.0),
        &TextStyle::new(32.0, aura).align(TextAlign::Right).bold(),
    );

    let portrait_height = aspect.portrait_height();
    draw_portrait(canvas, nodes, palette, source, aura, width, portrait_height);

    let stats_y = PORTRAIT_TOP + portrait_height + 60.0;
    canvas.fill_text(
        "Aura Composition:",
        Vec2::new(MARGIN, stats_y),
        &TextStyle::new(24.0, INK),
    );
    let stat_style = TextStyle::new(20.0, INK.with_alpha(0.8));
    for (i, (emotion, count)) in summary.counts.iter().take(STATS_SHOWN).enumerate() {
        let x = MARGIN + (i % 2) as f32 * 400.0;
        let y = stats_y + 60.0 + (i / 2) as f32 * 50.0;
        canvas.fill_path(
            &Path::circle(Vec2::new(x, y - 8.0), 8.0),
            &Paint::Solid(palette.color(*emotion)),
        );
        canvas.fill_text(
            &format!("{emotion}: {count} blooms"),
            Vec2::new(x + 30.0, y),
            &stat_style,
        );
    }

    let footer_y = height - aspect.footer_offset();
    let center_x = width / 2.0;
    canvas.fill_text(
        &format!("\"a garden of {} preserved reflections\"", summary.blooms),
        Vec2::new(center_x, footer_y),
        &TextStyle::new(20.0, INK.with_alpha(0.4))
            .align(TextAlign::Center)
            .italic(),
    );
    let muted = TextStyle::new(18.0, INK.with_alpha(0.6)).align(TextAlign::Center);
    canvas.fill_text(
        &format!("Reflection Score: {}  •  Date: {date}", summary.total_chars),
        Vec2::new(center_x, footer_y + 50.0),
        &muted,
    );
    canvas.fill_text(
        "udyāna",
        Vec2::new(center_x, footer_y + 100.0),
        &TextStyle { size: 16.0, ..muted }.bold(),
    );

    let clear = Rgba::WHITE.with_alpha(0.0);
    let shine = Paint::linear(
        Vec2::ZERO,
        Vec2::new(width, height),
        vec![
            GradientStop::new(0.0, clear),
            GradientStop::new(0.45, clear),
            GradientStop::new(0.5, Rgba::WHITE.with_alpha(0.3)),
            GradientStop::new(0.55, clear),
            GradientStop::new(1.0, clear),
        ],
    );
    canvas.fill_rect(Rect::new(0.0, 0.0, width, height), &shine);
}

fn draw_portrait(
    canvas: &mut dyn Canvas,
    nodes: &[SimulationNode],
    palette: &Palette,
    source: (f32, f32),
    aura: Rgba,
    width: f32,
    portrait_height: f32,
) {
    let frame = Rect::new(MARGIN, PORTRAIT_TOP, width - 2.0 * MARGIN, portrait_height);
    canvas.save();
    canvas.clip_rect(frame);
    canvas.fill_rect(
        frame,
        &Paint::radial(
            frame.center(),
            0.0,
            500.0,
            vec![
                GradientStop::new(0.0, aura.with_alpha(hex_alpha(0x22))),
                GradientStop::new(1.0, Rgba::WHITE),
            ],
        ),
    );

    let (source_w, source_h) = (source.0.max(1.0), source.1.max(1.0));
    for node in nodes {
        let placed = SimulationNode {
            pos: Vec2::new(
                frame.x + node.pos.x / source_w * frame.width,
                frame.y + node.pos.y / source_h * frame.height,
            ),
            vel: Vec2::ZERO,
            radius: node.radius * config::EXPORT_FLOWER_SCALE,
            ..node.clone()
        };
        draw_flower(canvas, &placed, 0.0, palette);
    }
    canvas.restore();
}

/// Renders the meadow map for the current garden and hands it to `sink`.
/// An empty garden exports nothing; a missing typeface is an error.
pub fn export_meadow(
    garden: &Garden,
    aspect: Aspect,
    now: Millis,
    face: Option<&dyn Typeface>,
    sink: &mut dyn ExportSink,
) -> ExportResult<Option<PathBuf>> {
    if garden.is_empty() {
        tracing::debug!("meadow export skipped, garden is empty");
        return Ok(None);
    }
    let face = face.ok_or(ExportError::NoFont)?;
    let date = format_date(now);
    let card = rasterize_card(
        format!("udyana-meadow-map-{aspect}-{now}.png"),
        aspect,
        face,
        |canvas| {
            draw_meadow_card(
                canvas,
                garden.nodes(),
                garden.palette(),
                garden.size(),
                aspect,
                &date,
            )
        },
    )?;
    sink.deliver(&card).map(Some)
}
