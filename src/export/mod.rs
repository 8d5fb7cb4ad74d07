//! Shareable cards: the meadow map of the whole garden and the single
//! thought card. Cards are rasterized on a [`PixelCanvas`], typeset through a
//! [`Typeface`] and handed to an [`ExportSink`] together with a suggested
//! filename.

mod meadow;
mod thought;
mod typeface;

use std::{fmt, fs, path::PathBuf};

use thiserror::Error;

use crate::{
    render::{Canvas, PixelCanvas},
    types::Rgba,
};

pub use meadow::{MeadowSummary, draw_meadow_card, export_meadow};
pub use thought::{draw_thought_card, export_thought, thought_gradient, wrap_text};
pub use typeface::{CardFont, FONT_ENV, Typeface};

pub const CARD_WIDTH: f32 = 1080.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Aspect {
    Square,
    Story,
}

impl Aspect {
    pub fn size(self) -> (f32, f32) {
        match self {
            Aspect::Square => (CARD_WIDTH, 1080.0),
            Aspect::Story => (CARD_WIDTH, 1920.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Aspect::Square => "square",
            Aspect::Story => "story",
        }
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A finished card ready to be written somewhere.
#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8.
    pub rgba: Vec<u8>,
}

/// Draws a card at the aspect's resolution, then typesets its text on top.
pub(crate) fn rasterize_card(
    filename: String,
    aspect: Aspect,
    typeface: &dyn Typeface,
    draw: impl FnOnce(&mut dyn Canvas),
) -> ExportResult<Card> {
    let (width, height) = aspect.size();
    let (width, height) = (width as u32, height as u32);
    let mut canvas = PixelCanvas::new(width, height).ok_or(ExportError::EmptySurface)?;
    canvas.clear(Rgba::WHITE);
    draw(&mut canvas);
    for label in canvas.take_labels() {
        typeface.draw(&mut canvas, &label);
    }
    Ok(Card {
        filename,
        width,
        height,
        rgba: canvas.to_rgba8(),
    })
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create export directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("no font available for card text; set [export] font or UDYANA_FONT")]
    NoFont,
    #[error("card surface has no pixels")]
    EmptySurface,
}

pub type ExportResult<T> = Result<T, ExportError>;

pub trait ExportSink {
    /// Stores the card and reports where it went.
    fn deliver(&mut self, card: &Card) -> ExportResult<PathBuf>;
}

/// Writes cards into a directory, creating it on first use.
#[derive(Clone, Debug)]
pub struct FileExportSink {
    dir: PathBuf,
}

impl FileExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ExportSink for FileExportSink {
    fn deliver(&mut self, card: &Card) -> ExportResult<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|source| ExportError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.dir.join(&card.filename);
        image::save_buffer(
            &path,
            &card.rgba,
            card.width,
            card.height,
            image::ColorType::Rgba8,
        )
        .map_err(|source| ExportError::Encode {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), width = card.width, height = card.height, "card exported");
        Ok(path)
    }
}
