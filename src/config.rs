use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const RENDER_HZ: f32 = 30.0;
/// Simulation clock advance per frame.
pub const FRAME_TIME_STEP: f32 = 0.016;

pub const DECAY_HORIZON_MS: i64 = 24 * 60 * 60 * 1000;
pub const OPACITY_POLL_MS: i64 = 1000;
pub const AUTOSAVE_DELAY_MS: i64 = 1000;

pub const VELOCITY_WINDOW_MS: i64 = 1000;
pub const VELOCITY_MAX_EVENTS: usize = 10;

pub const CANVAS_PADDING_RATIO: f32 = 0.15;
pub const INITIAL_SPREAD: f32 = 0.15;
pub const TARGET_INSET_RATIO: f32 = 0.15;
pub const TARGET_SPAN_RATIO: f32 = 0.7;

pub const NODE_RADIUS_BASE: f32 = 20.0;
pub const NODE_RADIUS_CHARS_PER_PX: f32 = 10.0;
pub const NODE_RADIUS_GROWTH_CAP: f32 = 30.0;
pub const NODE_RADIUS_MAX: f32 = NODE_RADIUS_BASE + NODE_RADIUS_GROWTH_CAP;
pub const PETALS_CHARS_PER_PETAL: usize = 8;
pub const PETALS_MIN: usize = 5;
pub const PETALS_MAX: usize = 18;

pub const SPRING_GAIN: f32 = 0.0003;
pub const REPULSION_GAIN: f32 = 0.02;
pub const REPULSION_RADIUS_FACTOR: f32 = 2.0;
pub const VELOCITY_DAMPING: f32 = 0.95;
pub const EDGE_MARGIN_X: f32 = 20.0;
pub const EDGE_MARGIN_Y: f32 = 100.0;

pub const PULSE_AMPLITUDE: f32 = 0.08;
pub const PULSE_RATE: f32 = 2.0;
pub const SPIN_RATE: f32 = 0.2;
pub const GLOW_RADIUS_FACTOR: f32 = 3.5;
pub const CENTER_DISK_FACTOR: f32 = 0.4;

pub const FLOW_LINES: usize = 8;
pub const FLOW_STEP_PX: f32 = 20.0;
pub const FLOW_AMPLITUDE: f32 = 30.0;
pub const CONNECTION_DISTANCE: f32 = 400.0;
pub const CONNECTION_MAX_OPACITY: f32 = 0.2;
pub const CONNECTION_BOW: f32 = 0.1;
pub const LEGEND_BOTTOM_OFFSET: f32 = 60.0;
pub const LEGEND_SLOT_WIDTH: f32 = 80.0;
pub const LEGEND_DOT_RADIUS: f32 = 6.0;

pub const EXPORT_FLOWER_SCALE: f32 = 0.8;
/// Layout steps run before a headless export so clusters have formed.
pub const EXPORT_SETTLE_TICKS: usize = 600;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub log: LogConfig,
    pub garden: GardenConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub file: String,
}

/// Logical canvas the garden simulates in; the terminal view scales it down.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GardenConfig {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    pub dir: String,
    /// TrueType/OpenType file for card text; system fonts are searched when unset.
    pub font: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            log: LogConfig::default(),
            garden: GardenConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: data_dir().join("udyana.db").to_string_lossy().into_owned(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: data_dir().join("udyana.log").to_string_lossy().into_owned(),
        }
    }
}

impl Default for GardenConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: data_dir().join("exports").to_string_lossy().into_owned(),
            font: None,
        }
    }
}

/// Returns `~/.udyana/`, falling back to the working directory when no home
/// directory can be resolved.
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".udyana"))
        .unwrap_or_else(|| PathBuf::from(".udyana"))
}

pub fn default_config_path() -> PathBuf {
    data_dir().join("config.toml")
}

impl AppConfig {
    /// Loads from `path` (or the default location). A missing file yields the
    /// defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(default_config_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(raw)?;
        anyhow::ensure!(
            config.garden.width > 0.0 && config.garden.height > 0.0,
            "garden canvas must have a positive size"
        );
        Ok(config)
    }
}
