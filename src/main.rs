mod clock;
mod config;
mod editor;
mod emotion;
mod export;
mod flags;
mod garden;
mod logging;
mod render;
mod spatial;
mod store;
mod types;
mod ui;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::{
    clock::{Clock, SystemClock},
    config::AppConfig,
    emotion::Palette,
    export::{Aspect, CardFont, FileExportSink, Typeface},
    garden::{Garden, GardenLayout},
    store::{SqliteStore, ThoughtStore},
};

#[derive(Parser)]
#[command(name = "udyana", version, about = "A journal whose words fade unless you keep them")]
struct Cli {
    /// Config file (defaults to ~/.udyana/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Database file, overriding the configured one
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Write the meadow map of every preserved thought without opening the editor
    Export {
        #[arg(long, value_enum, default_value_t = Aspect::Square)]
        aspect: Aspect,
        /// Output directory (defaults to the configured export dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(db) = &cli.db {
        config.storage.db_path = db.to_string_lossy().into_owned();
    }
    logging::init(&config.log)?;

    let store = open_store(Path::new(&config.storage.db_path))?;

    match cli.command {
        None => ui::run(&store, &config),
        Some(Command::Export { aspect, out }) => {
            let dir = out.unwrap_or_else(|| PathBuf::from(&config.export.dir));
            match export_garden(&store, &config, aspect, &dir)? {
                Some(path) => println!("{}", path.display()),
                None => println!("nothing has bloomed yet"),
            }
            Ok(())
        }
    }
}

fn open_store(path: &Path) -> Result<SqliteStore> {
    SqliteStore::open(path).with_context(|| format!("failed to open database {}", path.display()))
}

fn export_garden(
    store: &SqliteStore,
    config: &AppConfig,
    aspect: Aspect,
    dir: &Path,
) -> Result<Option<PathBuf>> {
    let records = store
        .query_by_solidified(true)
        .context("failed to read preserved thoughts")?;
    let mut garden = Garden::new(
        GardenLayout::from_entropy(config.garden.width, config.garden.height),
        Palette::default(),
    );
    garden.load(&records);
    garden.settle(config::EXPORT_SETTLE_TICKS);

    let font = CardFont::discover(config.export.font.as_deref().map(Path::new));
    let mut sink = FileExportSink::new(dir);
    let path = export::export_meadow(
        &garden,
        aspect,
        SystemClock.now_ms(),
        font.as_ref().map(|f| f as &dyn Typeface),
        &mut sink,
    )?;
    Ok(path)
}
