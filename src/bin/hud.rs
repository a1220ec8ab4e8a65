use std::io::BufRead;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use hud_layout::actor::host::LoggingBridge;
use hud_layout::actor::hud::{Event, Hud};
use hud_layout::common::config::{Config, config_file, restore_file, storage_file};
use hud_layout::common::log;
use hud_layout::layout_engine::compute_hud_layout;
use hud_layout::layout_engine::defaults::default_measure;
use hud_layout::model::WidgetRegistry;
use hud_layout::sys::geometry::Size;
use hud_layout::sys::storage::FileStorage;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "hud")]
#[command(about = "Resolve and inspect the HUD widget layout")]
struct Cli {
    /// Config file to use instead of the one in the config directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Viewport size as WIDTHxHEIGHT.
    #[arg(long, default_value = "1920x1080", value_parser = parse_screen)]
    screen: Size,

    /// Lay out as if every widget had finished loading.
    #[arg(long)]
    ready: bool,

    /// Force simple mode on.
    #[arg(long)]
    simple: bool,

    /// Apply the player's saved layout. Without a path, the default restore
    /// file is used.
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    restore: Option<PathBuf>,

    /// Only check that the config and restore file load.
    #[arg(long)]
    validate: bool,

    /// Key/value file holding chat history and the language preference.
    /// Defaults to the one in the data directory.
    #[arg(long)]
    storage: Option<PathBuf>,

    /// Feed host event envelopes from stdin, one JSON object per line, before
    /// printing the layout.
    #[arg(long)]
    events: bool,
}

fn parse_screen(s: &str) -> Result<Size, String> {
    let (w, h) = s.split_once(['x', 'X']).ok_or("expected WIDTHxHEIGHT")?;
    let w: f64 = w.trim().parse().map_err(|_| format!("bad width {w:?}"))?;
    let h: f64 = h.trim().parse().map_err(|_| format!("bad height {h:?}"))?;
    let size = Size::new(w, h);
    if size.is_empty() || !w.is_finite() || !h.is_finite() {
        return Err(format!("screen must be positive, got {s}"));
    }
    Ok(size)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let opt: Cli = Parser::parse();
    log::init_logging();

    let config_path = opt.config.clone().unwrap_or_else(config_file);
    let mut config = Config::read_or_default(&config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    for problem in config.validate() {
        warn!(%problem, "config");
    }
    let fixed = config.auto_fix_values();
    if fixed > 0 {
        info!(fixed, "replaced invalid config values with defaults");
    }
    config.settings.layout.simple_mode |= opt.simple;

    let restore_path = opt.restore.as_ref().map(|path| {
        if path.as_os_str().is_empty() { restore_file() } else { path.clone() }
    });
    let mut registry = WidgetRegistry::default();
    if let Some(path) = &restore_path {
        let saved = WidgetRegistry::load(path)
            .with_context(|| format!("loading saved layout {}", path.display()))?;
        let applied = registry.restore(saved);
        info!(applied, path = %path.display(), "restored saved layout");
    }

    if opt.validate {
        println!("ok");
        return Ok(());
    }

    let layout = if opt.events {
        let storage = FileStorage::open(opt.storage.clone().unwrap_or_else(storage_file));
        info!(path = %storage.path().display(), "using storage");
        run_events(config, registry, storage, restore_path, opt.screen, opt.ready).await?
    } else {
        let flags = config.settings.layout.context_flags();
        compute_hud_layout(
            &registry,
            &default_measure(),
            opt.screen,
            opt.ready,
            flags,
            &config.settings.layout.status,
        )
    };

    println!("{}", serde_json::to_string_pretty(&layout)?);
    Ok(())
}

async fn run_events(
    config: Config,
    registry: WidgetRegistry,
    storage: FileStorage,
    restore_path: Option<PathBuf>,
    screen: Size,
    ready: bool,
) -> anyhow::Result<Vec<hud_layout::layout_engine::PlacedWidget>> {
    let frames = config.settings.layout.mount_frame_budget + 1;
    let (mut hud, events_tx) = Hud::new(
        config.settings,
        registry,
        default_measure(),
        Box::new(storage),
        Box::new(LoggingBridge),
        screen,
    );
    if let Some(path) = restore_path {
        hud = hud.with_restore_path(path);
    }
    if ready {
        for _ in 0..frames {
            events_tx.send(Event::Frame);
        }
    }
    for line in std::io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        if !line.trim().is_empty() {
            events_tx.send(Event::RawHost(line));
        }
    }
    events_tx.send(Event::Shutdown);

    let hud = hud.run().await;
    Ok(hud.layout().to_vec())
}
