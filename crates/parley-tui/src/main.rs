mod input;
mod offline;
mod render;
mod runtime;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use parley_core::config::{CoreConfig, Preferences};
use parley_core::notify::{
    AlertSettings, Alerter, BellAlerter, CompositeAlerter, LedAlerter, LogAlerter, BEEPY_LED_ROOT,
};
use parley_core::roomlist::ListStrategy;
use parley_core::tracing_setup::init_tracing;
use parley_core::CoreRuntime;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::offline::{spawn_replay, ReplayClient, Session};
use crate::runtime::run_app;
use ui::App;

#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Terminal chat client")]
struct Args {
    /// Offline session file to replay
    #[arg(long)]
    session: Option<PathBuf>,

    /// Directory holding preferences.json
    #[arg(long)]
    config_dir: Option<PathBuf>,

    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Group rooms by recency instead of by tag
    #[arg(long)]
    recency: bool,

    /// Widths at or below this use the single-pane layout
    #[arg(long)]
    compact_width: Option<u16>,
}

fn core_config(args: &Args) -> CoreConfig {
    let defaults = CoreConfig::default();
    CoreConfig::new(
        args.data_dir.clone().unwrap_or(defaults.data_dir),
        args.config_dir.clone().unwrap_or(defaults.config_dir),
    )
}

fn build_alerter(prefs: &Preferences) -> CompositeAlerter {
    let mut alerter = CompositeAlerter::new()
        .with(LogAlerter)
        .with(BellAlerter::stdout());
    if prefs.led_alerts {
        match LedAlerter::probe(BEEPY_LED_ROOT) {
            Ok(led) => alerter.push(Box::new(led)),
            Err(e) => warn!("LED alerts unavailable: {}", e),
        }
    }
    alerter
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    // Set up panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ui::restore_terminal();
        eprintln!("\n\n=== PANIC ===");
        eprintln!("{}", panic_info);
        eprintln!("=============\n");
        original_hook(panic_info);
    }));

    let config = core_config(&args);
    let prefs_path = config.preferences_path();
    let mut prefs = Preferences::load(&prefs_path)
        .with_context(|| format!("Failed to load preferences from {}", prefs_path.display()))?;
    if let Some(width) = args.compact_width {
        prefs.compact_width = width;
    }

    let session = match &args.session {
        Some(path) => Session::load(path)?,
        None => Session::default(),
    };
    if !session.user_id.is_empty() {
        prefs.user_id = session.user_id.clone();
    }
    info!(
        data_dir = %config.data_dir.display(),
        config_dir = %config.config_dir.display(),
        rooms = session.rooms.len(),
        "starting"
    );

    let strategy = if args.recency || !prefs.tag_group_rooms {
        ListStrategy::Recency
    } else {
        ListStrategy::TagGrouped
    };
    let (sync_tx, sync_rx) = mpsc::unbounded_channel();
    let (core_tx, core_rx) = mpsc::unbounded_channel();
    let client = Arc::new(ReplayClient::new(&session, sync_tx.clone()));
    let alerter: Arc<dyn Alerter> = Arc::new(build_alerter(&prefs));
    let core = Arc::new(CoreRuntime::new(
        strategy,
        client,
        alerter,
        AlertSettings::from(&prefs),
        core_tx,
    ));

    let mut app = App::new(core, prefs, prefs_path);
    let replay = spawn_replay(session, sync_tx);

    let mut terminal = ui::init_terminal()?;
    let result = run_app(&mut terminal, &mut app, sync_rx, core_rx).await;
    ui::restore_terminal()?;

    replay.abort();
    app.save_preferences();

    if let Err(err) = result {
        eprintln!("Error: {err}");
    }

    Ok(())
}
