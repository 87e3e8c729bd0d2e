mod app;
mod cache;
mod config;
mod constants;
mod input;
mod playback;
mod player;
mod store;
mod theme;
mod ui;
mod youtube;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use directories::ProjectDirs;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use app::App;
use config::{API_KEY_ENV, Config, KeySources, resolve_api_key};
use constants::constants;
use playback::PlaybackController;
use player::MpvHost;
use store::{FileStorage, LocalStore, MemoryStorage, Storage};
use youtube::ApiClient;

const LOG_ENV: &str = "FASTTUBE_LOG";

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// YouTube Data API key. Saved for later runs.
  #[arg(long)]
  api_key: Option<String>,

  /// Write playlist, history, stats and settings as JSON to this file and exit
  #[arg(long, value_name = "PATH")]
  export: Option<PathBuf>,

  /// Print a shell completion script and exit
  #[arg(long, value_enum, value_name = "SHELL")]
  completions: Option<Shell>,
}

// --- Logging ---

/// Log to a daily file in the data directory; the terminal belongs to the UI.
fn init_logging() -> Option<WorkerGuard> {
  let dir = ProjectDirs::from("", "", "fasttube")?.data_dir().join("logs");
  std::fs::create_dir_all(&dir).ok()?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "fasttube.log"));
  let filter =
    EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).with_env_var(LOG_ENV).from_env_lossy();
  tracing_subscriber::fmt().with_writer(writer).with_ansi(false).with_env_filter(filter).try_init().ok()?;
  Some(guard)
}

// --- Composition ---

/// File-backed store, or a volatile one when the data directory is unusable.
fn open_store() -> (LocalStore, bool) {
  let quota = constants().storage_quota_bytes;
  let history_limit = constants().history_limit;
  match FileStorage::open_default(quota) {
    Ok(storage) => {
      info!(dir = %storage.dir().display(), "store: opened");
      (LocalStore::new(Box::new(storage) as Box<dyn Storage>, history_limit), true)
    }
    Err(e) => {
      warn!(err = %e, "store: data directory unavailable, keeping data in memory");
      (LocalStore::new(Box::new(MemoryStorage::new()), history_limit), false)
    }
  }
}

fn build_app(args: &Args, config: Config, mut store: LocalStore) -> App {
  if let Some(key) = args.api_key.as_deref()
    && !store.save_api_key(key)
  {
    warn!("config: could not persist --api-key");
  }

  let stored = store.api_key_override();
  let env = std::env::var(API_KEY_ENV).ok();
  let api_key = resolve_api_key(KeySources {
    stored: stored.as_deref(),
    cli: args.api_key.as_deref(),
    file: config.api_key.as_deref(),
    env: env.as_deref(),
  });
  let api_config = config.api_config(api_key);
  info!(region = %api_config.region, credential = api_config.has_credential(), "youtube: client configured");
  let api = ApiClient::new(api_config);

  let host = MpvHost::new();
  let now_playing = host.now_playing();
  let playback = PlaybackController::new(Box::new(host), config.playback_policy());

  App::new(config, api, playback, store, now_playing)
}

fn export(store: &LocalStore, path: &Path) -> Result<()> {
  let bundle = store.export(Utc::now());
  let json = serde_json::to_string_pretty(&bundle).context("Failed to serialize export")?;
  std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
  info!(path = %path.display(), "export: written");
  Ok(())
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), "fasttube", &mut std::io::stdout());
    return Ok(());
  }

  let _guard = init_logging();
  info!(version = env!("CARGO_PKG_VERSION"), "fasttube: starting");

  let config = Config::load();
  let (store, persistent) = open_store();

  if let Some(path) = &args.export {
    export(&store, path)?;
    println!("Exported library to {}", path.display());
    return Ok(());
  }

  let mut app = build_app(&args, config, store);
  if !persistent {
    app.info_message = Some("Storage unavailable: changes will not be saved.".to_string());
  }

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, &mut app).await;
  ratatui::restore();
  app.close_player();
  info!("fasttube: exiting");
  result
}

async fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  app.boot();

  loop {
    app.check_pending();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(app, key).await;
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  Ok(())
}
