//! `releve` — terminal client for the academic results portal.
//!
//! # Usage
//!
//! ```
//! releve                                   # restore a saved session, or log in
//! releve --url https://portal.example/api
//! releve --config ~/.config/releve/config.toml
//! ```

mod app;
mod ui;

use std::{io, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use releve_client::{ApiClient, ApiConfig, token::FileTokenStore};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "releve", about = "Terminal client for the academic results portal")]
struct Args {
  /// Path to a TOML config file (url, language, token_file).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the portal API, including the `/api` prefix.
  #[arg(long, env = "RELEVE_URL")]
  url: Option<String>,

  /// Where the bearer token is persisted between runs.
  #[arg(long, env = "RELEVE_TOKEN_FILE", value_name = "FILE")]
  token_file: Option<PathBuf>,

  /// Value for the Accept-Language header.
  #[arg(long, env = "RELEVE_LANGUAGE")]
  language: Option<String>,

  /// Append tracing output to this file (stdout belongs to the TUI).
  #[arg(long, env = "RELEVE_LOG_FILE", value_name = "FILE")]
  log_file: Option<PathBuf>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:        String,
  #[serde(default)]
  language:   String,
  #[serde(default)]
  token_file: String,
}

const DEFAULT_TOKEN_FILE: &str = "~/.config/releve/token";

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  // Tracing goes to a file when asked for; otherwise events are dropped so
  // the alternate screen stays clean.
  if let Some(log_path) = &args.log_file {
    let file = std::fs::OpenOptions::new()
      .create(true)
      .append(true)
      .open(expand_tilde(log_path))
      .with_context(|| format!("opening log file {}", log_path.display()))?;
    tracing_subscriber::fmt()
      .with_env_filter(
        EnvFilter::builder()
          .with_default_directive(LevelFilter::INFO.into())
          .from_env_lossy(),
      )
      .with_writer(std::sync::Mutex::new(file))
      .with_ansi(false)
      .init();
  }

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(expand_tilde(path))
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let defaults = ApiConfig::default();
  let api_config = ApiConfig {
    base_url:        args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or(defaults.base_url),
    accept_language: args
      .language
      .or_else(|| (!file_cfg.language.is_empty()).then(|| file_cfg.language.clone()))
      .unwrap_or(defaults.accept_language),
  };
  let token_path = args
    .token_file
    .or_else(|| {
      (!file_cfg.token_file.is_empty()).then(|| PathBuf::from(&file_cfg.token_file))
    })
    .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE));

  let client = ApiClient::new(api_config)?;
  let store = FileTokenStore::new(expand_tilde(&token_path));
  let mut app = App::new(client, store);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Validate any saved session before the first frame.
  app.restore_session().await;

  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(evt) = maybe_event {
      match evt {
        Event::Key(key) => {
          let cont = app.handle_key(key).await?;
          if !cont {
            break;
          }
        }
        Event::Resize(_, _) => {
          // Terminal will redraw on next iteration.
        }
        _ => {}
      }
    }
  }

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &std::path::Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
