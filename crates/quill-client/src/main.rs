//! `quill`: command-line notes client.
//!
//! # Usage
//!
//! ```
//! quill add "buy milk"
//! quill list
//! quill login --session session.json
//! quill refresh --session renewed.json
//! quill --config ~/.config/quill/client.toml status
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quill_client::{App, BridgeOutcome, ClientConfig, MigrationOutcome};
use quill_core::{Error, NoteId, Session};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "quill", about = "Notes that follow you from guest to account")]
struct Args {
  /// Path to a TOML config file (base_url, data_dir, guest_note_limit).
  #[arg(short, long, value_name = "FILE", env = "QUILL_CONFIG")]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List notes of the active tier.
  List,
  /// Add a note.
  Add { content: String },
  /// Remove a note by id.
  Remove { id: NoteId },
  /// Sign in with a session JSON handed over by the auth provider.
  Login {
    #[arg(long, value_name = "FILE")]
    session: PathBuf,
  },
  /// Replace the session after the auth provider renewed its tokens.
  Refresh {
    #[arg(long, value_name = "FILE")]
    session: PathBuf,
  },
  /// Sign out. Notes stay in the account.
  Logout,
  /// Retry moving guest notes into the account.
  Retry,
  /// Show mode, note count and what the server sees.
  Status,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let config = ClientConfig::load(args.config.as_deref()).context("failed to read config")?;
  let mut app = App::open(&config)?;

  // A failed restore leaves the client in guest mode; `retry` picks it up.
  if let Err(e) = app.start().await {
    tracing::warn!(error = %e, "restoring session failed");
  }

  match args.command {
    Command::List => {
      for note in app.notes().list().await? {
        println!("{}\t{}\t{}", note.id, note.created_at.to_rfc3339(), note.content);
      }
    }
    Command::Add { content } => match app.notes().add(&content).await {
      Ok(note) => println!("{}", note.id),
      Err(Error::QuotaExceeded { limit }) => {
        anyhow::bail!("guest notes are limited to {limit}; run `quill login` to keep writing")
      }
      Err(e) => return Err(e.into()),
    },
    Command::Remove { id } => app.notes().remove(id).await?,
    Command::Login { session } => report(app.login(read_session(&session)?).await?),
    Command::Refresh { session } => report(app.refresh(read_session(&session)?).await?),
    Command::Logout => report(app.logout().await?),
    Command::Retry => match app.retry().await? {
      Some(outcome) => report(BridgeOutcome::SignedIn(outcome)),
      None => println!("nothing to retry"),
    },
    Command::Status => {
      let mode = app.notes().mode().await;
      let count = app.notes().list().await?.len();
      println!("mode:     {}", serde_json::to_string(&mode.kind())?.trim_matches('"'));
      println!("notes:    {count}");
      match app.session_view().await {
        Ok(view) => println!("server:   {}", serde_json::to_string(&view)?),
        Err(e) => println!("server:   unreachable ({e:#})"),
      }
    }
  }

  Ok(())
}

fn read_session(path: &Path) -> Result<Session> {
  let raw =
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
  serde_json::from_str(&raw).context("parsing session JSON")
}

fn report(outcome: BridgeOutcome) {
  match outcome {
    BridgeOutcome::SignedIn(MigrationOutcome::Migrated { count }) => {
      println!("signed in; moved {count} guest note(s) into your account")
    }
    BridgeOutcome::SignedIn(MigrationOutcome::NothingToMigrate) => println!("signed in"),
    BridgeOutcome::SignedIn(MigrationOutcome::AlreadyMigrated) => println!("already signed in"),
    BridgeOutcome::SignedOut => println!("signed out"),
    BridgeOutcome::Refreshed => println!("session refreshed"),
    BridgeOutcome::Ignored => {}
  }
}
