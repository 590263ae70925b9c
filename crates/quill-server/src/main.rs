//! quill-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite note store, and serves the notes API and session endpoints.
//!
//! # Issuing a session
//!
//! Without an external identity provider, a session for local use can be
//! minted with the configured token secret:
//!
//! ```
//! cargo run -p quill-server -- --issue-session 6f1c…-uuid > session.json
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use quill_server::{AppState, ServerConfig, auth::TokenKeys};
use quill_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Quill notes server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print a signed session JSON for this user id and exit.
  #[arg(long, value_name = "USER_ID")]
  issue_session: Option<Uuid>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("QUILL"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let keys = TokenKeys::new(&server_cfg.token_secret);

  // Helper mode: mint a session and exit.
  if let Some(user_id) = cli.issue_session {
    let session = keys
      .issue(user_id, chrono::Duration::seconds(server_cfg.session_ttl_secs))
      .map_err(|e| anyhow::anyhow!("issuing session: {e}"))?;
    println!("{}", serde_json::to_string_pretty(&session)?);
    return Ok(());
  }

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent() {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let state = AppState {
    store:  Arc::new(store),
    keys:   Arc::new(keys),
    config: Arc::new(server_cfg.clone()),
  };

  let app = quill_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
