//! HTTP surface for Quill.
//!
//! Exposes an axum [`Router`] with the remote note endpoints and the session
//! cookie endpoints, backed by any [`RemoteNoteStore`].

pub mod auth;
pub mod cookie;
pub mod error;
pub mod handlers;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, post},
};
use quill_core::RemoteNoteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::TokenKeys;
use handlers::{notes, session};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `QUILL_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:              String,
  #[serde(default = "default_port")]
  pub port:              u16,
  #[serde(default = "default_store_path")]
  pub store_path:        PathBuf,
  /// Shared secret for access-token signatures.
  pub token_secret:      String,
  /// Add `Secure` to the session cookie; enable behind TLS.
  #[serde(default)]
  pub cookie_secure:     bool,
  /// Lifetime of sessions issued by `--issue-session`.
  #[serde(default = "default_session_ttl_secs")]
  pub session_ttl_secs:  i64,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 5280 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/quill/notes.db") }
fn default_session_ttl_secs() -> i64 { 3600 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub keys:   Arc<TokenKeys>,
  pub config: Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      keys:   Arc::clone(&self.keys),
      config: Arc::clone(&self.config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the Quill server.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RemoteNoteStore + 'static,
{
  Router::new()
    .route("/api/notes",              get(notes::list::<S>).post(notes::create::<S>))
    .route("/api/notes/batch-insert", post(notes::batch_insert::<S>))
    .route("/api/notes/{id}",         delete(notes::remove::<S>))
    .route("/auth/callback",          post(session::callback::<S>))
    .route("/auth/logout",            post(session::logout::<S>))
    .route("/auth/session",           get(session::view::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
