//! Wiring of one client: storage, HTTP client, façade, coordinator, bridge
//! and the auth hub feeding it.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use quill_core::{Session, SessionView};

use crate::{
  auth::AuthHub,
  bridge::{AuthStateBridge, BridgeOutcome, Subscription},
  client::ApiClient,
  config::ClientConfig,
  facade::NoteFacade,
  local::{FilePersistence, LocalNoteStore},
  migration::{MigrationCoordinator, MigrationOutcome},
};

type Persistence = Arc<FilePersistence>;

pub type ClientFacade = NoteFacade<Persistence, ApiClient>;
pub type ClientBridge = AuthStateBridge<ApiClient, Persistence, ApiClient>;

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level client state.
pub struct App {
  pub hub:      AuthHub<Persistence>,
  pub bridge:   Arc<ClientBridge>,
  api:          ApiClient,
  subscription: Subscription,
}

impl App {
  /// Open the client's data directory and subscribe the bridge to the hub.
  /// Nothing is announced until [`start`](Self::start).
  pub fn open(config: &ClientConfig) -> Result<Self> {
    let persistence = Arc::new(
      FilePersistence::new(&config.data_dir)
        .with_context(|| format!("opening data dir {}", config.data_dir.display()))?,
    );
    let local = LocalNoteStore::open(Arc::clone(&persistence), config.guest_note_limit)
      .context("loading guest notes")?;
    let api = ApiClient::new(config.base_url.clone()).context("building HTTP client")?;

    let facade = Arc::new(NoteFacade::new(local, api.clone()));
    let coordinator = Arc::new(MigrationCoordinator::new(facade));
    let bridge = Arc::new(AuthStateBridge::new(api.clone(), coordinator));
    let hub = AuthHub::new(persistence);
    let subscription = bridge.subscribe(hub.subscribe());

    Ok(Self { hub, bridge, api, subscription })
  }

  pub fn notes(&self) -> &ClientFacade { self.bridge.coordinator().facade() }

  // ── Auth ──────────────────────────────────────────────────────────────────

  /// Announce the stored session and wait for the bridge to handle it.
  pub async fn start(&mut self) -> Result<BridgeOutcome> {
    self.hub.restore().context("reading stored session")?;
    self.next_outcome().await
  }

  pub async fn login(&mut self, session: Session) -> Result<BridgeOutcome> {
    self.hub.sign_in(session).context("storing session")?;
    self.next_outcome().await
  }

  /// Swap in a renewed session for the same account.
  pub async fn refresh(&mut self, session: Session) -> Result<BridgeOutcome> {
    self.hub.refresh(session).context("storing refreshed session")?;
    self.next_outcome().await
  }

  pub async fn logout(&mut self) -> Result<BridgeOutcome> {
    self.hub.sign_out().context("removing session")?;
    self.next_outcome().await
  }

  /// Retry a migration that failed during this run.
  pub async fn retry(&self) -> Result<Option<MigrationOutcome>> {
    Ok(self.bridge.coordinator().retry().await?)
  }

  pub async fn session_view(&self) -> Result<SessionView> {
    self.api.session_view().await.context("GET /auth/session failed")
  }

  async fn next_outcome(&mut self) -> Result<BridgeOutcome> {
    let outcome = self
      .subscription
      .next()
      .await
      .ok_or_else(|| anyhow!("auth event subscription closed"))?;
    Ok(outcome?)
  }
}
