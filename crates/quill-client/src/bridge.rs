//! Mirrors client-side authentication events into the server's session
//! cookie and drives the note façade through sign-in and sign-out.

use std::{future::Future, sync::Arc};

use quill_core::{AuthEvent, AuthEventKind, RemoteNoteStore, Result};
use tokio::{
  sync::{Mutex, broadcast, mpsc, watch},
  task::JoinHandle,
};

use crate::{
  local::LocalPersistence,
  migration::{MigrationCoordinator, MigrationOutcome},
};

// ─── Sink ────────────────────────────────────────────────────────────────────

/// Where auth events are persisted so server-rendered views can see them.
pub trait SessionSink: Send + Sync {
  fn persist<'a>(&'a self, event: &'a AuthEvent) -> impl Future<Output = Result<()>> + Send + 'a;
}

impl<S: SessionSink> SessionSink for Arc<S> {
  fn persist<'a>(&'a self, event: &'a AuthEvent) -> impl Future<Output = Result<()>> + Send + 'a {
    (**self).persist(event)
  }
}

// ─── Bridge ──────────────────────────────────────────────────────────────────

/// What handling one event amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeOutcome {
  /// A non-sign-out event without a session.
  Ignored,
  SignedIn(MigrationOutcome),
  Refreshed,
  SignedOut,
}

/// Identity of the last persisted event.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fingerprint {
  kind:         AuthEventKind,
  access_token: Option<String>,
}

impl From<&AuthEvent> for Fingerprint {
  fn from(event: &AuthEvent) -> Self {
    Self {
      kind:         event.kind,
      access_token: event.session.as_ref().map(|s| s.access_token.clone()),
    }
  }
}

pub struct AuthStateBridge<S, P, R> {
  sink:        S,
  coordinator: Arc<MigrationCoordinator<P, R>>,
  last:        Mutex<Option<Fingerprint>>,
  views:       watch::Sender<u64>,
}

impl<S, P, R> AuthStateBridge<S, P, R>
where
  S: SessionSink + 'static,
  P: LocalPersistence + 'static,
  R: RemoteNoteStore + 'static,
{
  pub fn new(sink: S, coordinator: Arc<MigrationCoordinator<P, R>>) -> Self {
    let (views, _) = watch::channel(0);
    Self { sink, coordinator, last: Mutex::new(None), views }
  }

  pub fn coordinator(&self) -> &Arc<MigrationCoordinator<P, R>> { &self.coordinator }

  /// Generation counter bumped whenever server-rendered views are stale.
  pub fn watch_views(&self) -> watch::Receiver<u64> { self.views.subscribe() }

  /// Persist `event` and route it.
  ///
  /// A sink failure stops handling before any routing, except that a
  /// sign-out always leaves the account. The failed event is not remembered,
  /// so delivering it again retries.
  pub async fn handle(&self, event: AuthEvent) -> Result<BridgeOutcome> {
    if event.kind == AuthEventKind::SignedOut {
      // The façade leaves the account even when the cookie cannot be
      // cleared; the sink error is still returned so redelivery retries.
      let persisted = self.persist_once(&AuthEvent::signed_out()).await;
      self.coordinator.on_sign_out().await;
      if persisted? {
        self.invalidate_views();
      }
      return Ok(BridgeOutcome::SignedOut);
    }

    let Some(session) = event.session.clone() else {
      tracing::debug!(kind = %event.kind, "auth event without session ignored");
      return Ok(BridgeOutcome::Ignored);
    };

    let persisted = self.persist_once(&event).await?;

    if !event.kind.is_sign_in() {
      self.coordinator.on_refresh(session).await;
      return Ok(BridgeOutcome::Refreshed);
    }

    let migrated = self.coordinator.on_sign_in(session).await;
    let changed = persisted || !matches!(migrated, Ok(MigrationOutcome::AlreadyMigrated));
    if changed && event.kind != AuthEventKind::InitialSession {
      self.invalidate_views();
    }
    migrated.map(BridgeOutcome::SignedIn)
  }

  /// Run [`handle`](Self::handle) for every event on `events` until the
  /// returned handle is dropped or the stream closes.
  pub fn subscribe(self: &Arc<Self>, mut events: broadcast::Receiver<AuthEvent>) -> Subscription {
    let (tx, outcomes) = mpsc::unbounded_channel();
    let bridge = Arc::clone(self);

    let task = tokio::spawn(async move {
      loop {
        let event = match events.recv().await {
          Ok(event) => event,
          Err(broadcast::error::RecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "auth event stream lagged");
            continue;
          }
          Err(broadcast::error::RecvError::Closed) => break,
        };

        tracing::debug!(kind = %event.kind, "auth event received");
        let outcome = bridge.handle(event).await;
        if let Err(e) = &outcome {
          tracing::warn!(error = %e, "auth event handling failed");
        }
        if tx.send(outcome).is_err() {
          break;
        }
      }
    });

    Subscription { task, outcomes }
  }

  /// Skip the sink when `event` matches the last persisted one. Returns
  /// whether the sink was called.
  async fn persist_once(&self, event: &AuthEvent) -> Result<bool> {
    let fingerprint = Fingerprint::from(event);
    let mut last = self.last.lock().await;
    if last.as_ref() == Some(&fingerprint) {
      tracing::debug!(kind = %event.kind, "duplicate auth event; not persisted");
      return Ok(false);
    }

    self.sink.persist(event).await?;
    *last = Some(fingerprint);
    Ok(true)
  }

  fn invalidate_views(&self) { self.views.send_modify(|generation| *generation += 1); }
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// Owns the task consuming auth events. Dropping it stops the task.
pub struct Subscription {
  task:     JoinHandle<()>,
  outcomes: mpsc::UnboundedReceiver<Result<BridgeOutcome>>,
}

impl Subscription {
  /// Outcome of the next handled event; `None` once the task has stopped.
  pub async fn next(&mut self) -> Option<Result<BridgeOutcome>> { self.outcomes.recv().await }

  pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
  fn drop(&mut self) { self.task.abort(); }
}
