//! Client-side stand-in for the authentication subsystem.
//!
//! The hub remembers the current session in local persistence and announces
//! every change on a single broadcast stream, which the auth state bridge
//! consumes.

use chrono::Utc;
use quill_core::{AuthEvent, AuthEventKind, Result, Session};
use tokio::sync::broadcast;

use crate::local::LocalPersistence;

/// Key under which the signed-in session is persisted.
pub const SESSION_KEY: &str = "quill.auth-session";

const EVENT_CAPACITY: usize = 16;

pub struct AuthHub<P> {
  persistence: P,
  events:      broadcast::Sender<AuthEvent>,
}

impl<P: LocalPersistence> AuthHub<P> {
  pub fn new(persistence: P) -> Self {
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    Self { persistence, events }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> { self.events.subscribe() }

  /// The stored session, if any and not expired.
  pub fn current(&self) -> Result<Option<Session>> {
    let Some(raw) = self.persistence.get(SESSION_KEY)? else {
      return Ok(None);
    };
    let session: Session = serde_json::from_str(&raw)?;
    if session.is_expired(Utc::now()) {
      tracing::info!(user = %session.user_id, "stored session expired");
      return Ok(None);
    }
    Ok(Some(session))
  }

  /// Announce the stored session as `INITIAL_SESSION` (with no session when
  /// signed out).
  pub fn restore(&self) -> Result<AuthEvent> {
    let event = AuthEvent::new(AuthEventKind::InitialSession, self.current()?);
    self.emit(event.clone());
    Ok(event)
  }

  pub fn sign_in(&self, session: Session) -> Result<()> {
    self.store(&session)?;
    tracing::info!(user = %session.user_id, "signed in");
    self.emit(AuthEvent::signed_in(session));
    Ok(())
  }

  /// Replace the stored session after a token refresh.
  pub fn refresh(&self, session: Session) -> Result<()> {
    self.store(&session)?;
    self.emit(AuthEvent::new(AuthEventKind::TokenRefreshed, Some(session)));
    Ok(())
  }

  pub fn sign_out(&self) -> Result<()> {
    self.persistence.remove(SESSION_KEY)?;
    tracing::info!("signed out");
    self.emit(AuthEvent::signed_out());
    Ok(())
  }

  fn store(&self, session: &Session) -> Result<()> {
    let raw = serde_json::to_string(session)?;
    self.persistence.set(SESSION_KEY, &raw)
  }

  fn emit(&self, event: AuthEvent) {
    // No receivers just means nobody is listening yet.
    if self.events.send(event).is_err() {
      tracing::debug!("auth event emitted without subscribers");
    }
  }
}
