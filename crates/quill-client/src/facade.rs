//! The single note API the rest of the client talks to.
//!
//! [`NoteFacade`] routes every call to the local or the remote store based on
//! its [`Mode`]. Callers never see which tier answered.

use quill_core::{
  Error, Note, NoteId, Owner, RemoteNoteStore, Result, Session, note::validate_content,
};
use tokio::sync::{Mutex, MutexGuard, watch};

use crate::{
  local::{LocalNoteStore, LocalPersistence},
  mode::{Mode, ModeEvent, ModeKind},
};

struct State<P> {
  mode:  Mode,
  local: LocalNoteStore<P>,
}

impl<P> State<P> {
  fn apply(&mut self, event: ModeEvent, observers: &watch::Sender<ModeKind>) {
    let before = self.mode.kind();
    self.mode = std::mem::take(&mut self.mode).next(event);
    let after = self.mode.kind();
    if before != after {
      tracing::info!(from = ?before, to = ?after, "note façade mode changed");
    }
    observers.send_replace(after);
  }

  fn owner(&self) -> Option<Owner> {
    match &self.mode {
      Mode::Authenticated(session) => Some(Owner::from(session)),
      _ => None,
    }
  }
}

pub struct NoteFacade<P, R> {
  state:  Mutex<State<P>>,
  remote: R,
  modes:  watch::Sender<ModeKind>,
}

impl<P, R> NoteFacade<P, R>
where
  P: LocalPersistence,
  R: RemoteNoteStore,
{
  /// A façade in guest mode over `local`, ready to switch to `remote`.
  pub fn new(local: LocalNoteStore<P>, remote: R) -> Self {
    let (modes, _) = watch::channel(ModeKind::Guest);
    Self {
      state: Mutex::new(State { mode: Mode::Guest, local }),
      remote,
      modes,
    }
  }

  pub fn remote(&self) -> &R { &self.remote }

  /// Current mode. Waits for an in-flight migration to settle.
  pub async fn mode(&self) -> Mode { self.state.lock().await.mode.clone() }

  /// Observe mode changes without contending for the façade.
  pub fn watch_mode(&self) -> watch::Receiver<ModeKind> { self.modes.subscribe() }

  /// All notes of the active tier, oldest first.
  pub async fn list(&self) -> Result<Vec<Note>> {
    let state = self.state.lock().await;
    match state.owner() {
      Some(owner) => self.remote.list(&owner).await.map_err(Into::into),
      None => Ok(state.local.list().to_vec()),
    }
  }

  pub async fn add(&self, content: &str) -> Result<Note> {
    validate_content(content)?;

    let mut state = self.state.lock().await;
    match state.owner() {
      Some(owner) => self.remote.add(content, &owner).await.map_err(Into::into),
      None => state.local.add(content),
    }
  }

  pub async fn remove(&self, id: NoteId) -> Result<()> {
    let mut state = self.state.lock().await;
    match (state.owner(), id) {
      (Some(owner), NoteId::Remote(_)) => {
        self.remote.remove(id, &owner).await.map_err(Into::into)
      }
      (None, NoteId::Local(_)) => state.local.remove(id),
      (_, id) => Err(Error::NotFound(id)),
    }
  }

  // ─── Transitions ───────────────────────────────────────────────────────────

  /// Enter [`Mode::Transitioning`] for `session` and hold the façade until
  /// the returned guard is finished or dropped.
  ///
  /// A façade that is still authenticated (for another account) is signed
  /// out first.
  pub(crate) async fn begin_transition(&self, session: Session) -> Transition<'_, P> {
    let mut state = self.state.lock().await;
    if !matches!(state.mode, Mode::Guest) {
      state.apply(ModeEvent::SignedOut, &self.modes);
    }
    state.apply(ModeEvent::SignInReceived(session), &self.modes);
    Transition { state, modes: &self.modes, finished: false }
  }

  pub(crate) async fn sign_out(&self) {
    self.state.lock().await.apply(ModeEvent::SignedOut, &self.modes);
  }

  /// Replace the held session in place. Returns whether the façade is
  /// authenticated afterwards.
  pub(crate) async fn refresh_session(&self, session: Session) -> bool {
    let mut state = self.state.lock().await;
    state.apply(ModeEvent::SessionRefreshed(session), &self.modes);
    matches!(state.mode, Mode::Authenticated(_))
  }
}

/// Exclusive hold on the façade while guest notes move to an account.
///
/// Dropping it without [`succeed`](Self::succeed) or [`fail`](Self::fail)
/// abandons the transition: the façade returns to guest mode and local notes
/// stay where they are.
pub(crate) struct Transition<'a, P> {
  state:    MutexGuard<'a, State<P>>,
  modes:    &'a watch::Sender<ModeKind>,
  finished: bool,
}

impl<P: LocalPersistence> Transition<'_, P> {
  pub fn local(&self) -> &[Note] { self.state.local.list() }

  pub fn clear_local(&mut self) -> Result<()> { self.state.local.clear() }

  pub fn succeed(mut self) {
    self.finished = true;
    self.state.apply(ModeEvent::MigrationSucceeded, self.modes);
  }

  pub fn fail(mut self) {
    self.finished = true;
    self.state.apply(ModeEvent::MigrationFailed, self.modes);
  }
}

impl<P> Drop for Transition<'_, P> {
  fn drop(&mut self) {
    if !self.finished {
      tracing::warn!("sign-in transition abandoned; staying in guest mode");
      self.state.apply(ModeEvent::MigrationFailed, self.modes);
    }
  }
}
