//! Moving guest notes into an account, exactly once per sign-in.

use std::sync::Arc;

use quill_core::{Error, NewNote, Owner, RemoteNoteStore, Result, Session};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{facade::NoteFacade, local::LocalPersistence};

/// What a sign-in did to the guest notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum MigrationOutcome {
  /// `count` guest notes now belong to the account.
  Migrated { count: usize },
  /// There were no guest notes; only the mode changed.
  NothingToMigrate,
  /// This identity was already migrated; the held session was refreshed.
  AlreadyMigrated,
}

#[derive(Default)]
struct Ledger {
  /// Identity whose guest notes were moved. Cleared on sign-out.
  migrated_for: Option<Uuid>,
  /// Session whose migration failed and may be retried.
  pending:      Option<Session>,
}

pub struct MigrationCoordinator<P, R> {
  facade: Arc<NoteFacade<P, R>>,
  ledger: Mutex<Ledger>,
}

impl<P, R> MigrationCoordinator<P, R>
where
  P: LocalPersistence,
  R: RemoteNoteStore,
{
  pub fn new(facade: Arc<NoteFacade<P, R>>) -> Self {
    Self { facade, ledger: Mutex::new(Ledger::default()) }
  }

  pub fn facade(&self) -> &Arc<NoteFacade<P, R>> { &self.facade }

  /// Whether a failed migration is waiting for [`retry`](Self::retry).
  pub async fn has_pending(&self) -> bool { self.ledger.lock().await.pending.is_some() }

  /// React to a session becoming available.
  ///
  /// On failure the local notes are untouched, the façade is back in guest
  /// mode and the session is kept for [`retry`](Self::retry).
  pub async fn on_sign_in(&self, session: Session) -> Result<MigrationOutcome> {
    let mut ledger = self.ledger.lock().await;

    if ledger.migrated_for == Some(session.identity()) {
      if self.facade.refresh_session(session.clone()).await {
        tracing::debug!(user = %session.user_id, "sign-in for migrated identity");
        return Ok(MigrationOutcome::AlreadyMigrated);
      }
      // The façade left authenticated mode behind our back; migrate afresh.
      ledger.migrated_for = None;
    }

    self.migrate(&mut ledger, session).await
  }

  /// Re-run the last failed migration. `None` when nothing is pending.
  pub async fn retry(&self) -> Result<Option<MigrationOutcome>> {
    let mut ledger = self.ledger.lock().await;
    let Some(session) = ledger.pending.take() else {
      return Ok(None);
    };
    tracing::info!(user = %session.user_id, "retrying migration");
    self.migrate(&mut ledger, session).await.map(Some)
  }

  pub async fn on_sign_out(&self) {
    let mut ledger = self.ledger.lock().await;
    *ledger = Ledger::default();
    self.facade.sign_out().await;
  }

  /// Replace the held session after a token refresh or profile update.
  pub async fn on_refresh(&self, session: Session) {
    let mut ledger = self.ledger.lock().await;
    if let Some(pending) = ledger.pending.as_mut()
      && pending.identity() == session.identity()
    {
      *pending = session.clone();
    }
    self.facade.refresh_session(session).await;
  }

  async fn migrate(&self, ledger: &mut Ledger, session: Session) -> Result<MigrationOutcome> {
    let user_id = session.identity();
    let owner = Owner::from(&session);
    let mut transition = self.facade.begin_transition(session.clone()).await;

    let notes: Vec<NewNote> = transition.local().iter().map(NewNote::from).collect();
    if notes.is_empty() {
      transition.succeed();
      ledger.migrated_for = Some(user_id);
      ledger.pending = None;
      tracing::info!(user = %user_id, "signed in with no guest notes");
      return Ok(MigrationOutcome::NothingToMigrate);
    }

    match self.facade.remote().batch_insert(&notes, &owner).await {
      Ok(inserted) => {
        if let Err(e) = transition.clear_local() {
          tracing::warn!(error = %e, "guest notes migrated but local copy not cleared");
        }
        transition.succeed();
        ledger.migrated_for = Some(user_id);
        ledger.pending = None;
        tracing::info!(user = %user_id, count = inserted.len(), "guest notes migrated");
        Ok(MigrationOutcome::Migrated { count: inserted.len() })
      }
      Err(e) => {
        let cause: Error = e.into();
        transition.fail();
        ledger.pending = Some(session);
        tracing::warn!(user = %user_id, error = %cause, "guest note migration failed");
        Err(Error::MigrationFailure(Box::new(cause)))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;
  use crate::{
    local::{GUEST_NOTES_KEY, LocalNoteStore},
    mode::Mode,
    testing::{self, Flaky, Undeletable, facade, session_for},
  };

  #[tokio::test]
  async fn empty_local_store_is_a_mode_flip_only() {
    let (f, _, remote) = facade(&[]).await;
    let c = MigrationCoordinator::new(Arc::clone(&f));
    let s = testing::session();

    let outcome = c.on_sign_in(s.clone()).await.unwrap();
    assert_eq!(outcome, MigrationOutcome::NothingToMigrate);
    assert_eq!(remote.batch_calls(), 0);
    assert_eq!(remote.inner.count_all().await.unwrap(), 0);
    assert_eq!(f.mode().await, Mode::Authenticated(s));
  }

  #[tokio::test]
  async fn guest_notes_move_to_the_account() {
    let (f, persistence, remote) = facade(&["buy milk", "walk dog", "read book"]).await;
    let c = MigrationCoordinator::new(Arc::clone(&f));
    let s = testing::session();

    let outcome = c.on_sign_in(s.clone()).await.unwrap();
    assert_eq!(outcome, MigrationOutcome::Migrated { count: 3 });

    let notes = f.list().await.unwrap();
    let contents: Vec<_> = notes.iter().map(|n| n.content.as_str()).collect();
    assert_eq!(contents, ["buy milk", "walk dog", "read book"]);
    assert!(notes.iter().all(|n| !n.id.is_local() && n.owner_id == Some(s.user_id)));
    assert_eq!(persistence.get(GUEST_NOTES_KEY).unwrap(), None);
  }

  #[tokio::test]
  async fn repeated_sign_in_migrates_once() {
    let (f, _, remote) = facade(&["a", "b"]).await;
    let c = MigrationCoordinator::new(Arc::clone(&f));
    let user = Uuid::new_v4();

    c.on_sign_in(session_for(user, "first")).await.unwrap();
    let again = c.on_sign_in(session_for(user, "second")).await.unwrap();
    assert_eq!(again, MigrationOutcome::AlreadyMigrated);

    assert_eq!(remote.batch_calls(), 1);
    assert_eq!(remote.inner.count_all().await.unwrap(), 2);
    assert_eq!(f.mode().await.session().unwrap().access_token, "second");
  }

  #[tokio::test]
  async fn failure_keeps_everything_and_retry_succeeds() {
    let (f, persistence, remote) = facade(&["keep me"]).await;
    let c = MigrationCoordinator::new(Arc::clone(&f));
    let s = testing::session();
    remote.set_failing(true);

    let err = c.on_sign_in(s.clone()).await.unwrap_err();
    assert!(matches!(err, Error::MigrationFailure(_)));
    assert!(err.is_retryable());
    assert_eq!(f.mode().await, Mode::Guest);
    assert_eq!(f.list().await.unwrap().len(), 1);
    assert!(persistence.get(GUEST_NOTES_KEY).unwrap().is_some());
    assert_eq!(remote.inner.count_all().await.unwrap(), 0);
    assert!(c.has_pending().await);

    remote.set_failing(false);
    let outcome = c.retry().await.unwrap();
    assert_eq!(outcome, Some(MigrationOutcome::Migrated { count: 1 }));
    assert!(!c.has_pending().await);
    assert_eq!(f.mode().await, Mode::Authenticated(s));
    assert_eq!(c.retry().await.unwrap(), None);
  }

  #[tokio::test]
  async fn undeletable_guest_key_is_not_migrated_twice() {
    let persistence = Arc::new(Undeletable::default());
    let remote = Arc::new(Flaky::new().await);
    let user = Uuid::new_v4();

    let mut local = LocalNoteStore::open(Arc::clone(&persistence), 3).unwrap();
    local.add("once").unwrap();
    let f = Arc::new(NoteFacade::new(local, Arc::clone(&remote)));
    let c = MigrationCoordinator::new(f);
    c.on_sign_in(session_for(user, "a")).await.unwrap();

    // A later run reloads local storage and signs in again.
    let local = LocalNoteStore::open(Arc::clone(&persistence), 3).unwrap();
    assert!(local.list().is_empty());
    let f = Arc::new(NoteFacade::new(local, Arc::clone(&remote)));
    let c = MigrationCoordinator::new(f);
    let outcome = c.on_sign_in(session_for(user, "b")).await.unwrap();

    assert_eq!(outcome, MigrationOutcome::NothingToMigrate);
    assert_eq!(remote.inner.count_all().await.unwrap(), 1);
  }

  #[tokio::test]
  async fn refresh_updates_a_pending_session() {
    let (f, _, remote) = facade(&["x"]).await;
    let c = MigrationCoordinator::new(Arc::clone(&f));
    let user = Uuid::new_v4();
    remote.set_failing(true);
    c.on_sign_in(session_for(user, "stale")).await.unwrap_err();

    c.on_refresh(session_for(user, "fresh")).await;
    remote.set_failing(false);
    c.retry().await.unwrap();
    assert_eq!(f.mode().await.session().unwrap().access_token, "fresh");
  }

  #[tokio::test]
  async fn sign_out_resets_the_idempotency_key() {
    let (f, _, remote) = facade(&[]).await;
    let c = MigrationCoordinator::new(Arc::clone(&f));
    let s = testing::session();

    c.on_sign_in(s.clone()).await.unwrap();
    c.on_sign_out().await;
    assert_eq!(f.mode().await, Mode::Guest);

    // Guest notes written after sign-out migrate on the next sign-in.
    f.add("second visit").await.unwrap();
    let outcome = c.on_sign_in(s).await.unwrap();
    assert_eq!(outcome, MigrationOutcome::Migrated { count: 1 });
    assert_eq!(remote.batch_calls(), 1);
  }

  #[tokio::test]
  async fn different_user_while_authenticated_signs_out_first() {
    let (f, _, _) = facade(&[]).await;
    let c = MigrationCoordinator::new(Arc::clone(&f));
    let alice = testing::session();
    let bob = testing::session();

    c.on_sign_in(alice).await.unwrap();
    let outcome = c.on_sign_in(bob.clone()).await.unwrap();
    assert_eq!(outcome, MigrationOutcome::NothingToMigrate);
    assert_eq!(f.mode().await, Mode::Authenticated(bob));
  }
}
