//! The `RemoteNoteStore` trait and the owner identity it is scoped to.
//!
//! The trait is implemented by the durable SQLite backend
//! (`quill-store-sqlite`) and by the HTTP client in `quill-client`. The note
//! façade depends on this abstraction, not on either backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Error,
  note::{NewNote, Note, NoteId},
  session::Session,
};

// ─── Owner ───────────────────────────────────────────────────────────────────

/// The account a remote call acts for.
///
/// Server-side backends trust `user_id` (the caller was already verified);
/// client-side backends present `access_token` to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
  pub user_id:      Uuid,
  pub access_token: Option<String>,
}

impl Owner {
  /// An owner whose identity has already been verified.
  pub fn verified(user_id: Uuid) -> Self { Self { user_id, access_token: None } }
}

impl From<&Session> for Owner {
  fn from(session: &Session) -> Self {
    Self {
      user_id:      session.user_id,
      access_token: Some(session.access_token.clone()),
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Durable, per-account note persistence. Every record is scoped to an owner.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded runtimes (tokio with `axum`).
pub trait RemoteNoteStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<Error> + 'static;

  /// Notes belonging to `owner`, ascending by creation time.
  fn list<'a>(
    &'a self,
    owner: &'a Owner,
  ) -> impl Future<Output = Result<Vec<Note>, Self::Error>> + Send + 'a;

  /// Insert one note; the store assigns id and timestamp.
  fn add<'a>(
    &'a self,
    content: &'a str,
    owner: &'a Owner,
  ) -> impl Future<Output = Result<Note, Self::Error>> + Send + 'a;

  /// Delete a note only if it belongs to `owner`.
  ///
  /// Fails with `Unauthorized` when the note belongs to someone else and with
  /// `NotFound` when it does not exist.
  fn remove<'a>(
    &'a self,
    id: NoteId,
    owner: &'a Owner,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Insert all `notes` under `owner` as one logical operation. On failure
  /// nothing is committed and callers must not assume partial success.
  fn batch_insert<'a>(
    &'a self,
    notes: &'a [NewNote],
    owner: &'a Owner,
  ) -> impl Future<Output = Result<Vec<Note>, Self::Error>> + Send + 'a;
}

impl<S: RemoteNoteStore> RemoteNoteStore for std::sync::Arc<S> {
  type Error = S::Error;

  fn list<'a>(
    &'a self,
    owner: &'a Owner,
  ) -> impl Future<Output = Result<Vec<Note>, Self::Error>> + Send + 'a {
    (**self).list(owner)
  }

  fn add<'a>(
    &'a self,
    content: &'a str,
    owner: &'a Owner,
  ) -> impl Future<Output = Result<Note, Self::Error>> + Send + 'a {
    (**self).add(content, owner)
  }

  fn remove<'a>(
    &'a self,
    id: NoteId,
    owner: &'a Owner,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a {
    (**self).remove(id, owner)
  }

  fn batch_insert<'a>(
    &'a self,
    notes: &'a [NewNote],
    owner: &'a Owner,
  ) -> impl Future<Output = Result<Vec<Note>, Self::Error>> + Send + 'a {
    (**self).batch_insert(notes, owner)
  }
}
