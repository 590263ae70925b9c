//! Error type for `quill-store-sqlite`.

use quill_core::NoteId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("invalid note: {0}")]
  Validation(String),

  /// Remote stores only hold UUID-identified notes.
  #[error("note {0} is not a remote note")]
  NotRemote(NoteId),

  #[error("note not found: {0}")]
  NoteNotFound(uuid::Uuid),

  /// The note exists but belongs to a different owner.
  #[error("note {0} belongs to another owner")]
  NotOwner(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for quill_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Validation(msg) => Self::Validation(msg),
      Error::NotRemote(id) => Self::NotFound(id),
      Error::NoteNotFound(id) => Self::NotFound(NoteId::Remote(id)),
      Error::NotOwner(_) => Self::Unauthorized,
      other => Self::Storage(other.to_string()),
    }
  }
}
