//! Error taxonomy shared by every Quill crate.
//!
//! Store-specific errors convert into this type so the note façade can hand
//! them to its caller unmodified.

use thiserror::Error;

use crate::note::NoteId;

#[derive(Debug, Error)]
pub enum Error {
  /// Empty or otherwise unusable note content.
  #[error("invalid note: {0}")]
  Validation(String),

  #[error("guest note limit of {limit} reached")]
  QuotaExceeded { limit: usize },

  /// No valid session, or the note belongs to another account.
  #[error("unauthorized")]
  Unauthorized,

  #[error("note not found: {0}")]
  NotFound(NoteId),

  /// Guest notes could not be moved into the account. Local notes are kept.
  #[error("migration failed: {0}")]
  MigrationFailure(#[source] Box<Error>),

  #[error("network error: {0}")]
  TransientNetwork(String),

  #[error("local persistence error: {0}")]
  Persistence(String),

  #[error("storage error: {0}")]
  Storage(String),

  #[error("invalid note id: {0:?}")]
  InvalidNoteId(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Whether the operation may succeed if the user tries again later.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Self::MigrationFailure(_) | Self::TransientNetwork(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
