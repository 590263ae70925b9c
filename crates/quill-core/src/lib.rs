//! Core types and trait definitions for Quill.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The store, server and client crates all depend on it.

pub mod error;
pub mod note;
pub mod session;
pub mod store;

pub use error::{Error, Result};
pub use note::{NewNote, Note, NoteId};
pub use session::{Affordance, AuthEvent, AuthEventKind, Session, SessionView};
pub use store::{Owner, RemoteNoteStore};

/// Number of notes a guest may keep before signing in.
pub const DEFAULT_GUEST_NOTE_LIMIT: usize = 3;
