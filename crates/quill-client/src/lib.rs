//! Client side of Quill.
//!
//! Guests keep a handful of notes in local storage; once they sign in, the
//! [`facade::NoteFacade`] switches to the account's remote notes and the
//! [`migration::MigrationCoordinator`] moves the guest notes over exactly
//! once. The [`bridge::AuthStateBridge`] listens to authentication events,
//! mirrors them into the server's session cookie and drives both.

pub mod app;
pub mod auth;
pub mod bridge;
pub mod client;
pub mod config;
pub mod facade;
pub mod local;
pub mod migration;
pub mod mode;

#[cfg(test)]
mod testing;

pub use app::App;
pub use bridge::{AuthStateBridge, BridgeOutcome, SessionSink, Subscription};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use facade::NoteFacade;
pub use local::{FilePersistence, LocalNoteStore, LocalPersistence, MemoryPersistence};
pub use migration::{MigrationCoordinator, MigrationOutcome};
pub use mode::{Mode, ModeKind};
