//! Offline snapshot cache for Skycast
//!
//! A [`SnapshotStore`] keeps named, versioned snapshots of HTTP responses in
//! SQLite. The [`OfflineWorker`] sits in front of a [`skycast_core::Transport`]
//! and serves intercepted GETs from the current snapshot.

pub mod store;
pub mod worker;

pub use store::SnapshotStore;
pub use worker::{OfflineWorker, WorkerState};
