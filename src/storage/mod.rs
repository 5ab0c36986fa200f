//! Durable wallet state.
//!
//! `ViewStore` is the repository interface the sync engine writes through.
//! `LocalStore` implements it in memory, optionally mirrored to a JSON file
//! so state survives restarts.

mod local;
mod repository;

pub use local::LocalStore;
pub use repository::{StorageError, ViewStore};
