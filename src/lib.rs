//! Client-side chain synchronization for a shielded wallet.
//!
//! The engine pulls compact blocks from a remote node, hands them to a
//! cryptographic view scanner, and keeps the wallet's durable view of the
//! chain (notes, swaps, transactions, prices, validators, auctions,
//! positions and tournament votes) consistent with it.

/// Chain-side types and the remote query interface
pub mod chain;
/// Host-supplied configuration
pub mod config;
/// Durable wallet state
pub mod storage;
/// Sync lifecycle and block processing
pub mod sync;
/// Amount helpers
pub mod utils;
/// Wallet records and the view scanner interface
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{GenesisBlock, RetryConfig, SyncConfig};
pub use storage::{LocalStore, StorageError, ViewStore};
pub use sync::{BlockProcessor, SyncError, ViewSyncService};
