//! Chain synchronization.
//!
//! - `service`: single-flight lifecycle with retry and cancellation
//! - `processor`: one sync attempt and the per-block pipeline
//! - `genesis`: frontier bootstrap and chunked genesis scanning
//! - `epoch`: epoch transitions and validator refresh
//! - `identify`: transaction relevance and provenance recovery
//! - `indexers`: auctions, positions, tournament votes, prices, assets
//! - `progress_tracker`: per-attempt statistics and progress logs

mod epoch;
mod genesis;
/// Transaction relevance identification
pub mod identify;
pub(crate) mod indexers;
mod processor;
/// Progress tracking for sync attempts
pub mod progress_tracker;
mod service;
mod types;

pub use identify::{Identified, RelevantTransaction, identify_transactions};
pub use processor::BlockProcessor;
pub use progress_tracker::{SyncProgressTracker, SyncStats};
pub use service::ViewSyncService;
pub use types::SyncError;
