use crate::chain::{Height, QuerierError};
use crate::storage::StorageError;
use crate::view::ScannerError;

/// Error types for a sync attempt
///
/// Every variant is fatal to the current attempt only. The service loop
/// rolls the scanner back to its checkpoint and retries.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
	#[error("Querier error: {0}")]
	Querier(#[from] QuerierError),

	#[error("Scanner error: {0}")]
	Scanner(#[from] ScannerError),

	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),

	#[error("Unexpected block height: expected {expected}, got {actual}")]
	UnexpectedHeight { expected: Height, actual: Height },

	#[error("Unexpected epoch index at height {height}: expected {expected}, got {actual}")]
	UnexpectedEpoch {
		expected: u64,
		actual: u64,
		height: Height,
	},

	#[error("Missing required field: {0}")]
	MissingField(String),

	#[error("Block stream ended after height {height:?}")]
	StreamEnded { height: Option<Height> },

	#[error("Sync task failed: {0}")]
	TaskFailed(String),
}
