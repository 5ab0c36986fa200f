//! Interface to the cryptographic view scanner.
//!
//! The scanner owns the wallet's keys and an append-only commitment-tree
//! accumulator. It trial-decrypts blocks, buffers what it finds, and hands
//! the buffered notes, swaps and tree deltas over on flush. Its in-memory
//! state is a cache of what the durable store holds and can be rebuilt from
//! the last persisted checkpoint at any time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::chain::{Address, AddressIndex, CompactBlock, FrontierSnapshot, Height, Root, StateCommitment};

use super::records::{SpendableNoteRecord, SwapRecord};

/// Error types for scanner operations
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
	#[error("Trial decryption failed at height {height}: {reason}")]
	Decryption { height: Height, reason: String },

	#[error("Commitment tree error: {0}")]
	Tree(String),

	#[error("Scanner state could not be restored: {0}")]
	Restore(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredHash {
	pub position: u64,
	pub height: u8,
	pub essential: bool,
	pub hash: Root,
}

/// Structural changes to the commitment tree since the last flush.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SctUpdates {
	pub set_position: Option<u64>,
	pub set_forgotten: Option<u64>,
	pub store_commitments: Vec<(u64, StateCommitment)>,
	pub store_hashes: Vec<StoredHash>,
	/// Position ranges whose hashes are no longer needed.
	pub delete_ranges: Vec<(u64, u64)>,
}

/// Everything the scanner has buffered, up to and including `height`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
	pub height: Height,
	pub sct_updates: SctUpdates,
	pub new_notes: Vec<SpendableNoteRecord>,
	pub new_swaps: Vec<SwapRecord>,
}

/// Address ownership tests against the wallet's viewing key.
pub trait AddressOwnership: Send + Sync {
	fn is_controlled_address(&self, address: &Address) -> bool;

	fn index_for_address(&self, address: &Address) -> Option<AddressIndex>;
}

#[async_trait]
pub trait ViewScanner: AddressOwnership {
	/// Trial-decrypt a block and advance the accumulator.
	///
	/// # Returns
	/// Whether the scanner wants its buffer flushed now.
	async fn scan_block(
		&mut self,
		block: &CompactBlock,
		skip_trial_decrypt: bool,
	) -> Result<bool, ScannerError>;

	/// Scan one slice of the genesis block's payloads. `offset` is the index
	/// of the slice's first payload within the whole block.
	async fn scan_genesis_chunk(
		&mut self,
		offset: u64,
		chunk: &CompactBlock,
		skip_trial_decrypt: bool,
	) -> Result<(), ScannerError>;

	/// Complete accumulator construction after the last genesis chunk.
	async fn finalize_genesis(&mut self, block: &CompactBlock) -> Result<(), ScannerError>;

	/// Drain buffered notes, swaps and tree deltas.
	fn flush_updates(&mut self) -> ScanResult;

	fn current_root(&self) -> Root;

	/// Replace the accumulator with a precomputed frontier.
	async fn load_frontier(&mut self, snapshot: &FrontierSnapshot) -> Result<(), ScannerError>;

	/// Discard unflushed state and reload from the last persisted checkpoint.
	async fn reset_to_checkpoint(&mut self) -> Result<(), ScannerError>;
}
