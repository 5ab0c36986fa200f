//! Compact blocks and the chain parameters they can carry.

use serde::{Deserialize, Serialize};

use super::dex::BatchSwapOutputData;
use super::ids::{AssetId, Root, StateCommitment};

/// Block height.
pub type Height = u64;

/// Condensed per-block summary, sufficient for trial decryption without full
/// transaction data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompactBlock {
	pub height: Height,
	pub epoch_index: u64,
	/// Present only on the last block of an epoch.
	pub epoch_root: Option<Root>,
	pub state_payloads: Vec<StatePayload>,
	pub nullifiers: Vec<super::ids::Nullifier>,
	pub fmd_parameters: Option<FmdParameters>,
	pub gas_prices: Option<GasPrices>,
	pub alt_gas_prices: Vec<GasPrices>,
	pub app_parameters_updated: bool,
	pub swap_outputs: Vec<BatchSwapOutputData>,
}

impl CompactBlock {
	/// Whether this block closes its epoch.
	pub fn ends_epoch(&self) -> bool {
		self.epoch_root.is_some()
	}
}

/// A state fragment added to the commitment tree by a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatePayload {
	/// A commitment with no decryptable body.
	RolledUp { commitment: StateCommitment },
	Note {
		commitment: StateCommitment,
		ciphertext: Vec<u8>,
	},
	Swap {
		commitment: StateCommitment,
		ciphertext: Vec<u8>,
	},
}

impl StatePayload {
	pub fn commitment(&self) -> StateCommitment {
		match self {
			StatePayload::RolledUp { commitment }
			| StatePayload::Note { commitment, .. }
			| StatePayload::Swap { commitment, .. } => *commitment,
		}
	}
}

/// Fuzzy message detection parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FmdParameters {
	pub precision_bits: u32,
	pub as_of_block_height: Height,
}

/// Fee prices for one fee asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPrices {
	/// Absent on the base gas prices, which are denominated in the staking
	/// asset.
	pub asset_id: Option<AssetId>,
	pub block_space_price: u64,
	pub compact_block_space_price: u64,
	pub verification_price: u64,
	pub execution_price: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SctParameters {
	pub epoch_duration: u64,
}

/// Chain-wide application parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppParameters {
	pub chain_id: String,
	pub sct_params: SctParameters,
}

/// Precomputed commitment-tree frontier, used to skip historical replay for
/// a fresh wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierSnapshot {
	pub height: Height,
	pub epoch_index: u64,
	pub epoch_start_height: Height,
	pub frontier: Vec<u8>,
}
