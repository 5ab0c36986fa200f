//! DEX types: trading pairs, batch swap outputs and liquidity positions.

use serde::{Deserialize, Serialize};

use super::block::Height;
use super::ids::{AssetId, PositionId, content_hash};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradingPair {
	pub asset_1: AssetId,
	pub asset_2: AssetId,
}

/// Clearing data for one trading pair in one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSwapOutputData {
	pub height: Height,
	pub trading_pair: TradingPair,
	/// Total input of asset 1.
	pub delta_1: u128,
	/// Total input of asset 2.
	pub delta_2: u128,
	/// Output of asset 1, paid to asset 2 swappers.
	pub lambda_1: u128,
	/// Output of asset 2, paid to asset 1 swappers.
	pub lambda_2: u128,
	pub unfilled_1: u128,
	pub unfilled_2: u128,
}

/// An LP position as submitted in a `PositionOpen` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
	pub trading_pair: TradingPair,
	pub fee_bps: u32,
	pub reserves_1: u128,
	pub reserves_2: u128,
	pub nonce: [u8; 32],
	pub close_on_fill: bool,
}

impl Position {
	/// The position id is not carried on chain; it is a hash of the
	/// immutable position fields.
	pub fn id(&self) -> PositionId {
		PositionId(content_hash(self))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PositionState {
	Opened,
	Closed,
	Withdrawn { sequence: u64 },
}

impl PositionState {
	/// Label used inside LP NFT denominations.
	pub fn denom_label(&self) -> String {
		match self {
			PositionState::Opened => "opened".to_string(),
			PositionState::Closed => "closed".to_string(),
			PositionState::Withdrawn { sequence } => format!("withdrawn_{}", sequence),
		}
	}
}
