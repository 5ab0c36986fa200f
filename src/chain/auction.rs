use serde::{Deserialize, Serialize};

use super::block::Height;
use super::ids::{AssetId, AuctionId, content_hash};
use super::transaction::Value;

/// Immutable parameters of a Dutch auction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutchAuctionDescription {
	pub input: Value,
	pub output_id: AssetId,
	pub max_output: u128,
	pub min_output: u128,
	pub start_height: Height,
	pub end_height: Height,
	pub step_count: u64,
	pub nonce: [u8; 32],
}

impl DutchAuctionDescription {
	pub fn id(&self) -> AuctionId {
		AuctionId(content_hash(self))
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutchAuctionState {
	pub seq: u64,
	pub input_reserves: u128,
	pub output_reserves: u128,
}

/// Auction as reported by the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutchAuction {
	pub description: DutchAuctionDescription,
	pub state: DutchAuctionState,
}
