//! Wallet-local records persisted by the view store.

use serde::{Deserialize, Serialize};

use crate::chain::auction::DutchAuctionDescription;
use crate::chain::dex::{BatchSwapOutputData, Position, PositionState, TradingPair};
use crate::chain::{
	Address, AddressIndex, AssetId, AuctionId, Height, Nullifier, PositionId, StateCommitment,
	Transaction, TransactionId, Value,
};

/// Provenance of a note or swap commitment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitmentSource {
	/// Not yet linked to the transaction that created it.
	#[default]
	Blank,
	Transaction { id: TransactionId },
	Genesis,
	FundingStreamReward { epoch_index: u64 },
	LiquidityTournamentReward { epoch_index: u64 },
}

impl CommitmentSource {
	pub fn is_blank(&self) -> bool {
		matches!(self, CommitmentSource::Blank)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
	pub value: Value,
	pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendableNoteRecord {
	pub note_commitment: StateCommitment,
	pub note: Note,
	pub address_index: AddressIndex,
	pub nullifier: Nullifier,
	pub height_created: Height,
	pub height_spent: Option<Height>,
	pub position: u64,
	pub source: CommitmentSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapPlaintext {
	pub trading_pair: TradingPair,
	pub delta_1: u128,
	pub delta_2: u128,
	pub claim_address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRecord {
	pub swap_commitment: StateCommitment,
	pub swap: SwapPlaintext,
	pub address_index: AddressIndex,
	pub nullifier: Nullifier,
	pub position: u64,
	pub height_claimed: Option<Height>,
	pub output_data: Option<BatchSwapOutputData>,
	pub source: CommitmentSource,
}

/// A note or swap owned by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanRecord {
	Note(SpendableNoteRecord),
	Swap(SwapRecord),
}

impl ScanRecord {
	pub fn commitment(&self) -> StateCommitment {
		match self {
			ScanRecord::Note(note) => note.note_commitment,
			ScanRecord::Swap(swap) => swap.swap_commitment,
		}
	}

	pub fn address_index(&self) -> AddressIndex {
		match self {
			ScanRecord::Note(note) => note.address_index,
			ScanRecord::Swap(swap) => swap.address_index,
		}
	}

	pub fn source(&self) -> &CommitmentSource {
		match self {
			ScanRecord::Note(note) => &note.source,
			ScanRecord::Swap(swap) => &swap.source,
		}
	}

	/// Copy of this record with its provenance replaced.
	pub fn with_source(&self, source: CommitmentSource) -> Self {
		let mut record = self.clone();
		match &mut record {
			ScanRecord::Note(note) => note.source = source,
			ScanRecord::Swap(swap) => swap.source = source,
		}
		record
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
	pub id: TransactionId,
	pub height: Height,
	pub transaction: Transaction,
	pub subaccount: Option<AddressIndex>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epoch {
	pub index: u64,
	pub start_height: Height,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionReserves {
	pub input: Value,
	pub output: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionRecord {
	pub auction_id: AuctionId,
	pub seq_num: u64,
	pub description: Option<DutchAuctionDescription>,
	pub outstanding_reserves: Option<AuctionReserves>,
	/// Commitment of the wallet's auction NFT note.
	pub note_commitment: Option<StateCommitment>,
}

/// Partial auction update. `None` fields leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuctionUpdate {
	pub seq_num: Option<u64>,
	pub description: Option<DutchAuctionDescription>,
	pub outstanding_reserves: Option<AuctionReserves>,
	pub note_commitment: Option<StateCommitment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
	pub position_id: PositionId,
	/// Unknown when the wallet first sees a position through a close or
	/// withdrawal.
	pub position: Option<Position>,
	pub state: PositionState,
	pub subaccount: Option<AddressIndex>,
}

/// One liquidity tournament vote, aggregated within its transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LqtVoteRecord {
	pub incentivized_asset: AssetId,
	pub epoch_index: u64,
	pub transaction_id: TransactionId,
	/// Summed delegation tokens voted with.
	pub vote_value: Value,
	pub reward_amount: Option<u128>,
	pub subaccount: Option<AddressIndex>,
}

impl LqtVoteRecord {
	pub fn key(&self) -> LqtVoteKey {
		LqtVoteKey {
			epoch_index: self.epoch_index,
			transaction_id: self.transaction_id,
			incentivized_asset: self.incentivized_asset,
			delegation_asset: self.vote_value.asset_id,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LqtVoteKey {
	pub epoch_index: u64,
	pub transaction_id: TransactionId,
	pub incentivized_asset: AssetId,
	pub delegation_asset: AssetId,
}

/// Spot price of `priced_asset` in units of `numeraire`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
	pub priced_asset: AssetId,
	pub numeraire: AssetId,
	pub as_of_height: Height,
	pub price: f64,
}
