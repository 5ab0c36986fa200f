//! Full transactions and the action kinds the view layer cares about.

use serde::{Deserialize, Serialize};

use super::auction::DutchAuctionDescription;
use super::dex::Position;
use super::ids::{AssetId, AuctionId, Nullifier, PositionId, StateCommitment, TransactionId, content_hash};

/// Encoded payment address. Decoding is owned by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl From<&str> for Address {
	fn from(s: &str) -> Self {
		Address(s.to_string())
	}
}

/// Subaccount index of a wallet address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressIndex {
	pub account: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
	pub amount: u128,
	pub asset_id: AssetId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
	pub actions: Vec<Action>,
	pub expiry_height: u64,
	pub memo: Option<Vec<u8>>,
}

impl Transaction {
	/// Content hash identifying this transaction.
	pub fn id(&self) -> TransactionId {
		TransactionId(content_hash(self))
	}

	/// Nullifiers revealed by spends and swap claims.
	pub fn nullifiers(&self) -> impl Iterator<Item = &Nullifier> {
		self.actions.iter().filter_map(|action| match action {
			Action::Spend { nullifier } | Action::SwapClaim { nullifier, .. } => Some(nullifier),
			_ => None,
		})
	}

	/// Commitments created by outputs, swaps and swap claims.
	pub fn commitments(&self) -> impl Iterator<Item = &StateCommitment> {
		self.actions.iter().flat_map(|action| {
			let commitments: &[StateCommitment] = match action {
				Action::Output { note_commitment } => std::slice::from_ref(note_commitment),
				Action::Swap { swap_commitment } => std::slice::from_ref(swap_commitment),
				Action::SwapClaim {
					output_commitments, ..
				} => output_commitments.as_slice(),
				_ => &[],
			};
			commitments.iter()
		})
	}

	pub fn ibc_relays(&self) -> impl Iterator<Item = &IbcRelay> {
		self.actions.iter().filter_map(|action| match action {
			Action::IbcRelay(relay) => Some(relay),
			_ => None,
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
	Spend {
		nullifier: Nullifier,
	},
	Output {
		note_commitment: StateCommitment,
	},
	Swap {
		swap_commitment: StateCommitment,
	},
	SwapClaim {
		nullifier: Nullifier,
		output_commitments: [StateCommitment; 2],
	},
	PositionOpen {
		position: Position,
	},
	PositionClose {
		position_id: PositionId,
	},
	PositionWithdraw {
		position_id: PositionId,
		sequence: u64,
	},
	DutchAuctionSchedule {
		description: DutchAuctionDescription,
	},
	DutchAuctionEnd {
		auction_id: AuctionId,
	},
	DutchAuctionWithdraw {
		auction_id: AuctionId,
		seq: u64,
	},
	IbcRelay(IbcRelay),
	LiquidityTournamentVote {
		/// Asset the vote is cast for.
		incentivized: AssetId,
		/// Delegation tokens backing the vote.
		value: Value,
		rewards_recipient: Address,
	},
}

/// IBC relay messages. Only the packet-carrying variants can concern the
/// wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IbcRelay {
	RecvPacket(Packet),
	Acknowledgement(Packet),
	Timeout(Packet),
	/// Client, connection and channel handshakes.
	Other { type_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
	pub sequence: u64,
	pub source_port: String,
	pub source_channel: String,
	pub destination_port: String,
	pub destination_channel: String,
	/// JSON-encoded ICS-20 payload.
	pub data: Vec<u8>,
}

/// ICS-20 fungible token transfer payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FungibleTokenPacketData {
	pub denom: String,
	pub amount: String,
	pub sender: String,
	pub receiver: String,
	#[serde(default)]
	pub memo: String,
}

impl Packet {
	pub fn token_data(&self) -> Result<FungibleTokenPacketData, serde_json::Error> {
		serde_json::from_slice(&self.data)
	}
}
