//! Asset metadata, including the denominations that only exist locally.
//!
//! LP-position NFTs, auction NFTs and delegation tokens are never served by
//! the chain's asset registry. Their metadata is synthesized from the object
//! they represent, and their asset id is the hash of the base denomination.

use serde::{Deserialize, Serialize};

use super::dex::PositionState;
use super::ids::{AssetId, AuctionId, IdentityKey, PositionId};

const AUCTION_NFT_PREFIX: &str = "auctionnft_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenomUnit {
	pub denom: String,
	pub exponent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
	pub asset_id: AssetId,
	pub base: String,
	pub display: String,
	pub symbol: String,
	pub denom_units: Vec<DenomUnit>,
}

impl Metadata {
	fn synthetic(base: String, display: String, symbol: String, exponent: u32) -> Self {
		let mut denom_units = vec![DenomUnit {
			denom: base.clone(),
			exponent: 0,
		}];
		if exponent > 0 {
			denom_units.push(DenomUnit {
				denom: display.clone(),
				exponent,
			});
		}
		Self {
			asset_id: AssetId::from_denom(&base),
			base,
			display,
			symbol,
			denom_units,
		}
	}
}

pub fn lp_nft_metadata(position_id: &PositionId, state: &PositionState) -> Metadata {
	let base = format!("lpnft_{}_{}", state.denom_label(), position_id);
	let symbol = format!("lpNft:{}({})", state.denom_label(), &position_id.to_hex()[..8]);
	Metadata::synthetic(base.clone(), base, symbol, 0)
}

pub fn auction_nft_metadata(auction_id: &AuctionId, seq: u64) -> Metadata {
	let base = format!("{}{}_{}", AUCTION_NFT_PREFIX, seq, auction_id);
	let symbol = format!("auction@{}({})", seq, &auction_id.to_hex()[..8]);
	Metadata::synthetic(base.clone(), base, symbol, 0)
}

pub(crate) fn delegation_denom(identity_key: &IdentityKey) -> String {
	format!("udelegation_{}", identity_key)
}

pub fn delegation_metadata(identity_key: &IdentityKey) -> Metadata {
	let base = delegation_denom(identity_key);
	let display = format!("delegation_{}", identity_key);
	let symbol = format!("delUM({})", &identity_key.to_hex()[..8]);
	Metadata::synthetic(base, display, symbol, 6)
}

/// Parse `auctionnft_<seq>_<auction id>` out of a base denomination.
pub fn parse_auction_nft(base: &str) -> Option<(u64, AuctionId)> {
	let rest = base.strip_prefix(AUCTION_NFT_PREFIX)?;
	let (seq, id) = rest.split_once('_')?;
	Some((seq.parse().ok()?, AuctionId::from_hex(id)?))
}
