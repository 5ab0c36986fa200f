use serde::{Deserialize, Serialize};

use super::asset::delegation_denom;
use super::ids::{AssetId, IdentityKey};

/// Fixed-point scale of validator exchange rates.
pub const EXCHANGE_RATE_DECIMALS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorState {
	Defined,
	Inactive,
	Active,
	Jailed,
	Tombstoned,
	Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateData {
	pub epoch_index: u64,
	/// Delegation-token to staking-token exchange rate, scaled by 10^8.
	pub validator_exchange_rate: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorInfo {
	pub identity_key: IdentityKey,
	pub name: String,
	pub state: ValidatorState,
	pub rate_data: RateData,
}

impl ValidatorInfo {
	pub fn delegation_asset_id(&self) -> AssetId {
		AssetId::from_denom(&delegation_denom(&self.identity_key))
	}
}
