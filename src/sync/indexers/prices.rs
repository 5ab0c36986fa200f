//! Spot prices from swap settlements and validator exchange rates.

use crate::chain::dex::BatchSwapOutputData;
use crate::chain::stake::{EXCHANGE_RATE_DECIMALS, ValidatorInfo};
use crate::chain::{AssetId, Height};
use crate::utils::ratio;
use crate::view::PriceRecord;

/// Prices implied by one batch swap, one per numeraire in the pair.
///
/// The price of the other asset is what its swappers received in the
/// numeraire per unit actually traded. Zero input, zero output and fully
/// unfilled batches yield no price.
pub(crate) fn swap_prices(
	output: &BatchSwapOutputData,
	numeraires: &[AssetId],
) -> Vec<PriceRecord> {
	let pair = &output.trading_pair;
	numeraires
		.iter()
		.filter_map(|numeraire| {
			let (priced_asset, lambda, delta, unfilled) = if pair.asset_1 == *numeraire {
				(pair.asset_2, output.lambda_1, output.delta_2, output.unfilled_2)
			} else if pair.asset_2 == *numeraire {
				(pair.asset_1, output.lambda_2, output.delta_1, output.unfilled_1)
			} else {
				return None;
			};
			if delta == 0 || lambda == 0 {
				return None;
			}
			let price = ratio(lambda, delta.checked_sub(unfilled)?)?;
			Some(PriceRecord {
				priced_asset,
				numeraire: *numeraire,
				as_of_height: output.height,
				price,
			})
		})
		.collect()
}

/// Price of a validator's delegation token in the staking asset.
pub(crate) fn delegation_price(
	validator: &ValidatorInfo,
	staking_asset_id: AssetId,
	as_of_height: Height,
) -> PriceRecord {
	let scale = 10u128.pow(EXCHANGE_RATE_DECIMALS);
	PriceRecord {
		priced_asset: validator.delegation_asset_id(),
		numeraire: staking_asset_id,
		as_of_height,
		price: ratio(validator.rate_data.validator_exchange_rate, scale).unwrap_or_default(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::chain::IdentityKey;
	use crate::chain::dex::TradingPair;
	use crate::chain::stake::{RateData, ValidatorState};

	const USDC: AssetId = AssetId([1; 32]);
	const GM: AssetId = AssetId([2; 32]);

	fn output(delta_2: u128, lambda_1: u128, unfilled_2: u128) -> BatchSwapOutputData {
		BatchSwapOutputData {
			height: 950,
			trading_pair: TradingPair {
				asset_1: USDC,
				asset_2: GM,
			},
			delta_1: 0,
			delta_2,
			lambda_1,
			lambda_2: 0,
			unfilled_1: 0,
			unfilled_2,
		}
	}

	#[test]
	fn prices_other_asset_in_numeraire() {
		let prices = swap_prices(&output(100, 250, 0), &[USDC]);
		assert_eq!(prices.len(), 1);
		assert_eq!(prices[0].priced_asset, GM);
		assert_eq!(prices[0].price, 2.5);
		assert_eq!(prices[0].as_of_height, 950);
	}

	#[test]
	fn partially_filled_batches_use_traded_amount() {
		let prices = swap_prices(&output(100, 150, 50), &[USDC]);
		assert_eq!(prices[0].price, 3.0);
	}

	#[test]
	fn degenerate_batches_have_no_price() {
		assert!(swap_prices(&output(0, 150, 0), &[USDC]).is_empty());
		assert!(swap_prices(&output(100, 0, 0), &[USDC]).is_empty());
		assert!(swap_prices(&output(100, 150, 100), &[USDC]).is_empty());
		// asset 1 swappers put nothing in
		assert!(swap_prices(&output(100, 150, 0), &[GM]).is_empty());
	}

	#[test]
	fn delegation_price_scales_exchange_rate() {
		let validator = ValidatorInfo {
			identity_key: IdentityKey([3; 32]),
			name: "v".to_string(),
			state: ValidatorState::Active,
			rate_data: RateData {
				epoch_index: 1,
				validator_exchange_rate: 150_000_000,
			},
		};
		let price = delegation_price(&validator, USDC, 70);
		assert_eq!(price.price, 1.5);
		assert_eq!(price.priced_asset, validator.delegation_asset_id());
	}
}
