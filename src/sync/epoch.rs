//! Epoch transitions and validator set refresh.

use futures_util::StreamExt;
use tracing::{debug, info};

use crate::chain::asset::delegation_metadata;
use crate::chain::stake::EXCHANGE_RATE_DECIMALS;
use crate::chain::{CompactBlock, Height};
use crate::sync::SyncError;
use crate::sync::indexers::prices::delegation_price;
use crate::utils::format_amount;
use crate::view::Epoch;

use super::processor::BlockProcessor;

impl BlockProcessor {
	/// Record the epoch that starts after `block` and refresh validators if
	/// the wallet is within one epoch of the tip.
	pub(crate) async fn handle_epoch_transition(
		&self,
		block: &CompactBlock,
		latest_known: Height,
	) -> Result<Epoch, SyncError> {
		let next_start = block.height + 1;
		let epoch = self.store.add_epoch(next_start).await?;
		info!("Epoch {} begins at height {}", epoch.index, next_start);

		let epoch_duration = self.epoch_duration().await?;
		if latest_known.saturating_sub(next_start) < epoch_duration {
			self.refresh_validators(next_start).await?;
		} else {
			debug!(
				"Skipping validator refresh at height {}, tip is {}",
				next_start, latest_known
			);
		}
		Ok(epoch)
	}

	async fn epoch_duration(&self) -> Result<u64, SyncError> {
		if let Some(params) = self.store.app_params().await? {
			return Ok(params.sct_params.epoch_duration);
		}
		let params = self.querier.app_params().await?;
		self.store.save_app_params(&params).await?;
		Ok(params.sct_params.epoch_duration)
	}

	/// Replace the stored validator set with the chain's current one and
	/// price each delegation token as of `as_of_height`.
	///
	/// # Returns
	/// The number of validators stored.
	pub(crate) async fn refresh_validators(&self, as_of_height: Height) -> Result<usize, SyncError> {
		let mut stream = self.querier.all_validator_infos().await?;
		let mut validators = Vec::new();
		while let Some(info) = stream.next().await {
			validators.push(info?);
		}

		self.store.clear_validator_infos().await?;
		for validator in &validators {
			debug!(
				"Validator {} exchange rate {}",
				validator.name,
				format_amount(
					validator.rate_data.validator_exchange_rate,
					EXCHANGE_RATE_DECIMALS
				)
			);
			self.store.upsert_validator_info(validator).await?;

			let delegation_id = validator.delegation_asset_id();
			if self.store.asset_metadata(&delegation_id).await?.is_none() {
				self.store
					.save_asset_metadata(&delegation_metadata(&validator.identity_key))
					.await?;
			}

			let price = delegation_price(validator, self.config.staking_asset_id, as_of_height);
			self.store.update_price(&price).await?;
		}

		info!(
			"Refreshed {} validators as of height {}",
			validators.len(),
			as_of_height
		);
		Ok(validators.len())
	}
}
