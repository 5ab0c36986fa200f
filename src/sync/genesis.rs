//! Fresh-wallet start: frontier bootstrap and chunked genesis scanning.

use tracing::info;

use crate::chain::{CompactBlock, Height};
use crate::sync::SyncError;
use crate::view::Epoch;

use super::processor::BlockProcessor;

impl BlockProcessor {
	/// Start a fresh wallet from a precomputed frontier instead of genesis.
	///
	/// Applies only when a snapshot height is configured, the wallet was
	/// created at or after it, and no snapshot was applied before.
	///
	/// # Returns
	/// The new checkpoint, or `None` when nothing was applied.
	pub(crate) async fn apply_bootstrap_snapshot(&self) -> Result<Option<Height>, SyncError> {
		let (Some(snapshot_height), Some(created)) = (
			self.config.bootstrap_snapshot_height,
			self.config.wallet_creation_height,
		) else {
			return Ok(None);
		};
		if created < snapshot_height || self.store.bootstrap_applied().await? {
			return Ok(None);
		}

		let snapshot = self.querier.frontier_snapshot().await?;
		self.scanner.lock().await.load_frontier(&snapshot).await?;

		self.store
			.save_epoch(&Epoch {
				index: snapshot.epoch_index,
				start_height: snapshot.epoch_start_height,
			})
			.await?;
		let params = self.querier.app_params().await?;
		self.store.save_app_params(&params).await?;
		self.store.save_full_sync_height(snapshot.height).await?;
		self.store.mark_bootstrap_applied().await?;
		self.refresh_validators(snapshot.epoch_start_height).await?;

		info!(
			"Bootstrapped wallet {} from frontier at height {}",
			self.config.wallet_id, snapshot.height
		);
		Ok(Some(snapshot.height))
	}

	/// Trial-decrypt the genesis block in fixed-size slices.
	///
	/// Slices run strictly in order, each advancing the scanner's tree, and
	/// the task yields to the runtime between them. The caller flushes once
	/// afterwards.
	pub(crate) async fn scan_genesis(&self, genesis: &CompactBlock) -> Result<(), SyncError> {
		let chunk_size = self.config.genesis_chunk_size.max(1);
		let skip_trial_decrypt = self.config.predates_wallet(genesis.height);
		info!(
			"Scanning genesis block with {} payloads",
			genesis.state_payloads.len()
		);

		let mut scanner = self.scanner.lock().await;
		for (index, payloads) in genesis.state_payloads.chunks(chunk_size).enumerate() {
			let chunk = CompactBlock {
				height: genesis.height,
				epoch_index: genesis.epoch_index,
				state_payloads: payloads.to_vec(),
				..Default::default()
			};
			scanner
				.scan_genesis_chunk((index * chunk_size) as u64, &chunk, skip_trial_decrypt)
				.await?;
			tokio::task::yield_now().await;
		}
		scanner.finalize_genesis(genesis).await?;
		Ok(())
	}
}
