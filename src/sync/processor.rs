//! Block processing for one sync attempt.
//!
//! `BlockProcessor::sync_and_store` reads the persisted checkpoint, finds the
//! network, optionally bootstraps or scans genesis, then consumes the live
//! compact block stream. Each block runs through the pipeline in
//! `process_block` and nothing advances to the next height until the block's
//! effects are persisted. A flushed block moves the persisted checkpoint only
//! once its whole pipeline and any epoch transition have succeeded.

use backoff::ExponentialBackoff;
use backoff::future::retry;
use futures::future::try_join_all;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::chain::block::GasPrices;
use crate::chain::{
	AssetId, ChainQuerier, CompactBlock, Height, Nullifier, QuerierError, StateCommitment,
};
use crate::config::SyncConfig;
use crate::storage::ViewStore;
use crate::sync::identify::{RelevantTransaction, identify_transactions};
use crate::sync::indexers::{assets, auctions, positions, prices, tournament};
use crate::sync::progress_tracker::SyncProgressTracker;
use crate::sync::SyncError;
use crate::view::{Epoch, ScanRecord, ScannerError, TransactionRecord, ViewScanner};

/// First height after `checkpoint`. Genesis follows the pre-genesis state.
pub(crate) fn next_height(checkpoint: Option<Height>) -> Height {
	checkpoint.map_or(0, |height| height + 1)
}

/// How the scanner sees a block before it enters the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockScan {
	Scan { skip_trial_decrypt: bool },
	/// Already scanned in chunks; the pipeline only flushes.
	Prescanned,
}

/// Bookkeeping carried from block to block within one attempt.
pub(crate) struct SyncState {
	pub checkpoint: Option<Height>,
	pub epoch: Epoch,
	pub latest_known: Height,
	pub tracker: SyncProgressTracker,
}

#[derive(Debug, Default)]
struct BlockOutcome {
	flushed: bool,
	relevant_transactions: usize,
}

pub struct BlockProcessor {
	pub(crate) querier: Arc<dyn ChainQuerier>,
	pub(crate) scanner: Arc<Mutex<Box<dyn ViewScanner>>>,
	pub(crate) store: Arc<dyn ViewStore>,
	pub(crate) config: SyncConfig,
	numeraires: RwLock<Vec<AssetId>>,
}

impl BlockProcessor {
	pub fn new(
		querier: Arc<dyn ChainQuerier>,
		scanner: Box<dyn ViewScanner>,
		store: Arc<dyn ViewStore>,
		config: SyncConfig,
	) -> Self {
		let numeraires = RwLock::new(config.numeraires.clone());
		Self {
			querier,
			scanner: Arc::new(Mutex::new(scanner)),
			store,
			config,
			numeraires,
		}
	}

	pub fn config(&self) -> &SyncConfig {
		&self.config
	}

	/// Replace the numeraires used for swap prices from the next block on.
	pub fn set_numeraires(&self, numeraires: Vec<AssetId>) {
		let mut current = self
			.numeraires
			.write()
			.unwrap_or_else(|poisoned| poisoned.into_inner());
		*current = numeraires;
	}

	fn numeraires(&self) -> Vec<AssetId> {
		self.numeraires
			.read()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.clone()
	}

	/// Discard unflushed scanner state.
	pub async fn reset_scanner(&self) -> Result<(), ScannerError> {
		self.scanner.lock().await.reset_to_checkpoint().await
	}

	/// Run one sync attempt until the stream ends or `cancel` fires.
	///
	/// # Returns
	/// `Ok(())` only when cancelled. Any other end of the attempt is an
	/// error for the caller to retry.
	pub async fn sync_and_store(&self, cancel: &CancellationToken) -> Result<(), SyncError> {
		let mut checkpoint = self.store.full_sync_height().await?;

		let Some(latest_known) = self.probe_latest_height(cancel).await? else {
			return Ok(());
		};
		info!(
			"Wallet {} at height {:?}, chain tip at {}",
			self.config.wallet_id, checkpoint, latest_known
		);

		if checkpoint.is_none() {
			checkpoint = self.apply_bootstrap_snapshot().await?;
		}
		if checkpoint.is_none() {
			self.store.add_epoch(0).await?;
			self.refresh_validators(0).await?;
		}

		let start_height = next_height(checkpoint);
		let mut state = SyncState {
			checkpoint,
			epoch: self.tracked_epoch(start_height).await?,
			latest_known,
			tracker: SyncProgressTracker::new(start_height),
		};

		if let Some(genesis) = self.config.genesis_block() {
			if genesis.height == start_height && checkpoint.is_none() {
				self.scan_genesis(genesis).await?;
				self.handle_block(genesis, BlockScan::Prescanned, &mut state)
					.await?;
			}
		}

		let mut stream = self
			.querier
			.compact_block_range(next_height(state.checkpoint), cancel.clone())
			.await?;

		loop {
			let item = tokio::select! {
				biased;
				_ = cancel.cancelled() => None,
				item = stream.next() => item,
			};
			let Some(block) = item else {
				break;
			};
			let block = block?;
			let scan = BlockScan::Scan {
				skip_trial_decrypt: self.config.predates_wallet(block.height),
			};
			self.handle_block(&block, scan, &mut state).await?;
		}

		state.tracker.log_progress(state.latest_known, true);
		info!("{}", state.tracker.get_stats().summary());

		if cancel.is_cancelled() {
			Ok(())
		} else {
			Err(SyncError::StreamEnded {
				height: state.checkpoint,
			})
		}
	}

	/// Wait for the node to report a height, retrying without limit.
	/// `None` when cancelled first.
	async fn probe_latest_height(
		&self,
		cancel: &CancellationToken,
	) -> Result<Option<Height>, SyncError> {
		let policy = ExponentialBackoff {
			max_elapsed_time: None,
			..ExponentialBackoff::default()
		};
		let querier = &self.querier;
		let probe = retry(policy, || async move {
			match querier.latest_block_height().await {
				Ok(Some(height)) => Ok(height),
				Ok(None) => Err(backoff::Error::transient(QuerierError::NoData(
					"latest block height".to_string(),
				))),
				Err(e) => {
					warn!("Network probe failed, retrying: {}", e);
					Err(backoff::Error::transient(e))
				}
			}
		});

		tokio::select! {
			_ = cancel.cancelled() => Ok(None),
			height = probe => Ok(Some(height?)),
		}
	}

	async fn tracked_epoch(&self, height: Height) -> Result<Epoch, SyncError> {
		self.store
			.epoch_by_height(height)
			.await?
			.ok_or_else(|| SyncError::MissingField(format!("epoch containing height {}", height)))
	}

	/// Check ordering invariants, run the pipeline and advance `state`.
	pub(crate) async fn handle_block(
		&self,
		block: &CompactBlock,
		scan: BlockScan,
		state: &mut SyncState,
	) -> Result<(), SyncError> {
		let expected = next_height(state.checkpoint);
		if block.height != expected {
			return Err(SyncError::UnexpectedHeight {
				expected,
				actual: block.height,
			});
		}
		if block.epoch_index != state.epoch.index {
			return Err(SyncError::UnexpectedEpoch {
				expected: state.epoch.index,
				actual: block.epoch_index,
				height: block.height,
			});
		}

		let outcome = self.process_block(block, scan, state.latest_known).await?;
		state.checkpoint = Some(block.height);
		state.latest_known = state.latest_known.max(block.height);

		if block.ends_epoch() {
			state.epoch = self
				.handle_epoch_transition(block, state.latest_known)
				.await?;
		}

		if outcome.flushed {
			self.store.save_full_sync_height(block.height).await?;
		}

		if self.config.assert_root_valid {
			self.assert_root(block.height).await;
		}

		state.tracker.record_block(
			block.height,
			outcome.flushed,
			outcome.relevant_transactions,
		);
		state.tracker.log_progress(state.latest_known, false);
		Ok(())
	}

	async fn process_block(
		&self,
		block: &CompactBlock,
		scan: BlockScan,
		latest_known: Height,
	) -> Result<BlockOutcome, SyncError> {
		self.apply_parameters(block).await?;

		let mut scanner = self.scanner.lock().await;
		let scanner_wants_flush = match scan {
			BlockScan::Scan { skip_trial_decrypt } => {
				scanner.scan_block(block, skip_trial_decrypt).await?
			}
			BlockScan::Prescanned => true,
		};
		let flush = scanner_wants_flush
			|| block.height % self.config.flush_interval == 0
			|| block.height > latest_known;
		let scan_result = flush.then(|| scanner.flush_updates());
		drop(scanner);

		let mut outcome = BlockOutcome {
			flushed: flush,
			..Default::default()
		};
		let (new_notes, new_swaps) = match scan_result {
			Some(mut result) => {
				result.height = block.height;
				self.store.save_scan_result(&result).await?;
				debug!(
					"Flushed {} notes and {} swaps at height {}",
					result.new_notes.len(),
					result.new_swaps.len(),
					block.height
				);
				assets::identify_assets(
					&*self.store,
					&*self.querier,
					result.new_notes.iter().map(|note| note.note.value.asset_id),
				)
				.await?;
				(result.new_notes, result.new_swaps)
			}
			None => (Vec::new(), Vec::new()),
		};

		let spent = self.resolve_nullifiers(block).await?;

		let mut created: HashMap<StateCommitment, ScanRecord> = new_notes
			.iter()
			.cloned()
			.map(ScanRecord::Note)
			.chain(new_swaps.iter().cloned().map(ScanRecord::Swap))
			.map(|record| (record.commitment(), record))
			.collect();
		// records created and spent in the same block keep their spend
		for record in spent.values() {
			if let Some(entry) = created.get_mut(&record.commitment()) {
				*entry = record.clone();
			}
		}

		if !spent.is_empty() || !created.is_empty() {
			let transactions = self.querier.transactions_by_height(block.height).await?;
			let scanner = self.scanner.clone();
			let identified = tokio::task::spawn_blocking(move || {
				let scanner = scanner.blocking_lock();
				identify_transactions(&spent, &created, transactions, &**scanner)
			})
			.await
			.map_err(|e| SyncError::TaskFailed(e.to_string()))?;

			for record in &identified.recovered {
				match record {
					ScanRecord::Note(note) => self.store.save_note(note).await?,
					ScanRecord::Swap(swap) => self.store.save_swap(swap).await?,
				}
			}

			for relevant in &identified.relevant {
				for action in &relevant.transaction.actions {
					positions::apply_position_action(&*self.store, action, relevant.subaccount)
						.await?;
					auctions::apply_auction_action(&*self.store, &*self.querier, action).await?;
				}
			}

			for relevant in &identified.relevant {
				let votes = tournament::aggregate_votes(
					&relevant.transaction,
					relevant.id,
					block.epoch_index,
					relevant.subaccount,
				);
				for vote in &votes {
					self.store.save_lqt_vote(vote).await?;
				}
			}

			tournament::backfill_rewards(&*self.store, &new_notes, block.epoch_index).await?;

			outcome.relevant_transactions = identified.relevant.len();
			self.save_transactions(identified.relevant, block.height)
				.await?;
		}

		auctions::associate_auction_notes(&*self.store, &new_notes).await?;

		self.update_swap_prices(block, latest_known).await?;

		Ok(outcome)
	}

	/// Store parameter updates carried by the block.
	async fn apply_parameters(&self, block: &CompactBlock) -> Result<(), SyncError> {
		if block.app_parameters_updated {
			let params = self.querier.app_params().await?;
			self.store.save_app_params(&params).await?;
		}
		if let Some(fmd) = &block.fmd_parameters {
			self.store.save_fmd_params(fmd).await?;
		}
		if let Some(gas_prices) = &block.gas_prices {
			let base = GasPrices {
				asset_id: Some(self.config.staking_asset_id),
				..gas_prices.clone()
			};
			self.store.save_gas_prices(&base).await?;
		}
		for alt in &block.alt_gas_prices {
			self.store.save_gas_prices(alt).await?;
		}
		Ok(())
	}

	/// Look up every nullifier in the block concurrently and mark matched
	/// records spent or claimed at this height.
	async fn resolve_nullifiers(
		&self,
		block: &CompactBlock,
	) -> Result<HashMap<Nullifier, ScanRecord>, SyncError> {
		let store = &self.store;
		let lookups = block.nullifiers.iter().map(|nullifier| async move {
			if let Some(note) = store.note_by_nullifier(nullifier).await? {
				return Ok::<_, SyncError>(Some((*nullifier, ScanRecord::Note(note))));
			}
			let swap = store.swap_by_nullifier(nullifier).await?;
			Ok(swap.map(|swap| (*nullifier, ScanRecord::Swap(swap))))
		});
		let found = try_join_all(lookups).await?;

		let mut spent = HashMap::new();
		for (nullifier, record) in found.into_iter().flatten() {
			let record = match record {
				ScanRecord::Note(mut note) => {
					if note.height_spent.is_none() {
						note.height_spent = Some(block.height);
						self.store.save_note(&note).await?;
					}
					ScanRecord::Note(note)
				}
				ScanRecord::Swap(mut swap) => {
					if swap.height_claimed.is_none() {
						swap.height_claimed = Some(block.height);
						self.store.save_swap(&swap).await?;
					}
					ScanRecord::Swap(swap)
				}
			};
			spent.insert(nullifier, record);
		}
		Ok(spent)
	}

	async fn save_transactions(
		&self,
		relevant: Vec<RelevantTransaction>,
		height: Height,
	) -> Result<(), SyncError> {
		for tx in relevant {
			self.store
				.save_transaction(&TransactionRecord {
					id: tx.id,
					height,
					transaction: tx.transaction,
					subaccount: tx.subaccount,
				})
				.await?;
		}
		Ok(())
	}

	/// Derive spot prices from the block's batch swaps when it is close
	/// enough to the tip.
	async fn update_swap_prices(
		&self,
		block: &CompactBlock,
		latest_known: Height,
	) -> Result<(), SyncError> {
		if block.swap_outputs.is_empty()
			|| block.height + self.config.price_relevance_threshold < latest_known
		{
			return Ok(());
		}
		let numeraires = self.numeraires();
		for output in &block.swap_outputs {
			for price in prices::swap_prices(output, &numeraires) {
				self.store.update_price(&price).await?;
			}
		}
		Ok(())
	}

	/// Compare local and remote commitment-tree roots. Never fails.
	async fn assert_root(&self, height: Height) {
		let local = self.scanner.lock().await.current_root();
		match self.querier.remote_root_at(height).await {
			Ok(remote) if remote == local => debug!("Root verified at height {}", height),
			Ok(remote) => error!(
				"Root mismatch at height {}: local {}, remote {}",
				height, local, remote
			),
			Err(e) => error!("Could not fetch remote root at height {}: {}", height, e),
		}
	}
}
