//! In-memory view store with optional JSON file persistence.
//!
//! All wallet state lives in a single serializable struct. When opened on a
//! data directory, every mutation rewrites `view_state.json` (via a temp file
//! and rename) together with a small metadata file recording the sync height
//! and the save time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::chain::block::{FmdParameters, GasPrices};
use crate::chain::dex::{Position, PositionState};
use crate::chain::stake::ValidatorInfo;
use crate::chain::{
	AddressIndex, AppParameters, AssetId, AuctionId, Height, IdentityKey, Metadata, Nullifier,
	PositionId, StateCommitment, TransactionId,
};
use crate::view::{
	AuctionRecord, AuctionUpdate, Epoch, LqtVoteKey, LqtVoteRecord, PositionRecord, PriceRecord,
	ScanResult, SpendableNoteRecord, StoredHash, SwapRecord, TransactionRecord,
};

use super::repository::{StorageError, ViewStore};

const STATE_FILE: &str = "view_state.json";
const METADATA_FILE: &str = "view_state.meta.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct SctState {
	position: Option<u64>,
	forgotten: Option<u64>,
	commitments: BTreeMap<u64, StateCommitment>,
	hashes: Vec<StoredHash>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
	full_sync_height: Option<Height>,
	/// Sorted by start height.
	epochs: Vec<Epoch>,
	notes: HashMap<StateCommitment, SpendableNoteRecord>,
	note_nullifiers: HashMap<Nullifier, StateCommitment>,
	swaps: HashMap<StateCommitment, SwapRecord>,
	swap_nullifiers: HashMap<Nullifier, StateCommitment>,
	transactions: HashMap<TransactionId, TransactionRecord>,
	assets: HashMap<AssetId, Metadata>,
	app_params: Option<AppParameters>,
	fmd_params: Option<FmdParameters>,
	gas_prices: HashMap<AssetId, GasPrices>,
	validators: BTreeMap<IdentityKey, ValidatorInfo>,
	auctions: HashMap<AuctionId, AuctionRecord>,
	positions: HashMap<PositionId, PositionRecord>,
	lqt_votes: Vec<LqtVoteRecord>,
	prices: Vec<PriceRecord>,
	sct: SctState,
	bootstrap_applied: bool,
}

impl StoreState {
	fn put_note(&mut self, note: &SpendableNoteRecord) {
		self.note_nullifiers
			.insert(note.nullifier, note.note_commitment);
		self.notes.insert(note.note_commitment, note.clone());
	}

	fn put_swap(&mut self, swap: &SwapRecord) {
		self.swap_nullifiers
			.insert(swap.nullifier, swap.swap_commitment);
		self.swaps.insert(swap.swap_commitment, swap.clone());
	}
}

pub struct LocalStore {
	state: Mutex<StoreState>,
	data_dir: Option<PathBuf>,
}

impl LocalStore {
	/// A store that lives only as long as the process.
	pub fn in_memory() -> Self {
		Self {
			state: Mutex::new(StoreState::default()),
			data_dir: None,
		}
	}

	/// Open a file-backed store in `data_dir`, loading any saved state.
	pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
		let data_dir = data_dir.into();
		tokio::fs::create_dir_all(&data_dir).await?;

		let path = data_dir.join(STATE_FILE);
		let state = if path.exists() {
			let content = tokio::fs::read_to_string(&path).await?;
			let state: StoreState = serde_json::from_str(&content)?;
			info!(
				"Loaded view state from {:?} at height {:?}",
				path, state.full_sync_height
			);
			state
		} else {
			StoreState::default()
		};

		Ok(Self {
			state: Mutex::new(state),
			data_dir: Some(data_dir),
		})
	}

	async fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
		let guard = self.state.lock().await;
		f(&guard)
	}

	/// Apply `f` and persist the result before releasing the lock, so writes
	/// reach disk in the order they were made.
	async fn mutate<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> Result<R, StorageError> {
		let mut guard = self.state.lock().await;
		let result = f(&mut guard);
		if let Some(dir) = &self.data_dir {
			persist(dir, &guard).await?;
		}
		Ok(result)
	}
}

async fn persist(dir: &Path, state: &StoreState) -> Result<(), StorageError> {
	let content = serde_json::to_string(state)?;
	let tmp = dir.join(format!("{}.tmp", STATE_FILE));
	tokio::fs::write(&tmp, content).await?;
	tokio::fs::rename(&tmp, dir.join(STATE_FILE)).await?;

	let metadata = serde_json::json!({
		"sync_height": state.full_sync_height,
		"timestamp": chrono::Utc::now().to_rfc3339(),
	});
	tokio::fs::write(
		dir.join(METADATA_FILE),
		serde_json::to_string_pretty(&metadata)?,
	)
	.await?;

	debug!("Persisted view state at height {:?}", state.full_sync_height);
	Ok(())
}

#[async_trait]
impl ViewStore for LocalStore {
	async fn full_sync_height(&self) -> Result<Option<Height>, StorageError> {
		Ok(self.read(|s| s.full_sync_height).await)
	}

	async fn save_full_sync_height(&self, height: Height) -> Result<(), StorageError> {
		self.mutate(|s| s.full_sync_height = Some(height)).await
	}

	async fn save_scan_result(&self, result: &ScanResult) -> Result<(), StorageError> {
		self.mutate(|s| {
			let updates = &result.sct_updates;
			if let Some(position) = updates.set_position {
				s.sct.position = Some(position);
			}
			if let Some(forgotten) = updates.set_forgotten {
				s.sct.forgotten = Some(forgotten);
			}
			for (position, commitment) in &updates.store_commitments {
				s.sct.commitments.insert(*position, *commitment);
			}
			for (start, end) in &updates.delete_ranges {
				s.sct
					.hashes
					.retain(|h| h.position < *start || h.position >= *end);
			}
			for stored in &updates.store_hashes {
				s.sct
					.hashes
					.retain(|h| h.position != stored.position || h.height != stored.height);
				s.sct.hashes.push(stored.clone());
			}

			for note in &result.new_notes {
				s.put_note(note);
			}
			for swap in &result.new_swaps {
				s.put_swap(swap);
			}
		})
		.await
	}

	async fn epoch_by_height(&self, height: Height) -> Result<Option<Epoch>, StorageError> {
		Ok(self
			.read(|s| {
				s.epochs
					.iter()
					.rev()
					.find(|epoch| epoch.start_height <= height)
					.copied()
			})
			.await)
	}

	async fn add_epoch(&self, start_height: Height) -> Result<Epoch, StorageError> {
		self.mutate(|s| {
			if let Some(existing) = s.epochs.iter().find(|e| e.start_height == start_height) {
				return *existing;
			}
			let index = s
				.epochs
				.iter()
				.filter(|e| e.start_height < start_height)
				.map(|e| e.index + 1)
				.max()
				.unwrap_or(0);
			let epoch = Epoch {
				index,
				start_height,
			};
			s.epochs.push(epoch);
			s.epochs.sort_by_key(|e| e.start_height);
			epoch
		})
		.await
	}

	async fn save_epoch(&self, epoch: &Epoch) -> Result<(), StorageError> {
		self.mutate(|s| {
			s.epochs.retain(|e| e.start_height != epoch.start_height);
			s.epochs.push(*epoch);
			s.epochs.sort_by_key(|e| e.start_height);
		})
		.await
	}

	async fn note_by_nullifier(
		&self,
		nullifier: &Nullifier,
	) -> Result<Option<SpendableNoteRecord>, StorageError> {
		Ok(self
			.read(|s| {
				s.note_nullifiers
					.get(nullifier)
					.and_then(|c| s.notes.get(c))
					.cloned()
			})
			.await)
	}

	async fn note_by_commitment(
		&self,
		commitment: &StateCommitment,
	) -> Result<Option<SpendableNoteRecord>, StorageError> {
		Ok(self.read(|s| s.notes.get(commitment).cloned()).await)
	}

	async fn save_note(&self, note: &SpendableNoteRecord) -> Result<(), StorageError> {
		self.mutate(|s| s.put_note(note)).await
	}

	async fn swap_by_nullifier(
		&self,
		nullifier: &Nullifier,
	) -> Result<Option<SwapRecord>, StorageError> {
		Ok(self
			.read(|s| {
				s.swap_nullifiers
					.get(nullifier)
					.and_then(|c| s.swaps.get(c))
					.cloned()
			})
			.await)
	}

	async fn save_swap(&self, swap: &SwapRecord) -> Result<(), StorageError> {
		self.mutate(|s| s.put_swap(swap)).await
	}

	async fn save_transaction(&self, record: &TransactionRecord) -> Result<(), StorageError> {
		self.mutate(|s| {
			s.transactions.insert(record.id, record.clone());
		})
		.await
	}

	async fn transaction(
		&self,
		id: &TransactionId,
	) -> Result<Option<TransactionRecord>, StorageError> {
		Ok(self.read(|s| s.transactions.get(id).cloned()).await)
	}

	async fn asset_metadata(&self, asset_id: &AssetId) -> Result<Option<Metadata>, StorageError> {
		Ok(self.read(|s| s.assets.get(asset_id).cloned()).await)
	}

	async fn save_asset_metadata(&self, metadata: &Metadata) -> Result<(), StorageError> {
		self.mutate(|s| {
			s.assets.insert(metadata.asset_id, metadata.clone());
		})
		.await
	}

	async fn app_params(&self) -> Result<Option<AppParameters>, StorageError> {
		Ok(self.read(|s| s.app_params.clone()).await)
	}

	async fn save_app_params(&self, params: &AppParameters) -> Result<(), StorageError> {
		self.mutate(|s| s.app_params = Some(params.clone())).await
	}

	async fn save_fmd_params(&self, params: &FmdParameters) -> Result<(), StorageError> {
		self.mutate(|s| s.fmd_params = Some(params.clone())).await
	}

	async fn save_gas_prices(&self, prices: &GasPrices) -> Result<(), StorageError> {
		self.mutate(|s| {
			s.gas_prices
				.insert(prices.asset_id.unwrap_or_default(), prices.clone());
		})
		.await
	}

	async fn gas_prices(&self, asset_id: &AssetId) -> Result<Option<GasPrices>, StorageError> {
		Ok(self.read(|s| s.gas_prices.get(asset_id).cloned()).await)
	}

	async fn clear_validator_infos(&self) -> Result<(), StorageError> {
		self.mutate(|s| s.validators.clear()).await
	}

	async fn upsert_validator_info(&self, info: &ValidatorInfo) -> Result<(), StorageError> {
		self.mutate(|s| {
			s.validators.insert(info.identity_key, info.clone());
		})
		.await
	}

	async fn validator_infos(&self) -> Result<Vec<ValidatorInfo>, StorageError> {
		Ok(self.read(|s| s.validators.values().cloned().collect()).await)
	}

	async fn upsert_auction(
		&self,
		auction_id: &AuctionId,
		update: AuctionUpdate,
	) -> Result<(), StorageError> {
		self.mutate(|s| {
			let record = s
				.auctions
				.entry(*auction_id)
				.or_insert_with(|| AuctionRecord {
					auction_id: *auction_id,
					seq_num: 0,
					description: None,
					outstanding_reserves: None,
					note_commitment: None,
				});
			if let Some(seq_num) = update.seq_num {
				record.seq_num = seq_num;
			}
			if let Some(description) = update.description {
				record.description = Some(description);
			}
			if let Some(reserves) = update.outstanding_reserves {
				record.outstanding_reserves = Some(reserves);
			}
			if let Some(commitment) = update.note_commitment {
				record.note_commitment = Some(commitment);
			}
		})
		.await
	}

	async fn delete_auction_reserves(&self, auction_id: &AuctionId) -> Result<(), StorageError> {
		self.mutate(|s| {
			if let Some(record) = s.auctions.get_mut(auction_id) {
				record.outstanding_reserves = None;
			}
		})
		.await
	}

	async fn auction(&self, auction_id: &AuctionId) -> Result<Option<AuctionRecord>, StorageError> {
		Ok(self.read(|s| s.auctions.get(auction_id).cloned()).await)
	}

	async fn auctions(&self) -> Result<Vec<AuctionRecord>, StorageError> {
		Ok(self.read(|s| s.auctions.values().cloned().collect()).await)
	}

	async fn add_position(
		&self,
		position_id: &PositionId,
		position: &Position,
		subaccount: Option<AddressIndex>,
	) -> Result<(), StorageError> {
		self.mutate(|s| {
			s.positions.insert(
				*position_id,
				PositionRecord {
					position_id: *position_id,
					position: Some(position.clone()),
					state: PositionState::Opened,
					subaccount,
				},
			);
		})
		.await
	}

	async fn update_position(
		&self,
		position_id: &PositionId,
		state: PositionState,
		subaccount: Option<AddressIndex>,
	) -> Result<(), StorageError> {
		self.mutate(|s| {
			let record = s
				.positions
				.entry(*position_id)
				.or_insert_with(|| PositionRecord {
					position_id: *position_id,
					position: None,
					state,
					subaccount,
				});
			record.state = state;
			if subaccount.is_some() {
				record.subaccount = subaccount;
			}
		})
		.await
	}

	async fn positions(&self) -> Result<Vec<PositionRecord>, StorageError> {
		Ok(self.read(|s| s.positions.values().cloned().collect()).await)
	}

	async fn save_lqt_vote(&self, vote: &LqtVoteRecord) -> Result<(), StorageError> {
		self.mutate(|s| {
			let key = vote.key();
			match s.lqt_votes.iter_mut().find(|v| v.key() == key) {
				Some(existing) => *existing = vote.clone(),
				None => s.lqt_votes.push(vote.clone()),
			}
		})
		.await
	}

	async fn lqt_votes(
		&self,
		epoch_index: u64,
		subaccount: Option<AddressIndex>,
	) -> Result<Vec<LqtVoteRecord>, StorageError> {
		Ok(self
			.read(|s| {
				s.lqt_votes
					.iter()
					.filter(|v| v.epoch_index == epoch_index && v.subaccount == subaccount)
					.cloned()
					.collect()
			})
			.await)
	}

	async fn update_lqt_reward(&self, key: &LqtVoteKey, amount: u128) -> Result<(), StorageError> {
		let found = self
			.mutate(|s| match s.lqt_votes.iter_mut().find(|v| v.key() == *key) {
				Some(vote) => {
					vote.reward_amount = Some(amount);
					true
				}
				None => false,
			})
			.await?;
		if found {
			Ok(())
		} else {
			Err(StorageError::NotFound(format!(
				"liquidity tournament vote {:?}",
				key
			)))
		}
	}

	async fn update_price(&self, record: &PriceRecord) -> Result<(), StorageError> {
		self.mutate(|s| {
			match s.prices.iter_mut().find(|p| {
				p.priced_asset == record.priced_asset && p.numeraire == record.numeraire
			}) {
				Some(existing) => *existing = record.clone(),
				None => s.prices.push(record.clone()),
			}
		})
		.await
	}

	async fn prices(&self) -> Result<Vec<PriceRecord>, StorageError> {
		Ok(self.read(|s| s.prices.clone()).await)
	}

	async fn bootstrap_applied(&self) -> Result<bool, StorageError> {
		Ok(self.read(|s| s.bootstrap_applied).await)
	}

	async fn mark_bootstrap_applied(&self) -> Result<(), StorageError> {
		self.mutate(|s| s.bootstrap_applied = true).await
	}
}
