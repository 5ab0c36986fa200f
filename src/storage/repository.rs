use async_trait::async_trait;

use crate::chain::block::{FmdParameters, GasPrices};
use crate::chain::stake::ValidatorInfo;
use crate::chain::{
	AddressIndex, AppParameters, AssetId, AuctionId, Height, Metadata, Nullifier, PositionId,
	StateCommitment, TransactionId,
};
use crate::chain::dex::{Position, PositionState};
use crate::view::{
	AuctionRecord, AuctionUpdate, Epoch, LqtVoteKey, LqtVoteRecord, PositionRecord, PriceRecord,
	ScanResult, SpendableNoteRecord, SwapRecord, TransactionRecord,
};

/// Error types for the durable store
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	JsonError(#[from] serde_json::Error),

	#[error("Record not found: {0}")]
	NotFound(String),
}

/// Durable wallet state.
///
/// Records are upserted by commitment or nullifier and never deleted; the
/// only destructive operations are the validator snapshot reset and dropping
/// an auction's outstanding reserves.
#[async_trait]
pub trait ViewStore: Send + Sync {
	/// Height of the last flushed block, `None` before genesis.
	async fn full_sync_height(&self) -> Result<Option<Height>, StorageError>;

	async fn save_full_sync_height(&self, height: Height) -> Result<(), StorageError>;

	/// Persist tree deltas, new notes and new swaps as one write. The
	/// checkpoint is left alone; replaying the same result is harmless.
	async fn save_scan_result(&self, result: &ScanResult) -> Result<(), StorageError>;

	/// The epoch containing `height`.
	async fn epoch_by_height(&self, height: Height) -> Result<Option<Epoch>, StorageError>;

	/// Record a new epoch starting at `start_height`. Adding an epoch that
	/// already exists returns the stored row.
	async fn add_epoch(&self, start_height: Height) -> Result<Epoch, StorageError>;

	/// Insert an epoch row with a known index, replacing any row with the
	/// same start height.
	async fn save_epoch(&self, epoch: &Epoch) -> Result<(), StorageError>;

	async fn note_by_nullifier(
		&self,
		nullifier: &Nullifier,
	) -> Result<Option<SpendableNoteRecord>, StorageError>;

	async fn note_by_commitment(
		&self,
		commitment: &StateCommitment,
	) -> Result<Option<SpendableNoteRecord>, StorageError>;

	async fn save_note(&self, note: &SpendableNoteRecord) -> Result<(), StorageError>;

	async fn swap_by_nullifier(&self, nullifier: &Nullifier)
	-> Result<Option<SwapRecord>, StorageError>;

	async fn save_swap(&self, swap: &SwapRecord) -> Result<(), StorageError>;

	async fn save_transaction(&self, record: &TransactionRecord) -> Result<(), StorageError>;

	async fn transaction(&self, id: &TransactionId)
	-> Result<Option<TransactionRecord>, StorageError>;

	async fn asset_metadata(&self, asset_id: &AssetId) -> Result<Option<Metadata>, StorageError>;

	async fn save_asset_metadata(&self, metadata: &Metadata) -> Result<(), StorageError>;

	async fn app_params(&self) -> Result<Option<AppParameters>, StorageError>;

	async fn save_app_params(&self, params: &AppParameters) -> Result<(), StorageError>;

	async fn save_fmd_params(&self, params: &FmdParameters) -> Result<(), StorageError>;

	/// Gas prices keyed by their asset id.
	async fn save_gas_prices(&self, prices: &GasPrices) -> Result<(), StorageError>;

	async fn gas_prices(&self, asset_id: &AssetId) -> Result<Option<GasPrices>, StorageError>;

	async fn clear_validator_infos(&self) -> Result<(), StorageError>;

	async fn upsert_validator_info(&self, info: &ValidatorInfo) -> Result<(), StorageError>;

	async fn validator_infos(&self) -> Result<Vec<ValidatorInfo>, StorageError>;

	async fn upsert_auction(
		&self,
		auction_id: &AuctionId,
		update: AuctionUpdate,
	) -> Result<(), StorageError>;

	async fn delete_auction_reserves(&self, auction_id: &AuctionId) -> Result<(), StorageError>;

	async fn auction(&self, auction_id: &AuctionId) -> Result<Option<AuctionRecord>, StorageError>;

	async fn auctions(&self) -> Result<Vec<AuctionRecord>, StorageError>;

	async fn add_position(
		&self,
		position_id: &PositionId,
		position: &Position,
		subaccount: Option<AddressIndex>,
	) -> Result<(), StorageError>;

	async fn update_position(
		&self,
		position_id: &PositionId,
		state: PositionState,
		subaccount: Option<AddressIndex>,
	) -> Result<(), StorageError>;

	async fn positions(&self) -> Result<Vec<PositionRecord>, StorageError>;

	async fn save_lqt_vote(&self, vote: &LqtVoteRecord) -> Result<(), StorageError>;

	/// Votes cast in `epoch_index` from `subaccount`.
	async fn lqt_votes(
		&self,
		epoch_index: u64,
		subaccount: Option<AddressIndex>,
	) -> Result<Vec<LqtVoteRecord>, StorageError>;

	async fn update_lqt_reward(&self, key: &LqtVoteKey, amount: u128) -> Result<(), StorageError>;

	/// Upsert the price of `record.priced_asset` in `record.numeraire`.
	async fn update_price(&self, record: &PriceRecord) -> Result<(), StorageError>;

	async fn prices(&self) -> Result<Vec<PriceRecord>, StorageError>;

	/// Whether a frontier snapshot has ever been applied to this wallet.
	async fn bootstrap_applied(&self) -> Result<bool, StorageError>;

	async fn mark_bootstrap_applied(&self) -> Result<(), StorageError>;
}
