//!
//! Query interface to a remote full node.
//!
//! The view layer never talks to the network directly. It goes through a
//! `ChainQuerier`, which supplies the live compact block stream and the
//! handful of point queries needed while processing blocks. Transport,
//! authentication and retries at the connection level belong to the
//! implementation.

use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

use super::auction::DutchAuction;
use super::block::{AppParameters, CompactBlock, FrontierSnapshot, Height};
use super::ids::{AssetId, AuctionId, Root};
use super::asset::Metadata;
use super::stake::ValidatorInfo;
use super::transaction::Transaction;

/// Live stream of compact blocks.
pub type CompactBlockStream =
	Pin<Box<dyn Stream<Item = Result<CompactBlock, QuerierError>> + Send>>;

/// Stream of the full validator set.
pub type ValidatorInfoStream =
	Pin<Box<dyn Stream<Item = Result<ValidatorInfo, QuerierError>> + Send>>;

/// Error types for chain queries
#[derive(Debug, thiserror::Error)]
pub enum QuerierError {
	#[error("Transport error: {0}")]
	Transport(String),

	#[error("Decode error: {0}")]
	Decode(String),

	#[error("Node returned no data: {0}")]
	NoData(String),

	#[error("JSON parse error: {0}")]
	JsonError(#[from] serde_json::Error),
}

/// Remote chain access used by the sync engine.
#[async_trait]
pub trait ChainQuerier: Send + Sync {
	/// Subscribe to compact blocks starting at `start_height`.
	///
	/// # Arguments
	/// * `start_height` - First height the stream yields.
	/// * `cancel` - Ends the stream when cancelled.
	///
	/// # Returns
	/// A pinned stream that stays open at the chain tip and keeps yielding
	/// blocks as they are produced.
	async fn compact_block_range(
		&self,
		start_height: Height,
		cancel: CancellationToken,
	) -> Result<CompactBlockStream, QuerierError>;

	/// Latest block height known to the node, if it reports one.
	async fn latest_block_height(&self) -> Result<Option<Height>, QuerierError>;

	/// All transactions committed at `height`, decoded.
	async fn transactions_by_height(&self, height: Height)
	-> Result<Vec<Transaction>, QuerierError>;

	async fn app_params(&self) -> Result<AppParameters, QuerierError>;

	/// Registry metadata for `asset_id`. Locally synthesized kinds are never
	/// found here.
	async fn asset_metadata_by_id(
		&self,
		asset_id: &AssetId,
	) -> Result<Option<Metadata>, QuerierError>;

	async fn all_validator_infos(&self) -> Result<ValidatorInfoStream, QuerierError>;

	async fn auction_state_by_id(
		&self,
		auction_id: &AuctionId,
	) -> Result<Option<DutchAuction>, QuerierError>;

	/// Current commitment-tree frontier, for bootstrapping fresh wallets.
	async fn frontier_snapshot(&self) -> Result<FrontierSnapshot, QuerierError>;

	/// Commitment-tree root at `height`. Only used by debug assertions.
	async fn remote_root_at(&self, height: Height) -> Result<Root, QuerierError>;
}
