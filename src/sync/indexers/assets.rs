//! Asset identification for newly flushed notes.

use futures::future::try_join_all;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::chain::asset::{
	auction_nft_metadata, delegation_metadata, lp_nft_metadata,
};
use crate::chain::dex::PositionState;
use crate::chain::{AssetId, ChainQuerier, Metadata};
use crate::storage::ViewStore;
use crate::sync::SyncError;

/// Make sure every asset in `asset_ids` has stored metadata.
///
/// Lookups run concurrently. Returns the number of assets that stayed
/// unidentified.
pub(crate) async fn identify_assets(
	store: &dyn ViewStore,
	querier: &dyn ChainQuerier,
	asset_ids: impl IntoIterator<Item = AssetId>,
) -> Result<usize, SyncError> {
	let unique: HashSet<AssetId> = asset_ids.into_iter().collect();
	let found = try_join_all(
		unique
			.into_iter()
			.map(|asset_id| identify_asset(store, querier, asset_id)),
	)
	.await?;
	Ok(found.iter().filter(|metadata| metadata.is_none()).count())
}

/// Stored metadata, else the chain registry, else a locally synthesized
/// denomination. Newly found metadata is persisted.
pub(crate) async fn identify_asset(
	store: &dyn ViewStore,
	querier: &dyn ChainQuerier,
	asset_id: AssetId,
) -> Result<Option<Metadata>, SyncError> {
	if let Some(metadata) = store.asset_metadata(&asset_id).await? {
		return Ok(Some(metadata));
	}

	let metadata = match querier.asset_metadata_by_id(&asset_id).await? {
		Some(metadata) => Some(metadata),
		None => synthesize(store, &asset_id).await?,
	};

	match &metadata {
		Some(metadata) => {
			debug!("Identified asset {} as {}", asset_id, metadata.base);
			store.save_asset_metadata(metadata).await?;
		}
		None => warn!("No metadata for asset {}", asset_id),
	}
	Ok(metadata)
}

/// Search the denominations derivable from locally known validators,
/// positions and auctions for one hashing to `asset_id`. Later sequence
/// numbers are tried first and the search stops at the first match.
async fn synthesize(
	store: &dyn ViewStore,
	asset_id: &AssetId,
) -> Result<Option<Metadata>, SyncError> {
	let validators = store.validator_infos().await?;
	let positions = store.positions().await?;
	let auctions = store.auctions().await?;

	let delegations = validators
		.iter()
		.map(|validator| delegation_metadata(&validator.identity_key));
	let lp_nfts = positions.iter().flat_map(|record| {
		let id = record.position_id;
		let last_sequence = match record.state {
			PositionState::Withdrawn { sequence } => sequence,
			_ => 0,
		};
		[PositionState::Opened, PositionState::Closed]
			.into_iter()
			.chain((0..=last_sequence).rev().map(|sequence| PositionState::Withdrawn { sequence }))
			.map(move |state| lp_nft_metadata(&id, &state))
	});
	let auction_nfts = auctions.iter().flat_map(|auction| {
		let id = auction.auction_id;
		(0..=auction.seq_num.saturating_add(1))
			.rev()
			.map(move |seq| auction_nft_metadata(&id, seq))
	});

	Ok(delegations
		.chain(lp_nfts)
		.chain(auction_nfts)
		.find(|candidate| candidate.asset_id == *asset_id))
}
