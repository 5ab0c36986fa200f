//! Dutch auction lifecycle.

use tracing::debug;

use crate::chain::asset::{auction_nft_metadata, parse_auction_nft};
use crate::chain::{Action, AuctionId, ChainQuerier, Value};
use crate::storage::ViewStore;
use crate::sync::SyncError;
use crate::view::{AuctionReserves, AuctionUpdate, SpendableNoteRecord};

/// Apply an auction schedule, end or withdrawal. Other actions are ignored.
pub(crate) async fn apply_auction_action(
	store: &dyn ViewStore,
	querier: &dyn ChainQuerier,
	action: &Action,
) -> Result<(), SyncError> {
	match action {
		Action::DutchAuctionSchedule { description } => {
			let auction_id = description.id();
			debug!("Auction {} scheduled", auction_id);
			store
				.upsert_auction(
					&auction_id,
					AuctionUpdate {
						seq_num: Some(0),
						description: Some(description.clone()),
						..Default::default()
					},
				)
				.await?;
			save_nft_metadata(store, &auction_id, 0).await?;
		}
		Action::DutchAuctionEnd { auction_id } => {
			let auction = querier
				.auction_state_by_id(auction_id)
				.await?
				.ok_or_else(|| SyncError::MissingField(format!("state of auction {}", auction_id)))?;
			let reserves = AuctionReserves {
				input: Value {
					amount: auction.state.input_reserves,
					asset_id: auction.description.input.asset_id,
				},
				output: Value {
					amount: auction.state.output_reserves,
					asset_id: auction.description.output_id,
				},
			};
			store
				.upsert_auction(
					auction_id,
					AuctionUpdate {
						seq_num: Some(1),
						outstanding_reserves: Some(reserves),
						..Default::default()
					},
				)
				.await?;
			save_nft_metadata(store, auction_id, 1).await?;
		}
		Action::DutchAuctionWithdraw { auction_id, seq } => {
			store
				.upsert_auction(
					auction_id,
					AuctionUpdate {
						seq_num: Some(*seq),
						..Default::default()
					},
				)
				.await?;
			store.delete_auction_reserves(auction_id).await?;
			save_nft_metadata(store, auction_id, *seq).await?;
		}
		_ => {}
	}
	Ok(())
}

/// Link auction NFT notes to their auction. Returns how many were linked.
pub(crate) async fn associate_auction_notes(
	store: &dyn ViewStore,
	notes: &[SpendableNoteRecord],
) -> Result<usize, SyncError> {
	let mut linked = 0;
	for note in notes {
		let Some(metadata) = store.asset_metadata(&note.note.value.asset_id).await? else {
			continue;
		};
		let Some((_, auction_id)) = parse_auction_nft(&metadata.base) else {
			continue;
		};
		store
			.upsert_auction(
				&auction_id,
				AuctionUpdate {
					note_commitment: Some(note.note_commitment),
					..Default::default()
				},
			)
			.await?;
		linked += 1;
	}
	Ok(linked)
}

async fn save_nft_metadata(
	store: &dyn ViewStore,
	auction_id: &AuctionId,
	seq: u64,
) -> Result<(), SyncError> {
	store
		.save_asset_metadata(&auction_nft_metadata(auction_id, seq))
		.await?;
	Ok(())
}
