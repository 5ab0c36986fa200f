//! Liquidity tournament votes and rewards.

use std::collections::BTreeMap;
use tracing::debug;

use crate::chain::{Action, AddressIndex, AssetId, Transaction, TransactionId, Value};
use crate::storage::ViewStore;
use crate::sync::SyncError;
use crate::view::{CommitmentSource, LqtVoteRecord, SpendableNoteRecord};

/// Sum a transaction's votes per (incentivized asset, delegation asset).
///
/// Votes are only summed within one transaction, never across.
pub(crate) fn aggregate_votes(
	transaction: &Transaction,
	transaction_id: TransactionId,
	epoch_index: u64,
	subaccount: Option<AddressIndex>,
) -> Vec<LqtVoteRecord> {
	let mut totals: BTreeMap<(AssetId, AssetId), u128> = BTreeMap::new();
	for action in &transaction.actions {
		if let Action::LiquidityTournamentVote {
			incentivized,
			value,
			..
		} = action
		{
			*totals.entry((*incentivized, value.asset_id)).or_default() += value.amount;
		}
	}

	totals
		.into_iter()
		.map(|((incentivized_asset, delegation_asset), amount)| LqtVoteRecord {
			incentivized_asset,
			epoch_index,
			transaction_id,
			vote_value: Value {
				amount,
				asset_id: delegation_asset,
			},
			reward_amount: None,
			subaccount,
		})
		.collect()
}

/// Write each tournament reward note's amount onto the epoch's vote rows
/// that voted with the rewarded asset from the same subaccount.
///
/// The full amount goes to every matching row. Returns the number of rows
/// updated.
pub(crate) async fn backfill_rewards(
	store: &dyn ViewStore,
	notes: &[SpendableNoteRecord],
	epoch_index: u64,
) -> Result<usize, SyncError> {
	let mut updated = 0;
	for note in notes {
		if !matches!(note.source, CommitmentSource::LiquidityTournamentReward { .. }) {
			continue;
		}
		let votes = store
			.lqt_votes(epoch_index, Some(note.address_index))
			.await?;
		for vote in votes
			.iter()
			.filter(|vote| vote.vote_value.asset_id == note.note.value.asset_id)
		{
			store
				.update_lqt_reward(&vote.key(), note.note.value.amount)
				.await?;
			updated += 1;
		}
	}
	if updated > 0 {
		debug!("Backfilled {} tournament rewards in epoch {}", updated, epoch_index);
	}
	Ok(updated)
}
