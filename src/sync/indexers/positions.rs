//! LP position lifecycle.

use tracing::debug;

use crate::chain::asset::lp_nft_metadata;
use crate::chain::dex::PositionState;
use crate::chain::{Action, AddressIndex, PositionId};
use crate::storage::ViewStore;
use crate::sync::SyncError;

/// Apply a position open, close or withdrawal. Other actions are ignored.
pub(crate) async fn apply_position_action(
	store: &dyn ViewStore,
	action: &Action,
	subaccount: Option<AddressIndex>,
) -> Result<(), SyncError> {
	match action {
		Action::PositionOpen { position } => {
			let position_id = position.id();
			debug!("Position {} opened", position_id);
			store
				.add_position(&position_id, position, subaccount)
				.await?;
			for state in [
				PositionState::Opened,
				PositionState::Closed,
				PositionState::Withdrawn { sequence: 0 },
			] {
				save_nft_metadata(store, &position_id, &state).await?;
			}
		}
		Action::PositionClose { position_id } => {
			store
				.update_position(position_id, PositionState::Closed, subaccount)
				.await?;
		}
		Action::PositionWithdraw {
			position_id,
			sequence,
		} => {
			let state = PositionState::Withdrawn {
				sequence: *sequence,
			};
			store
				.update_position(position_id, state, subaccount)
				.await?;
			save_nft_metadata(store, position_id, &state).await?;
		}
		_ => {}
	}
	Ok(())
}

async fn save_nft_metadata(
	store: &dyn ViewStore,
	position_id: &PositionId,
	state: &PositionState,
) -> Result<(), SyncError> {
	store
		.save_asset_metadata(&lp_nft_metadata(position_id, state))
		.await?;
	Ok(())
}
