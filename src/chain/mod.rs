//! Chain-side types and the remote query interface.
//!
//! This module holds everything the sync engine receives from the network:
//! compact blocks, decoded transactions and their actions, asset metadata,
//! validator, DEX and auction state, and the `ChainQuerier` trait through
//! which it is fetched.

/// Locally synthesized and registry asset metadata
pub mod asset;
pub mod auction;
/// Compact blocks and chain parameters
pub mod block;
pub mod dex;
/// Fixed-width identifiers
pub mod ids;
/// Remote node query interface
mod querier;
pub mod stake;
/// Transactions and actions
pub mod transaction;

pub use asset::Metadata;
pub use block::{AppParameters, CompactBlock, FrontierSnapshot, Height, StatePayload};
pub use ids::*;
pub use querier::{ChainQuerier, CompactBlockStream, QuerierError, ValidatorInfoStream};
pub use transaction::{Action, Address, AddressIndex, Transaction, Value};
