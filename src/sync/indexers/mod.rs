//! Derived-state indexers.
//!
//! Each indexer turns relevant transactions or block data into auxiliary
//! wallet state: asset metadata, auction and LP position lifecycles,
//! liquidity tournament votes and rewards, and spot prices.

pub(crate) mod assets;
pub(crate) mod auctions;
pub(crate) mod positions;
pub(crate) mod prices;
pub(crate) mod tournament;
