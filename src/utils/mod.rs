//!
//! Amount helpers shared by the indexers and log output.
/// Fixed-point amount formatting and ratios
pub mod amount;

pub use amount::{format_amount, ratio};
