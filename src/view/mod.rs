//! Wallet view: the records the wallet keeps about its own chain state, and
//! the scanner that discovers them.

pub mod records;
mod scanner;

pub use records::*;
pub use scanner::{AddressOwnership, ScanResult, ScannerError, SctUpdates, StoredHash, ViewScanner};
