//! Transaction relevance identification.
//!
//! Given the records a block touched (spent by nullifier, or newly created by
//! commitment) and the block's full transactions, decide which transactions
//! concern the wallet and recover provenance for records that were flushed
//! without it. Every transaction is checked independently on the rayon pool.

use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::chain::transaction::IbcRelay;
use crate::chain::{Address, AddressIndex, Nullifier, StateCommitment, Transaction, TransactionId};
use crate::view::{AddressOwnership, CommitmentSource, ScanRecord};

/// A transaction that touches the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevantTransaction {
	pub id: TransactionId,
	pub transaction: Transaction,
	pub subaccount: Option<AddressIndex>,
}

#[derive(Debug, Default)]
pub struct Identified {
	pub relevant: Vec<RelevantTransaction>,
	/// Clones of blank-provenance records, tagged with their transaction.
	pub recovered: Vec<ScanRecord>,
}

/// Find the transactions relevant to the wallet.
///
/// # Arguments
/// * `spent` - Records whose nullifier was revealed in the block.
/// * `created` - Records newly flushed for the block, by commitment.
/// * `transactions` - The block's decoded transactions.
/// * `ownership` - Address ownership test for IBC relay payloads.
///
/// The input maps are never modified; recovered records are clones.
pub fn identify_transactions<A>(
	spent: &HashMap<Nullifier, ScanRecord>,
	created: &HashMap<StateCommitment, ScanRecord>,
	transactions: Vec<Transaction>,
	ownership: &A,
) -> Identified
where
	A: AddressOwnership + ?Sized,
{
	let per_transaction: Vec<(RelevantTransaction, Vec<ScanRecord>)> = transactions
		.into_par_iter()
		.filter_map(|transaction| check_transaction(transaction, spent, created, ownership))
		.collect();

	let mut identified = Identified::default();
	let mut seen = HashSet::new();
	for (relevant, recovered) in per_transaction {
		identified.recovered.extend(
			recovered
				.into_iter()
				.filter(|record| seen.insert(record.commitment())),
		);
		identified.relevant.push(relevant);
	}
	identified
}

fn check_transaction<A>(
	transaction: Transaction,
	spent: &HashMap<Nullifier, ScanRecord>,
	created: &HashMap<StateCommitment, ScanRecord>,
	ownership: &A,
) -> Option<(RelevantTransaction, Vec<ScanRecord>)>
where
	A: AddressOwnership + ?Sized,
{
	let matched: Vec<&ScanRecord> = transaction
		.nullifiers()
		.filter_map(|nullifier| spent.get(nullifier))
		.chain(
			transaction
				.commitments()
				.filter_map(|commitment| created.get(commitment)),
		)
		.collect();

	let relay_addresses: Vec<Address> = transaction
		.ibc_relays()
		.filter_map(inbound_address)
		.filter(|address| ownership.is_controlled_address(address))
		.collect();

	if matched.is_empty() && relay_addresses.is_empty() {
		return None;
	}

	// hashing is deferred until the transaction is known to be relevant
	let id = transaction.id();
	let subaccount = matched
		.first()
		.map(|record| record.address_index())
		.or_else(|| {
			relay_addresses
				.iter()
				.find_map(|address| ownership.index_for_address(address))
		});

	let recovered = matched
		.iter()
		.filter(|record| record.source().is_blank())
		.map(|record| record.with_source(CommitmentSource::Transaction { id }))
		.collect();

	let relevant = RelevantTransaction {
		id,
		transaction,
		subaccount,
	};
	Some((relevant, recovered))
}

/// The wallet-side address of an inbound or refunded ICS-20 transfer:
/// the receiver of a received packet, the sender of an acknowledged or
/// timed-out one. Unparseable payloads name nobody.
fn inbound_address(relay: &IbcRelay) -> Option<Address> {
	let (packet, receiving) = match relay {
		IbcRelay::RecvPacket(packet) => (packet, true),
		IbcRelay::Acknowledgement(packet) | IbcRelay::Timeout(packet) => (packet, false),
		IbcRelay::Other { .. } => return None,
	};
	let data = packet.token_data().ok()?;
	Some(Address(if receiving { data.receiver } else { data.sender }))
}
