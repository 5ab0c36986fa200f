//! In-memory collaborators for tests.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::Poll;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::chain::auction::DutchAuction;
use crate::chain::block::SctParameters;
use crate::chain::stake::{RateData, ValidatorInfo, ValidatorState};
use crate::chain::{
	Address, AddressIndex, AppParameters, AssetId, AuctionId, ChainQuerier, CompactBlock,
	CompactBlockStream, FrontierSnapshot, Height, IdentityKey, Metadata, Nullifier, QuerierError,
	Root, StateCommitment, Transaction, ValidatorInfoStream, Value,
};
use crate::config::SyncConfig;
use crate::storage::{LocalStore, ViewStore};
use crate::sync::BlockProcessor;
use crate::view::{
	AddressOwnership, CommitmentSource, Note, ScanResult, ScannerError, SpendableNoteRecord,
	SwapPlaintext, SwapRecord, ViewScanner,
};
use crate::chain::dex::TradingPair;

pub(crate) const TEST_CHAIN_ID: &str = "test-chain";
pub(crate) const STAKING_ASSET: AssetId = AssetId([200; 32]);

pub(crate) fn init_logging() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

pub(crate) fn value(amount: u128, seed: u8) -> Value {
	Value {
		amount,
		asset_id: AssetId([seed; 32]),
	}
}

/// A blank-provenance note whose commitment, nullifier and asset derive
/// from `seed`.
pub(crate) fn note_record(seed: u8, account: u32) -> SpendableNoteRecord {
	SpendableNoteRecord {
		note_commitment: StateCommitment([seed; 32]),
		note: Note {
			value: value(100, seed),
			address: Address(format!("address-{}", seed)),
		},
		address_index: AddressIndex { account },
		nullifier: Nullifier([seed.wrapping_add(128); 32]),
		height_created: 1,
		height_spent: None,
		position: seed as u64,
		source: CommitmentSource::Blank,
	}
}

pub(crate) fn swap_record(seed: u8, account: u32) -> SwapRecord {
	SwapRecord {
		swap_commitment: StateCommitment([seed; 32]),
		swap: SwapPlaintext {
			trading_pair: TradingPair {
				asset_1: AssetId([1; 32]),
				asset_2: AssetId([2; 32]),
			},
			delta_1: 10,
			delta_2: 0,
			claim_address: Address(format!("address-{}", seed)),
		},
		address_index: AddressIndex { account },
		nullifier: Nullifier([seed.wrapping_add(128); 32]),
		position: seed as u64,
		height_claimed: None,
		output_data: None,
		source: CommitmentSource::Blank,
	}
}

pub(crate) fn block(height: Height, epoch_index: u64) -> CompactBlock {
	CompactBlock {
		height,
		epoch_index,
		..Default::default()
	}
}

pub(crate) fn validator(seed: u8, exchange_rate: u128) -> ValidatorInfo {
	ValidatorInfo {
		identity_key: IdentityKey([seed; 32]),
		name: format!("validator-{}", seed),
		state: ValidatorState::Active,
		rate_data: RateData {
			epoch_index: 0,
			validator_exchange_rate: exchange_rate,
		},
	}
}

/// What the mock block stream does after its last block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum StreamTail {
	/// Cancel the attempt's token, then end.
	#[default]
	CancelAtEnd,
	/// Stay open until cancelled.
	HoldOpen,
	/// End without cancelling.
	End,
}

#[derive(Default)]
pub(crate) struct MockQuerier {
	blocks: Mutex<Vec<CompactBlock>>,
	latest_height: Mutex<Height>,
	transactions: Mutex<HashMap<Height, Vec<Transaction>>>,
	app_params: Mutex<Option<AppParameters>>,
	assets: Mutex<HashMap<AssetId, Metadata>>,
	validators: Mutex<Vec<ValidatorInfo>>,
	auctions: Mutex<HashMap<AuctionId, DutchAuction>>,
	snapshot: Mutex<Option<FrontierSnapshot>>,
	tail: Mutex<StreamTail>,
	failing_transaction_queries: AtomicUsize,
	remote_root: Mutex<Root>,
	root_unavailable: AtomicBool,
	pub stream_starts: Mutex<Vec<Height>>,
	pub transaction_queries: AtomicUsize,
	pub root_queries: AtomicUsize,
}

impl MockQuerier {
	pub fn set_blocks(&self, blocks: Vec<CompactBlock>) {
		*self.blocks.lock().unwrap() = blocks;
	}

	pub fn set_latest_height(&self, height: Height) {
		*self.latest_height.lock().unwrap() = height;
	}

	pub fn add_transactions(&self, height: Height, transactions: Vec<Transaction>) {
		self.transactions
			.lock()
			.unwrap()
			.insert(height, transactions);
	}

	pub fn set_app_params(&self, params: AppParameters) {
		*self.app_params.lock().unwrap() = Some(params);
	}

	pub fn add_asset(&self, metadata: Metadata) {
		self.assets
			.lock()
			.unwrap()
			.insert(metadata.asset_id, metadata);
	}

	pub fn set_validators(&self, validators: Vec<ValidatorInfo>) {
		*self.validators.lock().unwrap() = validators;
	}

	pub fn add_auction(&self, auction: DutchAuction) {
		self.auctions
			.lock()
			.unwrap()
			.insert(auction.description.id(), auction);
	}

	pub fn set_snapshot(&self, snapshot: FrontierSnapshot) {
		*self.snapshot.lock().unwrap() = Some(snapshot);
	}

	pub fn set_stream_tail(&self, tail: StreamTail) {
		*self.tail.lock().unwrap() = tail;
	}

	/// Make the next `count` transaction queries fail with a transport error.
	pub fn fail_transaction_queries(&self, count: usize) {
		self.failing_transaction_queries
			.store(count, Ordering::SeqCst);
	}

	pub fn set_remote_root(&self, root: Root) {
		*self.remote_root.lock().unwrap() = root;
	}

	pub fn set_root_unavailable(&self, unavailable: bool) {
		self.root_unavailable.store(unavailable, Ordering::SeqCst);
	}
}

pub(crate) fn app_params(epoch_duration: u64) -> AppParameters {
	AppParameters {
		chain_id: TEST_CHAIN_ID.to_string(),
		sct_params: SctParameters { epoch_duration },
	}
}

#[async_trait]
impl ChainQuerier for MockQuerier {
	async fn compact_block_range(
		&self,
		start_height: Height,
		cancel: CancellationToken,
	) -> Result<CompactBlockStream, QuerierError> {
		self.stream_starts.lock().unwrap().push(start_height);
		let blocks: Vec<CompactBlock> = self
			.blocks
			.lock()
			.unwrap()
			.iter()
			.filter(|block| block.height >= start_height)
			.cloned()
			.collect();

		let tail: CompactBlockStream = match *self.tail.lock().unwrap() {
			StreamTail::CancelAtEnd => stream::poll_fn(move |_| {
				cancel.cancel();
				Poll::Ready(None)
			})
			.boxed(),
			StreamTail::HoldOpen => stream::pending().boxed(),
			StreamTail::End => stream::empty().boxed(),
		};
		Ok(stream::iter(blocks.into_iter().map(Ok::<_, QuerierError>))
			.chain(tail)
			.boxed())
	}

	async fn latest_block_height(&self) -> Result<Option<Height>, QuerierError> {
		Ok(Some(*self.latest_height.lock().unwrap()))
	}

	async fn transactions_by_height(
		&self,
		height: Height,
	) -> Result<Vec<Transaction>, QuerierError> {
		self.transaction_queries.fetch_add(1, Ordering::SeqCst);
		let failing = self.failing_transaction_queries.fetch_update(
			Ordering::SeqCst,
			Ordering::SeqCst,
			|remaining| remaining.checked_sub(1),
		);
		if failing.is_ok() {
			return Err(QuerierError::Transport(format!(
				"transactions at height {} unavailable",
				height
			)));
		}
		Ok(self
			.transactions
			.lock()
			.unwrap()
			.get(&height)
			.cloned()
			.unwrap_or_default())
	}

	async fn app_params(&self) -> Result<AppParameters, QuerierError> {
		Ok(self
			.app_params
			.lock()
			.unwrap()
			.clone()
			.unwrap_or_else(|| app_params(100)))
	}

	async fn asset_metadata_by_id(
		&self,
		asset_id: &AssetId,
	) -> Result<Option<Metadata>, QuerierError> {
		Ok(self.assets.lock().unwrap().get(asset_id).cloned())
	}

	async fn all_validator_infos(&self) -> Result<ValidatorInfoStream, QuerierError> {
		let validators = self.validators.lock().unwrap().clone();
		Ok(stream::iter(validators.into_iter().map(Ok)).boxed())
	}

	async fn auction_state_by_id(
		&self,
		auction_id: &AuctionId,
	) -> Result<Option<DutchAuction>, QuerierError> {
		Ok(self.auctions.lock().unwrap().get(auction_id).cloned())
	}

	async fn frontier_snapshot(&self) -> Result<FrontierSnapshot, QuerierError> {
		self.snapshot
			.lock()
			.unwrap()
			.clone()
			.ok_or_else(|| QuerierError::NoData("frontier snapshot".to_string()))
	}

	async fn remote_root_at(&self, height: Height) -> Result<Root, QuerierError> {
		self.root_queries.fetch_add(1, Ordering::SeqCst);
		if self.root_unavailable.load(Ordering::SeqCst) {
			return Err(QuerierError::NoData(format!("root at height {}", height)));
		}
		Ok(*self.remote_root.lock().unwrap())
	}
}

#[derive(Debug, Default)]
pub(crate) struct ScannerStats {
	pub block_scans: AtomicUsize,
	pub skipped_trial_decrypts: AtomicUsize,
	pub genesis_chunks: AtomicUsize,
	pub finalized: AtomicUsize,
	pub flushes: AtomicUsize,
	pub resets: AtomicUsize,
	pub frontiers: AtomicUsize,
	pub scanned_heights: Mutex<Vec<Height>>,
}

/// Holds the first scan of `height` until released.
#[derive(Debug, Default)]
pub(crate) struct ScanGate {
	pub height: Height,
	pub entered: Notify,
	pub release: Notify,
	passed: AtomicBool,
}

impl ScanGate {
	pub fn at(height: Height) -> Arc<Self> {
		Arc::new(Self {
			height,
			..Default::default()
		})
	}
}

/// Scanner that "discovers" preset notes and swaps at preset heights.
#[derive(Default)]
pub(crate) struct MockScanner {
	notes: HashMap<Height, Vec<SpendableNoteRecord>>,
	swaps: HashMap<Height, Vec<SwapRecord>>,
	addresses: HashMap<Address, AddressIndex>,
	flush_every_block: bool,
	gate: Option<Arc<ScanGate>>,
	pending: ScanResult,
	pub stats: Arc<ScannerStats>,
}

impl MockScanner {
	pub fn with_address(mut self, address: &str, account: u32) -> Self {
		self.addresses
			.insert(Address::from(address), AddressIndex { account });
		self
	}

	pub fn with_note(mut self, height: Height, note: SpendableNoteRecord) -> Self {
		self.notes.entry(height).or_default().push(note);
		self
	}

	pub fn with_swap(mut self, height: Height, swap: SwapRecord) -> Self {
		self.swaps.entry(height).or_default().push(swap);
		self
	}

	pub fn flushing_every_block(mut self) -> Self {
		self.flush_every_block = true;
		self
	}

	pub fn with_gate(mut self, gate: Arc<ScanGate>) -> Self {
		self.gate = Some(gate);
		self
	}

	fn discover(&mut self, height: Height) {
		if let Some(notes) = self.notes.get(&height) {
			self.pending.new_notes.extend(notes.iter().cloned());
		}
		if let Some(swaps) = self.swaps.get(&height) {
			self.pending.new_swaps.extend(swaps.iter().cloned());
		}
		self.pending.height = height;
	}
}

impl AddressOwnership for MockScanner {
	fn is_controlled_address(&self, address: &Address) -> bool {
		self.addresses.contains_key(address)
	}

	fn index_for_address(&self, address: &Address) -> Option<AddressIndex> {
		self.addresses.get(address).copied()
	}
}

#[async_trait]
impl ViewScanner for MockScanner {
	async fn scan_block(
		&mut self,
		block: &CompactBlock,
		skip_trial_decrypt: bool,
	) -> Result<bool, ScannerError> {
		self.stats.block_scans.fetch_add(1, Ordering::SeqCst);
		self.stats
			.scanned_heights
			.lock()
			.unwrap()
			.push(block.height);
		if let Some(gate) = &self.gate {
			if gate.height == block.height && !gate.passed.swap(true, Ordering::SeqCst) {
				gate.entered.notify_one();
				gate.release.notified().await;
			}
		}
		if skip_trial_decrypt {
			self.stats
				.skipped_trial_decrypts
				.fetch_add(1, Ordering::SeqCst);
		} else {
			self.discover(block.height);
		}
		Ok(self.flush_every_block)
	}

	async fn scan_genesis_chunk(
		&mut self,
		_offset: u64,
		_chunk: &CompactBlock,
		_skip_trial_decrypt: bool,
	) -> Result<(), ScannerError> {
		self.stats.genesis_chunks.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}

	async fn finalize_genesis(&mut self, block: &CompactBlock) -> Result<(), ScannerError> {
		self.stats.finalized.fetch_add(1, Ordering::SeqCst);
		self.discover(block.height);
		Ok(())
	}

	fn flush_updates(&mut self) -> ScanResult {
		self.stats.flushes.fetch_add(1, Ordering::SeqCst);
		std::mem::take(&mut self.pending)
	}

	fn current_root(&self) -> Root {
		Root::default()
	}

	async fn load_frontier(&mut self, _snapshot: &FrontierSnapshot) -> Result<(), ScannerError> {
		self.stats.frontiers.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}

	async fn reset_to_checkpoint(&mut self) -> Result<(), ScannerError> {
		self.stats.resets.fetch_add(1, Ordering::SeqCst);
		self.pending = ScanResult::default();
		Ok(())
	}
}

/// A processor wired to mocks and an in-memory store.
pub(crate) struct Harness {
	pub querier: Arc<MockQuerier>,
	pub store: Arc<LocalStore>,
	pub scanner_stats: Arc<ScannerStats>,
	pub processor: Arc<BlockProcessor>,
}

impl Harness {
	pub fn new() -> Self {
		Self::build(MockScanner::default(), |config| config)
	}

	pub fn with_config(configure: impl FnOnce(SyncConfig) -> SyncConfig) -> Self {
		Self::build(MockScanner::default(), configure)
	}

	pub fn with_scanner(scanner: MockScanner) -> Self {
		Self::build(scanner, |config| config)
	}

	pub fn build(
		scanner: MockScanner,
		configure: impl FnOnce(SyncConfig) -> SyncConfig,
	) -> Self {
		init_logging();
		let querier = Arc::new(MockQuerier::default());
		let store = Arc::new(LocalStore::in_memory());
		let scanner_stats = scanner.stats.clone();
		let config = configure(SyncConfig::new(TEST_CHAIN_ID, "test-wallet", STAKING_ASSET));
		let processor = Arc::new(BlockProcessor::new(
			querier.clone(),
			Box::new(scanner),
			store.clone() as Arc<dyn ViewStore>,
			config,
		));
		Self {
			querier,
			store,
			scanner_stats,
			processor,
		}
	}

	/// Persist a checkpoint with epoch 0 starting at height 0.
	pub async fn resume_from(&self, checkpoint: Height) {
		self.store.add_epoch(0).await.unwrap();
		self.store.save_full_sync_height(checkpoint).await.unwrap();
	}
}
