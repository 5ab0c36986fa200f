//! Host-supplied configuration for the sync engine.

use std::time::Duration;

use crate::chain::{AssetId, CompactBlock, Height};

/// Default number of blocks between forced flushes during historical replay.
pub const DEFAULT_FLUSH_INTERVAL: u64 = 5000;

/// Default number of genesis payloads scanned per unit of work.
pub const DEFAULT_GENESIS_CHUNK_SIZE: usize = 500;

/// Default distance from the tip within which swap outputs update prices.
pub const DEFAULT_PRICE_RELEVANCE_THRESHOLD: u64 = 200;

/// Backoff applied between failed sync attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
	pub initial_interval: Duration,
	pub max_interval: Duration,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			initial_interval: Duration::from_secs(5),
			max_interval: Duration::from_secs(20),
		}
	}
}

/// Genesis block embedded by the host, used only when syncing `chain_id`.
#[derive(Debug, Clone)]
pub struct GenesisBlock {
	pub chain_id: String,
	pub block: CompactBlock,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
	pub chain_id: String,
	/// Identifies the wallet in logs.
	pub wallet_id: String,
	pub staking_asset_id: AssetId,
	/// Reference assets prices are quoted in.
	pub numeraires: Vec<AssetId>,
	pub genesis: Option<GenesisBlock>,
	/// Blocks below this height cannot hold wallet notes and skip trial
	/// decryption.
	pub wallet_creation_height: Option<Height>,
	/// Height of a precomputed frontier a fresh wallet may start from.
	pub bootstrap_snapshot_height: Option<Height>,
	pub flush_interval: u64,
	pub genesis_chunk_size: usize,
	pub price_relevance_threshold: u64,
	/// Compare the local commitment-tree root with the node's after every
	/// block.
	pub assert_root_valid: bool,
	pub retry: RetryConfig,
}

impl SyncConfig {
	pub fn new(
		chain_id: impl Into<String>,
		wallet_id: impl Into<String>,
		staking_asset_id: AssetId,
	) -> Self {
		Self {
			chain_id: chain_id.into(),
			wallet_id: wallet_id.into(),
			staking_asset_id,
			numeraires: Vec::new(),
			genesis: None,
			wallet_creation_height: None,
			bootstrap_snapshot_height: None,
			flush_interval: DEFAULT_FLUSH_INTERVAL,
			genesis_chunk_size: DEFAULT_GENESIS_CHUNK_SIZE,
			price_relevance_threshold: DEFAULT_PRICE_RELEVANCE_THRESHOLD,
			assert_root_valid: false,
			retry: RetryConfig::default(),
		}
	}

	pub fn with_numeraires(mut self, numeraires: Vec<AssetId>) -> Self {
		self.numeraires = numeraires;
		self
	}

	pub fn with_genesis(mut self, genesis: GenesisBlock) -> Self {
		self.genesis = Some(genesis);
		self
	}

	pub fn with_wallet_creation_height(mut self, height: Height) -> Self {
		self.wallet_creation_height = Some(height);
		self
	}

	pub fn with_bootstrap_snapshot_height(mut self, height: Height) -> Self {
		self.bootstrap_snapshot_height = Some(height);
		self
	}

	pub fn with_flush_interval(mut self, interval: u64) -> Self {
		self.flush_interval = interval.max(1);
		self
	}

	pub fn with_genesis_chunk_size(mut self, size: usize) -> Self {
		self.genesis_chunk_size = size.max(1);
		self
	}

	pub fn with_price_relevance_threshold(mut self, threshold: u64) -> Self {
		self.price_relevance_threshold = threshold;
		self
	}

	pub fn with_root_assertions(mut self, enabled: bool) -> Self {
		self.assert_root_valid = enabled;
		self
	}

	pub fn with_retry(mut self, retry: RetryConfig) -> Self {
		self.retry = retry;
		self
	}

	/// Whether trial decryption can be skipped at `height`.
	pub fn predates_wallet(&self, height: Height) -> bool {
		self.wallet_creation_height
			.is_some_and(|created| height < created)
	}

	/// The embedded genesis block, if it belongs to the configured chain.
	pub fn genesis_block(&self) -> Option<&CompactBlock> {
		self.genesis
			.as_ref()
			.filter(|genesis| genesis.chain_id == self.chain_id)
			.map(|genesis| &genesis.block)
	}
}
