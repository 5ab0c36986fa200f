//! Single-flight sync lifecycle.
//!
//! `ViewSyncService` owns at most one running sync task. Concurrent callers
//! of `sync()` attach to the task already in flight. The task retries failed
//! attempts forever with exponential backoff, rolling the scanner back to its
//! persisted checkpoint before each retry, and ends only when `stop()`
//! cancels it. A sync started after `stop()` waits for the stopped task to
//! finish its current block before it reads the checkpoint.

use backoff::ExponentialBackoffBuilder;
use backoff::backoff::Backoff;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::chain::AssetId;
use crate::sync::SyncError;

use super::processor::BlockProcessor;

type SyncHandle = Shared<BoxFuture<'static, Result<(), String>>>;

struct ActiveSync {
	handle: SyncHandle,
	cancel: CancellationToken,
}

#[derive(Default)]
struct SyncSlot {
	running: Option<ActiveSync>,
	/// A cancelled task that may still be finishing a block.
	stopping: Option<SyncHandle>,
}

pub struct ViewSyncService {
	processor: Arc<BlockProcessor>,
	slot: Mutex<SyncSlot>,
}

impl ViewSyncService {
	pub fn new(processor: BlockProcessor) -> Self {
		Self::from_shared(Arc::new(processor))
	}

	pub fn from_shared(processor: Arc<BlockProcessor>) -> Self {
		Self {
			processor,
			slot: Mutex::new(SyncSlot::default()),
		}
	}

	/// Attach to the running sync, or start one.
	///
	/// The attempt starts when this is called, not when the returned future
	/// is first polled. The future resolves once the sync is stopped, or with
	/// `SyncError::TaskFailed` if the task panicked.
	pub fn sync(&self) -> impl Future<Output = Result<(), SyncError>> + Send + use<> {
		let handle = self.attach_or_start();
		async move { handle.await.map_err(SyncError::TaskFailed) }
	}

	/// Cancel the running sync, if any. The next `sync()` starts afresh.
	pub fn stop(&self, reason: &str) {
		let mut slot = self
			.slot
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner());
		if let Some(active) = slot.running.take() {
			info!("Stopping sync: {}", reason);
			active.cancel.cancel();
			slot.stopping = Some(active.handle);
		}
	}

	/// Swap the pricing numeraires without interrupting a running sync.
	pub fn set_numeraires(&self, numeraires: Vec<AssetId>) {
		self.processor.set_numeraires(numeraires);
	}

	pub fn is_running(&self) -> bool {
		self.slot
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.running
			.as_ref()
			.is_some_and(|active| active.handle.peek().is_none())
	}

	fn attach_or_start(&self) -> SyncHandle {
		let mut slot = self
			.slot
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner());
		if let Some(running) = slot.running.as_ref() {
			if running.handle.peek().is_none() {
				return running.handle.clone();
			}
		}

		let previous = slot
			.stopping
			.take()
			.filter(|handle| handle.peek().is_none());
		let cancel = CancellationToken::new();
		let processor = self.processor.clone();
		let loop_cancel = cancel.clone();
		let task = tokio::spawn(async move {
			if let Some(previous) = previous {
				debug!("Waiting for the stopped sync to finish");
				if let Err(e) = previous.await {
					warn!("Stopped sync ended abnormally: {}", e);
				}
			}
			if loop_cancel.is_cancelled() {
				return;
			}
			run_sync_loop(processor, loop_cancel).await
		});
		let handle = async move { task.await.map_err(|e| e.to_string()) }
			.boxed()
			.shared();
		slot.running = Some(ActiveSync {
			handle: handle.clone(),
			cancel,
		});
		handle
	}
}

/// Retry sync attempts until cancelled.
async fn run_sync_loop(processor: Arc<BlockProcessor>, cancel: CancellationToken) {
	let retry = &processor.config().retry;
	let mut backoff = ExponentialBackoffBuilder::new()
		.with_initial_interval(retry.initial_interval)
		.with_max_interval(retry.max_interval)
		.with_multiplier(2.0)
		.with_randomization_factor(0.0)
		.with_max_elapsed_time(None)
		.build();

	loop {
		match processor.sync_and_store(&cancel).await {
			Ok(()) => {
				info!("Sync for wallet {} stopped", processor.config().wallet_id);
				return;
			}
			Err(e) if cancel.is_cancelled() => {
				info!("Sync cancelled during failed attempt: {}", e);
				return;
			}
			Err(e) => {
				warn!("Sync attempt failed: {}", e);
				if let Err(reset) = processor.reset_scanner().await {
					error!("Failed to reset scanner to checkpoint: {}", reset);
				}
				let delay = backoff.next_backoff().unwrap_or(retry.max_interval);
				warn!("Retrying sync in {:?}", delay);
				tokio::select! {
					_ = cancel.cancelled() => return,
					_ = tokio::time::sleep(delay) => {}
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::RetryConfig;
	use crate::storage::ViewStore;
	use crate::testing::{Harness, MockScanner, ScanGate, StreamTail, block};
	use std::sync::atomic::Ordering;
	use std::time::Duration;

	#[tokio::test]
	async fn concurrent_callers_share_one_attempt() {
		let harness = Harness::new();
		harness.resume_from(4).await;
		harness.querier.set_blocks(vec![block(5, 0), block(6, 0)]);
		let service = ViewSyncService::from_shared(harness.processor.clone());

		let first = service.sync();
		let second = service.sync();
		let (a, b) = tokio::join!(first, second);
		a.unwrap();
		b.unwrap();

		assert_eq!(harness.querier.stream_starts.lock().unwrap().len(), 1);
		assert_eq!(harness.store.full_sync_height().await.unwrap(), Some(6));

		// a finished attempt is not reused
		service.sync().await.unwrap();
		assert_eq!(
			harness.querier.stream_starts.lock().unwrap().as_slice(),
			&[5, 7]
		);
	}

	#[tokio::test]
	async fn stop_ends_an_open_stream() {
		let harness = Harness::new();
		harness.resume_from(0).await;
		harness.querier.set_stream_tail(StreamTail::HoldOpen);
		let service = ViewSyncService::from_shared(harness.processor.clone());

		let running = service.sync();
		tokio::time::sleep(Duration::from_millis(50)).await;
		assert!(service.is_running());
		assert_eq!(harness.querier.stream_starts.lock().unwrap().len(), 1);

		service.stop("test");
		running.await.unwrap();
		assert!(!service.is_running());
	}

	#[tokio::test(start_paused = true)]
	async fn failed_attempts_reset_the_scanner_and_retry() {
		let harness = Harness::with_config(|config| {
			config.with_retry(RetryConfig {
				initial_interval: Duration::from_secs(5),
				max_interval: Duration::from_secs(20),
			})
		});
		harness.resume_from(0).await;
		harness.querier.set_stream_tail(StreamTail::End);
		let service = ViewSyncService::from_shared(harness.processor.clone());

		let running = service.sync();
		// first attempt fails at once, the second after a 5s backoff
		tokio::time::sleep(Duration::from_secs(6)).await;
		service.stop("test");
		running.await.unwrap();

		assert_eq!(harness.scanner_stats.resets.load(Ordering::SeqCst), 2);
		assert_eq!(harness.querier.stream_starts.lock().unwrap().len(), 2);
	}

	#[tokio::test]
	async fn restart_waits_for_the_stopped_task() {
		let gate = ScanGate::at(5);
		let harness = Harness::with_scanner(MockScanner::default().with_gate(gate.clone()));
		harness.resume_from(4).await;
		harness.querier.set_blocks(vec![block(5, 0), block(6, 0)]);
		harness.querier.set_stream_tail(StreamTail::HoldOpen);
		let service = ViewSyncService::from_shared(harness.processor.clone());

		let first = service.sync();
		gate.entered.notified().await;
		service.stop("restart");
		let second = service.sync();

		// the first task is still inside block 5
		tokio::time::sleep(Duration::from_millis(50)).await;
		assert_eq!(harness.querier.stream_starts.lock().unwrap().as_slice(), &[5]);

		gate.release.notify_one();
		first.await.unwrap();
		tokio::time::sleep(Duration::from_millis(50)).await;
		assert!(service.is_running());

		service.stop("done");
		second.await.unwrap();

		assert_eq!(
			harness.querier.stream_starts.lock().unwrap().as_slice(),
			&[5, 6]
		);
		assert_eq!(
			harness.scanner_stats.scanned_heights.lock().unwrap().as_slice(),
			&[5, 6]
		);
		assert_eq!(harness.store.full_sync_height().await.unwrap(), Some(6));
	}
}
