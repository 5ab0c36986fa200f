//! Progress tracking for a sync attempt.
//!
//! Counts processed blocks, flushes and relevant transactions, and logs
//! progress every 1000 blocks so long historical replays stay observable.

use std::time::Instant;
use tracing::info;

use crate::chain::Height;

const LOG_INTERVAL: u64 = 1000;

/// Service for tracking synchronization progress
#[derive(Debug, Clone)]
pub struct SyncProgressTracker {
    /// First height this attempt asked the stream for
    start_height: Height,
    /// The highest block height we've processed
    highest_processed: Option<Height>,
    blocks_processed: u64,
    flushes: u64,
    relevant_transactions: usize,
    /// Last height at which we logged progress
    last_logged: Height,
    started_at: Instant,
}

impl SyncProgressTracker {
    pub fn new(start_height: Height) -> Self {
        Self {
            start_height,
            highest_processed: None,
            blocks_processed: 0,
            flushes: 0,
            relevant_transactions: 0,
            last_logged: start_height,
            started_at: Instant::now(),
        }
    }

    /// Record one processed block.
    pub fn record_block(&mut self, height: Height, flushed: bool, relevant_transactions: usize) {
        self.highest_processed = Some(self.highest_processed.map_or(height, |h| h.max(height)));
        self.blocks_processed += 1;
        if flushed {
            self.flushes += 1;
        }
        self.relevant_transactions += relevant_transactions;
    }

    /// Log progress every 1000 blocks, or when forced
    pub fn log_progress(&mut self, latest_known: Height, force: bool) {
        let Some(highest) = self.highest_processed else {
            return;
        };
        if force || highest.saturating_sub(self.last_logged) >= LOG_INTERVAL {
            info!(
                "Sync progress: height {} of {}, {} blocks, {} flushes, {} relevant transactions",
                highest,
                latest_known,
                self.blocks_processed,
                self.flushes,
                self.relevant_transactions
            );
            self.last_logged = highest;
        }
    }

    pub fn get_stats(&self) -> SyncStats {
        SyncStats {
            start_height: self.start_height,
            highest_processed: self.highest_processed,
            blocks_processed: self.blocks_processed,
            flushes: self.flushes,
            relevant_transactions: self.relevant_transactions,
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

/// Statistics about one sync attempt
#[derive(Debug, Clone)]
pub struct SyncStats {
    pub start_height: Height,
    pub highest_processed: Option<Height>,
    pub blocks_processed: u64,
    pub flushes: u64,
    pub relevant_transactions: usize,
    pub elapsed_secs: f64,
}

impl SyncStats {
    /// Get a human-readable summary of the sync statistics
    pub fn summary(&self) -> String {
        match self.highest_processed {
            Some(highest) => format!(
                "Sync from {} to {}: {} blocks, {} flushes, {} relevant transactions in {:.1}s",
                self.start_height,
                highest,
                self.blocks_processed,
                self.flushes,
                self.relevant_transactions,
                self.elapsed_secs
            ),
            None => format!("Sync from {}: no blocks processed", self.start_height),
        }
    }
}
