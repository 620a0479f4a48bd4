//! Transaction-scheduler-leader batching: accumulate incoming runtime
//! transactions until the earliest of a count limit, a byte-size limit or
//! a flush timeout, then hand the batch to the caller.
//!
//! Grounded on spec.md §4.6's "batches until the earliest of
//! `max_batch_size`/`max_batch_size_bytes`/`batch_flush_timeout`"; the
//! registry's `TxnSchedulerParameters` (`max_batch_size`,
//! `max_batch_size_bytes`, `batch_flush_timeout_ms`) is this batcher's
//! source of limits at runtime.
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};

use crate::host::Batch;

#[derive(Clone, Copy, Debug)]
pub struct BatcherLimits {
    pub max_batch_size: usize,
    pub max_batch_size_bytes: usize,
    pub flush_timeout: Duration,
}

/// Collects incoming transactions from `incoming` into batches respecting
/// `limits`, yielding a batch as soon as any single limit is hit. Returns
/// `None` once `incoming` is closed with nothing left buffered.
pub struct Batcher {
    incoming: mpsc::Receiver<Vec<u8>>,
    limits: BatcherLimits,
}

impl Batcher {
    pub fn new(incoming: mpsc::Receiver<Vec<u8>>, limits: BatcherLimits) -> Self {
        Batcher { incoming, limits }
    }

    pub async fn next_batch(&mut self) -> Option<Batch> {
        let first = self.incoming.recv().await?;
        let mut txs = vec![first];
        let mut bytes = txs[0].len();
        let deadline = Instant::now() + self.limits.flush_timeout;

        loop {
            if txs.len() >= self.limits.max_batch_size || bytes >= self.limits.max_batch_size_bytes {
                break;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            tokio::select! {
                tx = self.incoming.recv() => {
                    match tx {
                        Some(tx) => {
                            bytes += tx.len();
                            txs.push(tx);
                        }
                        None => break,
                    }
                }
                _ = sleep(remaining) => break,
            }
        }
        Some(Batch(txs))
    }
}
