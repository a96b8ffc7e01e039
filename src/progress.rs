//! Dump progress reporting

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Shared count of finished slots. Safe to bump from any worker; only the
/// log output depends on it.
#[derive(Debug)]
pub struct Progress {
    total: usize,
    done: AtomicUsize,
    started: Instant,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self { total, done: AtomicUsize::new(0), started: Instant::now() }
    }

    /// Mark one slot finished and log the running count. Returns the new count.
    pub fn advance(&self, slot: usize) -> usize {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!("dump: {}/{} (slot {:04})", done, self.total, slot);
        done
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
