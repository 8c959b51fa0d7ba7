//! Concurrency limiter for grading runs.
//!
//! A counting semaphore caps how many runs build and test at once. Callers beyond the cap wait in
//! FIFO order. Running/waiting counts are tracked alongside for status reporting.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::GradingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub running: usize,
    pub waiting: usize,
    pub max_concurrent: usize,
}

#[derive(Debug, Clone)]
pub struct GradingLimiter {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    running: Arc<AtomicUsize>,
    waiting: Arc<AtomicUsize>,
}

impl GradingLimiter {
    /// A limiter admitting `max_concurrent` runs at once (at least one).
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            running: Arc::new(AtomicUsize::new(0)),
            waiting: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Waits for a free slot. The slot is released when the permit drops.
    ///
    /// # Errors
    /// [`GradingError::Shutdown`] once [`GradingLimiter::close`] has been called.
    pub async fn acquire(&self) -> Result<GradingPermit, GradingError> {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        let acquired = Arc::clone(&self.semaphore).acquire_owned().await;
        self.waiting.fetch_sub(1, Ordering::SeqCst);

        let permit = acquired.map_err(|_| GradingError::Shutdown)?;
        self.running.fetch_add(1, Ordering::SeqCst);
        Ok(GradingPermit {
            _permit: permit,
            running: Arc::clone(&self.running),
        })
    }

    /// Rejects queued and future runs. Runs already holding a permit finish.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            running: self.running.load(Ordering::SeqCst),
            waiting: self.waiting.load(Ordering::SeqCst),
            max_concurrent: self.max_concurrent,
        }
    }
}

/// A held grading slot.
#[derive(Debug)]
pub struct GradingPermit {
    _permit: OwnedSemaphorePermit,
    running: Arc<AtomicUsize>,
}

impl Drop for GradingPermit {
    fn drop(&mut self) {
        self.running.fetch_sub(1, Ordering::SeqCst);
    }
}
