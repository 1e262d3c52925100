//! Bounded pool for CPU-heavy page parsing.
//!
//! Jobs run on tokio's blocking threads; a semaphore caps how many run at
//! once, and submissions past the cap wait for a permit in FIFO order.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::QueryError;

#[derive(Debug, Clone)]
pub struct ParsePool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl ParsePool {
    /// `max_workers == 0` sizes the pool to the available parallelism.
    /// Larger values than the semaphore can hand out are clamped.
    pub fn new(max_workers: usize) -> Self {
        let capacity = if max_workers == 0 {
            thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        } else {
            max_workers
        };
        // `close` takes every permit in one `u32` request.
        let capacity = capacity.min(Semaphore::MAX_PERMITS.min(u32::MAX as usize));
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    /// Run `job` on a worker and wait for its result.
    ///
    /// Cancellation is honored while queued; a job that has started runs to
    /// completion.
    pub async fn submit_wait<F, T>(
        &self,
        cancel: &CancellationToken,
        job: F,
    ) -> Result<T, QueryError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(QueryError::Cancelled),
            permit = self.permits.clone().acquire_owned() => {
                permit.map_err(|_| QueryError::Closed)?
            }
        };

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| QueryError::Worker(e.to_string()))
    }

    /// Stop taking submissions and wait for running jobs to finish.
    pub async fn close(&self) {
        if self.permits.is_closed() {
            return;
        }
        let all = u32::try_from(self.capacity).unwrap_or(u32::MAX);
        // Holding every permit means nothing is running.
        if let Ok(drained) = self.permits.acquire_many(all).await {
            self.permits.close();
            drop(drained);
            tracing::debug!(capacity = self.capacity, "querier.pool.closed");
        }
    }
}
