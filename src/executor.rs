//! C5 — two independent bounded worker groups, process-lifetime: a job pool
//! that runs background job drivers and a chunk pool that runs individual
//! chunk processors under a deadline. Both are backed by `tokio::sync::Semaphore`
//! rather than a dedicated thread pool, since job/chunk work here is async I/O
//! bound (spatial-store calls), not CPU bound.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

pub struct ExecutorPool {
    job_semaphore: Arc<Semaphore>,
    job_workers: u32,
    chunk_semaphore: Arc<Semaphore>,
    chunk_timeout: Duration,
    shutting_down: Arc<AtomicBool>,
}

impl ExecutorPool {
    pub fn new(job_workers: usize, chunk_workers: usize, chunk_timeout: Duration) -> Self {
        let job_workers = job_workers.max(1);
        Self {
            job_semaphore: Arc::new(Semaphore::new(job_workers)),
            job_workers: job_workers as u32,
            chunk_semaphore: Arc::new(Semaphore::new(chunk_workers.max(1))),
            chunk_timeout,
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Submits a job driver to run in the background. Returns immediately —
    /// the driver itself waits for a free worker slot, not the caller. Fails
    /// only once shutdown has begun.
    pub fn submit_job<F>(&self, fut: F) -> Result<(), ExecutorUnavailable>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(ExecutorUnavailable);
        }
        let semaphore = Arc::clone(&self.job_semaphore);
        tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            fut.await;
        });
        Ok(())
    }

    /// Runs a chunk processor under the chunk deadline, waiting for a free
    /// chunk-pool slot first. Returns `Err(ChunkTimedOut)` if the deadline
    /// (queue wait + execution) elapses before the processor finishes.
    pub async fn run_chunk<F, T>(&self, fut: F) -> Result<T, ChunkTimedOut>
    where
        F: Future<Output = T> + Send,
    {
        let semaphore = Arc::clone(&self.chunk_semaphore);
        let timed = async move {
            let _permit = semaphore.acquire_owned().await.map_err(|_| ())?;
            Ok::<T, ()>(fut.await)
        };
        match tokio::time::timeout(self.chunk_timeout, timed).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(())) | Err(_) => Err(ChunkTimedOut),
        }
    }

    pub fn chunk_timeout(&self) -> Duration {
        self.chunk_timeout
    }

    /// Stops accepting new job submissions and awaits all in-flight job-pool
    /// permits. The chunk pool has no separate drain: its only callers are
    /// job drivers, which this call has already waited out.
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        // Acquiring every permit blocks until every in-flight driver returns its own.
        if let Ok(permits) = self.job_semaphore.acquire_many(self.job_workers).await {
            drop(permits);
        }
    }
}

#[derive(Debug)]
pub struct ExecutorUnavailable;

#[derive(Debug)]
pub struct ChunkTimedOut;
