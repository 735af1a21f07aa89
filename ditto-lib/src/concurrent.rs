//! Bounded worker pool for candidate resolution.
//!
//! A fixed number of tokio tasks pull candidates from one bounded channel,
//! resolve them, and keep their results locally. `wait_done` closes the
//! channel, joins every worker, and returns the candidates in submission
//! order regardless of which worker finished first.

use crate::error::DittoError;
use crate::resolver::AvailabilityResolver;
use crate::types::Candidate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

/// Progress callback, called with (completed, total) after each candidate.
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

type Job = (usize, Candidate);

/// Resolves submitted candidates with at most `workers` in flight.
pub struct WorkerPool {
    sender: mpsc::Sender<Job>,
    workers: Vec<JoinHandle<Vec<Job>>>,
    next_index: usize,
}

impl WorkerPool {
    /// Start `workers` resolver tasks (at least one).
    ///
    /// `total` is only used for progress reporting.
    pub fn start(
        workers: usize,
        resolver: Arc<AvailabilityResolver>,
        total: usize,
        progress: Option<ProgressFn>,
    ) -> Self {
        let workers = workers.max(1);
        let (sender, receiver) = mpsc::channel::<Job>(workers * 2);
        let receiver = Arc::new(Mutex::new(receiver));
        let completed = Arc::new(AtomicUsize::new(0));

        let handles = (0..workers)
            .map(|worker_id| {
                let receiver = receiver.clone();
                let resolver = resolver.clone();
                let completed = completed.clone();
                let progress = progress.clone();

                tokio::spawn(async move {
                    Self::worker(worker_id, receiver, resolver, completed, total, progress).await
                })
            })
            .collect();

        Self {
            sender,
            workers: handles,
            next_index: 0,
        }
    }

    async fn worker(
        worker_id: usize,
        receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
        resolver: Arc<AvailabilityResolver>,
        completed: Arc<AtomicUsize>,
        total: usize,
        progress: Option<ProgressFn>,
    ) -> Vec<Job> {
        let mut results = Vec::new();

        loop {
            let job = {
                let mut rx = receiver.lock().await;
                rx.recv().await
            };

            let Some((index, mut candidate)) = job else {
                break;
            };

            resolver.resolve(&mut candidate).await;
            results.push((index, candidate));

            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(progress) = &progress {
                progress(done, total);
            }
        }

        debug!("Worker {} finished after {} candidates", worker_id, results.len());
        results
    }

    /// Queue a candidate; waits while the channel is full.
    pub async fn add(&mut self, candidate: Candidate) -> Result<(), DittoError> {
        let index = self.next_index;
        self.next_index += 1;
        self.sender
            .send((index, candidate))
            .await
            .map_err(|_| DittoError::internal("Worker pool stopped accepting candidates"))
    }

    /// Stop accepting work and wait for every queued candidate.
    pub async fn wait_done(self) -> Result<Vec<Candidate>, DittoError> {
        let Self {
            sender, workers, ..
        } = self;
        drop(sender);

        let mut results = Vec::new();
        for handle in workers {
            let batch = handle
                .await
                .map_err(|e| DittoError::internal(format!("Worker task failed: {}", e)))?;
            results.extend(batch);
        }

        results.sort_by_key(|(index, _)| *index);
        Ok(results.into_iter().map(|(_, candidate)| candidate).collect())
    }
}
