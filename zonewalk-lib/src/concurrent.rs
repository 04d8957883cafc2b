//! Worker pool for walking many seeds at once.
//!
//! The dispatcher starts a fixed number of workers in front of a bounded
//! queue. Each worker takes one task at a time and walks its chain to the
//! end before taking the next one, so the number of workers bounds the
//! number of chains in flight.

use crate::error::ZoneWalkError;
use crate::protocols::NsecTransport;
use crate::types::{DispatchSummary, Task};
use crate::walker::{NameSink, ZoneWalker};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

/// Starts workers that feed tasks to a shared [`ZoneWalker`].
pub struct Dispatcher<T, S> {
    walker: Arc<ZoneWalker<T, S>>,
    concurrency: usize,
}

impl<T: NsecTransport, S: NameSink> Dispatcher<T, S> {
    /// Create a dispatcher with `concurrency` workers (at least one).
    pub fn new(walker: Arc<ZoneWalker<T, S>>, concurrency: usize) -> Self {
        Self {
            walker,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn walker(&self) -> &Arc<ZoneWalker<T, S>> {
        &self.walker
    }

    /// Spawn all workers and return the handle used to feed them.
    ///
    /// The queue holds as many tasks as there are workers; submitting to a
    /// full queue waits until a worker frees a slot.
    pub fn start(&self) -> DispatchHandle {
        let (sender, receiver) = mpsc::channel::<Task>(self.concurrency);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..self.concurrency)
            .map(|id| {
                let walker = Arc::clone(&self.walker);
                let receiver = Arc::clone(&receiver);
                tokio::spawn(async move { run_worker(id, walker, receiver).await })
            })
            .collect();

        DispatchHandle { sender, workers }
    }
}

/// Feeding side of a running dispatcher.
pub struct DispatchHandle {
    sender: mpsc::Sender<Task>,
    workers: Vec<JoinHandle<usize>>,
}

impl DispatchHandle {
    /// Queue a task, waiting while the queue is full.
    pub async fn submit(&self, task: Task) -> Result<(), ZoneWalkError> {
        self.sender
            .send(task)
            .await
            .map_err(|_| ZoneWalkError::internal("all workers have stopped"))
    }

    /// Close the queue and wait for every worker to drain it and return.
    pub async fn finish(self) -> Result<DispatchSummary, ZoneWalkError> {
        drop(self.sender);

        let workers = self.workers.len();
        let mut chains = 0;
        for result in futures::future::join_all(self.workers).await {
            chains += result.map_err(|e| ZoneWalkError::internal(format!("worker failed: {}", e)))?;
        }

        Ok(DispatchSummary { workers, chains })
    }
}

async fn run_worker<T: NsecTransport, S: NameSink>(
    id: usize,
    walker: Arc<ZoneWalker<T, S>>,
    receiver: Arc<Mutex<mpsc::Receiver<Task>>>,
) -> usize {
    let mut chains = 0;

    loop {
        // Only hold the lock while waiting for the next task.
        let task = receiver.lock().await.recv().await;
        let Some(task) = task else { break };

        let summary = walker.walk(task).await;
        debug!(
            worker = id,
            seed = %summary.seed,
            discovered = summary.discovered,
            abandoned = summary.abandoned,
            converged = summary.converged,
            "chain finished"
        );
        chains += 1;
    }

    chains
}
