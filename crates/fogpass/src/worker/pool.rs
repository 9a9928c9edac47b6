use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use log::{debug, error, info, warn};

use crate::error::WorkerError;
use crate::pipeline::{panic_message, JobOutcome, Pipeline};
use crate::worker::task::IngestTask;

/// How a submitted task was handled.
#[derive(Debug)]
pub enum Submission {
    Queued,
    /// The queue was full, so the submitting thread ran the job itself.
    RanInline(JobOutcome),
}

/// Fixed set of ingestion threads fed from a bounded queue.
///
/// When the queue is full, `submit` runs the job on the caller's thread
/// instead of dropping it or blocking until space frees up.
pub struct IngestPool {
    pipeline: Arc<Pipeline>,
    sender: Mutex<Option<Sender<IngestTask>>>,
    backlog: Receiver<IngestTask>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    shutdown: Arc<AtomicBool>,
}

impl IngestPool {
    pub fn new(
        pipeline: Arc<Pipeline>,
        worker_count: usize,
        queue_capacity: usize,
    ) -> Result<Self, WorkerError> {
        if worker_count == 0 {
            return Err(WorkerError::SpawnFailed(
                "worker_count must be > 0".to_string(),
            ));
        }
        Self::start(pipeline, worker_count, queue_capacity)
    }

    fn start(
        pipeline: Arc<Pipeline>,
        worker_count: usize,
        queue_capacity: usize,
    ) -> Result<Self, WorkerError> {
        let (sender, receiver) = bounded::<IngestTask>(queue_capacity.max(1));
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let task_rx = receiver.clone();
            let worker_pipeline = Arc::clone(&pipeline);

            let handle = thread::Builder::new()
                .name(format!("ingest-worker-{}", worker_id))
                .spawn(move || run_worker(worker_id, task_rx, worker_pipeline))
                .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;

            workers.push(handle);
        }

        info!(
            "Started {} ingest workers (queue capacity {})",
            worker_count,
            queue_capacity.max(1)
        );

        Ok(Self {
            pipeline,
            sender: Mutex::new(Some(sender)),
            backlog: receiver,
            workers: Mutex::new(workers),
            shutdown,
        })
    }

    pub fn submit(&self, task: IngestTask) -> Result<Submission, WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        let sender = self
            .sender
            .lock()
            .map_err(|_| WorkerError::ChannelClosed)?
            .clone()
            .ok_or(WorkerError::ChannelClosed)?;

        match sender.try_send(task) {
            Ok(()) => Ok(Submission::Queued),
            Err(TrySendError::Full(task)) => {
                warn!(
                    "Ingest queue full ({} waiting), running job {} on the submitting thread",
                    self.pending(),
                    task.job_id
                );
                panic::catch_unwind(AssertUnwindSafe(|| self.pipeline.run(&task)))
                    .map(Submission::RanInline)
                    .map_err(|payload| WorkerError::JobPanicked {
                        job_id: task.job_id.clone(),
                        message: panic_message(payload.as_ref()),
                    })
            }
            Err(TrySendError::Disconnected(_)) => Err(WorkerError::ChannelClosed),
        }
    }

    /// Stops accepting new tasks. Tasks already queued still run.
    pub fn shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::Relaxed) {
            info!("Shutting down ingest pool...");
        }
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
    }

    /// Drains the queue and joins every worker.
    pub fn wait(&self) {
        self.shutdown();

        let workers = match self.workers.lock() {
            Ok(mut workers) => std::mem::take(&mut *workers),
            Err(_) => {
                error!("Ingest worker list poisoned, not joining");
                return;
            }
        };
        if workers.is_empty() {
            return;
        }

        for (i, worker) in workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All ingest workers have stopped");
    }

    /// Tasks queued but not yet picked up by a worker.
    pub fn pending(&self) -> usize {
        self.backlog.len()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

impl Drop for IngestPool {
    fn drop(&mut self) {
        self.wait();
    }
}

fn run_worker(worker_id: usize, task_receiver: Receiver<IngestTask>, pipeline: Arc<Pipeline>) {
    debug!("Worker {} started", worker_id);

    loop {
        match task_receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(task) => {
                debug!("Worker {} processing job {}", worker_id, task.job_id);
                match panic::catch_unwind(AssertUnwindSafe(|| pipeline.run(&task))) {
                    Ok(outcome) => debug!(
                        "Worker {} finished job {} as {} in {:?}",
                        worker_id, outcome.job_id, outcome.status, outcome.elapsed
                    ),
                    Err(payload) => error!(
                        "Worker {} panicked on job {}: {}",
                        worker_id,
                        task.job_id,
                        panic_message(payload.as_ref())
                    ),
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("Worker {} task channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}
