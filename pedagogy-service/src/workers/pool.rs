use super::evaluation::{EvaluationJob, EvaluationProcessor};
use crate::config::WorkerConfig;
use crate::services::metrics::EVALUATION_JOBS_TOTAL;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueError {
    #[error("Job queue full")]
    QueueFull,

    #[error("Worker pool is not running")]
    Closed,
}

/// Submitting side of the worker pool.
#[derive(Clone)]
pub struct JobQueue {
    job_tx: mpsc::Sender<EvaluationJob>,
}

impl JobQueue {
    /// Queue a job without waiting for room.
    pub fn enqueue(&self, job: EvaluationJob) -> Result<(), EnqueueError> {
        let result = self.job_tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        });

        let event = if result.is_ok() { "enqueued" } else { "rejected" };
        EVALUATION_JOBS_TOTAL.with_label_values(&[event]).inc();
        result
    }
}

/// A dispatcher task feeding jobs to at most `worker_count` concurrent tasks.
pub struct EvaluationWorkerPool {
    config: WorkerConfig,
    processor: EvaluationProcessor,
    job_rx: mpsc::Receiver<EvaluationJob>,
    shutdown_token: CancellationToken,
}

impl EvaluationWorkerPool {
    /// Returns `None` when the pool is disabled by configuration.
    pub fn new(
        config: WorkerConfig,
        processor: EvaluationProcessor,
        shutdown_token: CancellationToken,
    ) -> Option<(Self, JobQueue)> {
        if !config.enabled {
            tracing::info!("Worker pool disabled by configuration");
            return None;
        }

        let (job_tx, job_rx) = mpsc::channel(config.queue_size.max(1));
        let pool = Self {
            config,
            processor,
            job_rx,
            shutdown_token,
        };
        Some((pool, JobQueue { job_tx }))
    }

    pub fn start(self) -> JoinHandle<()> {
        let Self {
            config,
            processor,
            mut job_rx,
            shutdown_token: shutdown,
        } = self;

        let worker_count = config.worker_count.max(1);
        tracing::info!(
            worker_count,
            queue_size = config.queue_size,
            "Starting evaluation worker pool"
        );

        let permits = Arc::new(Semaphore::new(worker_count));

        tokio::spawn(async move {
            let mut held = None;
            loop {
                let job = tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => {
                        tracing::info!("Job dispatcher shutting down");
                        break;
                    }
                    job = job_rx.recv() => match job {
                        Some(job) => job,
                        None => {
                            tracing::info!("Channel closed, job dispatcher exiting");
                            break;
                        }
                    },
                };

                let permit = tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => {
                        tracing::warn!(job_id = %job.job_id, "Shutdown before job could start");
                        held = Some(job);
                        break;
                    }
                    permit = permits.clone().acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => {
                            held = Some(job);
                            break;
                        }
                    },
                };

                tracing::info!(job_id = %job.job_id, "Dispatching evaluation job");

                let processor = processor.clone();
                tokio::spawn(async move {
                    let _permit = permit;
                    if let Err(e) = processor.process(&job).await {
                        tracing::warn!(job_id = %job.job_id, error = %e, "Evaluation job did not complete");
                    }
                });
            }

            // Accepted jobs that never reached a worker still need a terminal status.
            job_rx.close();
            let mut abandoned = 0usize;
            if let Some(job) = held {
                processor.abandon(&job).await;
                abandoned += 1;
            }
            while let Ok(job) = job_rx.try_recv() {
                processor.abandon(&job).await;
                abandoned += 1;
            }
            if abandoned > 0 {
                tracing::warn!(abandoned, "Failed undelivered evaluation jobs at shutdown");
            }
        })
    }
}
