//! Bounded work queue for post-create case analysis
//!
//! Jobs are pushed onto a bounded `mpsc` channel and consumed by a fixed
//! number of worker tasks sharing the receiver. Submitting never blocks: a full
//! queue rejects the job and the caller logs it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::model::LocationHints;
use crate::service::case::CaseServiceError;

/// Background analysis of a freshly created case
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisJob {
    pub case_id: i64,
    pub hints: LocationHints,
}

/// Runs one queued job; errors are logged by the worker
#[async_trait]
pub trait AnalysisJobHandler: Send + Sync + 'static {
    async fn handle(&self, job: AnalysisJob) -> Result<(), CaseServiceError>;
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("Analysis queue is full")]
    Full,

    #[error("Analysis queue is closed")]
    Closed,
}

#[derive(Clone)]
pub struct AnalysisQueue {
    sender: mpsc::Sender<AnalysisJob>,
}

impl AnalysisQueue {
    /// Create the queue and spawn `workers` consumers (at least one)
    pub fn start(
        handler: Arc<dyn AnalysisJobHandler>,
        workers: usize,
        capacity: usize,
    ) -> (Self, Vec<JoinHandle<()>>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..workers.max(1))
            .map(|worker| {
                let receiver = receiver.clone();
                let handler = handler.clone();
                tokio::spawn(run_worker(worker, receiver, handler))
            })
            .collect();

        tracing::info!(workers = workers.max(1), capacity, "Analysis queue started");

        (Self { sender }, handles)
    }

    /// Enqueue a job without waiting for capacity
    pub fn submit(&self, job: AnalysisJob) -> Result<(), QueueError> {
        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })
    }
}

async fn run_worker(
    worker: usize,
    receiver: Arc<Mutex<mpsc::Receiver<AnalysisJob>>>,
    handler: Arc<dyn AnalysisJobHandler>,
) {
    loop {
        let job = { receiver.lock().await.recv().await };
        let Some(job) = job else {
            tracing::debug!(worker, "Analysis queue closed, worker exiting");
            break;
        };

        let case_id = job.case_id;
        let start_time = std::time::Instant::now();
        match handler.handle(job).await {
            Ok(()) => tracing::info!(
                worker,
                case_id,
                elapsed_ms = start_time.elapsed().as_millis(),
                "Background analysis completed"
            ),
            Err(e) => tracing::warn!(
                worker,
                case_id,
                error = %e,
                "Background analysis failed"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::Notify;

    struct RecordingHandler {
        seen: Mutex<Vec<i64>>,
        done: Notify,
        expected: usize,
    }

    #[async_trait]
    impl AnalysisJobHandler for RecordingHandler {
        async fn handle(&self, job: AnalysisJob) -> Result<(), CaseServiceError> {
            let mut seen = self.seen.lock().await;
            seen.push(job.case_id);
            if seen.len() == self.expected {
                self.done.notify_one();
            }
            if job.case_id % 2 == 0 {
                return Err(CaseServiceError::NotFound(job.case_id));
            }
            Ok(())
        }
    }

    struct BlockingHandler {
        release: Notify,
    }

    #[async_trait]
    impl AnalysisJobHandler for BlockingHandler {
        async fn handle(&self, _job: AnalysisJob) -> Result<(), CaseServiceError> {
            self.release.notified().await;
            Ok(())
        }
    }

    fn job(case_id: i64) -> AnalysisJob {
        AnalysisJob {
            case_id,
            hints: LocationHints::default(),
        }
    }

    #[tokio::test]
    async fn test_workers_process_every_job_despite_failures() {
        let handler = Arc::new(RecordingHandler {
            seen: Mutex::new(Vec::new()),
            done: Notify::new(),
            expected: 5,
        });
        let (queue, _handles) = AnalysisQueue::start(handler.clone(), 2, 16);

        for id in 1..=5 {
            queue.submit(job(id)).unwrap();
        }

        tokio::time::timeout(Duration::from_secs(5), handler.done.notified())
            .await
            .expect("jobs were not processed");

        let mut seen = handler.seen.lock().await.clone();
        seen.sort();
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_full_queue_rejects_jobs() {
        let handler = Arc::new(BlockingHandler {
            release: Notify::new(),
        });
        let (queue, _handles) = AnalysisQueue::start(handler.clone(), 1, 1);

        // One job is taken by the worker, one fills the channel
        queue.submit(job(1)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        queue.submit(job(2)).unwrap();

        assert_eq!(queue.submit(job(3)), Err(QueueError::Full));
        handler.release.notify_waiters();
    }

    #[tokio::test]
    async fn test_zero_workers_still_starts_one() {
        let handler = Arc::new(RecordingHandler {
            seen: Mutex::new(Vec::new()),
            done: Notify::new(),
            expected: 1,
        });
        let (queue, handles) = AnalysisQueue::start(handler.clone(), 0, 4);
        assert_eq!(handles.len(), 1);

        queue.submit(job(9)).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handler.done.notified())
            .await
            .expect("job was not processed");
    }
}
