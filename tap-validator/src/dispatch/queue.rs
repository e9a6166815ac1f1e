//! Task queue contract and the in-process queue used by the CLI.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, error};

use super::transport::{sync_query_params, TapTransport};
use crate::error::Result;
use crate::logging::{truncate_field, MAX_LOGGED_PAYLOAD};

/// Opaque handle of a dispatched job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

impl TaskHandle {
    /// Wraps a queue-assigned job id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// A unit of work: run `query_text` against a synchronous endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryJob {
    pub query_text: String,
    pub endpoint_url: String,
}

/// What a poll of the result store found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The job finished and this is the response body
    Ready(String),
    /// The job is executing
    Pending,
    /// Nothing is recorded for the job yet
    Missing,
    /// The job could not produce a response
    Failed(String),
}

/// A queue that runs query jobs and keeps their results until read.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Submits a job without waiting for it to run.
    async fn enqueue(&self, job: QueryJob) -> Result<TaskHandle>;

    /// Polls for the result of a job. A ready result is handed out once.
    async fn fetch(&self, handle: TaskHandle) -> FetchOutcome;
}

#[derive(Debug)]
enum TaskState {
    Queued,
    Running,
    Done(std::result::Result<String, String>),
}

/// A [`TaskQueue`] that executes jobs on tokio tasks in this process.
///
/// At most `workers` jobs talk to the service at the same time, and each
/// worker pauses for `throttle` after its request so a large fan-out does not
/// hammer the service.
pub struct LocalTaskQueue {
    transport: Arc<dyn TapTransport>,
    workers: Arc<Semaphore>,
    throttle: Duration,
    results: Arc<Mutex<HashMap<TaskHandle, TaskState>>>,
    next_id: AtomicU64,
}

impl LocalTaskQueue {
    pub fn new(transport: Arc<dyn TapTransport>, workers: usize, throttle: Duration) -> Self {
        Self {
            transport,
            workers: Arc::new(Semaphore::new(workers.max(1))),
            throttle,
            results: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of jobs whose results have not been read yet.
    pub async fn len(&self) -> usize {
        self.results.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.results.lock().await.is_empty()
    }
}

#[async_trait]
impl TaskQueue for LocalTaskQueue {
    async fn enqueue(&self, job: QueryJob) -> Result<TaskHandle> {
        let handle = TaskHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.results.lock().await.insert(handle, TaskState::Queued);

        let transport = Arc::clone(&self.transport);
        let workers = Arc::clone(&self.workers);
        let results = Arc::clone(&self.results);
        let throttle = self.throttle;

        tokio::spawn(async move {
            let _permit = workers.acquire_owned().await.ok();
            results.lock().await.insert(handle, TaskState::Running);

            let params = sync_query_params(&job.query_text);
            let outcome = match transport.get(&job.endpoint_url, &params).await {
                Ok(body) => {
                    debug!(
                        task = %handle,
                        response = %truncate_field(&body, MAX_LOGGED_PAYLOAD),
                        "Query job finished"
                    );
                    Ok(body)
                }
                Err(e) => {
                    error!(task = %handle, query = %job.query_text, error = %e, "Query job failed");
                    Err(e.to_string())
                }
            };
            if !throttle.is_zero() {
                tokio::time::sleep(throttle).await;
            }
            results.lock().await.insert(handle, TaskState::Done(outcome));
        });

        debug!(task = %handle, "Query job queued");
        Ok(handle)
    }

    async fn fetch(&self, handle: TaskHandle) -> FetchOutcome {
        let mut results = self.results.lock().await;
        match results.remove(&handle) {
            None => FetchOutcome::Failed(format!("No task registered as {handle}")),
            Some(TaskState::Done(Ok(body))) => FetchOutcome::Ready(body),
            Some(TaskState::Done(Err(message))) => FetchOutcome::Failed(message),
            Some(state) => {
                let outcome = match state {
                    TaskState::Queued => FetchOutcome::Missing,
                    _ => FetchOutcome::Pending,
                };
                results.insert(handle, state);
                outcome
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedTransport;

    fn job(text: &str) -> QueryJob {
        QueryJob {
            query_text: text.to_string(),
            endpoint_url: "http://example.com/sync".to_string(),
        }
    }

    async fn wait_for(queue: &LocalTaskQueue, handle: TaskHandle) -> FetchOutcome {
        loop {
            match queue.fetch(handle).await {
                FetchOutcome::Pending | FetchOutcome::Missing => tokio::task::yield_now().await,
                outcome => return outcome,
            }
        }
    }

    #[tokio::test]
    async fn test_result_is_handed_out_once() {
        let transport = Arc::new(ScriptedTransport::new().respond("SELECT 1", "<VOTABLE/>"));
        let queue = LocalTaskQueue::new(transport, 2, Duration::ZERO);

        let handle = queue.enqueue(job("SELECT 1")).await.unwrap();
        assert_eq!(wait_for(&queue, handle).await, FetchOutcome::Ready("<VOTABLE/>".to_string()));
        assert!(queue.is_empty().await);
        assert!(matches!(queue.fetch(handle).await, FetchOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_transport_error_is_failed_outcome() {
        let transport = Arc::new(ScriptedTransport::new());
        let queue = LocalTaskQueue::new(transport, 1, Duration::ZERO);

        let handle = queue.enqueue(job("SELECT unknown")).await.unwrap();
        match wait_for(&queue, handle).await {
            FetchOutcome::Failed(message) => assert!(message.contains("SELECT unknown")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handles_are_unique() {
        let transport = Arc::new(ScriptedTransport::new().respond("q", "body"));
        let queue = LocalTaskQueue::new(transport, 1, Duration::ZERO);
        let a = queue.enqueue(job("q")).await.unwrap();
        let b = queue.enqueue(job("q")).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(wait_for(&queue, a).await, FetchOutcome::Ready("body".to_string()));
        assert_eq!(wait_for(&queue, b).await, FetchOutcome::Ready("body".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_delays_completion() {
        let transport = Arc::new(ScriptedTransport::new().respond("q", "body"));
        let queue = LocalTaskQueue::new(transport, 1, Duration::from_secs(1));
        let started = tokio::time::Instant::now();

        let handle = queue.enqueue(job("q")).await.unwrap();
        let outcome = loop {
            match queue.fetch(handle).await {
                FetchOutcome::Ready(body) => break body,
                _ => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        };
        assert_eq!(outcome, "body");
        assert!(started.elapsed() >= Duration::from_secs(1));
    }
}
