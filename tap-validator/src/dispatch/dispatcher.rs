use futures::future::join_all;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Instant};
use tracing::{debug, instrument, warn};

use super::queue::{FetchOutcome, LocalTaskQueue, QueryJob, TaskHandle, TaskQueue};
use super::transport::TapTransport;
use crate::config::ValidatorConfig;
use crate::model::{Query, Status};
use crate::votable::TableView;

/// Message recorded when a blocking retrieval runs out of time.
pub const TIMEOUT_MESSAGE: &str = "Timeout waiting for query result";

/// Message recorded when the service answered with an empty body.
pub const EMPTY_RESPONSE_MESSAGE: &str = "Empty response from service";

/// The queue side of a [`QueryTask`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskRef {
    Queued(TaskHandle),
    /// The queue refused the job; the message says why
    Rejected(String),
}

/// A dispatched query and the handle of the job running it.
///
/// Identity is the pair (query identity, task); results retrieved out of send
/// order are correlated through it.
#[derive(Debug, Clone)]
pub struct QueryTask {
    query: Query,
    task: TaskRef,
}

impl QueryTask {
    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn task(&self) -> &TaskRef {
        &self.task
    }

    pub fn into_query(self) -> Query {
        self.query
    }
}

impl PartialEq for QueryTask {
    fn eq(&self, other: &Self) -> bool {
        self.query.id() == other.query.id() && self.task == other.task
    }
}

impl Eq for QueryTask {}

impl Hash for QueryTask {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.query.id().hash(state);
        self.task.hash(state);
    }
}

/// Sends queries through a [`TaskQueue`] and retrieves their results.
///
/// Sending and receiving are separate steps so a whole batch can be fanned out
/// before any result is awaited.
#[derive(Clone)]
pub struct Dispatcher {
    queue: Arc<dyn TaskQueue>,
    config: Arc<ValidatorConfig>,
}

impl Dispatcher {
    pub fn new(queue: Arc<dyn TaskQueue>, config: Arc<ValidatorConfig>) -> Self {
        Self { queue, config }
    }

    /// A dispatcher backed by an in-process [`LocalTaskQueue`] over `transport`.
    pub fn local(transport: Arc<dyn TapTransport>, config: Arc<ValidatorConfig>) -> Self {
        let queue = LocalTaskQueue::new(
            transport,
            config.worker_count(),
            config.request_throttle(),
        );
        Self::new(Arc::new(queue), config)
    }

    pub fn config(&self) -> &Arc<ValidatorConfig> {
        &self.config
    }

    /// Submits `query` against its service's synchronous endpoint without
    /// waiting for it to run.
    pub async fn send(&self, query: Query) -> QueryTask {
        let job = QueryJob {
            query_text: query.query_text().to_string(),
            endpoint_url: query.service().endpoints().synchronous().to_string(),
        };
        let task = match self.queue.enqueue(job).await {
            Ok(handle) => {
                debug!(query = %query.query_text(), task = %handle, "Query sent");
                TaskRef::Queued(handle)
            }
            Err(e) => {
                warn!(query = %query.query_text(), error = %e, "Task queue rejected query");
                TaskRef::Rejected(e.to_string())
            }
        };
        QueryTask { query, task }
    }

    /// Retrieves the result of a dispatched query and attaches it to the query.
    ///
    /// A job the queue has no record of yet is polled again after the poll
    /// delay, indefinitely. A job that is executing is waited on for at most
    /// the result timeout, counted from the first poll that saw it executing,
    /// when `block` is set;
    /// past that the result is a failure carrying [`TIMEOUT_MESSAGE`].
    /// Without `block` an executing job is polled like a missing one.
    ///
    /// Never fails: every outcome, including timeouts, is a [`TableView`].
    pub async fn get_result(&self, task: &mut QueryTask, block: bool) -> TableView {
        let view = match &task.task {
            TaskRef::Rejected(message) => TableView::failed(message.clone()),
            TaskRef::Queued(handle) => self.poll(*handle, block).await,
        };
        task.query.attach_result(view.clone());
        view
    }

    async fn poll(&self, handle: TaskHandle, block: bool) -> TableView {
        let timeout = self.config.result_timeout();
        let delay = self.config.poll_delay();
        // Time spent queued behind busy workers does not count.
        let mut started: Option<Instant> = None;

        loop {
            match self.queue.fetch(handle).await {
                FetchOutcome::Ready(payload) => return classify_payload(payload),
                FetchOutcome::Failed(message) => return TableView::failed(message),
                FetchOutcome::Pending if block => {
                    let elapsed = started.get_or_insert_with(Instant::now).elapsed();
                    if elapsed >= timeout {
                        warn!(task = %handle, elapsed_ms = elapsed.as_millis() as u64, "{TIMEOUT_MESSAGE}");
                        return TableView::failed(TIMEOUT_MESSAGE);
                    }
                    sleep(delay.min(timeout - elapsed)).await;
                }
                FetchOutcome::Pending | FetchOutcome::Missing => sleep(delay).await,
            }
        }
    }

    /// Sends and waits for one query, returning it with its result attached.
    pub async fn run(&self, query: Query) -> Query {
        let mut task = self.send(query).await;
        self.get_result(&mut task, true).await;
        task.into_query()
    }

    /// Sends every query, admitting at most `max_in_flight` sends at a time.
    /// Returns once all sends completed.
    #[instrument(skip(self, queries), fields(queries = queries.len()))]
    pub async fn send_all(&self, queries: Vec<Query>, max_in_flight: usize) -> Vec<QueryTask> {
        let gate = Arc::new(Semaphore::new(max_in_flight.max(1)));
        let sends = queries.into_iter().map(|query| {
            let gate = Arc::clone(&gate);
            async move {
                let _permit = gate.acquire().await.ok();
                self.send(query).await
            }
        });
        join_all(sends).await
    }

    /// Retrieves every result, blocking up to the result timeout for each.
    /// Tasks are awaited concurrently and returned in input order.
    pub async fn collect_all(&self, tasks: Vec<QueryTask>) -> Vec<Query> {
        let receives = tasks.into_iter().map(|mut task| async move {
            self.get_result(&mut task, true).await;
            task.into_query()
        });
        join_all(receives).await
    }
}

fn classify_payload(payload: String) -> TableView {
    let mut view = TableView::parse(payload);
    if view.status() == Status::Pending {
        view.set_status(Status::Fail);
        view.push_message(EMPTY_RESPONSE_MESSAGE);
    }
    view
}
