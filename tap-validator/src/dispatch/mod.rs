//! Query execution: transport, task queue and the send/poll dispatcher.

mod dispatcher;
mod queue;
mod transport;

pub use dispatcher::{Dispatcher, QueryTask, TaskRef, EMPTY_RESPONSE_MESSAGE, TIMEOUT_MESSAGE};
pub use queue::{FetchOutcome, LocalTaskQueue, QueryJob, TaskHandle, TaskQueue};
pub use transport::{sync_query_params, HttpTransport, TapTransport, STANDARD_PARAMS};
