//! Core data model: services, queries, statuses and validation results.

mod query;
mod service;
mod status;
mod validation;

pub use query::{Query, QueryId};
pub use service::{Endpoint, TapEndpoints, TapService};
pub use status::Status;
pub use validation::{ValidationKind, ValidationResult};
