//! Validators: each one checks one aspect of a TAP service and reports a
//! single [`ValidationResult`].

mod endpoint;
mod table;

pub use endpoint::{EndpointValidator, VOSI_AVAILABILITY_NAMESPACE};
pub use table::TableValidator;

use async_trait::async_trait;

use crate::model::ValidationResult;

/// A check run against a TAP service.
///
/// Validation never fails as a call: every problem found along the way,
/// including an unreachable service, ends up in the returned result.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn validate(&self) -> ValidationResult;
}
