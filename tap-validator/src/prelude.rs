//! Prelude for commonly used types and traits in tap-validator.

pub use crate::alert::{AlertStrategy, Alerter};
pub use crate::compare::{Comparator, DatabaseEngine};
pub use crate::config::{EmailSettings, ValidatorConfig};
pub use crate::dispatch::{Dispatcher, HttpTransport, TapTransport};
pub use crate::error::{Result, TapError};
pub use crate::formatters::{OutputFormat, ResultFormatter};
pub use crate::logging::setup::LoggingConfig;
pub use crate::model::{Query, Status, TapService, ValidationResult};
pub use crate::validator::{RunMode, TapValidator, ValidationConfiguration};
pub use crate::validators::Validator;
