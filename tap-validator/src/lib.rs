//! # tap-validator - health checks for IVOA TAP services
//!
//! `tap-validator` probes a Table Access Protocol service the way a client
//! would: it walks the service's own `TAP_SCHEMA` catalog, sends a sample-row
//! query to the discovered tables, checks that the columns each table returns
//! match the columns it declares, and folds every outcome into one verdict.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tap_validator::prelude::*;
//!
//! # async fn example() -> tap_validator::error::Result<()> {
//! let settings = Arc::new(ValidatorConfig::from_file("settings.toml")?);
//! let transport = Arc::new(HttpTransport::new(settings.http_timeout())?);
//! let service = Arc::new(TapService::new("https://example.org/tap"));
//!
//! let config = ValidationConfiguration::new(service);
//! let validator = TapValidator::new(config, settings, transport);
//!
//! for result in validator.run(RunMode::Validation, false).await? {
//!     println!("{result}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Run modes
//!
//! - **`TABLE_VALIDATION`**: sample-row queries over the tables of one service.
//!   With `fullscan` every table is probed, otherwise one random table per
//!   schema.
//! - **`VALIDATION`**: the table validation followed by checks of the VOSI
//!   `tables`, `availability` and `capabilities` endpoints.
//! - **`COMPARISON`**: runs a file of queries against two services and
//!   compares the answers cell by cell.
//!
//! Every result that is not a success is forwarded to a notification channel
//! (log, Slack webhook or email).
//!
//! ## Architecture
//!
//! - **`model`**: services, queries, statuses and validation results
//! - **`votable`**: VOTable parsing and the [`TableView`](votable::TableView)
//!   wrapped around every response
//! - **`query`**: catalog queries and the sample-row generator
//! - **`dispatch`**: transport, task queue and the polling dispatcher
//! - **`compare`**: column and table comparators
//! - **`validators`**: table and endpoint validators
//! - **`validator`**: the orchestrator tying the run modes together
//! - **`alert`**, **`formatters`**: notifications and reports

pub mod alert;
pub mod compare;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod formatters;
pub mod logging;
pub mod model;
pub mod prelude;
pub mod query;
pub mod security;
pub mod validator;
pub mod validators;
pub mod votable;

#[cfg(test)]
pub mod test_helpers;
