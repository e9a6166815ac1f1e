//! The validation orchestrator.
//!
//! [`TapValidator`] runs one of three [`RunMode`]s against the configured
//! services and forwards every result that is not a success to the configured
//! [`Alerter`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tap_validator::prelude::*;
//!
//! # async fn example() -> tap_validator::error::Result<()> {
//! let settings = Arc::new(ValidatorConfig::new());
//! let transport = Arc::new(HttpTransport::new(settings.http_timeout())?);
//! let service = Arc::new(TapService::new("https://example.org/tap"));
//!
//! let validator = TapValidator::new(ValidationConfiguration::new(service), settings, transport);
//! let results = validator.run(RunMode::TableValidation, false).await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::alert::{Alerter, LogAlerter};
use crate::compare::VoTableComparator;
use crate::config::ValidatorConfig;
use crate::dispatch::{Dispatcher, TapTransport};
use crate::error::{Result, TapError};
use crate::formatters::alert_message;
use crate::model::{Query, Status, TapService, ValidationKind, ValidationResult};
use crate::validators::{EndpointValidator, TableValidator, Validator};

/// What a run checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// Sample every table of the first service
    TableValidation,
    /// Table validation followed by the VOSI endpoint checks
    Validation,
    /// Run a list of queries on both services and compare the answers
    Comparison,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::TableValidation => "TABLE_VALIDATION",
            RunMode::Validation => "VALIDATION",
            RunMode::Comparison => "COMPARISON",
        }
    }
}

impl FromStr for RunMode {
    type Err = TapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "TABLE_VALIDATION" => Ok(RunMode::TableValidation),
            "VALIDATION" => Ok(RunMode::Validation),
            "COMPARISON" => Ok(RunMode::Comparison),
            _ => Err(TapError::InvalidRunMode {
                mode: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The services, inputs and notification channel of a run.
#[derive(Clone)]
pub struct ValidationConfiguration {
    first_service: Arc<TapService>,
    second_service: Option<Arc<TapService>>,
    queries: Option<PathBuf>,
    alerter: Arc<dyn Alerter>,
    alert_destination: String,
}

impl ValidationConfiguration {
    /// Validates `first_service` and notifies through the log.
    pub fn new(first_service: Arc<TapService>) -> Self {
        Self {
            first_service,
            second_service: None,
            queries: None,
            alerter: Arc::new(LogAlerter),
            alert_destination: String::new(),
        }
    }

    /// The service the first one is compared against.
    pub fn with_second_service(mut self, service: Arc<TapService>) -> Self {
        self.second_service = Some(service);
        self
    }

    /// A file with one comparison query per line.
    pub fn with_queries(mut self, path: impl Into<PathBuf>) -> Self {
        self.queries = Some(path.into());
        self
    }

    pub fn with_alerter(mut self, alerter: Arc<dyn Alerter>, destination: impl Into<String>) -> Self {
        self.alerter = alerter;
        self.alert_destination = destination.into();
        self
    }

    pub fn first_service(&self) -> &Arc<TapService> {
        &self.first_service
    }

    pub fn second_service(&self) -> Option<&Arc<TapService>> {
        self.second_service.as_ref()
    }

    pub fn queries(&self) -> Option<&Path> {
        self.queries.as_deref()
    }

    pub fn alert_destination(&self) -> &str {
        &self.alert_destination
    }
}

/// Runs validations against TAP services.
pub struct TapValidator {
    config: ValidationConfiguration,
    transport: Arc<dyn TapTransport>,
    dispatcher: Dispatcher,
}

impl TapValidator {
    pub fn new(
        config: ValidationConfiguration,
        settings: Arc<ValidatorConfig>,
        transport: Arc<dyn TapTransport>,
    ) -> Self {
        let dispatcher = Dispatcher::local(Arc::clone(&transport), settings);
        Self {
            config,
            transport,
            dispatcher,
        }
    }

    /// Builds a validator around an existing dispatcher, e.g. one backed by
    /// a different task queue.
    pub fn with_dispatcher(
        config: ValidationConfiguration,
        transport: Arc<dyn TapTransport>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            config,
            transport,
            dispatcher,
        }
    }

    pub fn config(&self) -> &ValidationConfiguration {
        &self.config
    }

    /// Runs `mode` and returns the result of every validator that ran, in run
    /// order.
    ///
    /// Problems with the services themselves are reported inside the results.
    /// Errors are reserved for runs that cannot start, such as a comparison
    /// without a query file.
    #[instrument(skip(self), fields(service = %self.config.first_service))]
    pub async fn run(&self, mode: RunMode, fullscan: bool) -> Result<Vec<ValidationResult>> {
        info!(mode = %mode, "Starting validation run");
        match mode {
            RunMode::TableValidation => Ok(vec![self.validate_tables(fullscan).await]),
            RunMode::Validation => Ok(self.validate_service(fullscan).await),
            RunMode::Comparison => Ok(vec![self.compare_services().await?]),
        }
    }

    /// Validates the tables of the first service.
    pub async fn validate_tables(&self, fullscan: bool) -> ValidationResult {
        let validator = self.table_validator(fullscan);
        let result = validator.validate().await;
        self.handle_notification(&result).await;
        result
    }

    /// Runs the table validation and the tables, availability and
    /// capabilities endpoint checks, one after the other.
    pub async fn validate_service(&self, fullscan: bool) -> Vec<ValidationResult> {
        let service = &self.config.first_service;
        let validators: Vec<Box<dyn Validator>> = vec![
            Box::new(self.table_validator(fullscan)),
            Box::new(EndpointValidator::tables(
                Arc::clone(service),
                Arc::clone(&self.transport),
            )),
            Box::new(EndpointValidator::availability(
                Arc::clone(service),
                Arc::clone(&self.transport),
            )),
            Box::new(EndpointValidator::capabilities(
                Arc::clone(service),
                Arc::clone(&self.transport),
            )),
        ];

        let mut results = Vec::with_capacity(validators.len());
        for validator in validators {
            let result = validator.validate().await;
            info!(validator = validator.name(), status = %result.status(), "Validator finished");
            self.handle_notification(&result).await;
            results.push(result);
        }
        results
    }

    /// Runs every query of the query file on both services and compares the
    /// answers.
    pub async fn compare_services(&self) -> Result<ValidationResult> {
        let Some(path) = self.config.queries() else {
            return Err(TapError::NotImplemented(
                "Can only use function with a known set of queries currently".to_string(),
            ));
        };
        let second = self.config.second_service().ok_or_else(|| {
            TapError::Configuration("COMPARISON mode needs a secondary TAP service".to_string())
        })?;
        let first = &self.config.first_service;

        let contents = tokio::fs::read_to_string(path).await?;
        let comparator = VoTableComparator::new();
        let mut result = ValidationResult::new(ValidationKind::Comparison);

        for text in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let mut ours = self.dispatcher.send(Query::new(text, Arc::clone(first))).await;
            let mut theirs = self.dispatcher.send(Query::new(text, Arc::clone(second))).await;
            let ours_result = self.dispatcher.get_result(&mut ours, true).await;
            let theirs_result = self.dispatcher.get_result(&mut theirs, true).await;

            if comparator.tables_match(&ours_result, &theirs_result) {
                info!(query = %text, "{text} [OK]");
                continue;
            }
            error!(query = %text, first = %first, second = %second, "{text} [MISMATCH]");
            let mut query = ours.into_query();
            query.mark(
                Status::Fail,
                format!("Result differs from the one returned by {second}"),
            );
            result.record(query);
        }

        let result = result.finish();
        self.handle_notification(&result).await;
        Ok(result)
    }

    fn table_validator(&self, fullscan: bool) -> TableValidator {
        TableValidator::new(
            Arc::clone(&self.config.first_service),
            self.dispatcher.clone(),
            fullscan,
        )
    }

    /// Sends the report of a result that is not a success. Delivery failures
    /// are logged and otherwise ignored.
    async fn handle_notification(&self, result: &ValidationResult) {
        if result.status() == Status::Success {
            return;
        }
        let message = alert_message(&self.config.first_service, result);
        if let Err(e) = self
            .config
            .alerter
            .send_alert(&message, &self.config.alert_destination)
            .await
        {
            warn!(error = %e, "Failed to deliver notification");
        }
    }
}
