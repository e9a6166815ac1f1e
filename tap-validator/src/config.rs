//! Runtime settings of a validation run.
//!
//! A [`ValidatorConfig`] is built once at startup, either in code through the
//! `with_*` setters or from a TOML settings file, and then shared by `Arc`
//! with every component that needs it.
//!
//! ```toml
//! [database]
//! engine = "MSSQL"
//!
//! [time]
//! delay = 1            # seconds between result polls
//! http_timeout = 30    # seconds per HTTP request
//! result_timeout = 120 # seconds to wait for one query result
//! throttle = 1         # seconds a worker pauses after each request
//!
//! [tasks]
//! max_parallel_tasks = 10
//! workers = 4
//!
//! [email]
//! sender = "tap-validator@example.org"
//! password = "..."
//! recipient = "ops@example.org"
//! host = "smtp.example.org"
//! ```

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::compare::DatabaseEngine;
use crate::error::{Result, TapError};
use crate::security::SecureString;

/// SMTP settings for the email alerter.
#[derive(Debug, Clone)]
pub struct EmailSettings {
    sender: String,
    password: SecureString,
    recipient: String,
    host: String,
}

impl EmailSettings {
    pub fn new(
        sender: impl Into<String>,
        password: impl Into<String>,
        recipient: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            password: SecureString::new(password),
            recipient: recipient.into(),
            host: host.into(),
        }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Get the SMTP password. Use `expose()` only when handing it to the
    /// transport.
    pub fn password(&self) -> &SecureString {
        &self.password
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

/// Settings shared by the dispatcher, the validators and the comparators.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    database_engine: DatabaseEngine,
    poll_delay: Duration,
    http_timeout: Duration,
    result_timeout: Duration,
    request_throttle: Duration,
    max_parallel_tasks: usize,
    worker_count: usize,
    email: Option<EmailSettings>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            database_engine: DatabaseEngine::Default,
            poll_delay: Duration::from_secs(1),
            http_timeout: Duration::from_secs(30),
            result_timeout: Duration::from_secs(120),
            request_throttle: Duration::from_secs(1),
            max_parallel_tasks: 10,
            worker_count: 4,
            email: None,
        }
    }
}

impl ValidatorConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the database engine used to normalize declared datatypes.
    pub fn with_database_engine(mut self, engine: DatabaseEngine) -> Self {
        self.database_engine = engine;
        self
    }

    /// Set the pause between two polls of a pending result.
    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    /// Set the timeout of a single HTTP request.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Set how long a blocking result retrieval waits before giving up.
    pub fn with_result_timeout(mut self, timeout: Duration) -> Self {
        self.result_timeout = timeout;
        self
    }

    /// Set the pause a worker takes after each request.
    pub fn with_request_throttle(mut self, throttle: Duration) -> Self {
        self.request_throttle = throttle;
        self
    }

    /// Set the number of query sends admitted at once.
    pub fn with_max_parallel_tasks(mut self, max: usize) -> Self {
        self.max_parallel_tasks = max;
        self
    }

    /// Set the number of queries executed against the service at once.
    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    /// Set the SMTP settings used by the email alerter.
    pub fn with_email(mut self, email: EmailSettings) -> Self {
        self.email = Some(email);
        self
    }

    pub fn database_engine(&self) -> DatabaseEngine {
        self.database_engine
    }

    pub fn poll_delay(&self) -> Duration {
        self.poll_delay
    }

    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    pub fn result_timeout(&self) -> Duration {
        self.result_timeout
    }

    pub fn request_throttle(&self) -> Duration {
        self.request_throttle
    }

    pub fn max_parallel_tasks(&self) -> usize {
        self.max_parallel_tasks
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn email(&self) -> Option<&EmailSettings> {
        self.email.as_ref()
    }

    /// Checks the settings for values that would stall a run.
    ///
    /// # Errors
    ///
    /// Returns [`TapError::Configuration`] for zero parallelism, zero workers
    /// or zero timeouts.
    pub fn validate(&self) -> Result<()> {
        if self.max_parallel_tasks == 0 {
            return Err(TapError::Configuration(
                "max_parallel_tasks must be at least 1".to_string(),
            ));
        }
        if self.worker_count == 0 {
            return Err(TapError::Configuration(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.http_timeout.is_zero() {
            return Err(TapError::Configuration(
                "http_timeout must be greater than zero".to_string(),
            ));
        }
        if self.result_timeout.is_zero() {
            return Err(TapError::Configuration(
                "result_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Parses a TOML settings document. Missing keys keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: SettingsFile = toml::from_str(contents)?;
        let config = file.into_config()?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML settings file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TapError::Configuration(format!(
                "Unable to read settings file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&contents)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    #[serde(default)]
    database: DatabaseSection,
    #[serde(default)]
    time: TimeSection,
    #[serde(default)]
    tasks: TasksSection,
    email: Option<EmailSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DatabaseSection {
    engine: Option<DatabaseEngine>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TimeSection {
    delay: Option<u64>,
    http_timeout: Option<u64>,
    result_timeout: Option<u64>,
    throttle: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TasksSection {
    max_parallel_tasks: Option<usize>,
    workers: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EmailSection {
    sender: Option<String>,
    password: Option<String>,
    recipient: Option<String>,
    host: Option<String>,
}

impl SettingsFile {
    fn into_config(self) -> Result<ValidatorConfig> {
        let mut config = ValidatorConfig::default();
        if let Some(engine) = self.database.engine {
            config = config.with_database_engine(engine);
        }
        if let Some(delay) = self.time.delay {
            config = config.with_poll_delay(Duration::from_secs(delay));
        }
        if let Some(timeout) = self.time.http_timeout {
            config = config.with_http_timeout(Duration::from_secs(timeout));
        }
        if let Some(timeout) = self.time.result_timeout {
            config = config.with_result_timeout(Duration::from_secs(timeout));
        }
        if let Some(throttle) = self.time.throttle {
            config = config.with_request_throttle(Duration::from_secs(throttle));
        }
        if let Some(max) = self.tasks.max_parallel_tasks {
            config = config.with_max_parallel_tasks(max);
        }
        if let Some(workers) = self.tasks.workers {
            config = config.with_worker_count(workers);
        }
        if let Some(email) = self.email {
            config = config.with_email(email.into_settings()?);
        }
        Ok(config)
    }
}

impl EmailSection {
    fn into_settings(self) -> Result<EmailSettings> {
        let missing = |key: &str| {
            TapError::Configuration(format!("[email] section is missing '{key}'"))
        };
        Ok(EmailSettings::new(
            self.sender.ok_or_else(|| missing("sender"))?,
            self.password.ok_or_else(|| missing("password"))?,
            self.recipient.ok_or_else(|| missing("recipient"))?,
            self.host.ok_or_else(|| missing("host"))?,
        ))
    }
}
