//! Error types for the TAP validator.
//!
//! Per-query problems (unreachable service, malformed VOTable, timeouts) are
//! never surfaced through this type: they are recovered into a
//! [`Status`](crate::model::Status) on the query. `TapError` covers the
//! remaining cases, which are either usage/configuration mistakes that end the
//! run, or failures of a collaborator (transport, task queue, alert channel)
//! that callers may choose to recover from.

use thiserror::Error;

/// The main error type for the TAP validator.
#[derive(Error, Debug)]
pub enum TapError {
    /// The requested run mode is not one of the known modes.
    #[error("Unknown 'run mode' for TAPValidator: {mode}")]
    InvalidRunMode {
        /// The mode string as it was supplied
        mode: String,
    },

    /// The requested operation has no implementation for the given input.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Error related to configuration or settings.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote service could not be reached or did not answer.
    #[error("Transport error for {url}: {message}")]
    Transport {
        /// The URL that was requested
        url: String,
        /// Detailed error message
        message: String,
    },

    /// A payload could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A column returned by a query is absent from the TAP_SCHEMA declaration.
    #[error("Column '{column}' of table '{table}' is not declared in TAP_SCHEMA.columns")]
    ColumnNotDeclared { column: String, table: String },

    /// A comparison input carried no parsed table.
    #[error("No table available for the {role} result")]
    MissingTable {
        /// Which side of the comparison was missing ("actual", "expected")
        role: String,
    },

    /// The task queue refused or lost a job.
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// A notification could not be delivered.
    #[error("Alert delivery via {channel} failed: {message}")]
    Alert { channel: String, message: String },

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A type alias for `Result<T, TapError>`.
pub type Result<T> = std::result::Result<T, TapError>;

impl TapError {
    /// Creates a transport error for the given URL.
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates an alert delivery error.
    pub fn alert(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Alert {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors caused by how the validator was invoked, as
    /// opposed to failures while talking to a collaborator.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            TapError::InvalidRunMode { .. }
                | TapError::NotImplemented(_)
                | TapError::Configuration(_)
        )
    }
}

impl From<toml::de::Error> for TapError {
    fn from(err: toml::de::Error) -> Self {
        TapError::Configuration(format!("Invalid settings file: {err}"))
    }
}

impl From<serde_json::Error> for TapError {
    fn from(err: serde_json::Error) -> Self {
        TapError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_run_mode_message() {
        let err = TapError::InvalidRunMode {
            mode: "UNKNOWN_MODE".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown 'run mode' for TAPValidator: UNKNOWN_MODE"
        );
        assert!(err.is_usage_error());
    }

    #[test]
    fn test_column_not_declared() {
        let err = TapError::ColumnNotDeclared {
            column: "ra".to_string(),
            table: "Filter".to_string(),
        };
        assert!(err.to_string().contains("'ra'"));
        assert!(err.to_string().contains("'Filter'"));
        assert!(!err.is_usage_error());
    }

    #[test]
    fn test_transport_error() {
        let err = TapError::transport("http://example.com/tap/sync", "connection refused");
        assert_eq!(
            err.to_string(),
            "Transport error for http://example.com/tap/sync: connection refused"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "queries.txt");
        let err: TapError = io.into();
        assert!(matches!(err, TapError::Io(_)));
    }
}
