//! Output formatting for validation results.
//!
//! [`HumanFormatter`] produces the plain-text report that is also used as the
//! notification body; [`JsonFormatter`] produces a structured document for
//! scripts and CI pipelines.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::str::FromStr;

use crate::error::{Result, TapError};
use crate::model::{Query, TapService, ValidationKind, ValidationResult};

/// Turns a validation result into text.
pub trait ResultFormatter: Send + Sync {
    fn format(&self, service: &TapService, result: &ValidationResult) -> Result<String>;
}

/// The output formats understood by the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

impl OutputFormat {
    pub fn formatter(&self) -> Box<dyn ResultFormatter> {
        match self {
            OutputFormat::Human => Box::new(HumanFormatter::new()),
            OutputFormat::Json => Box::new(JsonFormatter::new()),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = TapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            other => Err(TapError::Configuration(format!(
                "Unknown output format '{other}', expected 'human' or 'json'"
            ))),
        }
    }
}

/// Plain-text report, one block per result.
#[derive(Debug, Clone, Copy, Default)]
pub struct HumanFormatter;

impl HumanFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl ResultFormatter for HumanFormatter {
    fn format(&self, service: &TapService, result: &ValidationResult) -> Result<String> {
        Ok(format!("TAP service: [{}]\n{}", service.url(), result.render()))
    }
}

/// JSON report. Pretty-printed unless built with [`JsonFormatter::compact`].
#[derive(Debug, Clone, Copy)]
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    service: &'a str,
    service_name: &'a str,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<&'static str>,
    status: &'static str,
    success: bool,
    failures: Vec<JsonFailure<'a>>,
    messages: &'a [String],
    generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct JsonFailure<'a> {
    query: &'a str,
    schema: &'a str,
    table: &'a str,
    status: &'static str,
    messages: &'a [String],
}

impl<'a> From<&'a Query> for JsonFailure<'a> {
    fn from(query: &'a Query) -> Self {
        Self {
            query: query.query_text(),
            schema: query.schema_name(),
            table: query.table_name(),
            status: query.status().as_str(),
            messages: query.messages(),
        }
    }
}

impl ResultFormatter for JsonFormatter {
    fn format(&self, service: &TapService, result: &ValidationResult) -> Result<String> {
        let kind = result.kind();
        let report = JsonReport {
            service: service.url(),
            service_name: service.name(),
            kind: match kind {
                ValidationKind::Generic => "generic",
                ValidationKind::Table => "table",
                ValidationKind::Vosi(_) => "vosi",
                ValidationKind::Comparison => "comparison",
            },
            endpoint: match kind {
                ValidationKind::Vosi(endpoint) => Some(endpoint.name()),
                _ => None,
            },
            status: result.status().as_str(),
            success: result.is_success(),
            failures: result.failures().iter().map(JsonFailure::from).collect(),
            messages: result.messages(),
            generated_at: Utc::now(),
        };

        let json = if self.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        Ok(json)
    }
}

/// The notification body sent for a result that did not succeed.
pub fn alert_message(service: &TapService, result: &ValidationResult) -> String {
    format!(
        "Notification for tap_service: [{}]\n{}",
        service.url(),
        result.render()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Endpoint, Status};
    use crate::test_helpers::TEST_SERVICE_URL;
    use crate::votable::TableView;
    use std::sync::Arc;

    fn failed_table_result() -> (Arc<TapService>, ValidationResult) {
        let service = Arc::new(TapService::with_name(TEST_SERVICE_URL, "test"));
        let mut query = Query::for_table("SELECT TOP 1 * FROM t", "s", "t", Arc::clone(&service));
        query.attach_result(TableView::failed("Table t does not exist"));
        let mut result = ValidationResult::new(ValidationKind::Table);
        result.record(query);
        (service, result.finish())
    }

    #[test]
    fn test_alert_message() {
        let (service, result) = failed_table_result();
        assert_eq!(
            alert_message(&service, &result),
            "Notification for tap_service: [http://example.com/tap]\n\
             Table Validation result status: [FAIL]\n\
             The following queries failed:\n\
             [SELECT TOP 1 * FROM t]\n\
             Relevant logs:\n\
             Table t does not exist\n"
        );
    }

    #[test]
    fn test_human_format_names_service() {
        let (service, result) = failed_table_result();
        let text = HumanFormatter::new().format(&service, &result).unwrap();
        assert!(text.starts_with("TAP service: [http://example.com/tap]\n"));
        assert!(text.contains("[FAIL]"));
    }

    #[test]
    fn test_json_format() {
        let (service, result) = failed_table_result();
        let json = JsonFormatter::compact().format(&service, &result).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["service"], "http://example.com/tap");
        assert_eq!(value["service_name"], "test");
        assert_eq!(value["kind"], "table");
        assert_eq!(value["status"], "FAIL");
        assert_eq!(value["success"], false);
        assert_eq!(value["failures"][0]["table"], "t");
        assert_eq!(value["failures"][0]["messages"][0], "Table t does not exist");
        assert!(value.get("endpoint").is_none());
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn test_json_format_vosi_endpoint() {
        let service = TapService::new(TEST_SERVICE_URL);
        let mut result = ValidationResult::new(ValidationKind::Vosi(Endpoint::Availability));
        result.mark(Status::Fail, "Unable to parse /availability endpoint.");
        let json = JsonFormatter::new().format(&service, &result).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "vosi");
        assert_eq!(value["endpoint"], "availability");
        assert_eq!(value["messages"][0], "Unable to parse /availability endpoint.");
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("human".parse::<OutputFormat>().unwrap(), OutputFormat::Human);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
