//! Shared fixtures for the integration tests: an in-memory TAP service and
//! VOTable document builders.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tap_validator::config::ValidatorConfig;
use tap_validator::dispatch::TapTransport;
use tap_validator::error::{Result, TapError};
use tap_validator::model::TapService;

pub const PRIMARY_URL: &str = "http://tap.example.org/tap";
pub const MIRROR_URL: &str = "http://mirror.example.org/tap";

/// An in-memory stand-in for one or more TAP services.
///
/// Query responses are keyed by service base URL and query text; metadata
/// documents by full endpoint URL. Every request is recorded.
#[derive(Default)]
pub struct MockTap {
    queries: HashMap<(String, String), String>,
    documents: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl MockTap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, service: &str, query: &str, body: impl Into<String>) -> Self {
        self.queries
            .insert((format!("{service}/sync"), query.to_string()), body.into());
        self
    }

    pub fn with_document(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.documents.insert(url.into(), body.into());
        self
    }

    /// Scripts the TAP_SCHEMA catalog of `service`.
    pub fn with_catalog(mut self, service: &str, catalog: &[(&str, &[&str])]) -> Self {
        let schemas: Vec<Vec<&str>> = catalog.iter().map(|(s, _)| vec![*s]).collect();
        self = self.with_query(
            service,
            "SELECT schema_name FROM TAP_SCHEMA.schemas",
            votable(&[("schema_name", "char")], &schemas),
        );
        for (schema, tables) in catalog {
            let rows: Vec<Vec<&str>> = tables.iter().map(|t| vec![*t]).collect();
            self = self.with_query(
                service,
                &format!("SELECT table_name FROM TAP_SCHEMA.tables WHERE schema_name='{schema}'"),
                votable(&[("table_name", "char")], &rows),
            );
        }
        self
    }

    /// Scripts a table: its sample row and its TAP_SCHEMA column declaration.
    pub fn with_table(
        self,
        service: &str,
        table: &str,
        served: &[(&str, &str)],
        declared: &[(&str, &str)],
    ) -> Self {
        let sample: Vec<&str> = served.iter().map(|_| "1").collect();
        let declared_rows: Vec<Vec<&str>> = declared.iter().map(|(n, t)| vec![*n, *t]).collect();
        self.with_query(
            service,
            &format!("SELECT TOP 1 * FROM {table}"),
            votable(served, &[sample]),
        )
        .with_query(
            service,
            &format!("SELECT column_name, datatype FROM TAP_SCHEMA.columns WHERE table_name='{table}'"),
            votable(&[("column_name", "char"), ("datatype", "char")], &declared_rows),
        )
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TapTransport for MockTap {
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<String> {
        let query = params
            .iter()
            .find(|(k, _)| k == "QUERY")
            .map(|(_, v)| v.clone());
        self.requests
            .lock()
            .unwrap()
            .push(query.clone().unwrap_or_else(|| url.to_string()));

        let body = match query {
            Some(q) => self.queries.get(&(url.to_string(), q)),
            None => self.documents.get(url),
        };
        body.cloned()
            .ok_or_else(|| TapError::transport(url, "404 Not Found"))
    }
}

pub fn service(url: &str) -> Arc<TapService> {
    Arc::new(TapService::new(url))
}

/// Settings with millisecond delays.
pub fn quick_settings() -> Arc<ValidatorConfig> {
    Arc::new(
        ValidatorConfig::new()
            .with_poll_delay(Duration::from_millis(1))
            .with_result_timeout(Duration::from_secs(5))
            .with_request_throttle(Duration::ZERO),
    )
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// A VOTable 1.4 result document with one table.
pub fn votable<S: AsRef<str>, R: AsRef<[S]>>(fields: &[(&str, &str)], rows: &[R]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <VOTABLE version=\"1.4\" xmlns=\"http://www.ivoa.net/xml/VOTable/v1.3\">\n\
         <RESOURCE type=\"results\">\n\
         <INFO name=\"QUERY_STATUS\" value=\"OK\"/>\n\
         <TABLE>\n",
    );
    for (name, datatype) in fields {
        xml.push_str(&format!(
            "<FIELD name=\"{}\" datatype=\"{}\"/>\n",
            escape(name),
            escape(datatype)
        ));
    }
    xml.push_str("<DATA><TABLEDATA>\n");
    for row in rows {
        xml.push_str("<TR>");
        for cell in row.as_ref() {
            xml.push_str(&format!("<TD>{}</TD>", escape(cell.as_ref())));
        }
        xml.push_str("</TR>\n");
    }
    xml.push_str("</TABLEDATA></DATA>\n</TABLE>\n</RESOURCE>\n</VOTABLE>\n");
    xml
}

pub fn error_document(message: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <VOTABLE version=\"1.4\" xmlns=\"http://www.ivoa.net/xml/VOTable/v1.3\">\n\
         <RESOURCE type=\"results\">\n\
         <INFO name=\"QUERY_STATUS\" value=\"ERROR\">{}</INFO>\n\
         </RESOURCE>\n\
         </VOTABLE>\n",
        escape(message)
    )
}
