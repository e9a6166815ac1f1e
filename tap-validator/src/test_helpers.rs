//! Test helpers: a scripted transport and VOTable document builders.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::ValidatorConfig;
use crate::dispatch::TapTransport;
use crate::error::{Result, TapError};
use crate::model::TapService;
use crate::query::QueryBuilder;

/// Base URL of the service used throughout the unit tests.
pub const TEST_SERVICE_URL: &str = "http://example.com/tap";

/// A [`TapTransport`] answering from canned responses.
///
/// Requests carrying a `QUERY` parameter are matched on the URL and query
/// text, then on the query text alone; other requests on the URL. Anything unscripted is a transport error.
#[derive(Default)]
pub struct ScriptedTransport {
    by_service_query: HashMap<(String, String), String>,
    by_query: HashMap<String, String>,
    by_url: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, query_text: &str, body: &str) -> Self {
        self.by_query.insert(query_text.to_string(), body.to_string());
        self
    }

    /// Answers `query_text` only when it is sent to `url`. Takes precedence
    /// over [`ScriptedTransport::respond`].
    pub fn respond_at(mut self, url: &str, query_text: &str, body: &str) -> Self {
        self.by_service_query
            .insert((url.to_string(), query_text.to_string()), body.to_string());
        self
    }

    pub fn respond_url(mut self, url: &str, body: &str) -> Self {
        self.by_url.insert(url.to_string(), body.to_string());
        self
    }

    /// Query texts (or URLs) requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TapTransport for ScriptedTransport {
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<String> {
        let query = params.iter().find(|(k, _)| k == "QUERY").map(|(_, v)| v);
        let key = query.cloned().unwrap_or_else(|| url.to_string());
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(key.clone());
        }
        let body = match query {
            Some(q) => self
                .by_service_query
                .get(&(url.to_string(), q.clone()))
                .or_else(|| self.by_query.get(q)),
            None => self.by_url.get(url),
        };
        body.cloned()
            .ok_or_else(|| TapError::transport(url, format!("no scripted response for {key}")))
    }
}

/// A settings object with short delays for tests.
pub fn fast_config() -> Arc<ValidatorConfig> {
    Arc::new(
        ValidatorConfig::new()
            .with_poll_delay(Duration::from_millis(1))
            .with_result_timeout(Duration::from_secs(2))
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

/// Builds a VOTable 1.3 document with one TABLE.
pub fn votable_xml(fields: &[(&str, &str)], rows: &[&[&str]]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<VOTABLE version="1.3" xmlns="http://www.ivoa.net/xml/VOTable/v1.3">
<RESOURCE type="results">
<INFO name="QUERY_STATUS" value="OK"/>
<TABLE>
"#,
    );
    for (name, datatype) in fields {
        let arraysize = if *datatype == "char" { r#" arraysize="*""# } else { "" };
        xml.push_str(&format!(
            "<FIELD name=\"{}\" datatype=\"{}\"{arraysize}/>\n",
            escape(name),
            escape(datatype)
        ));
    }
    xml.push_str("<DATA><TABLEDATA>\n");
    for row in rows {
        xml.push_str("<TR>");
        for cell in row.iter() {
            xml.push_str(&format!("<TD>{}</TD>", escape(cell)));
        }
        xml.push_str("</TR>\n");
    }
    xml.push_str("</TABLEDATA></DATA>\n</TABLE>\n</RESOURCE>\n</VOTABLE>\n");
    xml
}

/// Builds the error document a TAP service returns for a failed query.
pub fn error_votable(message: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<VOTABLE version="1.3" xmlns="http://www.ivoa.net/xml/VOTable/v1.3">
<RESOURCE type="results">
<INFO name="QUERY_STATUS" value="ERROR">{}</INFO>
</RESOURCE>
</VOTABLE>
"#,
        escape(message)
    )
}

/// Builds the answer to a TAP_SCHEMA.columns query.
pub fn columns_votable(columns: &[(&str, &str)]) -> String {
    let rows: Vec<Vec<&str>> = columns.iter().map(|(n, t)| vec![*n, *t]).collect();
    let rows: Vec<&[&str]> = rows.iter().map(Vec::as_slice).collect();
    votable_xml(&[("column_name", "char"), ("datatype", "char")], &rows)
}

/// Scripts the catalog of a service: its schemas and the tables in each.
pub fn catalog_transport(
    catalog: &[(&str, &[&str])],
) -> (Arc<TapService>, ScriptedTransport) {
    let service = Arc::new(TapService::with_name(TEST_SERVICE_URL, "test"));

    let schema_rows: Vec<[&str; 1]> = catalog.iter().map(|(schema, _)| [*schema]).collect();
    let schema_rows: Vec<&[&str]> = schema_rows.iter().map(|r| r.as_slice()).collect();
    let mut transport = ScriptedTransport::new().respond(
        QueryBuilder::schemas(&service).query_text(),
        &votable_xml(&[("schema_name", "char")], &schema_rows),
    );

    for (schema, tables) in catalog {
        let table_rows: Vec<[&str; 1]> = tables.iter().map(|t| [*t]).collect();
        let table_rows: Vec<&[&str]> = table_rows.iter().map(|r| r.as_slice()).collect();
        transport = transport.respond(
            QueryBuilder::tables(schema, &service).query_text(),
            &votable_xml(&[("table_name", "char")], &table_rows),
        );
    }

    (service, transport)
}
