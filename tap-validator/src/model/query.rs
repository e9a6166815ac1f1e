//! A single probe query against a TAP service.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{Status, TapService};
use crate::votable::TableView;

static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Query`]. Clones share the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId(u64);

impl QueryId {
    fn next() -> Self {
        Self(NEXT_QUERY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// An ADQL query addressed to a TAP service, and its result once known.
///
/// The status is derived: [`Status::Pending`] until a result is attached,
/// the result's status afterwards.
#[derive(Debug, Clone)]
pub struct Query {
    id: QueryId,
    query_text: String,
    schema_name: String,
    table_name: String,
    service: Arc<TapService>,
    result: Option<TableView>,
}

impl Query {
    /// Creates a query that is not tied to a particular schema or table.
    pub fn new(query_text: impl Into<String>, service: Arc<TapService>) -> Self {
        Self::for_table(query_text, "", "", service)
    }

    /// Creates a query probing `schema_name.table_name`.
    pub fn for_table(
        query_text: impl Into<String>,
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
        service: Arc<TapService>,
    ) -> Self {
        Self {
            id: QueryId::next(),
            query_text: query_text.into(),
            schema_name: schema_name.into(),
            table_name: table_name.into(),
            service,
            result: None,
        }
    }

    pub fn id(&self) -> QueryId {
        self.id
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn service(&self) -> &Arc<TapService> {
        &self.service
    }

    pub fn result(&self) -> Option<&TableView> {
        self.result.as_ref()
    }

    pub fn status(&self) -> Status {
        self.result
            .as_ref()
            .map(TableView::status)
            .unwrap_or(Status::Pending)
    }

    /// Attaches the result of running this query, replacing any previous one.
    pub fn attach_result(&mut self, result: TableView) {
        self.result = Some(result);
    }

    /// Moves an attached result to `status`, recording why.
    ///
    /// Has no effect on a query without a result: a pending query can only
    /// leave that state through [`Query::attach_result`].
    pub fn mark(&mut self, status: Status, message: impl Into<String>) {
        if let Some(result) = self.result.as_mut() {
            result.set_status(status);
            result.push_message(message);
        }
    }

    /// Diagnostic messages of the attached result.
    pub fn messages(&self) -> &[String] {
        self.result.as_ref().map(TableView::messages).unwrap_or(&[])
    }
}
