use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info, instrument};

use super::Validator;
use crate::compare::ColumnComparator;
use crate::dispatch::Dispatcher;
use crate::model::{Query, Status, TapService, ValidationKind, ValidationResult};
use crate::query::{QueryBuilder, QueryGenerator};
use crate::votable::TableView;

/// Probes every discovered table of a service with a sample-row query and
/// checks the served columns against TAP_SCHEMA.
///
/// A run has four phases, each finishing before the next starts:
/// 1. generate the sample-row queries from the catalog,
/// 2. send them all through the admission gate, then collect every result,
/// 3. fetch the declared columns of each table that answered and compare,
/// 4. record each query into the aggregate result, one at a time.
pub struct TableValidator {
    service: Arc<TapService>,
    dispatcher: Dispatcher,
    fullscan: bool,
}

impl TableValidator {
    pub fn new(service: Arc<TapService>, dispatcher: Dispatcher, fullscan: bool) -> Self {
        Self {
            service,
            dispatcher,
            fullscan,
        }
    }

    pub fn service(&self) -> &Arc<TapService> {
        &self.service
    }

    /// Runs the given queries and aggregates their outcomes. Useful when the
    /// queries come from somewhere other than the catalog walk.
    pub async fn validate_queries(&self, queries: Vec<Query>) -> ValidationResult {
        let max_in_flight = self.dispatcher.config().max_parallel_tasks();

        let tasks = self.dispatcher.send_all(queries, max_in_flight).await;
        let mut queries = self.dispatcher.collect_all(tasks).await;

        self.validate_columns(&mut queries).await;

        let mut result = ValidationResult::new(ValidationKind::Table);
        for query in queries {
            log_outcome(&query);
            result.record(query);
        }
        result.finish()
    }

    /// Compares the fields of every successful query against the columns
    /// declared for its table. Mismatches move the query to
    /// [`Status::ColumnValidationFail`].
    async fn validate_columns(&self, queries: &mut [Query]) {
        let successful: Vec<(usize, TableView)> = queries
            .iter()
            .enumerate()
            .filter_map(|(i, q)| q.result().map(|view| (i, view)))
            .filter(|(_, view)| view.status() == Status::Success)
            .map(|(i, view)| (i, view.clone()))
            .collect();
        if successful.is_empty() {
            return;
        }

        let column_queries = successful
            .iter()
            .map(|&(i, _)| {
                let q = &queries[i];
                QueryBuilder::columns(q.table_name(), q.schema_name(), &self.service)
            })
            .collect();
        let max_in_flight = self.dispatcher.config().max_parallel_tasks();
        let tasks = self.dispatcher.send_all(column_queries, max_in_flight).await;
        let declared = join_all(
            tasks
                .into_iter()
                .map(|mut task| async move { self.dispatcher.get_result(&mut task, true).await }),
        )
        .await;

        let engine = self.dispatcher.config().database_engine();
        for ((i, actual), expected) in successful.into_iter().zip(&declared) {
            let query = &mut queries[i];
            let comparator = ColumnComparator::new(engine).for_table(query.table_name());
            match comparator.check(&actual, expected) {
                Ok(None) => {}
                Ok(Some(mismatch)) => {
                    query.mark(Status::ColumnValidationFail, mismatch.to_string());
                }
                Err(e) => {
                    query.mark(Status::ColumnValidationFail, e.to_string());
                }
            }
        }
    }
}

fn log_outcome(query: &Query) {
    match query.status() {
        Status::Fail | Status::Truncated => {
            error!(
                query = %query.query_text(),
                schema = %query.schema_name(),
                status = %query.status(),
                "Query Failed [{}]",
                query.query_text()
            );
        }
        Status::ColumnValidationFail => {
            error!(
                query = %query.query_text(),
                schema = %query.schema_name(),
                error = %Status::ColumnValidationFail,
                "Validation Failed [{}] [Column Validation Error]",
                query.query_text()
            );
        }
        Status::Success | Status::Pending => {}
    }
}

#[async_trait]
impl Validator for TableValidator {
    fn name(&self) -> &str {
        "table"
    }

    #[instrument(skip(self), fields(service = %self.service, fullscan = self.fullscan))]
    async fn validate(&self) -> ValidationResult {
        let queries = QueryGenerator::new(&self.dispatcher)
            .collect(Arc::clone(&self.service), self.fullscan)
            .await;
        info!(queries = queries.len(), "Generated table queries");

        let result = self.validate_queries(queries).await;
        info!(status = %result.status(), failures = result.failures().len(), "Table validation finished");
        result
    }
}
