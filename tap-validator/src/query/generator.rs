use futures::stream::{self, Stream, StreamExt};
use rand::seq::IndexedRandom;
use std::sync::Arc;
use tracing::{debug, warn};

use super::builder::QueryBuilder;
use crate::dispatch::Dispatcher;
use crate::model::{Query, TapService};

/// Produces the sample-row queries that probe a service's tables.
///
/// The catalog is walked through the service itself: the schema list first,
/// then the table list of each schema. Catalog queries that fail contribute
/// nothing, so an unreachable service yields an empty sequence.
pub struct QueryGenerator<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> QueryGenerator<'a> {
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Returns a lazy stream of sample-row queries for `service`.
    ///
    /// No request is made until the stream is polled, and every call starts a
    /// fresh walk of the catalog. With `fullscan` every table of every schema
    /// is probed; otherwise one table per schema, chosen uniformly at random.
    pub fn generate(
        &self,
        service: Arc<TapService>,
        fullscan: bool,
    ) -> impl Stream<Item = Query> + Send + 'a {
        let dispatcher = self.dispatcher;

        stream::once(async move {
            let schemas = dispatcher.run(QueryBuilder::schemas(&service)).await;
            let names = first_column(&schemas);
            debug!(service = %service, schemas = names.len(), "Discovered schemas");
            (service, names)
        })
        .flat_map(|(service, names)| {
            stream::iter(names.into_iter().map(move |name| (Arc::clone(&service), name)))
        })
        .then(move |(service, schema)| async move {
            let tables = dispatcher.run(QueryBuilder::tables(&schema, &service)).await;
            let names = first_column(&tables);
            debug!(schema = %schema, tables = names.len(), "Discovered tables");
            select_tables(names, fullscan)
                .iter()
                .map(|table| QueryBuilder::sample_row(table, &schema, &service))
                .collect::<Vec<_>>()
        })
        .flat_map(stream::iter)
    }

    /// Drains [`QueryGenerator::generate`] into a vector.
    pub async fn collect(&self, service: Arc<TapService>, fullscan: bool) -> Vec<Query> {
        self.generate(service, fullscan).collect().await
    }
}

/// Values of the first column of a catalog query's result. Empty when the
/// query failed or returned no table.
fn first_column(query: &Query) -> Vec<String> {
    let Some(result) = query.result() else {
        return Vec::new();
    };
    if !result.status().is_success() {
        warn!(
            query = %query.query_text(),
            status = %result.status(),
            messages = ?result.messages(),
            "Catalog query failed"
        );
        return Vec::new();
    }
    result
        .table()
        .map(|table| table.column(0).map(str::to_string).collect())
        .unwrap_or_default()
}

fn select_tables(mut names: Vec<String>, fullscan: bool) -> Vec<String> {
    if fullscan {
        return names;
    }
    match names.choose(&mut rand::rng()) {
        Some(choice) => vec![choice.clone()],
        None => {
            names.clear();
            names
        }
    }
}
