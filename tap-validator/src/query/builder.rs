use std::sync::Arc;

use super::keywords::escape_identifier;
use crate::model::{Query, TapService};
use crate::security::AdqlSecurity;

/// Schema that holds the TAP catalog tables.
pub const TAP_SCHEMA: &str = "TAP_SCHEMA";

/// Builds the four query shapes used to probe a TAP service.
pub struct QueryBuilder;

impl QueryBuilder {
    /// Lists the schemas published by the service.
    pub fn schemas(service: &Arc<TapService>) -> Query {
        Query::for_table(
            "SELECT schema_name FROM TAP_SCHEMA.schemas",
            TAP_SCHEMA,
            "schemas",
            service.clone(),
        )
    }

    /// Lists the tables of one schema.
    pub fn tables(schema_name: &str, service: &Arc<TapService>) -> Query {
        Query::for_table(
            format!(
                "SELECT table_name FROM TAP_SCHEMA.tables WHERE schema_name='{}'",
                AdqlSecurity::escape_literal(schema_name)
            ),
            schema_name,
            "tables",
            service.clone(),
        )
    }

    /// Fetches a single row of a table. Reserved table names are quoted.
    pub fn sample_row(table_name: &str, schema_name: &str, service: &Arc<TapService>) -> Query {
        Query::for_table(
            format!("SELECT TOP 1 * FROM {}", escape_identifier(table_name)),
            schema_name,
            table_name,
            service.clone(),
        )
    }

    /// Lists the declared columns and datatypes of a table.
    pub fn columns(table_name: &str, schema_name: &str, service: &Arc<TapService>) -> Query {
        Query::for_table(
            format!(
                "SELECT column_name, datatype FROM TAP_SCHEMA.columns WHERE table_name='{}'",
                AdqlSecurity::escape_literal(table_name)
            ),
            schema_name,
            "columns",
            service.clone(),
        )
    }
}
