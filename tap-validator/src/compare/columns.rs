use std::collections::HashMap;
use std::fmt;
use tracing::error;

use super::engine::DatabaseEngine;
use super::Comparator;
use crate::error::{Result, TapError};
use crate::votable::TableView;

/// The first column whose served datatype differs from its declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMismatch {
    pub column: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for ColumnMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Column '{}': expected {} got {} instead",
            self.column, self.expected, self.actual
        )
    }
}

/// Checks the FIELDs of a query result against the columns declared for its
/// table in TAP_SCHEMA.columns.
///
/// `actual` is the sample-row result; `expected` is the answer to the columns
/// query, one `(column_name, datatype)` row per column. Declared datatypes are
/// normalized through the [`DatabaseEngine`] before comparison.
#[derive(Debug, Clone, Default)]
pub struct ColumnComparator {
    engine: DatabaseEngine,
    table: String,
}

impl ColumnComparator {
    pub fn new(engine: DatabaseEngine) -> Self {
        Self {
            engine,
            table: String::new(),
        }
    }

    /// Names the table being checked, for error reporting.
    pub fn for_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Returns the first mismatching column, or `None` if every column of
    /// `actual` matches its declaration.
    ///
    /// # Errors
    ///
    /// [`TapError::MissingTable`] if either side has no parsed table, and
    /// [`TapError::ColumnNotDeclared`] for a result column that TAP_SCHEMA
    /// does not list.
    pub fn check(&self, actual: &TableView, expected: &TableView) -> Result<Option<ColumnMismatch>> {
        let actual_table = actual.table().ok_or_else(|| TapError::MissingTable {
            role: "actual".to_string(),
        })?;
        let expected_table = expected.table().ok_or_else(|| TapError::MissingTable {
            role: "expected".to_string(),
        })?;

        let declared: HashMap<&str, &str> = expected_table
            .rows()
            .iter()
            .filter_map(|row| match row.as_slice() {
                [name, datatype, ..] => Some((name.as_str(), datatype.as_str())),
                _ => None,
            })
            .collect();

        for field in actual_table.fields() {
            let column = field.identifier();
            let declared_type = declared.get(column).ok_or_else(|| TapError::ColumnNotDeclared {
                column: column.to_string(),
                table: self.table.clone(),
            })?;
            let expected_type = self.engine.convert_type(declared_type);
            if expected_type != field.datatype {
                error!(
                    table = %self.table,
                    column = %column,
                    "Expected {expected_type} got {} instead",
                    field.datatype
                );
                return Ok(Some(ColumnMismatch {
                    column: column.to_string(),
                    expected: expected_type.to_string(),
                    actual: field.datatype.clone(),
                }));
            }
        }
        Ok(None)
    }
}

impl Comparator for ColumnComparator {
    fn compare(&self, actual: &TableView, expected: &TableView) -> Result<bool> {
        Ok(self.check(actual, expected)?.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{columns_votable, votable_xml};

    fn actual(fields: &[(&str, &str)]) -> TableView {
        TableView::parse(votable_xml(fields, &[]))
    }

    fn expected(columns: &[(&str, &str)]) -> TableView {
        TableView::parse(columns_votable(columns))
    }

    #[test]
    fn test_matching_columns() {
        let comparator = ColumnComparator::new(DatabaseEngine::Default);
        let result = comparator.compare(
            &actual(&[("ra", "double"), ("name", "char")]),
            &expected(&[("name", "char"), ("ra", "double")]),
        );
        assert!(result.unwrap());
    }

    #[test]
    fn test_mismatch_is_reported() {
        let comparator = ColumnComparator::new(DatabaseEngine::Default).for_table("Filter");
        let mismatch = comparator
            .check(
                &actual(&[("filterID", "int"), ("name", "char")]),
                &expected(&[("filterID", "long"), ("name", "char")]),
            )
            .unwrap()
            .unwrap();
        assert_eq!(mismatch.column, "filterID");
        assert_eq!(mismatch.expected, "long");
        assert_eq!(mismatch.actual, "int");
        assert_eq!(mismatch.to_string(), "Column 'filterID': expected long got int instead");
    }

    #[test]
    fn test_first_mismatch_short_circuits() {
        let comparator = ColumnComparator::new(DatabaseEngine::Default);
        let mismatch = comparator
            .check(
                &actual(&[("a", "int"), ("b", "int")]),
                &expected(&[("a", "char"), ("b", "char")]),
            )
            .unwrap()
            .unwrap();
        assert_eq!(mismatch.column, "a");
    }

    #[test]
    fn test_mssql_normalization() {
        let comparator = ColumnComparator::new(DatabaseEngine::Mssql);
        let result = comparator.compare(
            &actual(&[("id", "long"), ("mag", "float"), ("name", "char")]),
            &expected(&[("id", "BIGINT"), ("mag", "REAL"), ("name", "adql:VARCHAR")]),
        );
        assert!(result.unwrap());
    }

    #[test]
    fn test_undeclared_column_is_an_error() {
        let comparator = ColumnComparator::new(DatabaseEngine::Default).for_table("Filter");
        let err = comparator
            .compare(&actual(&[("ra", "double")]), &expected(&[("dec", "double")]))
            .unwrap_err();
        assert!(matches!(
            err,
            TapError::ColumnNotDeclared { ref column, ref table } if column == "ra" && table == "Filter"
        ));
    }

    #[test]
    fn test_missing_tables_are_errors() {
        let comparator = ColumnComparator::new(DatabaseEngine::Default);
        let failed = TableView::failed("boom");
        assert!(matches!(
            comparator.compare(&failed, &expected(&[])),
            Err(TapError::MissingTable { ref role }) if role == "actual"
        ));
        assert!(matches!(
            comparator.compare(&actual(&[]), &failed),
            Err(TapError::MissingTable { ref role }) if role == "expected"
        ));
    }

    #[test]
    fn test_no_fields_is_a_match() {
        let comparator = ColumnComparator::new(DatabaseEngine::Default);
        assert!(comparator.compare(&actual(&[]), &expected(&[])).unwrap());
    }
}
