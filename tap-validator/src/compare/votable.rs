use super::Comparator;
use crate::error::Result;
use crate::votable::TableView;

/// Compares two query results cell by cell, then field by field.
///
/// Columns are compared by position; no realignment by name is attempted.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoTableComparator;

impl VoTableComparator {
    pub fn new() -> Self {
        Self
    }

    /// Returns true when both results hold the same table.
    ///
    /// Two empty payloads are equal, as are two payloads that both failed to
    /// yield a table. A table never equals the absence of one.
    pub fn tables_match(&self, a: &TableView, b: &TableView) -> bool {
        if a.data().is_empty() && b.data().is_empty() {
            return true;
        }
        let (first, second) = match (a.table(), b.table()) {
            (None, None) => return true,
            (Some(first), Some(second)) => (first, second),
            _ => return false,
        };

        if first.row_count() != second.row_count() {
            return false;
        }
        let cells_match = first
            .rows()
            .iter()
            .zip(second.rows())
            .all(|(r1, r2)| r1 == r2);
        if !cells_match {
            return false;
        }

        first.fields().len() == second.fields().len()
            && first
                .fields()
                .iter()
                .zip(second.fields())
                .all(|(f1, f2)| f1.identifier() == f2.identifier() && f1.datatype == f2.datatype)
    }
}

impl Comparator for VoTableComparator {
    fn compare(&self, actual: &TableView, expected: &TableView) -> Result<bool> {
        Ok(self.tables_match(actual, expected))
    }
}
