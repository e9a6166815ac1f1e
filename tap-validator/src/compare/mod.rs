//! Comparison of query results against a declaration or another result.

mod columns;
mod engine;
mod votable;

pub use columns::{ColumnComparator, ColumnMismatch};
pub use engine::DatabaseEngine;
pub use votable::VoTableComparator;

use crate::error::Result;
use crate::votable::TableView;

/// Decides whether an actual result agrees with an expected one.
pub trait Comparator {
    /// Returns `Ok(true)` on agreement and `Ok(false)` on a mismatch. Errors
    /// are reserved for inputs that cannot be compared at all.
    fn compare(&self, actual: &TableView, expected: &TableView) -> Result<bool>;
}
