//! Outcome status of a query or a validation check.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TapError;

/// The status of a query or of an aggregated validation.
///
/// A query starts as `Pending` and moves to exactly one of the other
/// variants. The aggregate status of a validation run is the most severe
/// status among its queries, see [`Status::severity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// No result attached yet
    #[default]
    Pending,
    /// The query ran and its result passed every check
    Success,
    /// The service could not be reached, errored, or returned garbage
    Fail,
    /// The service answered but flagged the result as incomplete (overflow)
    Truncated,
    /// The result's columns do not match the TAP_SCHEMA declaration
    ColumnValidationFail,
}

impl Status {
    /// All statuses, in declaration order.
    pub const ALL: [Status; 5] = [
        Status::Pending,
        Status::Success,
        Status::Fail,
        Status::Truncated,
        Status::ColumnValidationFail,
    ];

    /// Rank used when aggregating: `Fail > Truncated > ColumnValidationFail >
    /// Success > Pending`.
    pub fn severity(&self) -> u8 {
        match self {
            Status::Pending => 0,
            Status::Success => 1,
            Status::ColumnValidationFail => 2,
            Status::Truncated => 3,
            Status::Fail => 4,
        }
    }

    /// Returns the more severe of two statuses.
    pub fn most_severe(self, other: Status) -> Status {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    /// Returns true for the terminal failure states.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Status::Fail | Status::Truncated | Status::ColumnValidationFail
        )
    }

    /// Returns true if this is the Success status.
    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }

    /// The canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Success => "SUCCESS",
            Status::Fail => "FAIL",
            Status::Truncated => "TRUNCATED",
            Status::ColumnValidationFail => "COLUMN_VALIDATION_FAIL",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = TapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| TapError::Parse(format!("'{s}' is not a valid Status")))
    }
}
