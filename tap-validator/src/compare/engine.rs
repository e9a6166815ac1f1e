//! Database-engine specific datatype normalization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Datatype prefix some services put on TAP_SCHEMA.columns entries.
const ADQL_PREFIX: &str = "adql:";

/// MSSQL column types and the VOTable primitive each is served as.
const MSSQL_TO_VOTABLE: &[(&str, &str)] = &[
    ("CHAR", "char"),
    ("INTEGER", "int"),
    ("REAL", "float"),
    ("BIGINT", "long"),
    ("SMALLINT", "short"),
    ("FLOAT", "float"),
    ("BINARY", "char"),
    ("VARBINARY", "char"),
    ("CLOB", "char"),
    ("TIMESTAMP", "char"),
    ("VARCHAR", "char"),
    ("DOUBLE", "float"),
    ("*", "char"),
];

/// The database engine behind the TAP service.
///
/// Decides how the datatypes declared in TAP_SCHEMA.columns translate to the
/// datatypes seen on result FIELDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DatabaseEngine {
    Mssql,
    /// Declared datatypes are compared verbatim
    #[default]
    Default,
}

impl DatabaseEngine {
    /// Parses an engine name. Anything other than `MSSQL` selects
    /// [`DatabaseEngine::Default`].
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("MSSQL") {
            DatabaseEngine::Mssql
        } else {
            DatabaseEngine::Default
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseEngine::Mssql => "MSSQL",
            DatabaseEngine::Default => "DEFAULT",
        }
    }

    /// Converts a declared column datatype to the VOTable datatype it is
    /// expected to appear as.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tap_validator::compare::DatabaseEngine;
    ///
    /// assert_eq!(DatabaseEngine::Mssql.convert_type("INTEGER"), "int");
    /// assert_eq!(DatabaseEngine::Mssql.convert_type("adql:VARCHAR"), "char");
    /// assert_eq!(DatabaseEngine::Default.convert_type("INTEGER"), "INTEGER");
    /// ```
    pub fn convert_type<'a>(&self, declared: &'a str) -> &'a str {
        match self {
            DatabaseEngine::Default => declared,
            DatabaseEngine::Mssql => {
                let bare = strip_prefix_ignore_case(declared.trim(), ADQL_PREFIX);
                MSSQL_TO_VOTABLE
                    .iter()
                    .find(|(sql, _)| sql.eq_ignore_ascii_case(bare))
                    .map(|(_, vo)| *vo)
                    .unwrap_or("char")
            }
        }
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> &'a str {
    match value.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => &value[prefix.len()..],
        _ => value,
    }
}

impl From<String> for DatabaseEngine {
    fn from(name: String) -> Self {
        DatabaseEngine::from_name(&name)
    }
}

impl From<DatabaseEngine> for String {
    fn from(engine: DatabaseEngine) -> Self {
        engine.as_str().to_string()
    }
}

impl fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
