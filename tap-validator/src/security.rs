//! Credential handling and ADQL literal escaping.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secure string that automatically clears its contents when dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SecureString(String);

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureString(***)")
    }
}

impl SecureString {
    /// Create a new secure string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the string value. Use carefully and avoid storing the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Convert to a regular string. The SecureString will be zeroized.
    pub fn into_string(mut self) -> String {
        let value = std::mem::take(&mut self.0);
        self.0.zeroize();
        value
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Escaping helpers for values interpolated into catalog queries.
pub struct AdqlSecurity;

impl AdqlSecurity {
    /// Escapes a value for use inside a single-quoted ADQL string literal.
    ///
    /// Schema and table names come back from the service itself, so they are
    /// not hostile, but a name containing `'` would otherwise break the
    /// catalog query for that schema.
    ///
    /// # Examples
    /// ```rust
    /// use tap_validator::security::AdqlSecurity;
    ///
    /// assert_eq!(AdqlSecurity::escape_literal("BestDR1"), "BestDR1");
    /// assert_eq!(AdqlSecurity::escape_literal("o'brien"), "o''brien");
    /// ```
    pub fn escape_literal(value: &str) -> String {
        value.replace('\'', "''")
    }
}
