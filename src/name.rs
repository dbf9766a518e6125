//! Lock identity resolution.
//!
//! The named lock protects one logical resource per database, derived from the
//! schema and table the migration bookkeeping lives in. Independent processes
//! must resolve identical configuration to the identical name so they contend
//! on the same server-side resource.

use std::fmt;

/// Resolved, case-normalized name of the session lock resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockName(String);

impl LockName {
    /// Derive the lock name from a schema and table pair.
    ///
    /// Pure and deterministic: the concatenation `schema.table` uppercased.
    /// Inputs are not validated; malformed inputs propagate as a malformed
    /// name, which the server will simply never match.
    pub fn resolve(schema: &str, table: &str) -> Self {
        Self(format!("{schema}.{table}").to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for LockName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_concatenates_schema_and_table_uppercased() {
        let name = LockName::resolve("dbo", "DatabaseChangeLogLock");
        assert_eq!(name.as_str(), "DBO.DATABASECHANGELOGLOCK");
    }

    #[test]
    fn resolve_is_case_insensitive_over_inputs() {
        assert_eq!(
            LockName::resolve("dbo", "LOCK"),
            LockName::resolve("DBO", "lock")
        );
    }

    #[test]
    fn resolve_is_deterministic_across_calls() {
        let a = LockName::resolve("migrations", "changelog_lock");
        let b = LockName::resolve("migrations", "changelog_lock");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.as_str());
    }
}
