//! Pre-execution gate for read-only SQL.
//!
//! Applied to every statement regardless of origin (renderer output or
//! hand-written SQL). Two rules: no multi-statement execution, and no
//! mutating keywords. Keyword matching is word-boundary aware so that
//! identifiers like `CREATED_AT` or literals like `'%UPDATED%'` never
//! trigger a false rejection.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{QueryError, QueryResult};

/// SQL statement keywords that are never allowed through.
pub const DANGEROUS_KEYWORDS: &[&str] = &[
    "DROP", "DELETE", "UPDATE", "INSERT", "CREATE", "ALTER", "TRUNCATE", "REPLACE", "MERGE",
    "GRANT", "REVOKE",
];

static KEYWORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({})\b", DANGEROUS_KEYWORDS.join("|")))
        .expect("keyword pattern is valid")
});

/// Reject SQL that is not a single read-only statement.
///
/// One trailing `;` is tolerated; any other `;` fails as multi-statement.
/// A `;` inside a string literal is rejected too — the gate is textual and
/// errs on the side of refusing.
pub fn validate(sql: &str) -> QueryResult<()> {
    let trimmed = sql.trim();
    let body = trimmed.strip_suffix(';').unwrap_or(trimmed);

    if body.contains(';') {
        return Err(QueryError::multiple_statements());
    }

    if let Some(found) = KEYWORD_PATTERN.find(body) {
        return Err(QueryError::dangerous_keyword(found.as_str()));
    }

    Ok(())
}
