//! Boundary contract with the query-execution collaborator.
//!
//! The engine never touches a database. It hands a validated statement and
//! its ordered parameters to whatever implements [`QueryExecutor`]; the
//! `prepare*` functions are the only paths that produce such statements, so
//! everything crossing the boundary has passed the safety gate.

use crate::corrector::{correct, Correction};
use crate::error::QueryResult;
use crate::render::{render, Args, RenderedQuery};
use crate::safety::validate;
use crate::value::BindValue;

/// A parameterized-query execution API.
///
/// The engine guarantees that `sql` contains only positional `?`
/// placeholders whose count and left-to-right order match `params`, and that
/// `sql` has passed the safety validator.
pub trait QueryExecutor {
    type Row;
    type Error: std::error::Error;

    fn execute(&mut self, sql: &str, params: &[BindValue]) -> Result<Vec<Self::Row>, Self::Error>;
}

/// Render a catalog template and run the result through the safety gate.
pub fn prepare(name: &str, args: &Args) -> QueryResult<RenderedQuery> {
    let rendered = render(name, args)?;
    validate(&rendered.sql)?;
    Ok(rendered)
}

/// Correct hand-written SQL and run the result through the safety gate.
///
/// Returns the corrected statement and the list of corrections applied, so
/// the caller can report what changed.
pub fn prepare_raw(sql: &str) -> QueryResult<(String, Vec<Correction>)> {
    let (corrected, corrections) = correct(sql);
    validate(&corrected)?;
    Ok((corrected, corrections))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: serde_json::Value) -> Args {
        value.as_object().expect("test args are an object").clone()
    }

    #[test]
    fn test_prepare_renders_and_validates() {
        let q = prepare("favorite_win_rate", &args(json!({"ninki": 1}))).unwrap();
        assert_eq!(q.sql.matches('?').count(), q.params.len());
    }

    #[test]
    fn test_prepare_raw_corrects_then_gates() {
        let (sql, corrections) =
            prepare_raw("SELECT * FROM NL_SE WHERE Ninki = '1'").unwrap();
        assert!(sql.contains("Ninki = 1"));
        assert_eq!(corrections.len(), 1);
    }

    #[test]
    fn test_prepare_raw_rejects_mutations() {
        let err = prepare_raw("DELETE FROM NL_SE").unwrap_err();
        assert!(matches!(
            err,
            crate::error::QueryError::DangerousQuery { .. }
        ));
    }
}
