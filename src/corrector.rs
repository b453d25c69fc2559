//! Best-effort correction of hand-written SQL against the current schema.
//!
//! Part of the JVLink schema migrated from zero-padded text codes to native
//! integers; the rest kept its fixed-width codes. SQL written from memory of
//! the old schema compares the wrong way on both halves. The corrector
//! rewrites the two known mistake patterns and reports every rewrite.
//!
//! This is a textual, regex-driven pass over a fixed rule set. It does not
//! parse SQL, so a string literal that happens to contain `Ninki = '1'` will
//! be rewritten too. Known precision/recall tradeoff; the safety validator
//! still gates everything afterwards.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// Columns still stored as fixed-width zero-padded text, with their widths.
pub const ZERO_PADDED_COLUMNS: &[(&str, usize)] =
    &[("JyoCD", 2), ("Umaban", 2), ("MonthDay", 4)];

/// Columns migrated from zero-padded text to native integers.
pub const INTEGER_COLUMNS: &[&str] = &["Ninki", "KakuteiJyuni", "Year", "Kyori", "Wakuban"];

/// One rewrite applied by the corrector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correction {
    pub column: &'static str,
    pub matched: String,
    pub replacement: String,
    pub message: String,
}

struct PadRule {
    column: &'static str,
    width: usize,
    eq: Regex,
    in_clause: Regex,
}

struct IntRule {
    column: &'static str,
    eq: Regex,
    in_clause: Regex,
}

static PAD_RULES: LazyLock<Vec<PadRule>> = LazyLock::new(|| {
    ZERO_PADDED_COLUMNS
        .iter()
        .map(|&(column, width)| PadRule {
            column,
            width,
            eq: column_eq_pattern(column),
            in_clause: column_in_pattern(column),
        })
        .collect()
});

static INT_RULES: LazyLock<Vec<IntRule>> = LazyLock::new(|| {
    INTEGER_COLUMNS
        .iter()
        .map(|&column| IntRule {
            column,
            eq: column_eq_pattern(column),
            in_clause: column_in_pattern(column),
        })
        .collect()
});

static QUOTED_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'(\d+)'").expect("quoted number pattern is valid"));

fn column_eq_pattern(column: &str) -> Regex {
    Regex::new(&format!(r"(?i)(\b{column}\s*=\s*)'(\d+)'"))
        .expect("column equality pattern is valid")
}

fn column_in_pattern(column: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b({column})\s+IN\s*\(([^)]*)\)"))
        .expect("column IN pattern is valid")
}

/// Applies the fixed rewrite rules and collects the corrections made.
#[derive(Debug, Default)]
pub struct QueryCorrector {
    corrections: Vec<Correction>,
}

impl QueryCorrector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite the SQL. Running the result through `correct` again yields no
    /// further corrections.
    pub fn correct(&mut self, sql: &str) -> String {
        self.corrections.clear();
        let mut corrected = sql.to_string();

        for rule in PAD_RULES.iter() {
            corrected = self.apply_padding(&corrected, rule);
        }
        for rule in INT_RULES.iter() {
            corrected = self.apply_unquoting(&corrected, rule);
        }

        corrected
    }

    /// Corrections recorded by the last `correct` call.
    pub fn corrections(&self) -> &[Correction] {
        &self.corrections
    }

    fn apply_padding(&mut self, sql: &str, rule: &PadRule) -> String {
        let corrections = &mut self.corrections;

        let sql = rule.eq.replace_all(sql, |caps: &regex::Captures| {
            let value = &caps[2];
            if value.len() >= rule.width {
                return caps[0].to_string();
            }
            let padded = format!("{value:0>width$}", width = rule.width);
            record(
                corrections,
                rule.column,
                value,
                &padded,
                format!(
                    "{} = '{}' corrected to '{}' (zero-padded text column)",
                    rule.column, value, padded
                ),
            );
            format!("{}'{}'", &caps[1], padded)
        });

        rule.in_clause
            .replace_all(&sql, |caps: &regex::Captures| {
                let inner = QUOTED_NUMBER.replace_all(&caps[2], |vcaps: &regex::Captures| {
                    let value = &vcaps[1];
                    if value.len() >= rule.width {
                        return vcaps[0].to_string();
                    }
                    let padded = format!("{value:0>width$}", width = rule.width);
                    record(
                        corrections,
                        rule.column,
                        value,
                        &padded,
                        format!(
                            "{} IN value '{}' corrected to '{}'",
                            rule.column, value, padded
                        ),
                    );
                    format!("'{padded}'")
                });
                format!("{} IN ({})", &caps[1], inner)
            })
            .into_owned()
    }

    fn apply_unquoting(&mut self, sql: &str, rule: &IntRule) -> String {
        let corrections = &mut self.corrections;

        let sql = rule.eq.replace_all(sql, |caps: &regex::Captures| {
            let value = &caps[2];
            record(
                corrections,
                rule.column,
                &format!("'{value}'"),
                value,
                format!(
                    "{} = '{}' corrected to {} (integer column)",
                    rule.column, value, value
                ),
            );
            format!("{}{}", &caps[1], value)
        });

        rule.in_clause
            .replace_all(&sql, |caps: &regex::Captures| {
                let inner = QUOTED_NUMBER.replace_all(&caps[2], |vcaps: &regex::Captures| {
                    let value = &vcaps[1];
                    record(
                        corrections,
                        rule.column,
                        &format!("'{value}'"),
                        value,
                        format!("{} IN value '{}' corrected to {}", rule.column, value, value),
                    );
                    value.to_string()
                });
                format!("{} IN ({})", &caps[1], inner)
            })
            .into_owned()
    }
}

/// Each rewrite is recorded once, deduplicated by message.
fn record(
    corrections: &mut Vec<Correction>,
    column: &'static str,
    matched: &str,
    replacement: &str,
    message: String,
) {
    if corrections.iter().any(|c| c.message == message) {
        return;
    }
    debug!(column, matched, replacement, "corrected SQL literal");
    corrections.push(Correction {
        column,
        matched: matched.to_string(),
        replacement: replacement.to_string(),
        message,
    });
}

/// Rewrite hand-written SQL and return the corrections that were applied.
pub fn correct(sql: &str) -> (String, Vec<Correction>) {
    let mut corrector = QueryCorrector::new();
    let corrected = corrector.correct(sql);
    (corrected, corrector.corrections)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jyocd_zero_padding() {
        let (sql, corrections) = correct("SELECT * FROM NL_SE WHERE JyoCD = '5'");
        assert!(sql.contains("JyoCD = '05'"));
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].column, "JyoCD");
    }

    #[test]
    fn test_already_padded_untouched() {
        let input = "SELECT * FROM NL_SE WHERE JyoCD = '05'";
        let (sql, corrections) = correct(input);
        assert_eq!(sql, input);
        assert!(corrections.is_empty());
    }

    #[test]
    fn test_integer_column_unquoted() {
        let (sql, corrections) = correct("SELECT * FROM NL_SE WHERE Ninki = '1'");
        assert!(sql.contains("Ninki = 1"));
        assert!(!sql.contains("'1'"));
        assert_eq!(corrections.len(), 1);
    }

    #[test]
    fn test_multiple_integer_columns() {
        let (sql, corrections) =
            correct("SELECT * FROM NL_SE WHERE Ninki = '1' AND KakuteiJyuni = '3'");
        assert!(sql.contains("Ninki = 1"));
        assert!(sql.contains("KakuteiJyuni = 3"));
        assert_eq!(corrections.len(), 2);
    }

    #[test]
    fn test_year_unquoted() {
        let (sql, _) = correct("SELECT * FROM NL_SE WHERE Year = '2024'");
        assert!(sql.contains("Year = 2024"));
    }

    #[test]
    fn test_in_clause_padding() {
        let (sql, corrections) = correct("SELECT * FROM NL_SE WHERE JyoCD IN ('5', '6')");
        assert!(sql.contains("'05'"));
        assert!(sql.contains("'06'"));
        assert_eq!(corrections.len(), 2);
    }

    #[test]
    fn test_in_clause_unquoting() {
        let (sql, corrections) = correct("SELECT * FROM NL_SE WHERE Ninki IN ('1', '2')");
        assert!(sql.contains("Ninki IN (1, 2)"));
        assert_eq!(corrections.len(), 2);
    }

    #[test]
    fn test_case_insensitive_column_match() {
        let (sql, corrections) = correct("SELECT * FROM NL_SE WHERE jyocd = '5'");
        assert!(sql.contains("jyocd = '05'"));
        assert_eq!(corrections.len(), 1);
    }

    #[test]
    fn test_no_corrections_needed() {
        let input = "SELECT * FROM NL_SE WHERE JyoCD = '05' AND Ninki = 1";
        let (sql, corrections) = correct(input);
        assert_eq!(sql, input);
        assert!(corrections.is_empty());
    }

    #[test]
    fn test_dedup_by_message() {
        let (_, corrections) =
            correct("SELECT * FROM NL_SE WHERE JyoCD = '5' OR JyoCD = '5'");
        assert_eq!(corrections.len(), 1);
    }

    #[test]
    fn test_idempotent() {
        let input = "SELECT * FROM NL_SE WHERE JyoCD IN ('5', '6') AND Ninki = '1' AND Year = '2024'";
        let (first, corrections) = correct(input);
        assert!(!corrections.is_empty());
        let (second, again) = correct(&first);
        assert_eq!(first, second);
        assert!(again.is_empty());
    }

    #[test]
    fn test_non_numeric_literal_untouched() {
        // MonthDay = 'abc' is not a numeric literal; leave it alone
        let input = "SELECT * FROM NL_RA WHERE MonthDay = 'abcd'";
        let (sql, corrections) = correct(input);
        assert_eq!(sql, input);
        assert!(corrections.is_empty());
    }

    #[test]
    fn test_monthday_padded_to_four() {
        let (sql, _) = correct("SELECT * FROM NL_RA WHERE MonthDay = '101'");
        assert!(sql.contains("MonthDay = '0101'"));
    }
}
