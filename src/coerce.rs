//! Argument coercion into bound values.
//!
//! Each template parameter declares the storage shape of the column it binds
//! against; coercion turns the caller's raw JSON argument into the matching
//! [`BindValue`] or fails with a typed error. Pure functions over the static
//! lookup tables.

use serde_json::Value as Json;

use crate::error::{QueryError, QueryResult};
use crate::lookup::CodeTable;
use crate::value::BindValue;

/// Declared storage shape of the column a parameter binds against.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Native integer column.
    Integer,
    /// Fixed-width zero-padded text code of the given width.
    ZeroPadded(usize),
    /// Free-text substring search. The value is wrapped with `%` and bound;
    /// LIKE metacharacters inside it are not escaped. Binding neutralizes
    /// them for statement structure but not for wildcard semantics.
    LikePattern,
    /// Name resolved to a fixed-width code through a lookup table.
    Lookup(&'static CodeTable),
}

/// Convert a raw argument into the bound value for its declared field kind.
pub fn coerce(param: &str, kind: FieldKind, raw: &Json) -> QueryResult<BindValue> {
    match kind {
        FieldKind::Integer => coerce_integer(param, raw),
        FieldKind::ZeroPadded(width) => {
            let text = raw_text(param, raw)?;
            zero_pad(param, &text, width)
        }
        FieldKind::LikePattern => {
            let text = raw_text(param, raw)?;
            Ok(BindValue::Text(format!("%{text}%")))
        }
        FieldKind::Lookup(table) => {
            let text = raw_text(param, raw)?;
            table.resolve(&text).map(|code| BindValue::from(code))
        }
    }
}

/// Parse an integer argument. Strings must be digits with an optional leading
/// minus sign; anything else is rejected so a numeric-looking field can never
/// smuggle SQL text.
fn coerce_integer(param: &str, raw: &Json) -> QueryResult<BindValue> {
    match raw {
        Json::Number(n) => n
            .as_i64()
            .map(BindValue::Int)
            .ok_or_else(|| QueryError::invalid(param, format!("'{n}' is not an integer"))),
        Json::String(s) => {
            let digits = s.strip_prefix('-').unwrap_or(s);
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(QueryError::invalid(
                    param,
                    format!("'{s}' is not an integer"),
                ));
            }
            s.parse::<i64>()
                .map(BindValue::Int)
                .map_err(|_| QueryError::invalid(param, format!("'{s}' is out of integer range")))
        }
        other => Err(QueryError::invalid(
            param,
            format!("expected an integer, got {}", json_type_name(other)),
        )),
    }
}

/// Left-pad a code with zeros to the declared width.
fn zero_pad(param: &str, text: &str, width: usize) -> QueryResult<BindValue> {
    if text.chars().count() > width {
        return Err(QueryError::invalid(
            param,
            format!("'{text}' is longer than {width} characters"),
        ));
    }
    Ok(BindValue::Text(format!("{text:0>width$}")))
}

/// Extract the textual form of an argument. Integral JSON numbers are
/// accepted so callers may pass `2020` where a year string is expected.
fn raw_text(param: &str, raw: &Json) -> QueryResult<String> {
    match raw {
        Json::String(s) => Ok(s.clone()),
        Json::Number(n) if n.is_i64() => Ok(n.to_string()),
        other => Err(QueryError::invalid(
            param,
            format!("expected a string, got {}", json_type_name(other)),
        )),
    }
}

fn json_type_name(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::all_venues;
    use serde_json::json;

    #[test]
    fn test_integer_from_number() {
        assert_eq!(
            coerce("ninki", FieldKind::Integer, &json!(1)).unwrap(),
            BindValue::Int(1)
        );
    }

    #[test]
    fn test_integer_from_digit_string() {
        assert_eq!(
            coerce("year_from", FieldKind::Integer, &json!("2020")).unwrap(),
            BindValue::Int(2020)
        );
        assert_eq!(
            coerce("delta", FieldKind::Integer, &json!("-3")).unwrap(),
            BindValue::Int(-3)
        );
    }

    #[test]
    fn test_integer_rejects_non_numeric() {
        let err = coerce("ninki", FieldKind::Integer, &json!("abc")).unwrap_err();
        assert!(matches!(err, QueryError::InvalidParameter { .. }));

        // Injection through a numeric-looking field
        let err = coerce("ninki", FieldKind::Integer, &json!("1 OR 1=1")).unwrap_err();
        assert!(matches!(err, QueryError::InvalidParameter { .. }));

        let err = coerce("ninki", FieldKind::Integer, &json!(1.5)).unwrap_err();
        assert!(matches!(err, QueryError::InvalidParameter { .. }));
    }

    #[test]
    fn test_zero_padded() {
        assert_eq!(
            coerce("jyo_cd", FieldKind::ZeroPadded(2), &json!("5")).unwrap(),
            BindValue::from("05")
        );
        assert_eq!(
            coerce("jyo_cd", FieldKind::ZeroPadded(2), &json!("05")).unwrap(),
            BindValue::from("05")
        );
        assert_eq!(
            coerce("month_day", FieldKind::ZeroPadded(4), &json!(101)).unwrap(),
            BindValue::from("0101")
        );
    }

    #[test]
    fn test_zero_padded_rejects_overlong() {
        let err = coerce("jyo_cd", FieldKind::ZeroPadded(2), &json!("123")).unwrap_err();
        assert!(matches!(err, QueryError::InvalidParameter { .. }));
    }

    #[test]
    fn test_like_pattern_wraps_value() {
        assert_eq!(
            coerce("horse_name", FieldKind::LikePattern, &json!("ディープ")).unwrap(),
            BindValue::from("%ディープ%")
        );
        // Quotes stay in the bound value, never in the SQL text
        assert_eq!(
            coerce("horse_name", FieldKind::LikePattern, &json!("x'; DROP--")).unwrap(),
            BindValue::from("%x'; DROP--%")
        );
    }

    #[test]
    fn test_lookup_resolves_code() {
        assert_eq!(
            coerce("venue", FieldKind::Lookup(all_venues()), &json!("東京")).unwrap(),
            BindValue::from("05")
        );
    }

    #[test]
    fn test_lookup_unknown_name() {
        let err = coerce("venue", FieldKind::Lookup(all_venues()), &json!("豊橋")).unwrap_err();
        assert!(matches!(err, QueryError::UnknownName { .. }));
    }
}
