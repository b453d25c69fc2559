//! Bound parameter values.

use serde::Serialize;

/// A scalar passed alongside SQL text to a parameterized execution API.
///
/// Values are always bound, never concatenated into the SQL string. The two
/// variants mirror the JVLink schema after its partial migration: native
/// integers and fixed-width text codes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BindValue {
    Int(i64),
    Text(String),
}

impl BindValue {
    /// Integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            BindValue::Int(n) => Some(*n),
            BindValue::Text(_) => None,
        }
    }

    /// Text payload, if this is a `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            BindValue::Int(_) => None,
            BindValue::Text(s) => Some(s),
        }
    }
}

impl std::fmt::Display for BindValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindValue::Int(n) => write!(f, "{}", n),
            BindValue::Text(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<i64> for BindValue {
    fn from(n: i64) -> Self {
        BindValue::Int(n)
    }
}

impl From<i32> for BindValue {
    fn from(n: i32) -> Self {
        BindValue::Int(n as i64)
    }
}

impl From<&str> for BindValue {
    fn from(s: &str) -> Self {
        BindValue::Text(s.to_string())
    }
}

impl From<String> for BindValue {
    fn from(s: String) -> Self {
        BindValue::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(BindValue::Int(5).as_int(), Some(5));
        assert_eq!(BindValue::Int(5).as_text(), None);
        assert_eq!(BindValue::from("05").as_text(), Some("05"));
    }

    #[test]
    fn test_display() {
        assert_eq!(BindValue::Int(2020).to_string(), "2020");
        assert_eq!(BindValue::from("05").to_string(), "'05'");
    }

    #[test]
    fn test_serialize_untagged() {
        assert_eq!(serde_json::to_string(&BindValue::Int(1)).unwrap(), "1");
        assert_eq!(
            serde_json::to_string(&BindValue::from("05")).unwrap(),
            "\"05\""
        );
    }
}
