//! Optional parameters to SQL predicate fragments.
//!
//! A condition slot expands to `AND <column> <op> ?` plus one bound value
//! when its parameter is supplied, and to the empty string otherwise.
//! Condition parameters are independent of each other.

use serde_json::Value as Json;

use crate::coerce::{coerce, FieldKind};
use crate::error::QueryResult;
use crate::value::BindValue;

/// Comparison operator used by a condition fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CondOp {
    Eq,
    Ge,
    Like,
}

impl CondOp {
    /// The SQL symbol for this operator.
    pub fn sql_symbol(&self) -> &'static str {
        match self {
            CondOp::Eq => "=",
            CondOp::Ge => ">=",
            CondOp::Like => "LIKE",
        }
    }
}

/// How a declared parameter maps into the template body.
#[derive(Debug, Clone, Copy)]
pub enum Binding {
    /// Scalar slot named after the parameter, substituted with `?` plus one
    /// bound value.
    Scalar(FieldKind),
    /// Optional predicate slot. Expands via [`build_condition`] when the
    /// parameter is supplied, or to the empty string when absent.
    Condition {
        slot: &'static str,
        column: &'static str,
        op: CondOp,
        kind: FieldKind,
    },
}

impl Binding {
    /// The slot name this binding fills. Scalar bindings use the parameter's
    /// own name, which the catalog passes in.
    pub fn slot_name(&self, param: &'static str) -> &'static str {
        match self {
            Binding::Scalar(_) => param,
            Binding::Condition { slot, .. } => slot,
        }
    }
}

/// Build the predicate fragment and bound value for a supplied condition
/// parameter. The fragment only ever contains a `?` placeholder; the value
/// itself travels out-of-band.
pub fn build_condition(
    param: &str,
    column: &str,
    op: CondOp,
    kind: FieldKind,
    raw: &Json,
) -> QueryResult<(String, BindValue)> {
    let value = coerce(param, kind, raw)?;
    Ok((format!("AND {} {} ?", column, op.sql_symbol()), value))
}
