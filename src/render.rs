//! Template rendering: arguments in, `(sql, ordered bound parameters)` out.
//!
//! Slots are substituted by walking the template body left-to-right, and a
//! slot's bound values are appended at the position its `?` lands in the
//! final string. Binding order is therefore defined by slot position in the
//! body, never by the order arguments were supplied.

use std::collections::HashMap;

use serde_json::Value as Json;
use tracing::debug;

use crate::catalog::{catalog, TemplateDef};
use crate::coerce::coerce;
use crate::condition::{build_condition, Binding};
use crate::error::{QueryError, QueryResult};
use crate::value::BindValue;

/// Named arguments for a render call, as they arrive from a JSON tool layer.
pub type Args = serde_json::Map<String, Json>;

/// A rendered SQL statement with its ordered bound parameters.
///
/// Invariant: the number of `?` placeholders in `sql` equals `params.len()`,
/// and their left-to-right order matches the order of `params`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    pub sql: String,
    pub params: Vec<BindValue>,
}

/// Render a catalog template with the given arguments.
///
/// Fails before any SQL is assembled for return: unknown template, missing
/// required parameter, unknown argument name, or a value that does not
/// coerce. JSON `null` arguments are treated as absent.
pub fn render(name: &str, args: &Args) -> QueryResult<RenderedQuery> {
    let catalog = catalog();
    let Some(def) = catalog.get(name) else {
        return Err(QueryError::UnknownTemplate {
            name: name.to_string(),
            available: catalog.names(),
            suggestion: catalog.suggest(name),
        });
    };

    for spec in &def.params {
        if spec.required && supplied(args, spec.name).is_none() {
            return Err(QueryError::missing(spec.name, spec.description));
        }
    }

    for key in args.keys() {
        if def.param(key).is_none() {
            return Err(QueryError::invalid(
                key.as_str(),
                format!("not a parameter of template '{}'", def.name),
            ));
        }
    }

    let slots = fill_slots(def, args)?;
    let (sql, params) = substitute(def, &slots)?;
    let sql = strip_blank_lines(&sql);

    debug!(template = def.name, params = params.len(), "rendered template");
    Ok(RenderedQuery { sql, params })
}

/// The expansion of one slot: replacement text plus the values bound by it.
struct SlotFill {
    text: String,
    params: Vec<BindValue>,
}

impl SlotFill {
    fn empty() -> Self {
        Self {
            text: String::new(),
            params: Vec::new(),
        }
    }

    fn bound(text: impl Into<String>, value: BindValue) -> Self {
        Self {
            text: text.into(),
            params: vec![value],
        }
    }
}

fn fill_slots(def: &TemplateDef, args: &Args) -> QueryResult<HashMap<&'static str, SlotFill>> {
    let mut slots: HashMap<&'static str, SlotFill> = HashMap::new();

    // Supplied arguments and defaults first.
    for spec in &def.params {
        let raw = supplied(args, spec.name);
        match (&spec.binding, raw) {
            (Binding::Scalar(kind), Some(value)) => {
                let bound = coerce(spec.name, *kind, value)?;
                slots.insert(spec.slot(), SlotFill::bound("?", bound));
            }
            (Binding::Scalar(_), None) => {
                if let Some(default) = &spec.default {
                    slots.insert(spec.slot(), SlotFill::bound("?", default.clone()));
                }
            }
            (
                Binding::Condition {
                    column, op, kind, ..
                },
                Some(value),
            ) => {
                let (fragment, bound) = build_condition(spec.name, column, *op, *kind, value)?;
                slots.insert(spec.slot(), SlotFill::bound(fragment, bound));
            }
            (Binding::Condition { .. }, None) => {}
        }
    }

    // Untriggered condition slots collapse to the empty string. Two
    // parameters may share a slot (year / year_from), so only fill holes.
    for spec in &def.params {
        if let Binding::Condition { slot, .. } = spec.binding {
            slots.entry(slot).or_insert_with(SlotFill::empty);
        }
    }

    Ok(slots)
}

/// Walk the body left-to-right, replacing each `{slot}` and appending its
/// bound values in encounter order.
fn substitute(
    def: &TemplateDef,
    slots: &HashMap<&'static str, SlotFill>,
) -> QueryResult<(String, Vec<BindValue>)> {
    let mut sql = String::with_capacity(def.sql.len());
    let mut params = Vec::new();
    let mut rest = def.sql;

    while let Some(start) = rest.find('{') {
        sql.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            return Err(QueryError::invalid(
                def.name,
                "template body has an unterminated slot marker",
            ));
        };
        let slot = &after[..end];
        let Some(fill) = slots.get(slot) else {
            return Err(QueryError::missing(slot, "template slot was never filled"));
        };
        sql.push_str(&fill.text);
        params.extend(fill.params.iter().cloned());
        rest = &after[end + 1..];
    }
    sql.push_str(rest);

    Ok((sql, params))
}

fn supplied<'a>(args: &'a Args, name: &str) -> Option<&'a Json> {
    args.get(name).filter(|v| !v.is_null())
}

/// Drop whitespace-only lines left behind by empty condition slots.
fn strip_blank_lines(sql: &str) -> String {
    sql.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
