//! Template-driven read-only SQL for JVLink racing databases.
//!
//! A fixed catalog of parameterized query templates over a schema whose
//! column types changed across versions (zero-padded text codes vs. native
//! integers). Rendering validates required parameters, coerces each argument
//! for its column's declared type, and returns SQL with `?` placeholders
//! plus the ordered bound parameters. Hand-written SQL goes through the
//! corrector instead; everything passes the safety validator before it may
//! reach an executor.
//!
//! ```
//! use jvlink_query::prelude::*;
//! use serde_json::json;
//!
//! let args = json!({"ninki": 1, "venue": "東京"});
//! let query = render("favorite_win_rate", args.as_object().unwrap())?;
//! assert_eq!(query.sql.matches('?').count(), query.params.len());
//! # Ok::<(), jvlink_query::QueryError>(())
//! ```

pub mod catalog;
pub mod coerce;
pub mod condition;
pub mod corrector;
pub mod error;
pub mod executor;
pub mod lookup;
pub mod render;
pub mod safety;
pub mod value;

pub use catalog::{get_template_info, list_templates};
pub use error::{QueryError, QueryResult};
pub use render::{render, Args, RenderedQuery};
pub use value::BindValue;

pub mod prelude {
    pub use crate::catalog::{get_template_info, list_templates};
    pub use crate::coerce::{coerce, FieldKind};
    pub use crate::corrector::correct;
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::executor::{prepare, prepare_raw, QueryExecutor};
    pub use crate::render::{render, Args, RenderedQuery};
    pub use crate::safety::validate;
    pub use crate::value::BindValue;
}
