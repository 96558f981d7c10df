//! Predicate, ordering, and paging primitives.
//!
//! A [`Filter`] is a single named condition over one column. Filter lists
//! compose as an implicit AND conjunction in list order; an empty list means
//! no predicate at all (an unbounded statement; callers are responsible for
//! the safety of that).

use crate::value::Value;
use serde::Serialize;

/// A named parameter binding: the unit of SQL parameter binding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Comparison code of a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cmp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
}

impl Cmp {
    /// Operator text as rendered into SQL.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Cmp::Eq => "=",
            Cmp::Ne => "!=",
            Cmp::Gt => ">",
            Cmp::Gte => ">=",
            Cmp::Lt => "<",
            Cmp::Lte => "<=",
            Cmp::Like => "LIKE",
        }
    }
}

/// A single-column predicate.
///
/// The set of variants is closed; the SQL text generator dispatches on them
/// by pattern matching.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Filter {
    /// `column <cmp> ?` with the value bound by name.
    Bound {
        column: String,
        cmp: Cmp,
        param: Parameter,
    },
    /// `column <cmp> ?` with the value supplied positionally per row
    /// (batch update carries the key value in each row's parameter map).
    Deferred { column: String, cmp: Cmp },
}

impl Filter {
    /// A bound predicate whose parameter is named after its column.
    pub fn new(column: impl Into<String>, cmp: Cmp, value: Value) -> Self {
        let column = column.into();
        let param = Parameter::new(column.clone(), value);
        Filter::Bound { column, cmp, param }
    }

    /// Bound equality: `column = ?`.
    pub fn eq(column: impl Into<String>, value: Value) -> Self {
        Self::new(column, Cmp::Eq, value)
    }

    /// A deferred predicate: placeholder only, value arrives per row.
    pub fn deferred(column: impl Into<String>, cmp: Cmp) -> Self {
        Filter::Deferred {
            column: column.into(),
            cmp,
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Filter::Bound { column, .. } | Filter::Deferred { column, .. } => column,
        }
    }
}

/// One ORDER BY term; rendered in list order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

/// A limit/offset pair bounding result-set size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    /// A page with the given limit and no offset.
    pub fn limit(limit: i64) -> Self {
        Self { limit, offset: 0 }
    }
}
