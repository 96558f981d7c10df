//! Bound statements: SQL text plus named parameter bindings.

use crate::value::Value;
use std::collections::HashMap;

/// Generated SQL text together with its parameter bindings.
///
/// `sql` carries dialect-neutral `?` placeholders; `names` fixes the
/// positional order in which they are bound. Single-row statements resolve
/// each name against `params`; batch statements resolve against each map in
/// `param_rows` in turn. The executor rewrites `?` to the driver's `$n`
/// placeholders when it runs the statement.
///
/// Structural (SET-clause) names are bracket-wrapped (`[name]`) so they can
/// never collide with a predicate parameter of the same identifier; see
/// [`crate::placeholder`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundStatement {
    pub sql: String,
    pub names: Vec<String>,
    pub params: HashMap<String, Value>,
    pub param_rows: Vec<HashMap<String, Value>>,
}

impl BoundStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            names: Vec::new(),
            params: HashMap::new(),
            param_rows: Vec::new(),
        }
    }
}
