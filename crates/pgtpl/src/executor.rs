//! Statement execution boundary.
//!
//! [`Executor`] is the seam through which the templating engine runs a
//! [`BoundStatement`] and materializes typed results. [`PgExecutor`] is the
//! provided implementation over any [`GenericClient`]: it resolves the
//! statement's parameter names against its value map(s), rewrites the
//! dialect-neutral `?` placeholders to `$1..$n`, and decodes result rows
//! into `column -> Value` maps using the schema's declared kinds.

use crate::client::GenericClient;
use crate::error::{TplError, TplResult};
use crate::statement::BoundStatement;
use crate::value::{Value, ValueKind};
use std::collections::HashMap;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Runs bound statements and materializes typed results.
pub trait Executor: Send + Sync {
    /// Run a select and return every row as a `column -> Value` map.
    fn select_list(
        &self,
        stmt: &BoundStatement,
        column_names: &[String],
        value_types: &HashMap<String, ValueKind>,
    ) -> impl std::future::Future<Output = TplResult<Vec<HashMap<String, Value>>>> + Send;

    /// Run a select and return the first row, if any.
    fn select_one(
        &self,
        stmt: &BoundStatement,
        column_names: &[String],
        value_types: &HashMap<String, ValueKind>,
    ) -> impl std::future::Future<Output = TplResult<Option<HashMap<String, Value>>>> + Send;

    /// Run a scalar query and return the first column of the first row.
    fn get_one(
        &self,
        stmt: &BoundStatement,
        kind: ValueKind,
    ) -> impl std::future::Future<Output = TplResult<Option<Value>>> + Send;

    /// Run a single-row mutation; returns the affected-row count.
    fn update(
        &self,
        stmt: &BoundStatement,
    ) -> impl std::future::Future<Output = TplResult<u64>> + Send;

    /// Run a multi-row insert (one statement, `param_rows` bound in order);
    /// returns the affected-row count for the whole batch.
    fn update_list(
        &self,
        stmt: &BoundStatement,
    ) -> impl std::future::Future<Output = TplResult<u64>> + Send;

    /// Run the statement once per entry of `param_rows`.
    ///
    /// **Not transactional**: rows already applied stay applied when a later
    /// row fails; the failure propagates as-is.
    fn batch_update(
        &self,
        stmt: &BoundStatement,
    ) -> impl std::future::Future<Output = TplResult<Vec<u64>>> + Send;
}

/// Rewrite `?` placeholders to `$1..$n`, left to right, skipping text inside
/// single-quoted literals.
pub(crate) fn number_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut idx = 0usize;
    let mut in_literal = false;

    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_literal = !in_literal;
                out.push(ch);
            }
            '?' if !in_literal => {
                idx += 1;
                out.push('$');
                out.push_str(&idx.to_string());
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Resolve `names` against a parameter map, in order.
fn resolve<'a>(
    names: &[String],
    params: &'a HashMap<String, Value>,
) -> TplResult<Vec<&'a Value>> {
    names
        .iter()
        .map(|name| {
            params.get(name).ok_or_else(|| {
                TplError::precondition(format!("no value bound for parameter '{name}'"))
            })
        })
        .collect()
}

fn as_sql_refs<'a>(values: &'a [&'a Value]) -> Vec<&'a (dyn ToSql + Sync)> {
    values.iter().map(|v| *v as &(dyn ToSql + Sync)).collect()
}

fn materialize(
    row: &Row,
    column_names: &[String],
    value_types: &HashMap<String, ValueKind>,
) -> TplResult<HashMap<String, Value>> {
    let mut result = HashMap::with_capacity(column_names.len());
    for (idx, column) in column_names.iter().enumerate() {
        let kind = value_types.get(column).copied().ok_or_else(|| {
            TplError::precondition(format!("no declared value type for column '{column}'"))
        })?;
        result.insert(column.clone(), Value::from_column(row, idx, kind)?);
    }
    Ok(result)
}

/// [`Executor`] over any [`GenericClient`].
#[derive(Debug)]
pub struct PgExecutor<C> {
    client: C,
}

impl<C: GenericClient> PgExecutor<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

impl<C: GenericClient> Executor for PgExecutor<C> {
    async fn select_list(
        &self,
        stmt: &BoundStatement,
        column_names: &[String],
        value_types: &HashMap<String, ValueKind>,
    ) -> TplResult<Vec<HashMap<String, Value>>> {
        let sql = number_placeholders(&stmt.sql);
        let values = resolve(&stmt.names, &stmt.params)?;
        let rows = self.client.query(&sql, &as_sql_refs(&values)).await?;

        rows.iter()
            .map(|row| materialize(row, column_names, value_types))
            .collect()
    }

    async fn select_one(
        &self,
        stmt: &BoundStatement,
        column_names: &[String],
        value_types: &HashMap<String, ValueKind>,
    ) -> TplResult<Option<HashMap<String, Value>>> {
        let sql = number_placeholders(&stmt.sql);
        let values = resolve(&stmt.names, &stmt.params)?;
        let row = self.client.query_opt(&sql, &as_sql_refs(&values)).await?;

        row.map(|row| materialize(&row, column_names, value_types))
            .transpose()
    }

    async fn get_one(&self, stmt: &BoundStatement, kind: ValueKind) -> TplResult<Option<Value>> {
        let sql = number_placeholders(&stmt.sql);
        let values = resolve(&stmt.names, &stmt.params)?;
        let row = self.client.query_opt(&sql, &as_sql_refs(&values)).await?;

        row.map(|row| Value::from_column(&row, 0, kind)).transpose()
    }

    async fn update(&self, stmt: &BoundStatement) -> TplResult<u64> {
        let sql = number_placeholders(&stmt.sql);
        let values = resolve(&stmt.names, &stmt.params)?;
        self.client.execute(&sql, &as_sql_refs(&values)).await
    }

    async fn update_list(&self, stmt: &BoundStatement) -> TplResult<u64> {
        let sql = number_placeholders(&stmt.sql);

        // One flat positional list: the VALUES clause repeats the name list
        // once per row.
        let mut values = Vec::with_capacity(stmt.names.len() * stmt.param_rows.len());
        for row in &stmt.param_rows {
            values.extend(resolve(&stmt.names, row)?);
        }
        self.client.execute(&sql, &as_sql_refs(&values)).await
    }

    async fn batch_update(&self, stmt: &BoundStatement) -> TplResult<Vec<u64>> {
        let sql = number_placeholders(&stmt.sql);

        let mut affected = Vec::with_capacity(stmt.param_rows.len());
        for row in &stmt.param_rows {
            let values = resolve(&stmt.names, row)?;
            affected.push(self.client.execute(&sql, &as_sql_refs(&values)).await?);
        }
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_placeholders_left_to_right() {
        assert_eq!(
            number_placeholders("UPDATE t SET a = ?, b = ? WHERE id = ?"),
            "UPDATE t SET a = $1, b = $2 WHERE id = $3"
        );
    }

    #[test]
    fn no_placeholders_is_identity() {
        assert_eq!(number_placeholders("SELECT 1 FROM t"), "SELECT 1 FROM t");
    }

    #[test]
    fn question_mark_inside_literal_is_kept() {
        assert_eq!(
            number_placeholders("SELECT '?' FROM t WHERE a = ?"),
            "SELECT '?' FROM t WHERE a = $1"
        );
    }

    #[test]
    fn resolve_follows_name_order() {
        let mut params = HashMap::new();
        params.insert("a".to_string(), Value::Int(1));
        params.insert("b".to_string(), Value::Int(2));

        let names = vec!["b".to_string(), "a".to_string()];
        let values = resolve(&names, &params).unwrap();
        assert_eq!(values, [&Value::Int(2), &Value::Int(1)]);
    }

    #[test]
    fn resolve_missing_name_is_a_precondition_failure() {
        let names = vec!["missing".to_string()];
        assert!(resolve(&names, &HashMap::new()).unwrap_err().is_precondition());
    }
}
