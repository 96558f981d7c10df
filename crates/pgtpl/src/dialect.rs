//! SQL text generation boundary.
//!
//! [`SqlDialect`] is the narrow seam through which the templating engine
//! obtains actual SQL syntax for a (table, projection, filters, orders,
//! page) description. [`PgDialect`] is the provided implementation.
//!
//! Statements carry dialect-neutral `?` placeholders; the executor rewrites
//! them to driver placeholders when the statement runs.

use crate::error::{TplError, TplResult};
use crate::filter::{Filter, Order, Page};
use crate::statement::BoundStatement;
use crate::value::Value;
use std::collections::HashMap;

/// Renders statement text for the templating engine.
///
/// Filters must render as an AND conjunction in list order, orders in list
/// order, and the page as LIMIT/OFFSET. Bound filters contribute their
/// (name, value) pairs to the statement; deferred filters render a
/// placeholder only.
pub trait SqlDialect: Send + Sync {
    /// `SELECT {projection} FROM {table} WHERE ... ORDER BY ... LIMIT ...`
    fn parse_select(
        &self,
        table: &str,
        projection: &str,
        filters: &[Filter],
        orders: &[Order],
        page: Option<&Page>,
    ) -> TplResult<BoundStatement>;

    /// `INSERT INTO {table} ({columns}) VALUES (...), (...)` with exactly
    /// `batch_size` row groups.
    fn parse_insert(
        &self,
        table: &str,
        joined_columns: &str,
        joined_values: &str,
        batch_size: usize,
    ) -> String;

    /// `UPDATE {table} SET {set_clause} WHERE ...`
    fn parse_update(
        &self,
        table: &str,
        set_clause: &str,
        filters: &[Filter],
    ) -> TplResult<BoundStatement>;

    /// `DELETE FROM {table} WHERE ...`
    fn parse_delete(&self, table: &str, filters: &[Filter]) -> TplResult<BoundStatement>;
}

/// The default PostgreSQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgDialect;

impl PgDialect {
    pub fn new() -> Self {
        Self
    }
}

/// Render filters into a WHERE body plus the bound names/values.
fn render_filters(
    filters: &[Filter],
) -> (String, Vec<String>, HashMap<String, Value>) {
    let mut clauses = Vec::with_capacity(filters.len());
    let mut names = Vec::new();
    let mut params = HashMap::new();

    for filter in filters {
        match filter {
            Filter::Bound { column, cmp, param } => {
                clauses.push(format!("{column} {} ?", cmp.as_sql()));
                names.push(param.name.clone());
                params.insert(param.name.clone(), param.value.clone());
            }
            Filter::Deferred { column, cmp } => {
                clauses.push(format!("{column} {} ?", cmp.as_sql()));
            }
        }
    }

    (clauses.join(" AND "), names, params)
}

fn push_where(sql: &mut String, where_body: &str) {
    if !where_body.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(where_body);
    }
}

impl SqlDialect for PgDialect {
    fn parse_select(
        &self,
        table: &str,
        projection: &str,
        filters: &[Filter],
        orders: &[Order],
        page: Option<&Page>,
    ) -> TplResult<BoundStatement> {
        let (where_body, names, params) = render_filters(filters);

        let mut sql = format!("SELECT {projection} FROM {table}");
        push_where(&mut sql, &where_body);

        if !orders.is_empty() {
            let order_body = orders
                .iter()
                .map(|o| {
                    if o.descending {
                        format!("{} DESC", o.column)
                    } else {
                        format!("{} ASC", o.column)
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_body);
        }

        if let Some(page) = page {
            sql.push_str(&format!(" LIMIT {}", page.limit));
            if page.offset > 0 {
                sql.push_str(&format!(" OFFSET {}", page.offset));
            }
        }

        let mut stmt = BoundStatement::new(sql);
        stmt.names = names;
        stmt.params = params;
        Ok(stmt)
    }

    fn parse_insert(
        &self,
        table: &str,
        joined_columns: &str,
        joined_values: &str,
        batch_size: usize,
    ) -> String {
        let row_group = format!("({joined_values})");
        let values_body = vec![row_group; batch_size].join(", ");
        format!("INSERT INTO {table} ({joined_columns}) VALUES {values_body}")
    }

    fn parse_update(
        &self,
        table: &str,
        set_clause: &str,
        filters: &[Filter],
    ) -> TplResult<BoundStatement> {
        if set_clause.trim().is_empty() {
            return Err(TplError::precondition(format!(
                "SET clause must not be empty, table: {table}"
            )));
        }

        let (where_body, names, params) = render_filters(filters);

        let mut sql = format!("UPDATE {table} SET {set_clause}");
        push_where(&mut sql, &where_body);

        let mut stmt = BoundStatement::new(sql);
        stmt.names = names;
        stmt.params = params;
        Ok(stmt)
    }

    fn parse_delete(&self, table: &str, filters: &[Filter]) -> TplResult<BoundStatement> {
        let (where_body, names, params) = render_filters(filters);

        let mut sql = format!("DELETE FROM {table}");
        push_where(&mut sql, &where_body);

        let mut stmt = BoundStatement::new(sql);
        stmt.names = names;
        stmt.params = params;
        Ok(stmt)
    }
}
