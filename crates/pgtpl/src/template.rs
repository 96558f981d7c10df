//! The templating orchestrator.
//!
//! [`Template`] is the public operation surface: it resolves (possibly
//! shard-qualified) table names to registered schemas, composes parameter
//! payloads through the key/set/default/placeholder helpers, hands SQL-text
//! generation to the [`SqlDialect`] and execution to the [`Executor`], and
//! reports every completed operation to an optional audit sink.
//!
//! Operations are independent async calls: there is no serialization,
//! queueing, or lock held across an operation; the only shared state
//! touched is a registry lookup.
//!
//! ```ignore
//! use pgtpl::{PgExecutor, SchemaRegistry, Template, TableSchema, Value, ValueKind};
//!
//! let registry = SchemaRegistry::new();
//! registry.put(
//!     TableSchema::new("users")
//!         .with_columns(&[("id", ValueKind::Long), ("name", ValueKind::Text)])
//!         .with_primary_key("id")
//!         .with_insert_columns(&["name"]),
//! );
//!
//! let template = Template::new(PgExecutor::new(client), registry);
//! let mut values = std::collections::HashMap::new();
//! values.insert("name".to_string(), Value::from("alice"));
//! let affected = template.insert("users", &values, None).await?;
//! ```

use crate::audit::{AuditEvent, AuditSink};
use crate::defaults;
use crate::dialect::{PgDialect, SqlDialect};
use crate::error::{TplError, TplResult};
use crate::executor::Executor;
use crate::filter::{Filter, Order, Page};
use crate::key;
use crate::placeholder;
use crate::registry::SchemaRegistry;
use crate::schema::TableSchema;
use crate::set;
use crate::statement::BoundStatement;
use crate::value::{Value, ValueKind};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Projection used by `select_count`.
const AGGREGATE: &str = "COUNT(*) AS aggregate";

/// Join a table name with an optional shard number: `orders` + `3` ->
/// `orders_3`; identity without a shard.
pub fn join_table_name(table_name: &str, shard: Option<u32>) -> String {
    match shard {
        Some(num) => format!("{table_name}_{num}"),
        None => table_name.to_string(),
    }
}

/// The public operation surface of the templating engine.
pub struct Template<E, D = PgDialect> {
    executor: E,
    dialect: D,
    registry: SchemaRegistry,
    audit: Option<Arc<dyn AuditSink>>,
}

impl<E: Executor> Template<E, PgDialect> {
    /// Create a template with the default PostgreSQL dialect.
    pub fn new(executor: E, registry: SchemaRegistry) -> Self {
        Self::with_dialect(executor, PgDialect::new(), registry)
    }
}

impl<E: Executor, D: SqlDialect> Template<E, D> {
    /// Create a template with an explicit dialect.
    pub fn with_dialect(executor: E, dialect: D, registry: SchemaRegistry) -> Self {
        Self {
            executor,
            dialect,
            registry,
            audit: None,
        }
    }

    /// Attach an audit sink. Panics raised by the sink are discarded.
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Resolve the shard-qualified table name to its registered schema.
    ///
    /// Operations against unregistered tables are a precondition violation,
    /// surfaced as [`TplError::UnregisteredTable`].
    pub fn table_schema(&self, table_name: &str, shard: Option<u32>) -> TplResult<Arc<TableSchema>> {
        let joined = join_table_name(table_name, shard);
        self.registry
            .get(&joined)
            .ok_or(TplError::UnregisteredTable(joined))
    }

    // ==================== SELECT ====================

    /// SELECT rows matching `filters`, ordered and paged as given.
    ///
    /// The projection is the schema's select column list; each matched row
    /// comes back as a `column -> Value` map.
    pub async fn select_list(
        &self,
        table_name: &str,
        filters: &[Filter],
        orders: &[Order],
        page: Option<&Page>,
        shard: Option<u32>,
    ) -> TplResult<Vec<HashMap<String, Value>>> {
        let schema = self.table_schema(table_name, shard)?;
        let stmt = self.parse_select(&schema, filters, orders, page)?;

        let result = self
            .executor
            .select_list(&stmt, schema.column_names(), schema.value_types())
            .await?;

        self.write_audit(AuditEvent::SelectList {
            table: table_name,
            shard,
            filters,
            orders,
            page,
            result: &result,
        });
        Ok(result)
    }

    /// SELECT the first row matching `filters`, or `None`.
    pub async fn select_one(
        &self,
        table_name: &str,
        filters: &[Filter],
        orders: &[Order],
        shard: Option<u32>,
    ) -> TplResult<Option<HashMap<String, Value>>> {
        let schema = self.table_schema(table_name, shard)?;
        let result = self.do_select_one(&schema, filters, orders).await?;

        self.write_audit(AuditEvent::SelectOne {
            table: table_name,
            shard,
            filters,
            orders,
            result: result.as_ref(),
        });
        Ok(result)
    }

    /// SELECT one row by key equality. `key_name` defaults to the schema's
    /// primary key.
    pub async fn select_one_by_key(
        &self,
        table_name: &str,
        key_value: Value,
        key_name: Option<&str>,
        shard: Option<u32>,
    ) -> TplResult<Option<HashMap<String, Value>>> {
        let schema = self.table_schema(table_name, shard)?;
        let filters = key::parse_for(&schema, key_value.clone(), key_name)?;
        let result = self.do_select_one(&schema, &filters, &[]).await?;

        self.write_audit(AuditEvent::SelectOneByKey {
            table: table_name,
            shard,
            key_value: &key_value,
            key_name,
            result: result.as_ref(),
        });
        Ok(result)
    }

    async fn do_select_one(
        &self,
        schema: &TableSchema,
        filters: &[Filter],
        orders: &[Order],
    ) -> TplResult<Option<HashMap<String, Value>>> {
        let page = Page::limit(1);
        let stmt = self.parse_select(schema, filters, orders, Some(&page))?;

        self.executor
            .select_one(&stmt, schema.column_names(), schema.value_types())
            .await
    }

    /// SELECT COUNT(*) of rows matching `filters`. An absent aggregate
    /// coerces to 0.
    pub async fn select_count(
        &self,
        table_name: &str,
        filters: &[Filter],
        shard: Option<u32>,
    ) -> TplResult<i64> {
        let joined = join_table_name(table_name, shard);
        let stmt = self.dialect.parse_select(&joined, AGGREGATE, filters, &[], None)?;

        let aggregate = self.executor.get_one(&stmt, ValueKind::Long).await?;
        let result = match aggregate {
            Some(Value::Null) | None => 0,
            Some(value) => value.as_i64()?,
        };

        self.write_audit(AuditEvent::SelectCount {
            table: table_name,
            shard,
            filters,
            result,
        });
        Ok(result)
    }

    /// True iff a row matching `filters` exists.
    ///
    /// Runs `SELECT 1 ... LIMIT 1`; the result is true iff exactly the
    /// literal `1` comes back.
    pub async fn check_exist(
        &self,
        table_name: &str,
        filters: &[Filter],
        shard: Option<u32>,
    ) -> TplResult<bool> {
        let joined = join_table_name(table_name, shard);
        let page = Page::limit(1);
        let stmt = self
            .dialect
            .parse_select(&joined, "1", filters, &[], Some(&page))?;

        let exist = self.executor.get_one(&stmt, ValueKind::Int).await?;
        let result = matches!(exist, Some(Value::Int(1)));

        self.write_audit(AuditEvent::CheckExist {
            table: table_name,
            shard,
            filters,
            result,
        });
        Ok(result)
    }

    // ==================== INSERT ====================

    /// INSERT one row. Columns omitted by the caller are backfilled from the
    /// schema's defaults; a column with neither fails before execution.
    pub async fn insert(
        &self,
        table_name: &str,
        values: &HashMap<String, Value>,
        shard: Option<u32>,
    ) -> TplResult<u64> {
        let schema = self.table_schema(table_name, shard)?;

        let mut stmt = BoundStatement::new(self.parse_insert(&schema, 1));
        stmt.names = schema.columns_on_insert().to_vec();
        stmt.params = defaults::apply_on_insert(&schema, values)?;

        let affected = self.executor.update(&stmt).await?;

        self.write_audit(AuditEvent::Insert {
            table: table_name,
            shard,
            values,
            affected,
        });
        Ok(affected)
    }

    /// INSERT a batch of rows in one statement, each row backfilled
    /// independently. An empty batch short-circuits to 0 without touching
    /// the executor.
    pub async fn batch_insert(
        &self,
        table_name: &str,
        rows: &[HashMap<String, Value>],
        shard: Option<u32>,
    ) -> TplResult<u64> {
        let schema = self.table_schema(table_name, shard)?;
        let param_rows = defaults::apply_on_insert_rows(&schema, rows)?;
        let batch_size = param_rows.len();

        let affected = if batch_size == 0 {
            0
        } else {
            let mut stmt = BoundStatement::new(self.parse_insert(&schema, batch_size));
            stmt.names = schema.columns_on_insert().to_vec();
            stmt.param_rows = param_rows;
            self.executor.update_list(&stmt).await?
        };

        self.write_audit(AuditEvent::BatchInsert {
            table: table_name,
            shard,
            rows: rows.len(),
            affected,
        });
        Ok(affected)
    }

    // ==================== UPDATE ====================

    /// UPDATE rows matching `filters`.
    ///
    /// `sets` are raw set expressions passed through verbatim; `set_values`
    /// are validated against the schema's updatable columns, unknown names
    /// discarded. Set-clause parameter names are bracket-wrapped before
    /// being merged with the predicate's names, so a set target never
    /// collides with a same-named predicate parameter.
    pub async fn update(
        &self,
        table_name: &str,
        sets: &[String],
        set_values: &[(String, Value)],
        filters: &[Filter],
        shard: Option<u32>,
    ) -> TplResult<u64> {
        let schema = self.table_schema(table_name, shard)?;
        let set_names = set::parse_set_names(&schema, set_values);

        let affected = self
            .do_update(schema.table_name(), sets, &set_names, set_values, filters)
            .await?;

        self.write_audit(AuditEvent::Update {
            table: table_name,
            shard,
            sets,
            set_values,
            filters,
            affected,
        });
        Ok(affected)
    }

    /// UPDATE rows matching a key-equality predicate. `key_name` defaults
    /// to the schema's primary key.
    pub async fn update_by_key(
        &self,
        table_name: &str,
        key_value: Value,
        sets: &[String],
        set_values: &[(String, Value)],
        key_name: Option<&str>,
        shard: Option<u32>,
    ) -> TplResult<u64> {
        let schema = self.table_schema(table_name, shard)?;
        let filters = key::parse_for(&schema, key_value.clone(), key_name)?;
        let set_names = set::parse_set_names(&schema, set_values);

        let affected = self
            .do_update(schema.table_name(), sets, &set_names, set_values, &filters)
            .await?;

        self.write_audit(AuditEvent::UpdateByKey {
            table: table_name,
            shard,
            key_value: &key_value,
            key_name,
            sets,
            set_values,
            affected,
        });
        Ok(affected)
    }

    async fn do_update(
        &self,
        table_name: &str,
        sets: &[String],
        set_names: &[String],
        set_values: &[(String, Value)],
        filters: &[Filter],
    ) -> TplResult<u64> {
        let joined_sets = set::join_sets(sets, set_names);
        let mut stmt = self.dialect.parse_update(table_name, &joined_sets, filters)?;

        stmt.names = placeholder::concat_names(Some(set_names), std::mem::take(&mut stmt.names));
        stmt.params = placeholder::concat_params(Some(set_values), std::mem::take(&mut stmt.params));

        self.executor.update(&stmt).await
    }

    /// UPDATE one statement per row, matching each row by its key value.
    ///
    /// **Not transactional**: a failure partway through leaves earlier rows
    /// applied. The key column is excluded from `set_names` (a column cannot
    /// be both a set target and the match key); the caller's slice is left
    /// untouched. Row maps bind the filtered set names first, then the key
    /// name, matching the generated `SET ..., ... WHERE key = ?` order.
    /// An empty row list performs no executor call and returns an empty
    /// result.
    pub async fn batch_update(
        &self,
        table_name: &str,
        sets: &[String],
        set_names: &[String],
        rows: &[HashMap<String, Value>],
        key_name: Option<&str>,
        shard: Option<u32>,
    ) -> TplResult<Vec<u64>> {
        let schema = self.table_schema(table_name, shard)?;
        let id_name = key::resolve_name(&schema, key_name)?;

        let set_names: Vec<String> = set_names
            .iter()
            .filter(|name| **name != id_name)
            .cloned()
            .collect();

        let affected = if rows.is_empty() {
            Vec::new()
        } else {
            let mut names = set_names.clone();
            names.push(id_name.clone());

            let joined_sets = set::join_sets(sets, &set_names);
            let filters = vec![key::parse_deferred(&id_name)?];
            let mut stmt = self
                .dialect
                .parse_update(schema.table_name(), &joined_sets, &filters)?;

            stmt.names = names;
            stmt.param_rows = rows.to_vec();

            self.executor.batch_update(&stmt).await?
        };

        self.write_audit(AuditEvent::BatchUpdate {
            table: table_name,
            shard,
            sets,
            set_names: &set_names,
            key_name,
            rows: rows.len(),
            affected: &affected,
        });
        Ok(affected)
    }

    // ==================== DELETE ====================

    /// DELETE rows matching `filters`.
    pub async fn delete(
        &self,
        table_name: &str,
        filters: &[Filter],
        shard: Option<u32>,
    ) -> TplResult<u64> {
        let joined = join_table_name(table_name, shard);
        let affected = self.do_delete(&joined, filters).await?;

        self.write_audit(AuditEvent::Delete {
            table: table_name,
            shard,
            filters,
            affected,
        });
        Ok(affected)
    }

    /// DELETE rows matching a key-equality predicate. `key_name` defaults
    /// to the schema's primary key.
    pub async fn delete_by_key(
        &self,
        table_name: &str,
        key_value: Value,
        key_name: Option<&str>,
        shard: Option<u32>,
    ) -> TplResult<u64> {
        let schema = self.table_schema(table_name, shard)?;
        let filters = key::parse_for(&schema, key_value.clone(), key_name)?;

        let joined = join_table_name(table_name, shard);
        let affected = self.do_delete(&joined, &filters).await?;

        self.write_audit(AuditEvent::DeleteByKey {
            table: table_name,
            shard,
            key_value: &key_value,
            key_name,
            affected,
        });
        Ok(affected)
    }

    async fn do_delete(&self, table_name: &str, filters: &[Filter]) -> TplResult<u64> {
        let stmt = self.dialect.parse_delete(table_name, filters)?;
        self.executor.update(&stmt).await
    }

    // ==================== dialect seams ====================

    /// `SELECT {schema columns} FROM {schema table} ...`
    pub fn parse_select(
        &self,
        schema: &TableSchema,
        filters: &[Filter],
        orders: &[Order],
        page: Option<&Page>,
    ) -> TplResult<BoundStatement> {
        self.dialect.parse_select(
            schema.table_name(),
            schema.joined_columns_on_select(),
            filters,
            orders,
            page,
        )
    }

    /// `INSERT INTO {schema table} ({columns}) VALUES ...` with
    /// `batch_size` row groups.
    pub fn parse_insert(&self, schema: &TableSchema, batch_size: usize) -> String {
        self.dialect.parse_insert(
            schema.table_name(),
            schema.joined_columns_on_insert(),
            schema.joined_values_on_insert(),
            batch_size,
        )
    }

    /// Single audit call site; sink panics are discarded.
    fn write_audit(&self, event: AuditEvent<'_>) {
        if let Some(sink) = &self.audit {
            let _ = std::panic::catch_unwind(AssertUnwindSafe(|| sink.record(&event)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_without_shard_is_identity() {
        assert_eq!(join_table_name("orders", None), "orders");
    }

    #[test]
    fn join_appends_shard_suffix() {
        assert_eq!(join_table_name("orders", Some(3)), "orders_3");
    }
}
