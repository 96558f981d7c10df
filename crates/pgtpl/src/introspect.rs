//! Schema introspection over the PostgreSQL catalogs.
//!
//! [`PgIntrospector`] builds [`TableSchema`]s from `pg_class` /
//! `pg_attribute` metadata: ordered columns with mapped value kinds, the
//! primary key, insert/update column sets, and literal column defaults.
//!
//! Auto-generated key columns (identity columns and `nextval(...)` serial
//! defaults) are excluded from the insert column list, since the database fills
//! them. Expression defaults (`now()` and friends) are likewise left to the
//! database and do not enter the backfill map; only simple literals do.

use crate::client::GenericClient;
use crate::error::{TplError, TplResult};
use crate::refresh::SchemaIntrospector;
use crate::schema::TableSchema;
use crate::value::{Value, ValueKind};
use tokio_postgres::Row;

/// [`SchemaIntrospector`] over any [`GenericClient`].
pub struct PgIntrospector<C> {
    client: C,
    schema_name: String,
}

impl<C: GenericClient> PgIntrospector<C> {
    /// Introspect the `public` schema.
    pub fn new(client: C) -> Self {
        Self::with_schema(client, "public")
    }

    /// Introspect an explicit schema.
    pub fn with_schema(client: C, schema_name: impl Into<String>) -> Self {
        Self {
            client,
            schema_name: schema_name.into(),
        }
    }
}

/// Map a `format_type` rendering to the engine's value kind.
///
/// Unrecognized types decode as text, which round-trips through the driver
/// for most of them.
fn kind_from_type(data_type: &str) -> ValueKind {
    match data_type {
        "boolean" => ValueKind::Bool,
        "smallint" | "integer" => ValueKind::Int,
        "bigint" => ValueKind::Long,
        "real" => ValueKind::Float,
        "double precision" => ValueKind::Double,
        "bytea" => ValueKind::Bytes,
        "date" => ValueKind::Date,
        "uuid" => ValueKind::Uuid,
        "json" | "jsonb" => ValueKind::Json,
        t if t.starts_with("timestamp") => ValueKind::Timestamp,
        _ => ValueKind::Text,
    }
}

/// Parse a simple literal default expression into a value of the column's
/// kind. Sequence and expression defaults yield `None`.
fn literal_default(kind: ValueKind, default_expr: &str) -> Option<Value> {
    let expr = default_expr.trim();
    if expr.contains("nextval(") {
        return None;
    }

    // format: `0`, `'abc'::character varying`, `true`
    let literal = expr.split("::").next().unwrap_or(expr).trim();

    match kind {
        ValueKind::Text => {
            let text = literal.strip_prefix('\'')?.strip_suffix('\'')?;
            Some(Value::Text(text.replace("''", "'")))
        }
        ValueKind::Bool => match literal {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        ValueKind::Int => literal.parse().ok().map(Value::Int),
        ValueKind::Long => literal.parse().ok().map(Value::Long),
        ValueKind::Float => literal.parse().ok().map(Value::Float),
        ValueKind::Double => literal.parse().ok().map(Value::Double),
        _ => None,
    }
}

fn get<'a, T>(row: &'a Row, column: &str) -> TplResult<T>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get(column)
        .map_err(|e| TplError::decode(column, e.to_string()))
}

impl<C: GenericClient> SchemaIntrospector for PgIntrospector<C> {
    async fn table_names(&self) -> TplResult<Vec<String>> {
        let rows = self
            .client
            .query(
                r#"
SELECT c.relname AS table_name
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
WHERE c.relkind = 'r'
  AND n.nspname = $1
ORDER BY c.relname
"#,
                &[&self.schema_name],
            )
            .await?;

        rows.iter().map(|row| get(row, "table_name")).collect()
    }

    async fn table_schema(&self, table_name: &str) -> TplResult<TableSchema> {
        let rows = self
            .client
            .query(
                r#"
SELECT
  a.attname AS column_name,
  pg_catalog.format_type(a.atttypid, a.atttypmod) AS data_type,
  pg_get_expr(ad.adbin, ad.adrelid) AS default_expr,
  (a.attidentity <> '') AS is_identity,
  COALESCE(i.indisprimary, false) AS is_primary
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid
LEFT JOIN pg_catalog.pg_attrdef ad ON ad.adrelid = c.oid AND ad.adnum = a.attnum
LEFT JOIN pg_catalog.pg_index i
  ON i.indrelid = c.oid AND a.attnum = ANY(i.indkey) AND i.indisprimary
WHERE c.relkind = 'r'
  AND a.attnum > 0
  AND NOT a.attisdropped
  AND n.nspname = $1
  AND c.relname = $2
ORDER BY a.attnum
"#,
                &[&self.schema_name, &table_name],
            )
            .await?;

        if rows.is_empty() {
            return Err(TplError::precondition(format!(
                "unsupported table '{}' in schema '{}'",
                table_name, self.schema_name
            )));
        }

        let mut columns: Vec<(String, ValueKind)> = Vec::with_capacity(rows.len());
        let mut id_name: Option<String> = None;
        let mut insert_columns: Vec<String> = Vec::new();
        let mut defaults: Vec<(String, Value)> = Vec::new();

        for row in &rows {
            let column: String = get(row, "column_name")?;
            let data_type: String = get(row, "data_type")?;
            let default_expr: Option<String> = get(row, "default_expr")?;
            let is_identity: bool = get(row, "is_identity")?;
            let is_primary: bool = get(row, "is_primary")?;

            let kind = kind_from_type(&data_type);
            let auto = is_identity
                || default_expr
                    .as_deref()
                    .is_some_and(|expr| expr.contains("nextval("));

            if is_primary && id_name.is_none() {
                id_name = Some(column.clone());
            }
            if !auto {
                insert_columns.push(column.clone());
            }
            if let Some(expr) = &default_expr
                && !auto
                && let Some(value) = literal_default(kind, expr)
            {
                defaults.push((column.clone(), value));
            }

            columns.push((column, kind));
        }

        let column_refs: Vec<(&str, ValueKind)> =
            columns.iter().map(|(n, k)| (n.as_str(), *k)).collect();
        let insert_refs: Vec<&str> = insert_columns.iter().map(|s| s.as_str()).collect();

        let mut schema = TableSchema::new(table_name)
            .with_columns(&column_refs)
            .with_insert_columns(&insert_refs);
        if let Some(id) = id_name {
            schema = schema.with_primary_key(id);
        }
        for (column, value) in defaults {
            schema = schema.with_default(column, value);
        }
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_common_types() {
        assert_eq!(kind_from_type("bigint"), ValueKind::Long);
        assert_eq!(kind_from_type("integer"), ValueKind::Int);
        assert_eq!(kind_from_type("character varying(64)"), ValueKind::Text);
        assert_eq!(kind_from_type("timestamp without time zone"), ValueKind::Timestamp);
        assert_eq!(kind_from_type("jsonb"), ValueKind::Json);
    }

    #[test]
    fn parses_literal_defaults() {
        assert_eq!(literal_default(ValueKind::Int, "0"), Some(Value::Int(0)));
        assert_eq!(
            literal_default(ValueKind::Text, "'guest'::character varying"),
            Some(Value::Text("guest".into()))
        );
        assert_eq!(
            literal_default(ValueKind::Bool, "false"),
            Some(Value::Bool(false))
        );
    }

    #[test]
    fn escaped_quote_in_text_default() {
        assert_eq!(
            literal_default(ValueKind::Text, "'it''s'::text"),
            Some(Value::Text("it's".into()))
        );
    }

    #[test]
    fn expression_defaults_are_skipped() {
        assert_eq!(literal_default(ValueKind::Timestamp, "now()"), None);
        assert_eq!(
            literal_default(ValueKind::Long, "nextval('users_id_seq'::regclass)"),
            None
        );
    }
}
