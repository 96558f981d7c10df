//! Registry refresh against live database metadata.
//!
//! The registry itself never introspects; these functions drive a
//! [`SchemaIntrospector`] and write the results into a
//! [`SchemaRegistry`]. They are plain async functions; no background
//! threads are spawned here. Callers that want periodic or event-driven
//! refresh submit these to their own runtime.

use crate::error::{TplError, TplResult};
use crate::registry::SchemaRegistry;
use crate::schema::TableSchema;

/// Produces table schemas from live database metadata.
pub trait SchemaIntrospector: Send + Sync {
    /// Names of the tables currently present.
    fn table_names(&self) -> impl std::future::Future<Output = TplResult<Vec<String>>> + Send;

    /// Build the schema of one table.
    fn table_schema(
        &self,
        table_name: &str,
    ) -> impl std::future::Future<Output = TplResult<TableSchema>> + Send;
}

/// Re-introspect one table and replace its registry entry wholesale.
pub async fn refresh<I: SchemaIntrospector>(
    introspector: &I,
    registry: &SchemaRegistry,
    table_name: &str,
) -> TplResult<()> {
    let trimmed = table_name.trim();
    if trimmed.is_empty() {
        return Err(TplError::precondition("table name must not be empty"));
    }

    let schema = introspector.table_schema(trimmed).await?;
    registry.put_as(trimmed, schema);

    tracing::info!(target: "pgtpl.refresh", table = trimmed, "schema refreshed");
    Ok(())
}

/// Reconcile the registry against the live table list.
///
/// Entries whose table no longer exists are removed; every live table is
/// re-introspected. A single table failing to refresh is logged and skipped
/// rather than aborting the sweep.
pub async fn refresh_all<I: SchemaIntrospector>(
    introspector: &I,
    registry: &SchemaRegistry,
) -> TplResult<()> {
    let live = introspector.table_names().await?;

    for stale in registry
        .table_names()
        .into_iter()
        .filter(|name| !live.contains(name))
    {
        registry.remove(&stale);
        tracing::info!(target: "pgtpl.refresh", table = %stale, "schema removed");
    }

    for table in &live {
        if let Err(error) = refresh(introspector, registry, table).await {
            tracing::error!(target: "pgtpl.refresh", table = %table, %error, "refresh failed");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FixedIntrospector {
        tables: Mutex<HashMap<String, TableSchema>>,
    }

    impl FixedIntrospector {
        fn new(schemas: Vec<TableSchema>) -> Self {
            let tables = schemas
                .into_iter()
                .map(|s| (s.table_name().to_string(), s))
                .collect();
            Self {
                tables: Mutex::new(tables),
            }
        }
    }

    impl SchemaIntrospector for FixedIntrospector {
        async fn table_names(&self) -> TplResult<Vec<String>> {
            Ok(self.tables.lock().unwrap().keys().cloned().collect())
        }

        async fn table_schema(&self, table_name: &str) -> TplResult<TableSchema> {
            self.tables
                .lock()
                .unwrap()
                .get(table_name)
                .cloned()
                .ok_or_else(|| TplError::precondition(format!("no such table: {table_name}")))
        }
    }

    fn schema(name: &str) -> TableSchema {
        TableSchema::new(name)
            .with_columns(&[("id", ValueKind::Long)])
            .with_primary_key("id")
    }

    #[tokio::test]
    async fn refresh_replaces_the_entry() {
        let registry = SchemaRegistry::new();
        registry.put(schema("users"));

        let replacement = TableSchema::new("users")
            .with_columns(&[("id", ValueKind::Long), ("name", ValueKind::Text)])
            .with_primary_key("id");
        let introspector = FixedIntrospector::new(vec![replacement]);

        refresh(&introspector, &registry, "users").await.unwrap();
        assert_eq!(registry.get("users").unwrap().column_names().len(), 2);
    }

    #[tokio::test]
    async fn refresh_rejects_blank_names() {
        let registry = SchemaRegistry::new();
        let introspector = FixedIntrospector::new(vec![]);
        let err = refresh(&introspector, &registry, "  ").await.unwrap_err();
        assert!(err.is_precondition());
    }

    #[tokio::test]
    async fn refresh_all_removes_dropped_tables() {
        let registry = SchemaRegistry::new();
        registry.put(schema("users"));
        registry.put(schema("orders"));

        let introspector = FixedIntrospector::new(vec![schema("users")]);
        refresh_all(&introspector, &registry).await.unwrap();

        assert!(registry.contains("users"));
        assert!(!registry.contains("orders"));
    }
}
