//! Concurrent table-schema registry.
//!
//! The registry is a plain name -> schema cache: it performs no
//! introspection of its own and passively receives writes from a refresh
//! mechanism (see [`crate::refresh`]). It is an explicit, injectable object
//! owned by the composing application. Clone it cheaply and hand one to
//! every [`Template`](crate::Template).
//!
//! Reads take a brief shared lock; writes replace whole `Arc<TableSchema>`
//! entries, so a concurrent reader observes either the previous schema or
//! the new one, never a mix. Last writer wins on concurrent puts.

use crate::schema::TableSchema;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Shared name -> [`TableSchema`] cache.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    inner: Arc<RwLock<HashMap<String, Arc<TableSchema>>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a schema by (possibly shard-qualified) table name.
    pub fn get(&self, table_name: &str) -> Option<Arc<TableSchema>> {
        self.inner.read().unwrap().get(table_name).cloned()
    }

    /// Register a schema under its own recorded table name.
    ///
    /// Returns the previous entry, if any.
    pub fn put(&self, schema: TableSchema) -> Option<Arc<TableSchema>> {
        let key = schema.table_name().to_string();
        self.put_as(key, schema)
    }

    /// Register a schema under an explicit key.
    ///
    /// Used when the caller's logical name differs from the schema's own
    /// recorded name, e.g. shard-qualified keys like `orders_3`.
    pub fn put_as(
        &self,
        table_name: impl Into<String>,
        schema: TableSchema,
    ) -> Option<Arc<TableSchema>> {
        self.inner
            .write()
            .unwrap()
            .insert(table_name.into(), Arc::new(schema))
    }

    /// Remove a schema, returning the previous entry if any.
    pub fn remove(&self, table_name: &str) -> Option<Arc<TableSchema>> {
        self.inner.write().unwrap().remove(table_name)
    }

    pub fn contains(&self, table_name: &str) -> bool {
        self.inner.read().unwrap().contains_key(table_name)
    }

    /// All registered keys. Used by refresh-all to reconcile against the
    /// live table list.
    pub fn table_names(&self) -> Vec<String> {
        self.inner.read().unwrap().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    fn schema(name: &str, columns: &[(&str, ValueKind)]) -> TableSchema {
        TableSchema::new(name).with_columns(columns)
    }

    #[test]
    fn put_then_get_roundtrips() {
        let registry = SchemaRegistry::new();
        registry.put(schema("users", &[("id", ValueKind::Long)]));

        let found = registry.get("users").expect("registered");
        assert_eq!(found.table_name(), "users");
        assert!(registry.contains("users"));
    }

    #[test]
    fn remove_then_get_is_absent() {
        let registry = SchemaRegistry::new();
        registry.put(schema("users", &[("id", ValueKind::Long)]));

        assert!(registry.remove("users").is_some());
        assert!(registry.get("users").is_none());
        assert!(!registry.contains("users"));
    }

    #[test]
    fn put_returns_previous_entry() {
        let registry = SchemaRegistry::new();
        assert!(registry.put(schema("users", &[("id", ValueKind::Long)])).is_none());

        let previous = registry
            .put(schema("users", &[("id", ValueKind::Long), ("name", ValueKind::Text)]))
            .expect("previous entry");
        assert_eq!(previous.column_names().len(), 1);
        assert_eq!(registry.get("users").unwrap().column_names().len(), 2);
    }

    #[test]
    fn put_as_keys_by_explicit_name() {
        let registry = SchemaRegistry::new();
        registry.put_as("orders_3", schema("orders", &[("id", ValueKind::Long)]));

        assert!(registry.contains("orders_3"));
        assert!(!registry.contains("orders"));
        assert_eq!(registry.get("orders_3").unwrap().table_name(), "orders");
    }

    #[test]
    fn concurrent_puts_leave_one_whole_schema() {
        let registry = SchemaRegistry::new();
        let mut handles = Vec::new();

        for i in 0..8 {
            let registry = registry.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    let s = if i % 2 == 0 {
                        schema("t", &[("id", ValueKind::Long)]).with_primary_key("id")
                    } else {
                        schema("t", &[("id", ValueKind::Long), ("name", ValueKind::Text)])
                            .with_primary_key("id")
                    };
                    registry.put(s);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        // Whichever writer landed last, the entry is one coherent schema.
        let s = registry.get("t").expect("present");
        match s.column_names().len() {
            1 => assert_eq!(s.joined_columns_on_select(), "id"),
            2 => assert_eq!(s.joined_columns_on_select(), "id, name"),
            n => panic!("unexpected column count {n}"),
        }
    }
}
