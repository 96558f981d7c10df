//! Table schema metadata.
//!
//! A [`TableSchema`] is the per-table catalog the templating engine works
//! from: ordered columns and their value kinds, the primary key, the column
//! sets applicable to insert and update, precomputed SQL fragments, and the
//! default values used to backfill inserts.
//!
//! Schemas are immutable once registered; the registry shares them as `Arc`s
//! and replaces them wholesale on refresh.

use crate::value::{Value, ValueKind};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Per-table catalog of columns, kinds, key, and defaults.
#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    table_name: String,
    id_name: String,
    column_names: Vec<String>,
    value_types: HashMap<String, ValueKind>,
    columns_on_insert: Vec<String>,
    columns_on_update: HashSet<String>,
    joined_columns_on_select: String,
    joined_columns_on_insert: String,
    joined_values_on_insert: String,
    default_values: HashMap<String, Value>,
}

impl TableSchema {
    /// Create an empty schema for `table_name`.
    ///
    /// Until columns are added, every column grouping is empty. `with_columns`
    /// seeds the insert set with all columns and the update set with all
    /// columns except the primary key; `with_insert_columns` /
    /// `with_update_columns` override those groupings explicitly.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            id_name: String::new(),
            column_names: Vec::new(),
            value_types: HashMap::new(),
            columns_on_insert: Vec::new(),
            columns_on_update: HashSet::new(),
            joined_columns_on_select: String::new(),
            joined_columns_on_insert: String::new(),
            joined_values_on_insert: String::new(),
            default_values: HashMap::new(),
        }
    }

    /// Add columns in order with their value kinds.
    pub fn with_columns(mut self, columns: &[(&str, ValueKind)]) -> Self {
        for (name, kind) in columns {
            self.column_names.push(name.to_string());
            self.value_types.insert(name.to_string(), *kind);
        }
        self.columns_on_insert = self.column_names.clone();
        self.rebuild_update_columns();
        self.rebuild_joined();
        self
    }

    /// Set the primary key column.
    ///
    /// The key column is removed from the default update set (it is the match
    /// key, not a set target).
    pub fn with_primary_key(mut self, id_name: impl Into<String>) -> Self {
        self.id_name = id_name.into();
        self.rebuild_update_columns();
        self
    }

    /// Override the insert column list (ordered; it defines the insert
    /// parameter order).
    pub fn with_insert_columns(mut self, columns: &[&str]) -> Self {
        self.columns_on_insert = columns.iter().map(|c| c.to_string()).collect();
        self.rebuild_joined();
        self
    }

    /// Override the updatable column set (membership only).
    pub fn with_update_columns(mut self, columns: &[&str]) -> Self {
        self.columns_on_update = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Register a default value, used only when an insert omits the column.
    pub fn with_default(mut self, column: impl Into<String>, value: Value) -> Self {
        self.default_values.insert(column.into(), value);
        self
    }

    fn rebuild_update_columns(&mut self) {
        self.columns_on_update = self
            .column_names
            .iter()
            .filter(|c| **c != self.id_name)
            .cloned()
            .collect();
    }

    fn rebuild_joined(&mut self) {
        self.joined_columns_on_select = self.column_names.join(", ");
        self.joined_columns_on_insert = self.columns_on_insert.join(", ");
        self.joined_values_on_insert = vec!["?"; self.columns_on_insert.len()].join(", ");
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Primary-key column name; empty when the table has none.
    pub fn id_name(&self) -> &str {
        &self.id_name
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn value_types(&self) -> &HashMap<String, ValueKind> {
        &self.value_types
    }

    pub fn value_type(&self, column: &str) -> Option<ValueKind> {
        self.value_types.get(column).copied()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.value_types.contains_key(column)
    }

    pub fn columns_on_insert(&self) -> &[String] {
        &self.columns_on_insert
    }

    pub fn columns_on_update(&self) -> &HashSet<String> {
        &self.columns_on_update
    }

    /// `col, col, col`, the select projection.
    pub fn joined_columns_on_select(&self) -> &str {
        &self.joined_columns_on_select
    }

    /// `col, col`, the insert column list.
    pub fn joined_columns_on_insert(&self) -> &str {
        &self.joined_columns_on_insert
    }

    /// `?, ?`, one placeholder per insert column.
    pub fn joined_values_on_insert(&self) -> &str {
        &self.joined_values_on_insert
    }

    pub fn default_values(&self) -> &HashMap<String, Value> {
        &self.default_values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> TableSchema {
        TableSchema::new("users")
            .with_columns(&[
                ("id", ValueKind::Long),
                ("name", ValueKind::Text),
                ("age", ValueKind::Int),
            ])
            .with_primary_key("id")
    }

    #[test]
    fn joined_fragments() {
        let s = schema();
        assert_eq!(s.joined_columns_on_select(), "id, name, age");
        assert_eq!(s.joined_columns_on_insert(), "id, name, age");
        assert_eq!(s.joined_values_on_insert(), "?, ?, ?");
    }

    #[test]
    fn primary_key_excluded_from_update_set() {
        let s = schema();
        assert!(!s.columns_on_update().contains("id"));
        assert!(s.columns_on_update().contains("name"));
        assert!(s.columns_on_update().contains("age"));
    }

    #[test]
    fn insert_columns_override_recomputes_fragments() {
        let s = schema().with_insert_columns(&["name", "age"]);
        assert_eq!(s.columns_on_insert(), ["name", "age"]);
        assert_eq!(s.joined_columns_on_insert(), "name, age");
        assert_eq!(s.joined_values_on_insert(), "?, ?");
        // select projection still covers every column
        assert_eq!(s.joined_columns_on_select(), "id, name, age");
    }

    #[test]
    fn value_kind_lookup() {
        let s = schema();
        assert_eq!(s.value_type("age"), Some(ValueKind::Int));
        assert_eq!(s.value_type("missing"), None);
        assert!(s.has_column("name"));
    }
}
