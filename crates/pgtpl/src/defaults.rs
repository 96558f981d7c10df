//! Default-value backfill for inserts.
//!
//! Every column in a schema's insert list must resolve to a caller value or
//! a registered default; a column with neither fails the whole operation
//! before any statement is executed.

use crate::error::{TplError, TplResult};
use crate::schema::TableSchema;
use crate::value::Value;
use std::collections::HashMap;

/// Build the full insert parameter map for one row.
pub fn apply_on_insert(
    schema: &TableSchema,
    values: &HashMap<String, Value>,
) -> TplResult<HashMap<String, Value>> {
    let defaults = schema.default_values();
    let mut result = HashMap::with_capacity(schema.columns_on_insert().len());

    for column in schema.columns_on_insert() {
        if let Some(value) = values.get(column) {
            result.insert(column.clone(), value.clone());
            continue;
        }
        let Some(default) = defaults.get(column) else {
            return Err(TplError::MissingDefault {
                table: schema.table_name().to_string(),
                column: column.clone(),
            });
        };
        result.insert(column.clone(), default.clone());
    }

    Ok(result)
}

/// Row-wise backfill over a batch. Rows are validated independently, but the
/// payload is built eagerly, so one bad row aborts the whole batch.
pub fn apply_on_insert_rows(
    schema: &TableSchema,
    rows: &[HashMap<String, Value>],
) -> TplResult<Vec<HashMap<String, Value>>> {
    rows.iter().map(|row| apply_on_insert(schema, row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    fn schema() -> TableSchema {
        TableSchema::new("users")
            .with_columns(&[
                ("id", ValueKind::Long),
                ("name", ValueKind::Text),
                ("age", ValueKind::Int),
            ])
            .with_primary_key("id")
            .with_insert_columns(&["name", "age"])
            .with_default("age", Value::Int(0))
    }

    #[test]
    fn fills_exactly_the_missing_columns() {
        let mut values = HashMap::new();
        values.insert("name".to_string(), Value::Text("a".into()));

        let bound = apply_on_insert(&schema(), &values).unwrap();
        assert_eq!(bound.len(), 2);
        assert_eq!(bound["name"], Value::Text("a".into()));
        assert_eq!(bound["age"], Value::Int(0));
    }

    #[test]
    fn caller_value_wins_over_default() {
        let mut values = HashMap::new();
        values.insert("name".to_string(), Value::Text("a".into()));
        values.insert("age".to_string(), Value::Int(42));

        let bound = apply_on_insert(&schema(), &values).unwrap();
        assert_eq!(bound["age"], Value::Int(42));
    }

    #[test]
    fn missing_default_names_the_column() {
        let values = HashMap::new();
        let err = apply_on_insert(&schema(), &values).unwrap_err();
        match err {
            TplError::MissingDefault { table, column } => {
                assert_eq!(table, "users");
                assert_eq!(column, "name");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn caller_null_is_a_value() {
        let mut values = HashMap::new();
        values.insert("name".to_string(), Value::Null);

        let bound = apply_on_insert(&schema(), &values).unwrap();
        assert_eq!(bound["name"], Value::Null);
    }

    #[test]
    fn one_bad_row_aborts_the_batch() {
        let mut good = HashMap::new();
        good.insert("name".to_string(), Value::Text("a".into()));
        let bad = HashMap::new();

        let err = apply_on_insert_rows(&schema(), &[good, bad]).unwrap_err();
        assert!(matches!(err, TplError::MissingDefault { .. }));
    }

    #[test]
    fn empty_batch_builds_empty_payload() {
        assert!(apply_on_insert_rows(&schema(), &[]).unwrap().is_empty());
    }
}
