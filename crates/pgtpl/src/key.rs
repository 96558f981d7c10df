//! Key-equality predicate construction.
//!
//! Builds the `key = ?` filter used by the by-key operation variants, either
//! bound (value known up front) or deferred (value carried per row by batch
//! update).

use crate::error::{TplError, TplResult};
use crate::filter::{Cmp, Filter, Parameter};
use crate::schema::TableSchema;
use crate::value::Value;

/// Resolve the key column: the supplied name trimmed, or the schema's
/// primary key when none is given. Empty after trimming is a precondition
/// failure.
pub fn resolve_name(schema: &TableSchema, key_name: Option<&str>) -> TplResult<String> {
    let name = match key_name {
        Some(n) => n.trim(),
        None => schema.id_name(),
    };
    if name.is_empty() {
        return Err(TplError::precondition(format!(
            "key name must not be empty, table: {}",
            schema.table_name()
        )));
    }
    Ok(name.to_string())
}

/// `key = ?` with the value bound by name.
pub fn parse(key_name: &str, key_value: Value) -> TplResult<Filter> {
    if key_name.trim().is_empty() {
        return Err(TplError::precondition("key name must not be empty"));
    }
    Ok(Filter::Bound {
        column: key_name.to_string(),
        cmp: Cmp::Eq,
        param: Parameter::new(key_name, key_value),
    })
}

/// `key = ?` with the value supplied positionally later.
pub fn parse_deferred(key_name: &str) -> TplResult<Filter> {
    if key_name.trim().is_empty() {
        return Err(TplError::precondition("key name must not be empty"));
    }
    Ok(Filter::deferred(key_name, Cmp::Eq))
}

/// Single-element filter list for the resolved key of `schema`.
pub fn parse_for(
    schema: &TableSchema,
    key_value: Value,
    key_name: Option<&str>,
) -> TplResult<Vec<Filter>> {
    let name = resolve_name(schema, key_name)?;
    Ok(vec![parse(&name, key_value)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    fn schema() -> TableSchema {
        TableSchema::new("users")
            .with_columns(&[("id", ValueKind::Long), ("name", ValueKind::Text)])
            .with_primary_key("id")
    }

    #[test]
    fn resolve_falls_back_to_primary_key() {
        assert_eq!(resolve_name(&schema(), None).unwrap(), "id");
    }

    #[test]
    fn resolve_trims_supplied_name() {
        assert_eq!(resolve_name(&schema(), Some("  name ")).unwrap(), "name");
    }

    #[test]
    fn blank_name_is_a_precondition_failure() {
        assert!(resolve_name(&schema(), Some("   ")).unwrap_err().is_precondition());
        assert!(parse("", Value::Long(1)).unwrap_err().is_precondition());
        assert!(parse_deferred(" ").unwrap_err().is_precondition());
    }

    #[test]
    fn no_primary_key_and_no_name_fails() {
        let s = TableSchema::new("t").with_columns(&[("a", ValueKind::Int)]);
        assert!(resolve_name(&s, None).unwrap_err().is_precondition());
    }

    #[test]
    fn parse_for_builds_bound_equality() {
        let filters = parse_for(&schema(), Value::Long(5), None).unwrap();
        assert_eq!(filters.len(), 1);
        match &filters[0] {
            Filter::Bound { column, cmp, param } => {
                assert_eq!(column, "id");
                assert_eq!(*cmp, Cmp::Eq);
                assert_eq!(param.value, Value::Long(5));
            }
            other => panic!("unexpected filter: {other:?}"),
        }
    }
}
