//! SET-clause construction.
//!
//! Caller-supplied assignments come in two flavors: validated name/value
//! pairs rendered as `column = ?`, and raw set expressions (e.g.
//! `counter = counter + 1`) passed through verbatim.

use crate::placeholder;
use crate::schema::TableSchema;
use crate::value::Value;

/// Filter caller assignments down to the schema's updatable columns,
/// preserving encountered order. Unknown columns are discarded silently.
pub fn parse_set_names(schema: &TableSchema, set_values: &[(String, Value)]) -> Vec<String> {
    let updatable = schema.columns_on_update();
    set_values
        .iter()
        .filter(|(name, _)| updatable.contains(name.as_str()))
        .map(|(name, _)| name.clone())
        .collect()
}

/// Render the textual SET clause body: raw expressions verbatim, then
/// `name = ?` fragments, joined with `", "`.
///
/// ```
/// # use pgtpl::set::join_sets;
/// let body = join_sets(&["a = a + 1".to_string()], &["b".to_string()]);
/// assert_eq!(body, "a = a + 1, b = ?");
/// ```
pub fn join_sets(sets: &[String], set_names: &[String]) -> String {
    let mut parts = sets.to_vec();
    parts.extend(placeholder::join_placeholder(set_names));
    parts.join(", ")
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
    }

    #[test]
    fn keeps_only_updatable_columns_in_order() {
        let set_values = vec![
            ("age".to_string(), Value::Int(30)),
            ("nickname".to_string(), Value::Text("x".into())),
            ("name".to_string(), Value::Text("a".into())),
            ("id".to_string(), Value::Long(1)),
        ];
        let names = parse_set_names(&schema(), &set_values);
        assert_eq!(names, ["age", "name"]);
    }

    #[test]
    fn empty_assignments_yield_no_names() {
        assert!(parse_set_names(&schema(), &[]).is_empty());
    }

    #[test]
    fn null_is_a_real_assignment() {
        let set_values = vec![("name".to_string(), Value::Null)];
        assert_eq!(parse_set_names(&schema(), &set_values), ["name"]);
    }

    #[test]
    fn joins_raw_sets_with_placeholders() {
        let body = join_sets(&["a = a + 1".to_string()], &["b".to_string()]);
        assert_eq!(body, "a = a + 1, b = ?");
    }

    #[test]
    fn raw_sets_alone() {
        let body = join_sets(&["a = a + 1".to_string(), "b = now()".to_string()], &[]);
        assert_eq!(body, "a = a + 1, b = now()");
    }

    #[test]
    fn names_alone() {
        let body = join_sets(&[], &["a".to_string(), "b".to_string()]);
        assert_eq!(body, "a = ?, b = ?");
    }

    #[test]
    fn blank_names_are_dropped() {
        let body = join_sets(&[], &["a".to_string(), "  ".to_string(), "b".to_string()]);
        assert_eq!(body, "a = ?, b = ?");
    }
}
