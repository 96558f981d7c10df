//! Structural (SET-clause) parameter naming.
//!
//! SET-clause parameters and predicate parameters occupy the same flat
//! name space at the execution boundary. A statement like
//! `UPDATE t SET status = ? WHERE status = ?` would bind both placeholders
//! from one `status` entry; wrapping the structural name as `[status]`
//! keeps the two bindings apart. Predicate names are appended after the
//! wrapped names, unwrapped.

use crate::value::Value;
use std::collections::HashMap;

const PLACEHOLDER: &str = " = ?";

/// `name` -> `[name]`.
pub fn wrap(name: &str) -> String {
    format!("[{name}]")
}

/// Wrapped placeholder names followed by the predicate's own names.
///
/// Identity on `parameter_names` when the placeholder side is absent.
pub fn concat_names(
    placeholder_names: Option<&[String]>,
    parameter_names: Vec<String>,
) -> Vec<String> {
    let Some(placeholders) = placeholder_names else {
        return parameter_names;
    };

    let mut result: Vec<String> = placeholders.iter().map(|n| wrap(n)).collect();
    result.extend(parameter_names);
    result
}

/// Bracket-keyed placeholder values merged with the predicate's own map.
///
/// Identity on `parameters` when the placeholder side is absent.
pub fn concat_params(
    placeholders: Option<&[(String, Value)]>,
    parameters: HashMap<String, Value>,
) -> HashMap<String, Value> {
    let Some(placeholders) = placeholders else {
        return parameters;
    };

    let mut result: HashMap<String, Value> = placeholders
        .iter()
        .map(|(name, value)| (wrap(name), value.clone()))
        .collect();
    result.extend(parameters);
    result
}

/// `[a, b]` -> `["a = ?", "b = ?"]`; blank columns are dropped.
pub fn join_placeholder(column_names: &[String]) -> Vec<String> {
    column_names
        .iter()
        .filter(|c| !c.trim().is_empty())
        .map(|c| format!("{c}{PLACEHOLDER}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_wrapped_then_appended() {
        let names = concat_names(Some(&["x".to_string()]), vec!["y".to_string()]);
        assert_eq!(names, ["[x]", "y"]);
    }

    #[test]
    fn concat_names_is_identity_without_placeholders() {
        let names = concat_names(None, vec!["y".to_string()]);
        assert_eq!(names, ["y"]);
    }

    #[test]
    fn same_identifier_does_not_collide() {
        let placeholders = vec![("status".to_string(), Value::Text("inactive".into()))];
        let mut predicate = HashMap::new();
        predicate.insert("status".to_string(), Value::Text("active".into()));

        let merged = concat_params(Some(&placeholders), predicate);
        assert_eq!(merged["[status]"], Value::Text("inactive".into()));
        assert_eq!(merged["status"], Value::Text("active".into()));
    }

    #[test]
    fn concat_params_is_identity_without_placeholders() {
        let mut predicate = HashMap::new();
        predicate.insert("id".to_string(), Value::Long(1));
        let merged = concat_params(None, predicate.clone());
        assert_eq!(merged, predicate);
    }

    #[test]
    fn join_placeholder_drops_blank_columns() {
        let fragments = join_placeholder(&["a".to_string(), "".to_string(), " ".to_string()]);
        assert_eq!(fragments, ["a = ?"]);
    }
}
