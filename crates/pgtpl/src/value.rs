//! Dynamic scalar values.
//!
//! [`Value`] is a closed sum over the primitive SQL scalar kinds. Schemas
//! declare a [`ValueKind`] per column, result rows are materialized as
//! `column -> Value` maps, and statements bind `Value`s positionally.
//!
//! Accessors are fallible: asking a `Value::Text` for an integer fails with
//! [`TplError::TypeMismatch`] instead of coercing. The only implicit widening
//! is `Int` -> `i64`.

use crate::error::{TplError, TplResult};
use bytes::BytesMut;
use serde::Serialize;
use tokio_postgres::Row;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

/// The kind tag of a [`Value`], without the payload.
///
/// Used by table schemas to declare how result columns are decoded, and by
/// scalar queries to declare the expected result kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Int,
    Long,
    Float,
    Double,
    Text,
    Bytes,
    Timestamp,
    Date,
    Uuid,
    Json,
}

/// A dynamically typed SQL scalar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL. A present `Null` is a real assignment, not an absent value.
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(chrono::NaiveDateTime),
    Date(chrono::NaiveDate),
    Uuid(uuid::Uuid),
    Json(serde_json::Value),
}

impl Value {
    /// The kind of this value. `Null` has no kind of its own and reports
    /// whatever accessor is applied to it as a mismatch.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Int(_) => Some(ValueKind::Int),
            Value::Long(_) => Some(ValueKind::Long),
            Value::Float(_) => Some(ValueKind::Float),
            Value::Double(_) => Some(ValueKind::Double),
            Value::Text(_) => Some(ValueKind::Text),
            Value::Bytes(_) => Some(ValueKind::Bytes),
            Value::Timestamp(_) => Some(ValueKind::Timestamp),
            Value::Date(_) => Some(ValueKind::Date),
            Value::Uuid(_) => Some(ValueKind::Uuid),
            Value::Json(_) => Some(ValueKind::Json),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn mismatch(&self, expected: ValueKind) -> TplError {
        TplError::TypeMismatch {
            expected,
            actual: self.kind(),
        }
    }

    pub fn as_bool(&self) -> TplResult<bool> {
        match self {
            Value::Bool(v) => Ok(*v),
            other => Err(other.mismatch(ValueKind::Bool)),
        }
    }

    pub fn as_i32(&self) -> TplResult<i32> {
        match self {
            Value::Int(v) => Ok(*v),
            other => Err(other.mismatch(ValueKind::Int)),
        }
    }

    /// `Int` widens to `i64`; every other kind is a mismatch.
    pub fn as_i64(&self) -> TplResult<i64> {
        match self {
            Value::Int(v) => Ok(i64::from(*v)),
            Value::Long(v) => Ok(*v),
            other => Err(other.mismatch(ValueKind::Long)),
        }
    }

    /// `Float` widens to `f64`; every other kind is a mismatch.
    pub fn as_f64(&self) -> TplResult<f64> {
        match self {
            Value::Float(v) => Ok(f64::from(*v)),
            Value::Double(v) => Ok(*v),
            other => Err(other.mismatch(ValueKind::Double)),
        }
    }

    pub fn as_str(&self) -> TplResult<&str> {
        match self {
            Value::Text(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Text)),
        }
    }

    pub fn as_bytes(&self) -> TplResult<&[u8]> {
        match self {
            Value::Bytes(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Bytes)),
        }
    }

    pub fn as_timestamp(&self) -> TplResult<chrono::NaiveDateTime> {
        match self {
            Value::Timestamp(v) => Ok(*v),
            other => Err(other.mismatch(ValueKind::Timestamp)),
        }
    }

    pub fn as_date(&self) -> TplResult<chrono::NaiveDate> {
        match self {
            Value::Date(v) => Ok(*v),
            other => Err(other.mismatch(ValueKind::Date)),
        }
    }

    pub fn as_uuid(&self) -> TplResult<uuid::Uuid> {
        match self {
            Value::Uuid(v) => Ok(*v),
            other => Err(other.mismatch(ValueKind::Uuid)),
        }
    }

    pub fn as_json(&self) -> TplResult<&serde_json::Value> {
        match self {
            Value::Json(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Json)),
        }
    }

    /// Materialize one column of a driver row according to its declared kind.
    ///
    /// SQL NULL decodes to [`Value::Null`] regardless of the declared kind.
    pub fn from_column(row: &Row, idx: usize, kind: ValueKind) -> TplResult<Value> {
        fn get<'a, T>(row: &'a Row, idx: usize) -> TplResult<Option<T>>
        where
            T: tokio_postgres::types::FromSql<'a>,
        {
            row.try_get::<usize, Option<T>>(idx).map_err(|e| {
                let column = row
                    .columns()
                    .get(idx)
                    .map(|c| c.name().to_string())
                    .unwrap_or_else(|| idx.to_string());
                TplError::decode(column, e.to_string())
            })
        }

        let value = match kind {
            ValueKind::Bool => get::<bool>(row, idx)?.map(Value::Bool),
            ValueKind::Int => get::<i32>(row, idx)?.map(Value::Int),
            ValueKind::Long => get::<i64>(row, idx)?.map(Value::Long),
            ValueKind::Float => get::<f32>(row, idx)?.map(Value::Float),
            ValueKind::Double => get::<f64>(row, idx)?.map(Value::Double),
            ValueKind::Text => get::<String>(row, idx)?.map(Value::Text),
            ValueKind::Bytes => get::<Vec<u8>>(row, idx)?.map(Value::Bytes),
            ValueKind::Timestamp => get::<chrono::NaiveDateTime>(row, idx)?.map(Value::Timestamp),
            ValueKind::Date => get::<chrono::NaiveDate>(row, idx)?.map(Value::Date),
            ValueKind::Uuid => get::<uuid::Uuid>(row, idx)?.map(Value::Uuid),
            ValueKind::Json => get::<serde_json::Value>(row, idx)?.map(Value::Json),
        };
        Ok(value.unwrap_or(Value::Null))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            // The statement's declared parameter type wins for numbers: a
            // schema may register Int while the column is bigint.
            Value::Int(v) => {
                if *ty == Type::INT8 {
                    i64::from(*v).to_sql(ty, out)
                } else if *ty == Type::INT2 {
                    i16::try_from(*v)?.to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Value::Long(v) => {
                if *ty == Type::INT4 {
                    i32::try_from(*v)?.to_sql(ty, out)
                } else if *ty == Type::INT2 {
                    i16::try_from(*v)?.to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Value::Float(v) => {
                if *ty == Type::FLOAT8 {
                    f64::from(*v).to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Value::Double(v) => v.to_sql(ty, out),
            Value::Text(v) => v.to_sql(ty, out),
            Value::Bytes(v) => v.to_sql(ty, out),
            Value::Timestamp(v) => v.to_sql(ty, out),
            Value::Date(v) => v.to_sql(ty, out),
            Value::Uuid(v) => v.to_sql(ty, out),
            Value::Json(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // The concrete kind is only known per instance; mismatches surface
        // from the inner `to_sql` call instead.
        true
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessor_matches_kind() {
        assert_eq!(Value::Int(7).as_i32().unwrap(), 7);
        assert_eq!(Value::Text("a".into()).as_str().unwrap(), "a");
        assert!(Value::Bool(true).as_bool().unwrap());
    }

    #[test]
    fn accessor_rejects_other_kind() {
        let err = Value::Text("a".into()).as_i64().unwrap_err();
        assert!(matches!(err, TplError::TypeMismatch { .. }));
    }

    #[test]
    fn int_widens_to_long() {
        assert_eq!(Value::Int(7).as_i64().unwrap(), 7i64);
        assert_eq!(Value::Long(7).as_i64().unwrap(), 7i64);
    }

    #[test]
    fn long_does_not_narrow_to_int() {
        assert!(Value::Long(7).as_i32().is_err());
    }

    #[test]
    fn float_widens_to_double() {
        assert_eq!(Value::Float(1.5).as_f64().unwrap(), 1.5f64);
    }

    #[test]
    fn null_has_no_kind() {
        assert!(Value::Null.kind().is_none());
        assert!(Value::Null.is_null());
        assert!(Value::Null.as_i64().is_err());
    }

    #[test]
    fn from_conversions() {
        assert_eq!(Value::from(5i32), Value::Int(5));
        assert_eq!(Value::from("x"), Value::Text("x".into()));
        assert_eq!(Value::from(true), Value::Bool(true));
    }
}
