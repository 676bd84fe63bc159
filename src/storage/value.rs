//! Tagged values exchanged with SQLite
//!
//! SQLite is dynamically typed per cell, so every bound parameter and every
//! extracted column goes through [`SqlValue`]. Repositories decode rows
//! positionally with the typed accessors on [`SqlRow`].

use super::{time, StorageError};
use chrono::{DateTime, Utc};
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Real(f64),
    Null,
}

impl SqlValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Text(_) => "text",
            SqlValue::Integer(_) => "integer",
            SqlValue::Real(_) => "real",
            SqlValue::Null => "null",
        }
    }

    /// Convert a cell read from a row. Blobs have no tag here and map to `Null`.
    pub(crate) fn from_value_ref(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Text(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Integer(i) => SqlValue::Integer(i),
            ValueRef::Real(f) => SqlValue::Real(f),
            ValueRef::Null | ValueRef::Blob(_) => SqlValue::Null,
        }
    }
}

// rusqlite binds text with SQLITE_TRANSIENT, so SQLite copies the bytes
// during the bind call and never keeps a pointer into our String.
impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlValue::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            SqlValue::Real(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            SqlValue::Null => ToSqlOutput::Borrowed(ValueRef::Null),
        })
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<i64> for SqlValue {
    fn from(i: i64) -> Self {
        SqlValue::Integer(i)
    }
}

impl From<u32> for SqlValue {
    fn from(i: u32) -> Self {
        SqlValue::Integer(i64::from(i))
    }
}

impl From<f64> for SqlValue {
    fn from(f: f64) -> Self {
        SqlValue::Real(f)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(ts: DateTime<Utc>) -> Self {
        SqlValue::Text(time::format_timestamp(&ts))
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// One result row, columns in SELECT order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlRow {
    values: Vec<SqlValue>,
}

impl SqlRow {
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, idx: usize) -> Option<&SqlValue> {
        self.values.get(idx)
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    fn column(&self, idx: usize) -> Result<&SqlValue, StorageError> {
        self.values.get(idx).ok_or_else(|| {
            StorageError::DbCorrupted(format!(
                "column {} missing (row has {} columns)",
                idx,
                self.values.len()
            ))
        })
    }

    fn mismatch(idx: usize, expected: &str, found: &SqlValue) -> StorageError {
        StorageError::DbCorrupted(format!(
            "column {}: expected {}, found {}",
            idx,
            expected,
            found.type_name()
        ))
    }

    pub fn text(&self, idx: usize) -> Result<&str, StorageError> {
        match self.column(idx)? {
            SqlValue::Text(s) => Ok(s),
            other => Err(Self::mismatch(idx, "text", other)),
        }
    }

    pub fn integer(&self, idx: usize) -> Result<i64, StorageError> {
        match self.column(idx)? {
            SqlValue::Integer(i) => Ok(*i),
            other => Err(Self::mismatch(idx, "integer", other)),
        }
    }

    pub fn opt_text(&self, idx: usize) -> Result<Option<&str>, StorageError> {
        match self.column(idx)? {
            SqlValue::Text(s) => Ok(Some(s)),
            SqlValue::Null => Ok(None),
            other => Err(Self::mismatch(idx, "text or null", other)),
        }
    }

    pub fn opt_integer(&self, idx: usize) -> Result<Option<i64>, StorageError> {
        match self.column(idx)? {
            SqlValue::Integer(i) => Ok(Some(*i)),
            SqlValue::Null => Ok(None),
            other => Err(Self::mismatch(idx, "integer or null", other)),
        }
    }

    /// Integer column that must fit a non-negative `u32`
    pub fn u32(&self, idx: usize) -> Result<u32, StorageError> {
        let i = self.integer(idx)?;
        u32::try_from(i).map_err(|_| {
            StorageError::DbCorrupted(format!("column {}: {} out of range for u32", idx, i))
        })
    }

    pub fn opt_u32(&self, idx: usize) -> Result<Option<u32>, StorageError> {
        match self.opt_integer(idx)? {
            Some(i) => u32::try_from(i).map(Some).map_err(|_| {
                StorageError::DbCorrupted(format!("column {}: {} out of range for u32", idx, i))
            }),
            None => Ok(None),
        }
    }

    /// Text column holding an ISO-8601 or legacy `YYYY-MM-DD HH:MM:SS` timestamp
    pub fn timestamp(&self, idx: usize) -> Result<DateTime<Utc>, StorageError> {
        let raw = self.text(idx)?;
        time::parse_timestamp(raw).ok_or_else(|| {
            StorageError::DbCorrupted(format!("column {}: unparsable timestamp '{}'", idx, raw))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_conversion() {
        assert_eq!(SqlValue::from(Some("openai")), SqlValue::Text("openai".to_string()));
        assert_eq!(SqlValue::from(None::<u32>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(1536u32)), SqlValue::Integer(1536));
    }

    #[test]
    fn test_blob_maps_to_null() {
        assert_eq!(SqlValue::from_value_ref(ValueRef::Blob(&[1, 2, 3])), SqlValue::Null);
    }

    #[test]
    fn test_typed_accessors() {
        let row = SqlRow::new(vec![
            SqlValue::Text("b1".to_string()),
            SqlValue::Integer(7),
            SqlValue::Null,
            SqlValue::Real(0.5),
        ]);

        assert_eq!(row.text(0).unwrap(), "b1");
        assert_eq!(row.u32(1).unwrap(), 7);
        assert_eq!(row.opt_text(2).unwrap(), None);
        assert_eq!(row.opt_integer(2).unwrap(), None);
        assert_eq!(row.get(3), Some(&SqlValue::Real(0.5)));
    }

    #[test]
    fn test_shape_mismatch_is_corruption() {
        let row = SqlRow::new(vec![SqlValue::Integer(-1), SqlValue::Text("x".to_string())]);

        assert!(matches!(row.text(0), Err(StorageError::DbCorrupted(_))));
        assert!(matches!(row.u32(0), Err(StorageError::DbCorrupted(_))));
        assert!(matches!(row.opt_integer(1), Err(StorageError::DbCorrupted(_))));
        assert!(matches!(row.timestamp(1), Err(StorageError::DbCorrupted(_))));
        assert!(matches!(row.text(5), Err(StorageError::DbCorrupted(_))));
    }
}
