//! Runtime values held by model instances.
//!
//! `Value` is the closed set of things a field can hold, including a
//! nested model instance for foreign keys. Serialization to the wire
//! level is one recursive function over the variant: model references
//! collapse to their primary key, containers to JSON text.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use ingot_sql::SqlValue;

use crate::model::Instance;

/// Formats used when encoding temporal values as SQLite text.
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// A runtime field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent / NULL.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// String.
    String(String),
    /// Date and time.
    DateTime(NaiveDateTime),
    /// Date.
    Date(NaiveDate),
    /// Time.
    Time(NaiveTime),
    /// Decoded JSON document.
    Json(serde_json::Value),
    /// Ordered collection.
    List(Vec<Value>),
    /// A nested model instance (full or primary-key-only stub).
    Model(Box<Instance>),
}

impl Value {
    /// Returns whether this value is Null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Serializes this value for the wire.
    ///
    /// Model references are replaced by their primary-key value;
    /// lists and JSON documents are encoded as JSON text; temporal
    /// values as ISO-8601 text.
    #[must_use]
    pub fn to_sql(&self) -> SqlValue {
        match self {
            Self::Null => SqlValue::Null,
            Self::Bool(b) => SqlValue::Bool(*b),
            Self::Int(n) => SqlValue::Int(*n),
            Self::Float(f) => SqlValue::Float(*f),
            Self::String(s) => SqlValue::Text(s.clone()),
            Self::DateTime(dt) => SqlValue::Text(dt.format(DATETIME_FORMAT).to_string()),
            Self::Date(d) => SqlValue::Text(d.format(DATE_FORMAT).to_string()),
            Self::Time(t) => SqlValue::Text(t.format(TIME_FORMAT).to_string()),
            Self::Json(j) => SqlValue::Text(j.to_string()),
            Self::List(_) => SqlValue::Text(self.to_json().to_string()),
            Self::Model(instance) => instance.pk().to_sql(),
        }
    }

    /// Normalizes this value into a JSON document, recursively
    /// collapsing nested model references to their primary keys.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(n) => serde_json::Value::from(*n),
            Self::Float(f) => {
                serde_json::Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::DateTime(dt) => {
                serde_json::Value::String(dt.format(DATETIME_FORMAT).to_string())
            }
            Self::Date(d) => serde_json::Value::String(d.format(DATE_FORMAT).to_string()),
            Self::Time(t) => serde_json::Value::String(t.format(TIME_FORMAT).to_string()),
            Self::Json(j) => j.clone(),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Model(instance) => instance.pk().to_json(),
        }
    }

    /// Returns the contained string, if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the contained integer, if this is an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the nested instance, if this is a model reference.
    #[must_use]
    pub fn as_model(&self) -> Option<&Instance> {
        match self {
            Self::Model(instance) => Some(instance),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(String::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Self::Time(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl From<Vec<Self>> for Value {
    fn from(v: Vec<Self>) -> Self {
        Self::List(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Self::List(v.into_iter().map(Self::String).collect())
    }
}

impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Self::List(v.into_iter().map(Self::from).collect())
    }
}

impl From<Instance> for Value {
    fn from(v: Instance) -> Self {
        Self::Model(Box::new(v))
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Builds a `(field name, Value)` list for instance construction and
/// filtering.
///
/// ```ignore
/// let user = users.objects().create(&db, values! {
///     "name" => "Tom",
///     "is_active" => true,
/// }).await?;
/// ```
#[macro_export]
macro_rules! values {
    () => {
        ::std::vec::Vec::<(::std::string::String, $crate::Value)>::new()
    };
    ($($key:literal => $val:expr),+ $(,)?) => {
        ::std::vec![
            $((::std::string::String::from($key), $crate::Value::from($val))),+
        ]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_serialization() {
        assert_eq!(Value::Null.to_sql(), SqlValue::Null);
        assert_eq!(Value::Int(3).to_sql(), SqlValue::Int(3));
        assert_eq!(
            Value::from("hi").to_sql(),
            SqlValue::Text(String::from("hi"))
        );
    }

    #[test]
    fn test_datetime_serialization() {
        let dt = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(
            Value::DateTime(dt).to_sql(),
            SqlValue::Text(String::from("2024-05-01 12:30:00"))
        );
    }

    #[test]
    fn test_list_serializes_as_json_text() {
        let value = Value::from(vec!["a", "b"]);
        assert_eq!(
            value.to_sql(),
            SqlValue::Text(String::from(r#"["a","b"]"#))
        );
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(5_i64)), Value::Int(5));
    }

    #[test]
    fn test_values_macro() {
        let pairs = values! { "a" => 1, "b" => "two" };
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], (String::from("a"), Value::Int(1)));
        let empty = values! {};
        assert!(empty.is_empty());
    }
}
