//! The casted document produced by processing.

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;

/// A document after every value in it was cast into the canonical form its
/// schema calls for.
///
/// Unlike `serde_json::Value`, a `Doc` distinguishes a property that was
/// declared but never given ([`Absent`](#variant.Absent)) from one that was
/// given as `null`, or whose value could not be cast
/// ([`Null`](#variant.Null)).
#[derive(Debug, Clone, PartialEq)]
pub enum Doc {
    /// No value was given at all.
    Absent,

    /// A value was given, but there is nothing usable in it.
    Null,

    Bool(bool),

    Integer(i64),

    Number(f64),

    String(String),

    /// A string cast under the `date` format.
    Date(NaiveDate),

    /// A string cast under the `date-time` format.
    DateTime(DateTime<Utc>),

    Array(Vec<Doc>),

    /// Object entries, in the order the schema declares its properties.
    Object(Vec<(String, Doc)>),
}

impl Doc {
    pub fn is_absent(&self) -> bool {
        matches!(self, Doc::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Doc::Null)
    }

    /// Is there a usable value here? Keyword checks only run against present
    /// values.
    pub fn is_present(&self) -> bool {
        !self.is_absent() && !self.is_null()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Doc::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Doc::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value of an `Integer` or `Number`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Doc::Integer(n) => Some(*n as f64),
            Doc::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Doc::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Doc]> {
        match self {
            Doc::Array(elements) => Some(elements),
            _ => None,
        }
    }

    /// The calendar year of a `Date` or `DateTime`.
    pub fn year(&self) -> Option<i32> {
        match self {
            Doc::Date(date) => Some(date.year()),
            Doc::DateTime(datetime) => Some(datetime.year()),
            _ => None,
        }
    }

    /// Look up an object entry. Declared-but-absent entries are returned as
    /// `Some(&Doc::Absent)`; undeclared keys as `None`.
    pub fn get(&self, key: &str) -> Option<&Doc> {
        match self {
            Doc::Object(entries) => entries
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// The keys of an object, in declaration order.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Doc::Object(entries) => entries.iter().map(|(name, _)| name.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

/// Converts without casting. Numbers which fit an `i64` become `Integer`.
impl From<&Value> for Doc {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Doc::Null,
            Value::Bool(b) => Doc::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Doc::Integer(i),
                None => n.as_f64().map_or(Doc::Null, Doc::Number),
            },
            Value::String(s) => Doc::String(s.clone()),
            Value::Array(elements) => Doc::Array(elements.iter().map(Doc::from).collect()),
            Value::Object(fields) => Doc::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), Doc::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Serializes as canonical JSON. Absent object entries are left out, dates
/// are written as `YYYY-MM-DD` and date-times as `YYYY-MM-DDTHH:MM:SSZ`.
impl Serialize for Doc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Doc::Absent | Doc::Null => serializer.serialize_none(),
            Doc::Bool(b) => serializer.serialize_bool(*b),
            Doc::Integer(n) => serializer.serialize_i64(*n),
            Doc::Number(n) => serializer.serialize_f64(*n),
            Doc::String(s) => serializer.serialize_str(s),
            Doc::Date(date) => serializer.collect_str(&date.format("%Y-%m-%d")),
            Doc::DateTime(datetime) => {
                serializer.serialize_str(&datetime.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            Doc::Array(elements) => {
                let mut seq = serializer.serialize_seq(Some(elements.len()))?;
                for element in elements {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Doc::Object(entries) => {
                let present = entries.iter().filter(|(_, value)| !value.is_absent());
                let mut map = serializer.serialize_map(None)?;
                for (name, value) in present {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}
