//! Property values
//!
//! Values carried by entity properties, with an explicit typed comparison.
//! No implicit cross-type total order is assumed: same-type values compare
//! naturally, and differently-typed values compare by a fixed type rank.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::key::Key;

/// A single property value.
///
/// `List` models repeated properties; the merge comparator never compares a
/// list directly, it compares the orientation-dependent extremum element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absent or explicitly null property
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit float
    Float(f64),
    /// Timestamp (UTC)
    Timestamp(DateTime<Utc>),
    /// UTF-8 string
    String(String),
    /// Reference to another entity
    Key(Key),
    /// Repeated property (ordered list of scalar values)
    List(Vec<Value>),
}

impl Value {
    /// Rank used to order values of different types.
    ///
    /// Integers and floats share a rank and compare numerically.
    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Integer(_) | Value::Float(_) => 2,
            Value::Timestamp(_) => 3,
            Value::String(_) => 4,
            Value::Key(_) => 5,
            Value::List(_) => 6,
        }
    }

    /// Deterministic three-way comparison.
    ///
    /// Same types compare naturally; mixed numeric types compare as floats;
    /// everything else compares by type rank. Float comparison falls back
    /// to `Equal` for NaN, which keeps the result deterministic.
    pub fn compare(&self, other: &Value) -> Ordering {
        let rank = self.type_rank().cmp(&other.type_rank());
        if rank != Ordering::Equal {
            return rank;
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (Value::Integer(a), Value::Float(b)) => {
                (*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (Value::Float(a), Value::Integer(b)) => {
                a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal)
            }
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Key(a), Value::Key(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let element = x.compare(y);
                    if element != Ordering::Equal {
                        return element;
                    }
                }
                a.len().cmp(&b.len())
            }
            // Unreachable: equal ranks are handled exhaustively above
            _ => Ordering::Equal,
        }
    }

    /// Returns true for a repeated (list) value
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Returns the list elements, if this is a repeated value
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Converts a JSON value from the document layer above.
    ///
    /// JSON has no timestamp or key representation, so those variants are
    /// only constructed natively. Nested objects are not representable as
    /// property values and become `Null`.
    pub fn from_json(value: &serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(_) => Value::Null,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Key> for Value {
    fn from(v: Key) -> Self {
        Value::Key(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_same_type_natural_order() {
        assert_eq!(
            Value::Integer(1).compare(&Value::Integer(2)),
            Ordering::Less
        );
        assert_eq!(
            Value::String("b".into()).compare(&Value::String("a".into())),
            Ordering::Greater
        );
        assert_eq!(Value::Bool(false).compare(&Value::Bool(true)), Ordering::Less);
    }

    #[test]
    fn test_mixed_numeric_comparison() {
        assert_eq!(
            Value::Integer(2).compare(&Value::Float(2.5)),
            Ordering::Less
        );
        assert_eq!(
            Value::Float(3.0).compare(&Value::Integer(2)),
            Ordering::Greater
        );
        assert_eq!(
            Value::Integer(2).compare(&Value::Float(2.0)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_cross_type_rank() {
        // Null < Bool < numeric < Timestamp < String < Key < List
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let ordered = [
            Value::Null,
            Value::Bool(true),
            Value::Integer(999),
            Value::Timestamp(ts),
            Value::String("a".into()),
            Value::Key(Key::with_id("book", 1)),
            Value::List(vec![]),
        ];
        for pair in ordered.windows(2) {
            assert_eq!(pair[0].compare(&pair[1]), Ordering::Less);
        }
    }

    #[test]
    fn test_timestamp_order() {
        let early = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(
            Value::Timestamp(early).compare(&Value::Timestamp(late)),
            Ordering::Less
        );
    }

    #[test]
    fn test_list_lexicographic() {
        let short = Value::List(vec![Value::Integer(1)]);
        let long = Value::List(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(short.compare(&long), Ordering::Less);

        let bigger_head = Value::List(vec![Value::Integer(2)]);
        assert_eq!(bigger_head.compare(&long), Ordering::Greater);
    }

    #[test]
    fn test_from_json() {
        let v = Value::from_json(&json!({"ignored": true}));
        assert_eq!(v, Value::Null);

        let v = Value::from_json(&json!([1, "two", 3.5]));
        assert_eq!(
            v,
            Value::List(vec![
                Value::Integer(1),
                Value::String("two".into()),
                Value::Float(3.5),
            ])
        );
    }
}
