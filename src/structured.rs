//! A small structured value (object / array / scalar / null) and the
//! partial-update merge used by [`PatchReg`](crate::PatchReg).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A JSON-shaped value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// absence of a value; merging `Null` into a field clears it
    Null,
    /// a boolean
    Bool(bool),
    /// an integer
    Int(i64),
    /// a floating point number
    Float(f64),
    /// a string
    Str(String),
    /// an array, merged by replacement
    Array(Vec<Value>),
    /// an object, merged field by field
    Object(BTreeMap<String, Value>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl Value {
    /// Builds an object from `(field, value)` pairs.
    ///
    /// ```
    /// use crdt_algebra::structured::Value;
    /// let v = Value::object(vec![("name", "bob".into()), ("age", 3.into())]);
    /// assert_eq!(v.get("NAME"), Some(&Value::from("bob")));
    /// ```
    pub fn object<K: Into<String>>(fields: Vec<(K, Value)>) -> Self {
        Value::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Looks up an object field, ignoring ASCII case.
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(field))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// True for `Value::Null`.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            _ => false,
        }
    }

    /// Returns `self` with `patch` merged on top of it.
    ///
    /// Objects merge field by field, matching field names without regard to
    /// ASCII case and keeping the existing spelling. Nested objects merge
    /// recursively. Everything else, arrays and `Null` included, replaces
    /// the existing value.
    ///
    /// ```
    /// use crdt_algebra::structured::Value;
    /// let base = Value::object(vec![("Name", "bob".into()), ("tags", Value::Array(vec![1.into()]))]);
    /// let patch = Value::object(vec![("name", "alice".into()), ("tags", Value::Array(vec![]))]);
    /// let merged = base.merged(&patch);
    /// assert_eq!(merged, Value::object(vec![("Name", "alice".into()), ("tags", Value::Array(vec![]))]));
    /// ```
    pub fn merged(&self, patch: &Value) -> Value {
        match (self, patch) {
            (Value::Object(base), Value::Object(patch)) => {
                let mut fields = base.clone();
                for (key, value) in patch.iter() {
                    let existing = fields
                        .keys()
                        .find(|k| k.eq_ignore_ascii_case(key))
                        .cloned();
                    match existing {
                        Some(k) => {
                            let merged = fields[&k].merged(value);
                            fields.insert(k, merged);
                        }
                        None => {
                            fields.insert(key.clone(), value.clone());
                        }
                    }
                }
                Value::Object(fields)
            }
            (_, patch) => patch.clone(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}
