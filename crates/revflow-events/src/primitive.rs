//! Scalar property values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A tagged scalar value used for event properties and trait updates.
///
/// Encodes as a bare JSON scalar. Null, array, and object inputs are not
/// representable; they are dropped when a property map is constructed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Primitive {
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit float.
    Double(f64),
    /// A string value.
    Str(String),
}

impl Primitive {
    /// Converts a JSON value into a primitive, if it is a supported scalar.
    ///
    /// Returns `None` for null, arrays, and objects.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Primitive::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Primitive::Int(i))
                } else {
                    n.as_f64().map(Primitive::Double)
                }
            }
            serde_json::Value::String(s) => Some(Primitive::Str(s.clone())),
            _ => None,
        }
    }

    /// Builds a property map from JSON entries, dropping unsupported values.
    ///
    /// Returns `None` when the map is empty after filtering, so that a
    /// message's `properties` field is absent rather than `{}`.
    pub fn filtered_map(
        entries: impl IntoIterator<Item = (String, serde_json::Value)>,
    ) -> Option<BTreeMap<String, Primitive>> {
        let map: BTreeMap<String, Primitive> = entries
            .into_iter()
            .filter_map(|(key, value)| Primitive::from_json(&value).map(|p| (key, p)))
            .collect();

        if map.is_empty() {
            None
        } else {
            Some(map)
        }
    }
}

impl From<bool> for Primitive {
    fn from(b: bool) -> Self {
        Primitive::Bool(b)
    }
}

impl From<i64> for Primitive {
    fn from(i: i64) -> Self {
        Primitive::Int(i)
    }
}

impl From<f64> for Primitive {
    fn from(f: f64) -> Self {
        Primitive::Double(f)
    }
}

impl From<&str> for Primitive {
    fn from(s: &str) -> Self {
        Primitive::Str(s.to_string())
    }
}

impl From<String> for Primitive {
    fn from(s: String) -> Self {
        Primitive::Str(s)
    }
}
