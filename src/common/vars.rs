//! Variable map threaded through one execution run.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered map from variable name to JSON value.
///
/// `Vars` is the unit of data exchanged between the executor, node
/// invokers and the evaluation harness. Insertion order is preserved so
/// serialized output stays deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vars(IndexMap<String, Value>);

impl Vars {
    /// create an empty variable map
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// get a variable by name
    pub fn get(
        &self,
        key: &str,
    ) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a variable rendered as a plain string.
    ///
    /// String values are returned as-is; any other value is rendered as
    /// compact JSON. Returns `None` when the variable is absent.
    pub fn get_str(
        &self,
        key: &str,
    ) -> Option<String> {
        self.0.get(key).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// set a variable, overwriting any existing value
    pub fn set<V: Into<Value>>(
        &mut self,
        key: impl Into<String>,
        value: V,
    ) {
        self.0.insert(key.into(), value.into());
    }

    /// Merge another map into this one; colliding keys are overwritten
    /// (last-write-wins).
    pub fn merge(
        &mut self,
        other: &Vars,
    ) {
        for (k, v) in other.iter() {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn contains(
        &self,
        key: &str,
    ) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl fmt::Display for Vars {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => write!(f, "{{}}"),
        }
    }
}

impl From<Value> for Vars {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map.into_iter().collect()),
            _ => Self::new(),
        }
    }
}

impl From<Vars> for Value {
    fn from(vars: Vars) -> Self {
        Value::Object(vars.0.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Vars {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
