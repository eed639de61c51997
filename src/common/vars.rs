//! Key/value bag returned by tasks.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

/// Outputs produced by a single task run.
///
/// Every key is merged into the variable pool twice by the engine,
/// once under the node id and once in the flat namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Vars {
    inner: Map<String, Value>,
}

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, converting it into JSON.
    pub fn set<V: Into<Value>>(
        &mut self,
        key: &str,
        value: V,
    ) {
        self.inner.insert(key.to_string(), value.into());
    }

    /// Insert an already-built JSON value.
    pub fn insert(
        &mut self,
        key: String,
        value: Value,
    ) {
        self.inner.insert(key, value);
    }

    /// Read a value and deserialize it into `T`.
    pub fn get<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Option<T> {
        self.inner.get(key).and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.inner.iter()
    }
}

impl IntoIterator for Vars {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl From<Vars> for Value {
    fn from(vars: Vars) -> Self {
        Value::Object(vars.inner)
    }
}

impl From<Value> for Vars {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(inner) => Self {
                inner,
            },
            _ => Self::default(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Vars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_set_and_get_typed() {
        let mut vars = Vars::new();
        vars.set("body", "hello");
        vars.set("count", 3);

        assert_eq!(vars.get::<String>("body").as_deref(), Some("hello"));
        assert_eq!(vars.get::<u32>("count"), Some(3));
        assert_eq!(vars.get::<u32>("body"), None);
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn test_non_object_value_becomes_empty() {
        let vars = Vars::from(json!("scalar"));
        assert!(vars.is_empty());
    }
}
