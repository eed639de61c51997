//! Per-run hierarchical variable store.
//!
//! Paths are slices of segments. Writes create intermediate maps as needed
//! and refuse to descend through a non-map value. Reads never fail, a missing
//! segment simply yields `None`.

use serde_json::{Map, Value};

use crate::{NodeflowError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariablePool {
    variables: Map<String, Value>,
}

impl VariablePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value by path. An empty path yields `None`.
    pub fn get<S: AsRef<str>>(
        &self,
        path: &[S],
    ) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.variables.get(first.as_ref())?;
        for key in rest {
            current = current.as_object()?.get(key.as_ref())?;
        }
        Some(current)
    }

    /// Write a value at the given path. An empty path is ignored.
    ///
    /// Fails without touching the pool when a segment before the last one
    /// already holds a non-map value.
    pub fn set<S: AsRef<str>>(
        &mut self,
        path: &[S],
        value: Value,
    ) -> Result<()> {
        let Some((last, parents)) = path.split_last() else {
            return Ok(());
        };
        if let Some(pos) = self.blocked_at(parents) {
            let at = parents[..=pos].iter().map(|k| k.as_ref()).collect::<Vec<&str>>().join(".");
            return Err(NodeflowError::Runtime(format!("cannot set '{}' on non-object value at '{}'", last.as_ref(), at)));
        }

        let mut current = &mut self.variables;
        for key in parents {
            let slot = current.entry(key.as_ref().to_string()).or_insert_with(|| Value::Object(Map::new()));
            current = match slot {
                Value::Object(map) => map,
                _ => return Err(NodeflowError::Runtime(format!("cannot descend into '{}'", key.as_ref()))),
            };
        }
        current.insert(last.as_ref().to_string(), value);
        Ok(())
    }

    /// Index of the first parent segment that holds a non-map value.
    fn blocked_at<S: AsRef<str>>(
        &self,
        parents: &[S],
    ) -> Option<usize> {
        let mut current = &self.variables;
        for (pos, key) in parents.iter().enumerate() {
            match current.get(key.as_ref()) {
                None => return None,
                Some(Value::Object(map)) => current = map,
                Some(_) => return Some(pos),
            }
        }
        None
    }

    /// Remove the value at the given path, returning it if present.
    pub fn remove<S: AsRef<str>>(
        &mut self,
        path: &[S],
    ) -> Option<Value> {
        let (last, parents) = path.split_last()?;

        let mut current = &mut self.variables;
        for key in parents {
            current = current.get_mut(key.as_ref())?.as_object_mut()?;
        }
        current.remove(last.as_ref())
    }

    /// Deep, independent snapshot of the whole pool.
    pub fn get_all(&self) -> Value {
        Value::Object(self.variables.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
