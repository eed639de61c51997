use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;
use tracing::debug;

use crate::common::VariablePool;

/// Regex pattern for pool variables
/// Format: `{{name}}`, `{{ name }}` or `{{nodeId.key}}`
const VARIABLE_TEMPLATE_PATTERN: &str = r"\{\{\s*([^{}\s]+)\s*\}\}";

static VARIABLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(VARIABLE_TEMPLATE_PATTERN).expect("variable template pattern is valid"));

/// Replace every `{{name}}` token with the pool value of `name`.
///
/// `name` is looked up in the flat namespace first; a dotted name that is
/// not a flat key is then read as a path (`{{nodeId.key}}`). Tokens that
/// resolve to nothing are left untouched.
pub fn resolve_template(
    pool: &VariablePool,
    template: &str,
) -> String {
    VARIABLE_RE
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            match lookup(pool, name) {
                Some(value) => value_to_string(value),
                None => {
                    debug!(variable = name, "unresolved template variable left as-is");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

fn lookup<'a>(
    pool: &'a VariablePool,
    name: &str,
) -> Option<&'a Value> {
    pool.get(&[name]).or_else(|| {
        if name.contains('.') {
            let path: Vec<&str> = name.split('.').collect();
            pool.get(path.as_slice())
        } else {
            None
        }
    })
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        v => v.to_string(), // For objects/arrays, use JSON string
    }
}
