//! Recursive structural comparison of property values.
//!
//! Changes are reported at the deepest path where the two sides diverge:
//! `config.retries`, `headers[1].name`, and so on. A key or array slot
//! present on one side only compares as `null` on the other side, so an
//! explicit `null` and a missing key are the same thing. Arrays made only
//! of primitives are compared as multisets: order is ignored, repeats are
//! not.

use std::collections::BTreeSet;

use chainkit_core::Properties;
use serde::Serialize;
use serde_json::{Map, Value};

/// A single property-level difference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyChange {
    pub path: String,
    pub old: Value,
    pub new: Value,
}

impl PropertyChange {
    pub fn new(path: impl Into<String>, old: Value, new: Value) -> Self {
        PropertyChange {
            path: path.into(),
            old,
            new,
        }
    }
}

/// Compare two property bags from the root.
pub fn compare_properties(old: &Properties, new: &Properties, out: &mut Vec<PropertyChange>) {
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    for key in keys {
        compare_entry("", key, old.get(key), new.get(key), out);
    }
}

/// Compare two values rooted at `path`.
pub fn compare_values(path: &str, old: &Value, new: &Value, out: &mut Vec<PropertyChange>) {
    match (old, new) {
        (Value::Object(a), Value::Object(b)) => compare_objects(path, a, b, out),
        (Value::Array(a), Value::Array(b)) => compare_arrays(path, a, b, out),
        (a, b) if a == b => {}
        (a, b) => out.push(PropertyChange::new(path, a.clone(), b.clone())),
    }
}

fn compare_objects(
    path: &str,
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    out: &mut Vec<PropertyChange>,
) {
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    for key in keys {
        compare_entry(path, key, old.get(key), new.get(key), out);
    }
}

fn compare_entry(
    path: &str,
    key: &str,
    old: Option<&Value>,
    new: Option<&Value>,
    out: &mut Vec<PropertyChange>,
) {
    let child = key_path(path, key);
    compare_values(&child, or_null(old), or_null(new), out);
}

fn compare_arrays(path: &str, old: &[Value], new: &[Value], out: &mut Vec<PropertyChange>) {
    if is_primitive_set(old) && is_primitive_set(new) {
        if sorted_primitives(old) != sorted_primitives(new) {
            out.push(PropertyChange::new(
                path,
                Value::Array(old.to_vec()),
                Value::Array(new.to_vec()),
            ));
        }
        return;
    }

    let len = old.len().max(new.len());
    for i in 0..len {
        let child = index_path(path, i);
        compare_values(&child, or_null(old.get(i)), or_null(new.get(i)), out);
    }
}

/// Absent values read as `null`.
pub(crate) fn or_null(value: Option<&Value>) -> &Value {
    value.unwrap_or(&Value::Null)
}

/// Non-empty arrays of strings, numbers and booleans have set semantics.
fn is_primitive_set(values: &[Value]) -> bool {
    !values.is_empty()
        && values
            .iter()
            .all(|v| v.is_string() || v.is_number() || v.is_boolean())
}

fn sorted_primitives(values: &[Value]) -> Vec<String> {
    let mut keys: Vec<String> = values.iter().map(Value::to_string).collect();
    keys.sort();
    keys
}

fn key_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}
