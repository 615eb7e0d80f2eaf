//! Property transforms applied to an element when its type is replaced.

use std::collections::BTreeSet;
use std::fmt;

use chainkit_core::Properties;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// New property bag for a migrated element, plus what was lost on the way.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransformOutcome {
    pub properties: Properties,
    /// Keys whose values are gone from the result.
    pub dropped: Vec<String>,
    /// Keys whose previous values were overwritten.
    pub altered: Vec<String>,
}

impl TransformOutcome {
    /// The input bag, carried over untouched.
    pub fn unchanged(properties: &Properties) -> Self {
        TransformOutcome {
            properties: properties.clone(),
            dropped: Vec::new(),
            altered: Vec::new(),
        }
    }

    pub fn is_lossless(&self) -> bool {
        self.dropped.is_empty() && self.altered.is_empty()
    }

    /// Dropped and altered keys, sorted and deduplicated.
    pub fn lost_paths(&self) -> Vec<String> {
        let paths: BTreeSet<&String> = self.dropped.iter().chain(&self.altered).collect();
        paths.into_iter().cloned().collect()
    }
}

/// Rewrites the properties of an element being migrated.
///
/// Implementations must be pure: the same input always yields the same
/// outcome, which keeps migrations repeatable.
pub trait PropertyTransform: Send + Sync + fmt::Debug {
    fn apply(&self, properties: &Properties) -> TransformOutcome;
}

/// One step of a [`DeclarativeTransform`]. This is the form rules take in
/// configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransformOp {
    /// Move a value to a new key.
    Rename { from: String, to: String },
    /// Remove a key.
    Drop { key: String },
    /// Set a key to a fixed value.
    Set { key: String, value: Value },
    /// Remove every key not listed.
    KeepOnly { keys: Vec<String> },
}

impl TransformOp {
    /// Whether this step is expected to discard or overwrite data. A rename
    /// only does so when the target key is already taken, which shows up
    /// in the [`TransformOutcome`] instead.
    pub fn may_lose_data(&self) -> bool {
        !matches!(self, TransformOp::Rename { .. })
    }
}

/// Applies a list of [`TransformOp`]s in order. With no ops it is the
/// identity transform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclarativeTransform {
    #[serde(default)]
    pub ops: Vec<TransformOp>,
}

impl DeclarativeTransform {
    pub fn new(ops: Vec<TransformOp>) -> Self {
        DeclarativeTransform { ops }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    /// True when no step can lose data.
    pub fn is_lossless(&self) -> bool {
        !self.ops.iter().any(TransformOp::may_lose_data)
    }
}

impl PropertyTransform for DeclarativeTransform {
    fn apply(&self, properties: &Properties) -> TransformOutcome {
        let mut out = TransformOutcome::unchanged(properties);
        for op in &self.ops {
            match op {
                TransformOp::Rename { from, to } => {
                    if from == to {
                        continue;
                    }
                    if let Some(value) = out.properties.remove(from) {
                        let previous = out.properties.insert(to.clone(), value.clone());
                        if previous.is_some_and(|p| p != value) {
                            out.altered.push(to.clone());
                        }
                    }
                }
                TransformOp::Drop { key } => {
                    if out.properties.remove(key).is_some() {
                        out.dropped.push(key.clone());
                    }
                }
                TransformOp::Set { key, value } => {
                    if let Some(previous) = out.properties.insert(key.clone(), value.clone()) {
                        if &previous != value {
                            out.altered.push(key.clone());
                        }
                    }
                }
                TransformOp::KeepOnly { keys } => {
                    let removed: Vec<String> = out
                        .properties
                        .keys()
                        .filter(|k| !keys.iter().any(|kept| kept == *k))
                        .cloned()
                        .collect();
                    for key in removed {
                        out.properties.remove(&key);
                        out.dropped.push(key);
                    }
                }
            }
        }
        out
    }
}

/// Wraps a closure as a [`PropertyTransform`].
pub struct FnTransform<F> {
    name: String,
    f: F,
}

impl<F> FnTransform<F>
where
    F: Fn(&Properties) -> TransformOutcome + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        FnTransform {
            name: name.into(),
            f,
        }
    }
}

impl<F> fmt::Debug for FnTransform<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransform").field("name", &self.name).finish()
    }
}

impl<F> PropertyTransform for FnTransform<F>
where
    F: Fn(&Properties) -> TransformOutcome + Send + Sync,
{
    fn apply(&self, properties: &Properties) -> TransformOutcome {
        (self.f)(properties)
    }
}
