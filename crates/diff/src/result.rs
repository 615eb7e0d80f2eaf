use std::fmt;

use chainkit_core::ConnectionEnd;
use serde::Serialize;
use serde_json::Value;

use crate::compare::PropertyChange;
use crate::matcher::MatchConfidence;

/// What kind of entity a diff entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Element,
    Connection,
    /// Chain-level properties, reported under a fixed synthetic id.
    Chain,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Element => f.write_str("Element"),
            EntityKind::Connection => f.write_str("Connection"),
            EntityKind::Chain => f.write_str("Chain"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffStatus {
    Added,
    Removed,
    Modified,
    Unchanged,
}

impl DiffStatus {
    /// The status seen from the other side.
    pub fn inverse(self) -> DiffStatus {
        match self {
            DiffStatus::Added => DiffStatus::Removed,
            DiffStatus::Removed => DiffStatus::Added,
            other => other,
        }
    }
}

/// Difference of one entity between the left and right graphs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDiff {
    pub kind: EntityKind,
    /// Id in the left graph; `None` for added entities.
    pub left_id: Option<String>,
    /// Id in the right graph; `None` for removed entities.
    pub right_id: Option<String>,
    pub status: DiffStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<MatchConfidence>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<PropertyChange>,
}

impl EntityDiff {
    pub(crate) fn paired(
        kind: EntityKind,
        left_id: &str,
        right_id: &str,
        confidence: MatchConfidence,
        changes: Vec<PropertyChange>,
    ) -> Self {
        let status = if changes.is_empty() {
            DiffStatus::Unchanged
        } else {
            DiffStatus::Modified
        };
        EntityDiff {
            kind,
            left_id: Some(left_id.to_string()),
            right_id: Some(right_id.to_string()),
            status,
            confidence: Some(confidence),
            changes,
        }
    }

    pub(crate) fn removed(kind: EntityKind, left_id: &str) -> Self {
        EntityDiff {
            kind,
            left_id: Some(left_id.to_string()),
            right_id: None,
            status: DiffStatus::Removed,
            confidence: None,
            changes: Vec::new(),
        }
    }

    pub(crate) fn added(kind: EntityKind, right_id: &str) -> Self {
        EntityDiff {
            kind,
            left_id: None,
            right_id: Some(right_id.to_string()),
            status: DiffStatus::Added,
            confidence: None,
            changes: Vec::new(),
        }
    }

    /// Left id when present, right id otherwise.
    pub fn id(&self) -> &str {
        self.left_id
            .as_deref()
            .or(self.right_id.as_deref())
            .unwrap_or_default()
    }

    /// True for a matched pair whose ids differ.
    pub fn id_changed(&self) -> bool {
        matches!((&self.left_id, &self.right_id), (Some(l), Some(r)) if l != r)
    }

    /// Whether this entry refers to `id` on either side.
    pub fn refers_to(&self, id: &str) -> bool {
        self.left_id.as_deref() == Some(id) || self.right_id.as_deref() == Some(id)
    }

    fn sort_key(&self) -> (EntityKind, &str, &str) {
        (self.kind, self.id(), self.right_id.as_deref().unwrap_or_default())
    }
}

/// Which input graph a warning was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn inverse(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Data-integrity issues found while diffing. They never fail the diff.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffWarning {
    /// A connection endpoint names an element that does not exist.
    DanglingReference {
        side: Side,
        connection_id: String,
        element_id: String,
        end: ConnectionEnd,
    },
}

impl fmt::Display for DiffWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffWarning::DanglingReference {
                side,
                connection_id,
                element_id,
                end,
            } => write!(
                f,
                "dangling reference in {} graph: connection {} {} {} does not exist",
                match side {
                    Side::Left => "left",
                    Side::Right => "right",
                },
                connection_id,
                end,
                element_id
            ),
        }
    }
}

/// Per-status entry counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffCounts {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
}

/// The result of diffing two chain graphs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDifferenceResult {
    pub left_id: String,
    pub right_id: String,
    /// Ordered by kind, then id.
    pub entities: Vec<EntityDiff>,
    pub warnings: Vec<DiffWarning>,
}

impl EntityDifferenceResult {
    pub(crate) fn new(
        left_id: &str,
        right_id: &str,
        mut entities: Vec<EntityDiff>,
        mut warnings: Vec<DiffWarning>,
    ) -> Self {
        entities.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        warnings.sort();
        EntityDifferenceResult {
            left_id: left_id.to_string(),
            right_id: right_id.to_string(),
            entities,
            warnings,
        }
    }

    /// True if every entry is unchanged.
    pub fn is_empty(&self) -> bool {
        self.entities
            .iter()
            .all(|e| e.status == DiffStatus::Unchanged)
    }

    pub fn counts(&self) -> DiffCounts {
        let mut counts = DiffCounts::default();
        for e in &self.entities {
            match e.status {
                DiffStatus::Added => counts.added += 1,
                DiffStatus::Removed => counts.removed += 1,
                DiffStatus::Modified => counts.modified += 1,
                DiffStatus::Unchanged => counts.unchanged += 1,
            }
        }
        counts
    }

    /// Entries that are not unchanged.
    pub fn changed(&self) -> impl Iterator<Item = &EntityDiff> + '_ {
        self.entities
            .iter()
            .filter(|e| e.status != DiffStatus::Unchanged)
    }

    /// First entry of the given kind referring to `id` on either side.
    pub fn find(&self, kind: EntityKind, id: &str) -> Option<&EntityDiff> {
        self.entities
            .iter()
            .find(|e| e.kind == kind && e.refers_to(id))
    }

    /// Serialize the diff to a JSON value.
    pub fn to_json(&self) -> Value {
        let counts = self.counts();
        let entities: Vec<Value> = self
            .entities
            .iter()
            .map(|e| {
                let changes: Vec<Value> = e
                    .changes
                    .iter()
                    .map(|c| {
                        serde_json::json!({
                            "new": c.new,
                            "old": c.old,
                            "path": c.path,
                        })
                    })
                    .collect();
                serde_json::json!({
                    "changes": changes,
                    "confidence": e.confidence,
                    "kind": e.kind,
                    "left_id": e.left_id,
                    "right_id": e.right_id,
                    "status": e.status,
                })
            })
            .collect();
        let warnings: Vec<Value> = self
            .warnings
            .iter()
            .map(|w| serde_json::to_value(w).unwrap_or(Value::Null))
            .collect();

        serde_json::json!({
            "entities": entities,
            "left_id": self.left_id,
            "right_id": self.right_id,
            "summary": {
                "added": counts.added,
                "modified": counts.modified,
                "removed": counts.removed,
                "unchanged": counts.unchanged,
            },
            "warnings": warnings,
        })
    }

    /// Format the diff as human-readable text. Unchanged entries are listed
    /// only when their id changed.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();

        for e in &self.entities {
            let ids = match (&e.left_id, &e.right_id) {
                (Some(l), Some(r)) if l != r => format!("{} -> {}", l, r),
                _ => e.id().to_string(),
            };
            match e.status {
                DiffStatus::Added => lines.push(format!("+ {} {}", e.kind, ids)),
                DiffStatus::Removed => lines.push(format!("- {} {}", e.kind, ids)),
                DiffStatus::Modified => {
                    lines.push(format!("~ {} {}", e.kind, ids));
                    for c in &e.changes {
                        let old = serde_json::to_string(&c.old).unwrap_or_default();
                        let new = serde_json::to_string(&c.new).unwrap_or_default();
                        lines.push(format!("    {}: {} -> {}", c.path, old, new));
                    }
                }
                DiffStatus::Unchanged if e.id_changed() => {
                    lines.push(format!("= {} {}", e.kind, ids));
                }
                DiffStatus::Unchanged => {}
            }
        }
        for w in &self.warnings {
            lines.push(format!("! {}", w));
        }

        let counts = self.counts();
        lines.push(format!(
            "{} added, {} removed, {} modified, {} unchanged",
            counts.added, counts.removed, counts.modified, counts.unchanged
        ));
        lines.join("\n")
    }
}
