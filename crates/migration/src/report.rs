//! Migration results.

use std::fmt;

use chainkit_core::{ConnectionEnd, ElementType, Graph};
use serde::Serialize;
use serde_json::Value;

/// What happened to one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MigrationOutcome {
    /// Retyped by a rule.
    Migrated,
    /// Deprecated, but no rule covers it. Left as is.
    Unsupported,
    /// Not deprecated.
    Unchanged,
}

impl fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationOutcome::Migrated => f.write_str("MIGRATED"),
            MigrationOutcome::Unsupported => f.write_str("UNSUPPORTED"),
            MigrationOutcome::Unchanged => f.write_str("UNCHANGED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementOutcome {
    pub element_id: String,
    /// Type before migration.
    pub element_type: ElementType,
    pub outcome: MigrationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement_type: Option<ElementType>,
}

/// Conditions worth a look after migrating. None of them stop a migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MigrationWarning {
    /// The rule's transform dropped or overwrote these properties.
    PropertyLoss {
        element_id: String,
        paths: Vec<String>,
    },
    /// A connection attaches at a port the endpoint's new type does not
    /// declare. The connection is kept.
    BrokenPort {
        connection_id: String,
        element_id: String,
        end: ConnectionEnd,
        port: String,
    },
    /// A connection endpoint names an element that does not exist.
    DanglingReference {
        connection_id: String,
        element_id: String,
        end: ConnectionEnd,
    },
    /// A migrated container's new type cannot hold elements.
    NotAContainer {
        element_id: String,
        container_id: String,
        container_type: ElementType,
    },
}

impl fmt::Display for MigrationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationWarning::PropertyLoss { element_id, paths } => {
                if paths.is_empty() {
                    write!(f, "element {} was migrated by a lossy rule", element_id)
                } else {
                    write!(
                        f,
                        "element {} lost properties: {}",
                        element_id,
                        paths.join(", ")
                    )
                }
            }
            MigrationWarning::BrokenPort {
                connection_id,
                element_id,
                end,
                port,
            } => write!(
                f,
                "connection {} {} port {:?} does not exist on migrated element {}",
                connection_id, end, port, element_id
            ),
            MigrationWarning::DanglingReference {
                connection_id,
                element_id,
                end,
            } => write!(
                f,
                "connection {} {} {} does not exist",
                connection_id, end, element_id
            ),
            MigrationWarning::NotAContainer {
                element_id,
                container_id,
                container_type,
            } => write!(
                f,
                "element {} is nested in {}, whose type {} is not a container",
                element_id, container_id, container_type
            ),
        }
    }
}

/// Deprecation flags of a chain, as shown next to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeprecationSummary {
    pub contains_deprecated_elements: bool,
    pub contains_unsupported_elements: bool,
    pub contains_deprecated_containers: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationReport {
    pub chain_id: String,
    /// One entry per element, in traversal order.
    pub outcomes: Vec<ElementOutcome>,
    pub warnings: Vec<MigrationWarning>,
    /// Flags of the migrated chain.
    pub summary: DeprecationSummary,
}

impl MigrationReport {
    pub fn migrated_count(&self) -> usize {
        self.count(MigrationOutcome::Migrated)
    }

    pub fn unsupported_count(&self) -> usize {
        self.count(MigrationOutcome::Unsupported)
    }

    pub fn unchanged_count(&self) -> usize {
        self.count(MigrationOutcome::Unchanged)
    }

    fn count(&self, outcome: MigrationOutcome) -> usize {
        self.outcomes.iter().filter(|o| o.outcome == outcome).count()
    }

    pub fn outcome_for(&self, element_id: &str) -> Option<&ElementOutcome> {
        self.outcomes.iter().find(|o| o.element_id == element_id)
    }

    /// True if nothing was retyped.
    pub fn is_noop(&self) -> bool {
        self.migrated_count() == 0
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "chain_id": self.chain_id,
            "outcomes": self.outcomes,
            "summary": {
                "migrated": self.migrated_count(),
                "unchanged": self.unchanged_count(),
                "unsupported": self.unsupported_count(),
            },
            "flags": self.summary,
            "warnings": self.warnings,
        })
    }

    /// One line per migrated or unsupported element, then warnings and a
    /// summary line.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();
        for o in &self.outcomes {
            match (o.outcome, &o.replacement_type) {
                (MigrationOutcome::Migrated, Some(to)) => {
                    lines.push(format!("~ {} {} -> {}", o.element_id, o.element_type, to));
                }
                (MigrationOutcome::Unsupported, _) => {
                    lines.push(format!("? {} {} (no migration rule)", o.element_id, o.element_type));
                }
                _ => {}
            }
        }
        for w in &self.warnings {
            lines.push(format!("! {}", w));
        }
        lines.push(format!(
            "{} migrated, {} unsupported, {} unchanged",
            self.migrated_count(),
            self.unsupported_count(),
            self.unchanged_count()
        ));
        lines.join("\n")
    }
}

/// A migrated chain and how it got there. The input graph is untouched.
#[derive(Debug, Clone)]
pub struct MigratedChain {
    pub chain: Graph,
    pub report: MigrationReport,
}
