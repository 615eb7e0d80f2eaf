/// Invariant violations in a chain graph, or in the migration rules applied to it.
///
/// These signal programming defects or corrupt input and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    /// Two elements share the same id.
    #[error("duplicate element id: {id}")]
    DuplicateElement { id: String },

    /// Two connections share the same id.
    #[error("duplicate connection id: {id}")]
    DuplicateConnection { id: String },

    /// An element names a container that is not part of the graph.
    #[error("element {element_id} references missing container {container_id}")]
    DanglingContainer {
        element_id: String,
        container_id: String,
    },

    /// Following container references from an element leads back to it.
    #[error("containment cycle through element {element_id}")]
    ContainmentCycle { element_id: String },

    /// Migration rules lead from a type back to itself.
    #[error("migration rules form a cycle: {}", path.join(" -> "))]
    RuleCycle { path: Vec<String> },

    /// A replacement type is itself deprecated by another rule.
    #[error(
        "replacement type {replacement} of {deprecated} is migrated again to {next}; rules must resolve in a single hop"
    )]
    RuleChain {
        deprecated: String,
        replacement: String,
        next: String,
    },
}
