use chainkit_core::IntegrityError;

/// All errors that can be returned by a `ChainRepository` implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No chain with the given id.
    #[error("chain not found: {chain_id}")]
    ChainNotFound { chain_id: String },

    /// No snapshot with the given id.
    #[error("snapshot not found: {snapshot_id}")]
    SnapshotNotFound { snapshot_id: String },

    /// The id cannot be used as a storage key (empty, or a path component
    /// for file-backed stores).
    #[error("invalid identifier: {id:?}")]
    InvalidId { id: String },

    /// A stored graph could not be rebuilt without violating its invariants.
    #[error("stored graph violates integrity: {0}")]
    Integrity(#[from] IntegrityError),

    /// A stored document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A backend-specific failure (I/O, connection, ...).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// True for the lookup failures a caller should treat as "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::ChainNotFound { .. } | StorageError::SnapshotNotFound { .. }
        )
    }
}
