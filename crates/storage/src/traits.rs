use async_trait::async_trait;
use chainkit_core::Graph;

use crate::error::StorageError;

/// Resolves chains and snapshots by identifier.
///
/// Chains are the live, editable graphs; snapshots are immutable captures
/// of a chain and are addressed by their own id. Both come back as
/// [`Graph`] values, so the engines never see the difference.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` so a single repository
/// can serve concurrent diff and migration calls across tasks.
#[async_trait]
pub trait ChainRepository: Send + Sync + 'static {
    /// Load a chain.
    ///
    /// Returns `Err(StorageError::ChainNotFound)` if no such chain exists.
    async fn load_chain(&self, chain_id: &str) -> Result<Graph, StorageError>;

    /// Load a snapshot.
    ///
    /// Returns `Err(StorageError::SnapshotNotFound)` if no such snapshot exists.
    async fn load_snapshot(&self, snapshot_id: &str) -> Result<Graph, StorageError>;

    /// Insert or overwrite a chain, keyed by `chain.id()`.
    async fn save_chain(&self, chain: &Graph) -> Result<(), StorageError>;

    /// Insert or overwrite a snapshot under `snapshot_id`.
    async fn save_snapshot(&self, snapshot_id: &str, graph: &Graph) -> Result<(), StorageError>;

    /// Delete a chain. Snapshots taken from it are kept.
    ///
    /// Returns `Err(StorageError::ChainNotFound)` if no such chain exists.
    async fn delete_chain(&self, chain_id: &str) -> Result<(), StorageError>;
}
