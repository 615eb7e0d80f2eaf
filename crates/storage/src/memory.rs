use std::collections::BTreeMap;

use async_trait::async_trait;
use chainkit_core::Graph;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::traits::ChainRepository;

/// Repository kept entirely in memory. Used by tests and by embedders that
/// load their chains from elsewhere.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    chains: RwLock<BTreeMap<String, Graph>>,
    snapshots: RwLock<BTreeMap<String, Graph>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-populated with the given chains.
    pub fn with_chains(chains: impl IntoIterator<Item = Graph>) -> Self {
        let chains = chains
            .into_iter()
            .map(|g| (g.id().to_string(), g))
            .collect();
        InMemoryRepository {
            chains: RwLock::new(chains),
            snapshots: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn chain_ids(&self) -> Vec<String> {
        self.chains.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl ChainRepository for InMemoryRepository {
    async fn load_chain(&self, chain_id: &str) -> Result<Graph, StorageError> {
        self.chains
            .read()
            .await
            .get(chain_id)
            .cloned()
            .ok_or_else(|| StorageError::ChainNotFound {
                chain_id: chain_id.to_string(),
            })
    }

    async fn load_snapshot(&self, snapshot_id: &str) -> Result<Graph, StorageError> {
        self.snapshots
            .read()
            .await
            .get(snapshot_id)
            .cloned()
            .ok_or_else(|| StorageError::SnapshotNotFound {
                snapshot_id: snapshot_id.to_string(),
            })
    }

    async fn save_chain(&self, chain: &Graph) -> Result<(), StorageError> {
        if chain.id().is_empty() {
            return Err(StorageError::InvalidId { id: String::new() });
        }
        self.chains
            .write()
            .await
            .insert(chain.id().to_string(), chain.clone());
        Ok(())
    }

    async fn save_snapshot(&self, snapshot_id: &str, graph: &Graph) -> Result<(), StorageError> {
        if snapshot_id.is_empty() {
            return Err(StorageError::InvalidId { id: String::new() });
        }
        self.snapshots
            .write()
            .await
            .insert(snapshot_id.to_string(), graph.clone());
        Ok(())
    }

    async fn delete_chain(&self, chain_id: &str) -> Result<(), StorageError> {
        match self.chains.write().await.remove(chain_id) {
            Some(_) => Ok(()),
            None => Err(StorageError::ChainNotFound {
                chain_id: chain_id.to_string(),
            }),
        }
    }
}
