//! File-backed repository: one JSON document per chain or snapshot.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/chains/<chain_id>.json
//! <root>/snapshots/<snapshot_id>.json
//! ```

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chainkit_core::Graph;

use crate::error::StorageError;
use crate::traits::ChainRepository;

const CHAINS_DIR: &str = "chains";
const SNAPSHOTS_DIR: &str = "snapshots";

#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    root: PathBuf,
}

impl DirectoryRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryRepository { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn chain_path(&self, chain_id: &str) -> Result<PathBuf, StorageError> {
        document_path(&self.root.join(CHAINS_DIR), chain_id)
    }

    fn snapshot_path(&self, snapshot_id: &str) -> Result<PathBuf, StorageError> {
        document_path(&self.root.join(SNAPSHOTS_DIR), snapshot_id)
    }
}

fn document_path(dir: &Path, id: &str) -> Result<PathBuf, StorageError> {
    let invalid = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\'])
        || id.contains('\0');
    if invalid {
        return Err(StorageError::InvalidId { id: id.to_string() });
    }
    Ok(dir.join(format!("{id}.json")))
}

async fn read_graph(path: &Path) -> Result<Option<Graph>, StorageError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(backend(path, e)),
    }
}

async fn write_graph(path: &Path, graph: &Graph) -> Result<(), StorageError> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| backend(dir, e))?;
    }
    let text = serde_json::to_string_pretty(graph)?;
    tokio::fs::write(path, text)
        .await
        .map_err(|e| backend(path, e))
}

fn backend(path: &Path, e: io::Error) -> StorageError {
    StorageError::Backend(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl ChainRepository for DirectoryRepository {
    async fn load_chain(&self, chain_id: &str) -> Result<Graph, StorageError> {
        read_graph(&self.chain_path(chain_id)?)
            .await?
            .ok_or_else(|| StorageError::ChainNotFound {
                chain_id: chain_id.to_string(),
            })
    }

    async fn load_snapshot(&self, snapshot_id: &str) -> Result<Graph, StorageError> {
        read_graph(&self.snapshot_path(snapshot_id)?)
            .await?
            .ok_or_else(|| StorageError::SnapshotNotFound {
                snapshot_id: snapshot_id.to_string(),
            })
    }

    async fn save_chain(&self, chain: &Graph) -> Result<(), StorageError> {
        write_graph(&self.chain_path(chain.id())?, chain).await
    }

    async fn save_snapshot(&self, snapshot_id: &str, graph: &Graph) -> Result<(), StorageError> {
        write_graph(&self.snapshot_path(snapshot_id)?, graph).await
    }

    async fn delete_chain(&self, chain_id: &str) -> Result<(), StorageError> {
        let path = self.chain_path(chain_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StorageError::ChainNotFound {
                chain_id: chain_id.to_string(),
            }),
            Err(e) => Err(backend(&path, e)),
        }
    }
}
