//! Diff requests: which two graphs to compare, by chain or snapshot id.

use std::fmt;

use chainkit_core::Graph;
use chainkit_storage::{ChainRepository, StorageError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{diff_with_options, DiffOptions};
use crate::error::DiffError;
use crate::result::EntityDifferenceResult;

/// Identifiers of the two graphs to compare. Each side needs a chain id or
/// a snapshot id; when both are given the snapshot is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_chain_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_snapshot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_chain_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_snapshot_id: Option<String>,
}

/// One resolved side of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphRef {
    Chain(String),
    Snapshot(String),
}

impl fmt::Display for GraphRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphRef::Chain(id) => write!(f, "chain {}", id),
            GraphRef::Snapshot(id) => write!(f, "snapshot {}", id),
        }
    }
}

impl DiffRequest {
    /// Compare two live chains.
    pub fn chains(left: impl Into<String>, right: impl Into<String>) -> Self {
        DiffRequest {
            left_chain_id: Some(left.into()),
            right_chain_id: Some(right.into()),
            ..Default::default()
        }
    }

    /// Resolve each side to a single reference. Blank ids count as absent.
    pub fn validate(&self) -> Result<(GraphRef, GraphRef), DiffError> {
        let left = side_ref(&self.left_chain_id, &self.left_snapshot_id).ok_or_else(|| {
            DiffError::InvalidDiffRequest {
                reason: "left chain id or left snapshot id is required".to_string(),
            }
        })?;
        let right = side_ref(&self.right_chain_id, &self.right_snapshot_id).ok_or_else(|| {
            DiffError::InvalidDiffRequest {
                reason: "right chain id or right snapshot id is required".to_string(),
            }
        })?;
        Ok((left, right))
    }
}

fn side_ref(chain_id: &Option<String>, snapshot_id: &Option<String>) -> Option<GraphRef> {
    let present = |id: &Option<String>| id.as_deref().filter(|s| !s.trim().is_empty()).map(str::to_string);
    present(snapshot_id)
        .map(GraphRef::Snapshot)
        .or_else(|| present(chain_id).map(GraphRef::Chain))
}

/// Resolve both sides of `request` through `repo` and diff them.
///
/// Unknown ids are reported as [`DiffError::InvalidDiffRequest`]; any
/// other repository failure is passed through.
pub async fn diff_request<R: ChainRepository + ?Sized>(
    repo: &R,
    request: &DiffRequest,
    options: &DiffOptions,
) -> Result<EntityDifferenceResult, DiffError> {
    let (left_ref, right_ref) = request.validate()?;
    debug!(left = %left_ref, right = %right_ref, "resolving diff request");

    let left = resolve(repo, &left_ref).await?;
    let right = resolve(repo, &right_ref).await?;
    Ok(diff_with_options(&left, &right, options))
}

async fn resolve<R: ChainRepository + ?Sized>(repo: &R, graph_ref: &GraphRef) -> Result<Graph, DiffError> {
    let loaded = match graph_ref {
        GraphRef::Chain(id) => repo.load_chain(id).await,
        GraphRef::Snapshot(id) => repo.load_snapshot(id).await,
    };
    loaded.map_err(|e| match e {
        e @ (StorageError::ChainNotFound { .. } | StorageError::SnapshotNotFound { .. }) => {
            DiffError::InvalidDiffRequest {
                reason: format!("{} does not exist ({})", graph_ref, e),
            }
        }
        other => DiffError::Storage(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{DiffStatus, EntityKind};
    use chainkit_core::Element;
    use chainkit_storage::InMemoryRepository;
    use serde_json::json;

    fn chain(id: &str, x: i64) -> Graph {
        Graph::builder(id)
            .element(Element::new("e1", "T").with_property("x", json!(x)))
            .build()
            .unwrap()
    }

    #[test]
    fn validate_requires_one_id_per_side() {
        let err = DiffRequest::default().validate().unwrap_err();
        assert!(matches!(err, DiffError::InvalidDiffRequest { .. }));

        let req = DiffRequest {
            left_chain_id: Some("a".into()),
            right_chain_id: Some("  ".into()),
            ..Default::default()
        };
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("right"));
    }

    #[test]
    fn snapshot_wins_over_chain() {
        let req = DiffRequest {
            left_chain_id: Some("c1".into()),
            left_snapshot_id: Some("s1".into()),
            right_chain_id: Some("c2".into()),
            right_snapshot_id: None,
        };
        let (l, r) = req.validate().unwrap();
        assert_eq!(l, GraphRef::Snapshot("s1".into()));
        assert_eq!(r, GraphRef::Chain("c2".into()));
    }

    #[test]
    fn request_deserializes_from_camel_case() {
        let req: DiffRequest =
            serde_json::from_value(json!({"leftChainId": "a", "rightSnapshotId": "s"})).unwrap();
        assert_eq!(req.left_chain_id.as_deref(), Some("a"));
        assert_eq!(req.right_snapshot_id.as_deref(), Some("s"));
    }

    #[tokio::test]
    async fn chain_against_snapshot() {
        let repo = InMemoryRepository::new();
        repo.save_chain(&chain("c1", 2)).await.unwrap();
        repo.save_snapshot("s1", &chain("c1", 1)).await.unwrap();

        let req = DiffRequest {
            left_snapshot_id: Some("s1".into()),
            right_chain_id: Some("c1".into()),
            ..Default::default()
        };
        let result = diff_request(&repo, &req, &DiffOptions::default())
            .await
            .unwrap();
        let e = result.find(EntityKind::Element, "e1").unwrap();
        assert_eq!(e.status, DiffStatus::Modified);
    }

    #[tokio::test]
    async fn unknown_id_is_invalid_request() {
        let repo = InMemoryRepository::new();
        repo.save_chain(&chain("c1", 1)).await.unwrap();

        let err = diff_request(&repo, &DiffRequest::chains("c1", "nope"), &DiffOptions::default())
            .await
            .unwrap_err();
        match err {
            DiffError::InvalidDiffRequest { reason } => assert!(reason.contains("nope")),
            other => panic!("expected InvalidDiffRequest, got {other:?}"),
        }
    }
}
