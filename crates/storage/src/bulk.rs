//! Best-effort bulk deletion of chains.

use serde::Serialize;

use crate::traits::ChainRepository;

/// A chain that could not be deleted, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteFailure {
    pub id: String,
    pub error: String,
}

/// Outcome of a bulk delete, per requested id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkDeleteReport {
    pub deleted: Vec<String>,
    pub failed: Vec<DeleteFailure>,
}

impl BulkDeleteReport {
    /// True when every requested chain was deleted.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();
        for id in &self.deleted {
            lines.push(format!("deleted {}", id));
        }
        for f in &self.failed {
            lines.push(format!("failed  {}: {}", f.id, f.error));
        }
        lines.push(format!(
            "{} deleted, {} failed",
            self.deleted.len(),
            self.failed.len()
        ));
        lines.join("\n")
    }
}

/// Delete each chain independently.
///
/// A failure is logged and recorded, then the loop moves on: one bad id
/// never prevents the remaining deletions. Ids are processed in the order
/// given; a repeated id is attempted again (and normally fails as not found).
pub async fn bulk_delete<R>(repo: &R, ids: &[String]) -> BulkDeleteReport
where
    R: ChainRepository + ?Sized,
{
    tracing::info!(count = ids.len(), "bulk deleting chains");
    let mut report = BulkDeleteReport::default();

    for id in ids {
        match repo.delete_chain(id).await {
            Ok(()) => {
                tracing::debug!(chain_id = %id, "chain deleted");
                report.deleted.push(id.clone());
            }
            Err(e) => {
                tracing::warn!(chain_id = %id, error = %e, "error deleting chain");
                report.failed.push(DeleteFailure {
                    id: id.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    report
}
