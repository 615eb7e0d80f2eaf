//! Delete conformance tests.

use std::future::Future;

use super::{sample_chain, Check};
use crate::{ChainRepository, StorageError};

pub(super) async fn run_delete_tests<R, F, Fut>(factory: &F) -> Vec<Check>
where
    R: ChainRepository,
    F: Fn() -> Fut,
    Fut: Future<Output = R>,
{
    vec![
        Check::new(
            "delete",
            "deleted_chain_is_gone",
            deleted_chain_is_gone(factory).await,
        ),
        Check::new(
            "delete",
            "delete_keeps_snapshots",
            delete_keeps_snapshots(factory).await,
        ),
        Check::new(
            "delete",
            "second_delete_reports_not_found",
            second_delete_reports_not_found(factory).await,
        ),
    ]
}

async fn deleted_chain_is_gone<R, F, Fut>(factory: &F) -> Result<(), String>
where
    R: ChainRepository,
    F: Fn() -> Fut,
    Fut: Future<Output = R>,
{
    let repo = factory().await;
    repo.save_chain(&sample_chain("orders")?)
        .await
        .map_err(|e| format!("save: {e}"))?;
    repo.delete_chain("orders")
        .await
        .map_err(|e| format!("delete: {e}"))?;
    match repo.load_chain("orders").await {
        Err(StorageError::ChainNotFound { .. }) => Ok(()),
        other => Err(format!("expected ChainNotFound, got {:?}", other)),
    }
}

async fn delete_keeps_snapshots<R, F, Fut>(factory: &F) -> Result<(), String>
where
    R: ChainRepository,
    F: Fn() -> Fut,
    Fut: Future<Output = R>,
{
    let repo = factory().await;
    let chain = sample_chain("orders")?;
    repo.save_chain(&chain)
        .await
        .map_err(|e| format!("save chain: {e}"))?;
    repo.save_snapshot("orders-v1", &chain)
        .await
        .map_err(|e| format!("save snapshot: {e}"))?;
    repo.delete_chain("orders")
        .await
        .map_err(|e| format!("delete: {e}"))?;
    repo.load_snapshot("orders-v1")
        .await
        .map(|_| ())
        .map_err(|e| format!("snapshot should survive chain delete: {e}"))
}

async fn second_delete_reports_not_found<R, F, Fut>(factory: &F) -> Result<(), String>
where
    R: ChainRepository,
    F: Fn() -> Fut,
    Fut: Future<Output = R>,
{
    let repo = factory().await;
    repo.save_chain(&sample_chain("orders")?)
        .await
        .map_err(|e| format!("save: {e}"))?;
    repo.delete_chain("orders")
        .await
        .map_err(|e| format!("first delete: {e}"))?;
    match repo.delete_chain("orders").await {
        Err(StorageError::ChainNotFound { chain_id }) if chain_id == "orders" => Ok(()),
        other => Err(format!("expected ChainNotFound(orders), got {:?}", other)),
    }
}
