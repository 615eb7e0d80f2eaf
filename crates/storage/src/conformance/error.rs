use std::future::Future;

use super::Check;
use crate::{ChainRepository, StorageError};

pub(super) async fn run_error_tests<R, F, Fut>(factory: &F) -> Vec<Check>
where
    R: ChainRepository,
    F: Fn() -> Fut,
    Fut: Future<Output = R>,
{
    vec![
        Check::new(
            "error",
            "load_missing_chain_names_id",
            load_missing_chain_names_id(factory).await,
        ),
        Check::new(
            "error",
            "load_missing_snapshot_names_id",
            load_missing_snapshot_names_id(factory).await,
        ),
        Check::new(
            "error",
            "delete_missing_chain_is_not_found",
            delete_missing_chain_is_not_found(factory).await,
        ),
    ]
}

async fn load_missing_chain_names_id<R, F, Fut>(factory: &F) -> Result<(), String>
where
    R: ChainRepository,
    F: Fn() -> Fut,
    Fut: Future<Output = R>,
{
    let repo = factory().await;
    match repo.load_chain("chain-404").await {
        Err(StorageError::ChainNotFound { chain_id }) => {
            if chain_id != "chain-404" {
                return Err(format!("expected chain_id \"chain-404\", got \"{}\"", chain_id));
            }
            Ok(())
        }
        other => Err(format!("expected ChainNotFound, got {:?}", other)),
    }
}

async fn load_missing_snapshot_names_id<R, F, Fut>(factory: &F) -> Result<(), String>
where
    R: ChainRepository,
    F: Fn() -> Fut,
    Fut: Future<Output = R>,
{
    let repo = factory().await;
    match repo.load_snapshot("snap-404").await {
        Err(StorageError::SnapshotNotFound { snapshot_id }) => {
            if snapshot_id != "snap-404" {
                return Err(format!(
                    "expected snapshot_id \"snap-404\", got \"{}\"",
                    snapshot_id
                ));
            }
            Ok(())
        }
        other => Err(format!("expected SnapshotNotFound, got {:?}", other)),
    }
}

async fn delete_missing_chain_is_not_found<R, F, Fut>(factory: &F) -> Result<(), String>
where
    R: ChainRepository,
    F: Fn() -> Fut,
    Fut: Future<Output = R>,
{
    let repo = factory().await;
    match repo.delete_chain("nothing-here").await {
        Err(e) if e.is_not_found() => Ok(()),
        other => Err(format!("expected ChainNotFound, got {:?}", other)),
    }
}
