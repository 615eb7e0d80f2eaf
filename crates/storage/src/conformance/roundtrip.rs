//! Save/load round-trip conformance tests.

use std::future::Future;

use super::{sample_chain, Check};
use crate::ChainRepository;

pub(super) async fn run_roundtrip_tests<R, F, Fut>(factory: &F) -> Vec<Check>
where
    R: ChainRepository,
    F: Fn() -> Fut,
    Fut: Future<Output = R>,
{
    vec![
        Check::new(
            "roundtrip",
            "saved_chain_loads_back_equal",
            saved_chain_loads_back_equal(factory).await,
        ),
        Check::new(
            "roundtrip",
            "saved_snapshot_loads_back_equal",
            saved_snapshot_loads_back_equal(factory).await,
        ),
        Check::new(
            "roundtrip",
            "save_overwrites_existing_chain",
            save_overwrites_existing_chain(factory).await,
        ),
        Check::new(
            "roundtrip",
            "snapshot_ids_do_not_resolve_as_chains",
            snapshot_ids_do_not_resolve_as_chains(factory).await,
        ),
    ]
}

async fn saved_chain_loads_back_equal<R, F, Fut>(factory: &F) -> Result<(), String>
where
    R: ChainRepository,
    F: Fn() -> Fut,
    Fut: Future<Output = R>,
{
    let repo = factory().await;
    let chain = sample_chain("orders")?;
    repo.save_chain(&chain)
        .await
        .map_err(|e| format!("save: {e}"))?;
    let loaded = repo
        .load_chain("orders")
        .await
        .map_err(|e| format!("load: {e}"))?;
    if loaded != chain {
        return Err(format!("loaded chain differs: {:?}", loaded));
    }
    Ok(())
}

async fn saved_snapshot_loads_back_equal<R, F, Fut>(factory: &F) -> Result<(), String>
where
    R: ChainRepository,
    F: Fn() -> Fut,
    Fut: Future<Output = R>,
{
    let repo = factory().await;
    let chain = sample_chain("orders")?;
    repo.save_snapshot("orders-v1", &chain)
        .await
        .map_err(|e| format!("save: {e}"))?;
    let loaded = repo
        .load_snapshot("orders-v1")
        .await
        .map_err(|e| format!("load: {e}"))?;
    if loaded != chain {
        return Err(format!("loaded snapshot differs: {:?}", loaded));
    }
    Ok(())
}

async fn save_overwrites_existing_chain<R, F, Fut>(factory: &F) -> Result<(), String>
where
    R: ChainRepository,
    F: Fn() -> Fut,
    Fut: Future<Output = R>,
{
    let repo = factory().await;
    let first = sample_chain("orders")?;
    repo.save_chain(&first)
        .await
        .map_err(|e| format!("save first: {e}"))?;

    let second = chainkit_core::Graph::builder("orders")
        .name("renamed")
        .build()
        .map_err(|e| e.to_string())?;
    repo.save_chain(&second)
        .await
        .map_err(|e| format!("save second: {e}"))?;

    let loaded = repo
        .load_chain("orders")
        .await
        .map_err(|e| format!("load: {e}"))?;
    if loaded != second {
        return Err(format!("expected overwritten chain, got {:?}", loaded));
    }
    Ok(())
}

async fn snapshot_ids_do_not_resolve_as_chains<R, F, Fut>(factory: &F) -> Result<(), String>
where
    R: ChainRepository,
    F: Fn() -> Fut,
    Fut: Future<Output = R>,
{
    let repo = factory().await;
    repo.save_snapshot("snap-1", &sample_chain("orders")?)
        .await
        .map_err(|e| format!("save: {e}"))?;
    match repo.load_chain("snap-1").await {
        Err(e) if e.is_not_found() => Ok(()),
        other => Err(format!("expected ChainNotFound, got {:?}", other)),
    }
}
