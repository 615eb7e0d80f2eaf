use chainkit_storage::ChainRepository;
use tracing::debug;

use crate::engine::MigrationEngine;
use crate::error::MigrationError;
use crate::report::MigratedChain;

/// Load a chain, migrate it, and save the result when `persist` is set.
///
/// The stored chain is only overwritten after a successful migration that
/// changed at least one element.
pub async fn migrate_chain<R: ChainRepository + ?Sized>(
    repo: &R,
    chain_id: &str,
    engine: &MigrationEngine<'_>,
    persist: bool,
) -> Result<MigratedChain, MigrationError> {
    let chain = repo.load_chain(chain_id).await?;
    let migrated = engine.migrate(&chain)?;
    if persist && !migrated.report.is_noop() {
        repo.save_chain(&migrated.chain).await?;
        debug!(chain_id, "migrated chain saved");
    }
    Ok(migrated)
}
