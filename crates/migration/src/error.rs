use chainkit_core::IntegrityError;
use chainkit_storage::StorageError;

/// Errors that abort a migration. Nothing is written when one is returned.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// The rule table or the rebuilt graph violates an invariant.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    /// Loading or saving the chain failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A rules file could not be read or parsed.
    #[error("invalid rules configuration: {0}")]
    Config(String),
}
