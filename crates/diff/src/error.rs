use chainkit_storage::StorageError;

/// Errors returned when a diff has to resolve its inputs first.
///
/// [`crate::diff`] itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The request names no usable graph on one side, or names one that
    /// does not exist.
    #[error("invalid diff request: {reason}")]
    InvalidDiffRequest { reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}
