//! chainkit-storage: where chains and snapshots come from.
//!
//! The engines only ever see [`chainkit_core::Graph`] values; this crate
//! defines the [`ChainRepository`] contract the calling layer uses to
//! resolve identifiers into graphs, two backends, the best-effort
//! [`bulk_delete`], and a backend-agnostic conformance suite.

mod bulk;
pub mod conformance;
mod directory;
mod error;
mod memory;
mod traits;

pub use bulk::{bulk_delete, BulkDeleteReport, DeleteFailure};
pub use directory::DirectoryRepository;
pub use error::StorageError;
pub use memory::InMemoryRepository;
pub use traits::ChainRepository;
