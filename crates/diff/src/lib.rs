//! chainkit-diff: structural difference engine for chain graphs.
//!
//! [`diff`] pairs up the elements and connections of two graphs (see
//! [`matcher`]) and reports, per entity, whether it was added, removed,
//! modified or left unchanged, down to the deepest changed property path.
//! The result is deterministic: it does not depend on the order in which
//! either graph was built, and swapping the inputs swaps the result.
//!
//! [`diff_request`] resolves chain and snapshot ids through a
//! [`chainkit_storage::ChainRepository`] before diffing.

pub mod compare;
mod engine;
mod error;
pub mod matcher;
mod request;
mod result;

pub use compare::PropertyChange;
pub use engine::{
    diff, diff_with_options, DiffOptions, CHAIN_ENTITY_ID, CONTAINER_PATH, POSITION_PATH, TYPE_PATH,
};
pub use error::DiffError;
pub use matcher::{match_graphs, MatchConfidence, MatchOptions, MatchedPair, Matching};
pub use request::{diff_request, DiffRequest, GraphRef};
pub use result::{
    DiffCounts, DiffStatus, DiffWarning, EntityDiff, EntityDifferenceResult, EntityKind, Side,
};
