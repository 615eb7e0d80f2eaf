//! chainkit-core: the chain graph model shared by the diff and migration engines.
//!
//! A chain is a directed, possibly cyclic graph of typed [`Element`]s joined
//! by [`Connection`]s, with an optional containment tree laid over the
//! elements. [`Graph`] values are immutable; derived graphs are built with
//! [`Graph::with_replacements`], which shares unchanged entries with its
//! source.

pub mod element;
pub mod error;
pub mod graph;
pub mod library;

pub use element::{Connection, ConnectionEnd, Element, ElementType, Position, Properties};
pub use error::IntegrityError;
pub use graph::{ChainProperties, DanglingReference, Graph, GraphBuilder};
pub use library::{ContainmentViolation, ElementDescriptor, ElementLibrary};
