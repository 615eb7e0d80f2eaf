//! chainkit-migration: replaces deprecated element types in chain graphs.
//!
//! A [`RuleTable`] maps deprecated types (optionally per version range) to
//! their replacements, each with a [`PropertyTransform`] for the element's
//! properties. The [`MigrationEngine`] applies it to a [`chainkit_core::Graph`]
//! and returns a new graph plus a [`MigrationReport`]; the input is never
//! modified. Rule tables and element libraries are usually loaded from a
//! TOML [`RulesConfig`].

mod config;
mod engine;
mod error;
mod report;
mod rules;
mod service;
pub mod transform;

pub use config::{RuleConfig, RulesConfig};
pub use engine::MigrationEngine;
pub use error::MigrationError;
pub use report::{
    DeprecationSummary, ElementOutcome, MigratedChain, MigrationOutcome, MigrationReport,
    MigrationWarning,
};
pub use rules::{MigrationRule, RuleTable, VersionRange};
pub use service::migrate_chain;
pub use transform::{
    DeclarativeTransform, FnTransform, PropertyTransform, TransformOp, TransformOutcome,
};
