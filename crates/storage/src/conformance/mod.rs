//! Conformance test suite for `ChainRepository` implementations.
//!
//! A backend-agnostic suite any repository can run to verify it honours the
//! contract the engines' callers rely on:
//!
//! - **Round trip**: saved chains and snapshots load back equal
//! - **Separation**: chains and snapshots live in distinct id spaces
//! - **Delete**: deleted chains are gone, snapshots survive
//! - **Errors**: missing ids produce the not-found variants with the id
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh, empty repository for each test:
//!
//! ```ignore
//! use chainkit_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn my_backend_conformance() {
//!     let report = run_conformance_suite(|| async { MyRepository::connect().await }).await;
//!     assert_eq!(report.failed(), 0, "{report}");
//! }
//! ```

mod delete;
mod error;
mod roundtrip;

use std::fmt;
use std::future::Future;

use chainkit_core::{ChainProperties, Connection, Element, Graph};
use serde_json::json;

use crate::ChainRepository;

/// Outcome of one conformance check.
#[derive(Debug, Clone)]
pub struct Check {
    pub category: &'static str,
    pub name: &'static str,
    /// Why the check failed; `None` when it passed.
    pub failure: Option<String>,
}

impl Check {
    fn new(category: &'static str, name: &'static str, outcome: Result<(), String>) -> Self {
        Check {
            category,
            name,
            failure: outcome.err(),
        }
    }

    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Every check of a suite run, in execution order.
#[derive(Debug, Clone, Default)]
pub struct ConformanceReport {
    pub checks: Vec<Check>,
}

impl ConformanceReport {
    pub fn total(&self) -> usize {
        self.checks.len()
    }

    pub fn failed(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed()).count()
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} of {} repository checks failed",
            self.failed(),
            self.total()
        )?;
        for check in &self.checks {
            if let Some(why) = &check.failure {
                writeln!(f, "  {}/{}: {}", check.category, check.name, why)?;
            }
        }
        Ok(())
    }
}

/// Run every check against a repository backend. `factory` must return a
/// fresh, empty repository on each call.
pub async fn run_conformance_suite<R, F, Fut>(factory: F) -> ConformanceReport
where
    R: ChainRepository,
    F: Fn() -> Fut,
    Fut: Future<Output = R>,
{
    let mut report = ConformanceReport::default();
    report.checks.extend(roundtrip::run_roundtrip_tests(&factory).await);
    report.checks.extend(delete::run_delete_tests(&factory).await);
    report.checks.extend(error::run_error_tests(&factory).await);
    report
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// A small chain exercising nesting, ports, positions and nested properties.
fn sample_chain(id: &str) -> Result<Graph, String> {
    Graph::builder(id)
        .properties(ChainProperties {
            name: format!("chain {id}"),
            description: "conformance fixture".to_string(),
            labels: vec!["test".to_string()],
        })
        .element(
            Element::new("trigger", "http-trigger")
                .with_property("path", json!("/orders"))
                .at(10.0, 20.0),
        )
        .element(Element::new("split", "split").with_version(2))
        .element(
            Element::new("script", "script")
                .in_container("split")
                .with_property("config", json!({"retries": 3, "tags": ["a", "b"]})),
        )
        .connection(Connection::new("c1", "trigger", "split").with_ports("out", "in"))
        .build()
        .map_err(|e| format!("fixture: {e}"))
}
