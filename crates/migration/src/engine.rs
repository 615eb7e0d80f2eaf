//! Migration engine: applies a [`RuleTable`] to every element of a chain.
//!
//! Elements are visited in containment order (each container before its
//! children). A migrated element keeps its id, container and position; only
//! its type and properties change. Connections are never rewritten or
//! removed, since they reference elements by id.
//!
//! Rules must resolve in a single hop: if an element's replacement type is
//! itself migrated by another rule, the migration fails instead of chasing
//! the chain. This is what makes migrating an already-migrated chain a
//! no-op.

use std::collections::{BTreeMap, BTreeSet};

use chainkit_core::{
    Connection, ConnectionEnd, Element, ElementLibrary, ElementType, Graph, IntegrityError,
};
use tracing::{debug, info, warn};

use crate::error::MigrationError;
use crate::report::{
    DeprecationSummary, ElementOutcome, MigratedChain, MigrationOutcome, MigrationReport,
    MigrationWarning,
};
use crate::rules::{MigrationRule, RuleTable};

#[derive(Debug, Clone, Copy)]
pub struct MigrationEngine<'a> {
    rules: &'a RuleTable,
    library: &'a ElementLibrary,
}

impl<'a> MigrationEngine<'a> {
    pub fn new(rules: &'a RuleTable, library: &'a ElementLibrary) -> Self {
        MigrationEngine { rules, library }
    }

    /// Migrate every element of `graph` that a rule applies to.
    ///
    /// Fails without partial output if the rules for some element form a
    /// cycle or a multi-hop chain, or if the rebuilt graph would violate
    /// graph integrity.
    pub fn migrate(&self, graph: &Graph) -> Result<MigratedChain, MigrationError> {
        let mut outcomes = Vec::with_capacity(graph.element_count());
        let mut warnings = Vec::new();
        let mut replacements = Vec::new();

        for element in graph.containment_order() {
            match self.resolve(element)? {
                Some(rule) => {
                    let transformed = rule.transform.apply(&element.properties);
                    let lost = transformed.lost_paths();
                    if !rule.lossless || !lost.is_empty() {
                        warn!(element_id = %element.id, paths = ?lost, "migration lost properties");
                        warnings.push(MigrationWarning::PropertyLoss {
                            element_id: element.id.clone(),
                            paths: lost,
                        });
                    }
                    debug!(
                        element_id = %element.id,
                        from = %element.element_type,
                        to = %rule.replacement_type,
                        "migrating element"
                    );

                    let mut replacement = element.clone();
                    replacement.element_type = rule.replacement_type.clone();
                    replacement.properties = transformed.properties;
                    replacements.push(replacement);

                    outcomes.push(ElementOutcome {
                        element_id: element.id.clone(),
                        element_type: element.element_type.clone(),
                        outcome: MigrationOutcome::Migrated,
                        replacement_type: Some(rule.replacement_type.clone()),
                    });
                }
                None => {
                    let outcome = if self.library.is_deprecated(element.element_type.as_str()) {
                        MigrationOutcome::Unsupported
                    } else {
                        MigrationOutcome::Unchanged
                    };
                    outcomes.push(ElementOutcome {
                        element_id: element.id.clone(),
                        element_type: element.element_type.clone(),
                        outcome,
                        replacement_type: None,
                    });
                }
            }
        }

        let retyped: BTreeMap<&str, &ElementType> = outcomes
            .iter()
            .filter_map(|o| Some((o.element_id.as_str(), o.replacement_type.as_ref()?)))
            .collect();
        for connection in graph.connections() {
            self.check_connection(graph, connection, &retyped, &mut warnings);
        }

        let chain = graph.with_replacements(replacements, Vec::<Connection>::new())?;

        let retyped_ids: BTreeSet<&str> = retyped.keys().copied().collect();
        for violation in self.library.containment_violations(&chain) {
            if retyped_ids.contains(violation.container_id.as_str()) {
                warn!(
                    element_id = %violation.element_id,
                    container_id = %violation.container_id,
                    "migrated container cannot hold elements"
                );
                warnings.push(MigrationWarning::NotAContainer {
                    element_id: violation.element_id,
                    container_id: violation.container_id,
                    container_type: violation.container_type,
                });
            }
        }

        let report = MigrationReport {
            chain_id: graph.id().to_string(),
            outcomes,
            warnings,
            summary: self.inspect(&chain),
        };
        info!(
            chain_id = graph.id(),
            migrated = report.migrated_count(),
            unsupported = report.unsupported_count(),
            warnings = report.warnings.len(),
            "chain migrated"
        );
        Ok(MigratedChain { chain, report })
    }

    /// Deprecation flags of a chain, without migrating it.
    ///
    /// An element counts as deprecated when its type is marked deprecated
    /// in the library or a rule applies to it. It is unsupported when it is
    /// marked deprecated and no rule applies. A deprecated container is a
    /// deprecated element with children.
    pub fn inspect(&self, graph: &Graph) -> DeprecationSummary {
        let mut summary = DeprecationSummary::default();
        let parents: BTreeSet<&str> = graph
            .elements()
            .filter_map(|e| e.container.as_deref())
            .collect();

        for element in graph.elements() {
            let ty = element.element_type.as_str();
            let has_rule = self.rules.lookup(ty, element.version).is_some();
            let flagged = self.library.is_deprecated(ty);
            if !(has_rule || flagged) {
                continue;
            }
            summary.contains_deprecated_elements = true;
            if flagged && !has_rule {
                summary.contains_unsupported_elements = true;
            }
            if parents.contains(element.id.as_str()) {
                summary.contains_deprecated_containers = true;
            }
        }
        summary
    }

    /// The rule to apply to `element`, after checking that its replacement
    /// type is final.
    fn resolve(&self, element: &Element) -> Result<Option<&'a MigrationRule>, IntegrityError> {
        let Some(rule) = self
            .rules
            .lookup(element.element_type.as_str(), element.version)
        else {
            return Ok(None);
        };

        let mut path = vec![element.element_type.to_string()];
        let mut current = Some(rule);
        while let Some(step) = current {
            let next = step.replacement_type.to_string();
            let cycle = path.contains(&next);
            path.push(next);
            if cycle {
                return Err(IntegrityError::RuleCycle { path });
            }
            current = self
                .rules
                .lookup(step.replacement_type.as_str(), element.version);
        }

        if path.len() > 2 {
            return Err(IntegrityError::RuleChain {
                deprecated: path[0].clone(),
                replacement: path[1].clone(),
                next: path[2].clone(),
            });
        }
        Ok(Some(rule))
    }

    fn check_connection(
        &self,
        graph: &Graph,
        connection: &Connection,
        retyped: &BTreeMap<&str, &ElementType>,
        warnings: &mut Vec<MigrationWarning>,
    ) {
        for end in [ConnectionEnd::Source, ConnectionEnd::Target] {
            let element_id = connection.endpoint(end);
            if !graph.contains_element(element_id) {
                warn!(connection_id = %connection.id, element_id, "dangling connection endpoint");
                warnings.push(MigrationWarning::DanglingReference {
                    connection_id: connection.id.clone(),
                    element_id: element_id.to_string(),
                    end,
                });
                continue;
            }

            let Some(new_type) = retyped.get(element_id) else {
                continue;
            };
            let Some(port) = connection.port(end) else {
                continue;
            };
            let accepted = self
                .library
                .get(new_type.as_str())
                .map_or(true, |d| d.accepts_port(end, Some(port)));
            if !accepted {
                warn!(connection_id = %connection.id, element_id, port, "port missing after migration");
                warnings.push(MigrationWarning::BrokenPort {
                    connection_id: connection.id.clone(),
                    element_id: element_id.to_string(),
                    end,
                    port: port.to_string(),
                });
            }
        }
    }
}
