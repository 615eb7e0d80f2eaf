//! Difference engine: turns a [`Matching`] into an [`EntityDifferenceResult`].

use std::collections::BTreeSet;

use chainkit_core::{ChainProperties, Element, Graph, Position};
use serde_json::Value;
use tracing::debug;

use crate::compare::{compare_properties, compare_values, PropertyChange};
use crate::matcher::{match_graphs, MatchConfidence, MatchOptions, Matching};
use crate::result::{DiffWarning, EntityDiff, EntityDifferenceResult, EntityKind, Side};

/// Id of the pseudo-entity carrying chain-level property changes.
pub const CHAIN_ENTITY_ID: &str = "$chain";
/// Change path reported when a matched element changed type.
pub const TYPE_PATH: &str = "$type";
/// Change path reported when an element moved to another container.
pub const CONTAINER_PATH: &str = "$container";
/// Change path reported for canvas moves, when enabled.
pub const POSITION_PATH: &str = "$position";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffOptions {
    /// Report canvas position changes. Off by default: moving an element
    /// around the canvas does not change the chain.
    pub include_positions: bool,
    /// See [`MatchOptions::min_similarity`].
    pub min_similarity: f64,
}

impl Default for DiffOptions {
    fn default() -> Self {
        DiffOptions {
            include_positions: false,
            min_similarity: MatchOptions::default().min_similarity,
        }
    }
}

/// Diff two graphs with default options.
pub fn diff(left: &Graph, right: &Graph) -> EntityDifferenceResult {
    diff_with_options(left, right, &DiffOptions::default())
}

pub fn diff_with_options(left: &Graph, right: &Graph, options: &DiffOptions) -> EntityDifferenceResult {
    let matching = match_graphs(
        left,
        right,
        &MatchOptions {
            min_similarity: options.min_similarity,
        },
    );

    let mut entities = Vec::new();

    for pair in &matching.elements {
        let changes = element_changes(pair.left, pair.right, &matching, options);
        entities.push(EntityDiff::paired(
            EntityKind::Element,
            &pair.left.id,
            &pair.right.id,
            pair.confidence,
            changes,
        ));
    }
    for e in &matching.unmatched_left_elements {
        entities.push(EntityDiff::removed(EntityKind::Element, &e.id));
    }
    for e in &matching.unmatched_right_elements {
        entities.push(EntityDiff::added(EntityKind::Element, &e.id));
    }

    // Matched connections agree on mapped endpoints and ports, which is all
    // a connection carries.
    for pair in &matching.connections {
        entities.push(EntityDiff::paired(
            EntityKind::Connection,
            &pair.left.id,
            &pair.right.id,
            pair.confidence,
            Vec::new(),
        ));
    }
    for c in &matching.unmatched_left_connections {
        entities.push(EntityDiff::removed(EntityKind::Connection, &c.id));
    }
    for c in &matching.unmatched_right_connections {
        entities.push(EntityDiff::added(EntityKind::Connection, &c.id));
    }

    entities.push(EntityDiff::paired(
        EntityKind::Chain,
        CHAIN_ENTITY_ID,
        CHAIN_ENTITY_ID,
        MatchConfidence::ExactId,
        chain_changes(left.properties(), right.properties()),
    ));

    let mut warnings = Vec::new();
    for (side, graph) in [(Side::Left, left), (Side::Right, right)] {
        for d in graph.dangling_connections() {
            tracing::warn!(
                side = ?side,
                connection_id = %d.connection_id,
                element_id = %d.element_id,
                "dangling connection endpoint"
            );
            warnings.push(DiffWarning::DanglingReference {
                side,
                connection_id: d.connection_id,
                element_id: d.element_id,
                end: d.end,
            });
        }
    }

    let result = EntityDifferenceResult::new(left.id(), right.id(), entities, warnings);
    let counts = result.counts();
    debug!(
        left = left.id(),
        right = right.id(),
        added = counts.added,
        removed = counts.removed,
        modified = counts.modified,
        warnings = result.warnings.len(),
        "diff computed"
    );
    result
}

fn element_changes(
    left: &Element,
    right: &Element,
    matching: &Matching<'_>,
    options: &DiffOptions,
) -> Vec<PropertyChange> {
    let mut changes = Vec::new();

    if left.element_type != right.element_type {
        changes.push(PropertyChange::new(
            TYPE_PATH,
            Value::from(left.element_type.as_str()),
            Value::from(right.element_type.as_str()),
        ));
    }

    // The left container is compared under its right-side identity, so a
    // parent that was itself renamed does not count as a move.
    let mapped = left
        .container
        .as_deref()
        .map(|c| matching.right_for(c).unwrap_or(c));
    if mapped != right.container.as_deref() {
        changes.push(PropertyChange::new(
            CONTAINER_PATH,
            optional_id(left.container.as_deref()),
            optional_id(right.container.as_deref()),
        ));
    }

    if options.include_positions && left.position != right.position {
        changes.push(PropertyChange::new(
            POSITION_PATH,
            position_value(left.position.as_ref()),
            position_value(right.position.as_ref()),
        ));
    }

    compare_properties(&left.properties, &right.properties, &mut changes);
    changes
}

fn chain_changes(left: &ChainProperties, right: &ChainProperties) -> Vec<PropertyChange> {
    let mut changes = Vec::new();
    compare_values(
        "name",
        &Value::from(left.name.as_str()),
        &Value::from(right.name.as_str()),
        &mut changes,
    );
    compare_values(
        "description",
        &Value::from(left.description.as_str()),
        &Value::from(right.description.as_str()),
        &mut changes,
    );

    let l: BTreeSet<&str> = left.labels.iter().map(String::as_str).collect();
    let r: BTreeSet<&str> = right.labels.iter().map(String::as_str).collect();
    if l != r {
        changes.push(PropertyChange::new(
            "labels",
            Value::from(left.labels.clone()),
            Value::from(right.labels.clone()),
        ));
    }
    changes
}

fn optional_id(id: Option<&str>) -> Value {
    id.map_or(Value::Null, Value::from)
}

fn position_value(position: Option<&Position>) -> Value {
    match position {
        Some(p) => serde_json::json!({ "x": p.x, "y": p.y }),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::DiffStatus;
    use chainkit_core::{Connection, ConnectionEnd};
    use serde_json::json;

    fn element_entries(result: &EntityDifferenceResult) -> Vec<&EntityDiff> {
        result
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Element)
            .collect()
    }

    #[test]
    fn identical_graphs_are_unchanged() {
        let g = Graph::builder("g")
            .name("Orders")
            .element(Element::new("a", "http").with_property("url", json!("x")))
            .element(Element::new("b", "log"))
            .connection(Connection::new("c1", "a", "b"))
            .build()
            .unwrap();
        let result = diff(&g, &g);
        assert!(result.is_empty());
        assert_eq!(result.counts().unchanged, 4);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn property_change_is_modified() {
        let l = Graph::builder("l")
            .element(Element::new("e1", "T1").with_property("x", json!(1)))
            .build()
            .unwrap();
        let r = Graph::builder("r")
            .element(Element::new("e1", "T1").with_property("x", json!(2)))
            .build()
            .unwrap();
        let result = diff(&l, &r);
        let entries = element_entries(&result);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, DiffStatus::Modified);
        assert_eq!(entries[0].confidence, Some(MatchConfidence::ExactId));
        assert_eq!(
            entries[0].changes,
            vec![PropertyChange::new("x", json!(1), json!(2))]
        );
    }

    #[test]
    fn explicit_null_property_is_unchanged() {
        let l = Graph::builder("l")
            .element(Element::new("e1", "T1").with_property("a", json!(null)))
            .build()
            .unwrap();
        let r = Graph::builder("r")
            .element(Element::new("e1", "T1"))
            .build()
            .unwrap();
        for result in [diff(&l, &r), diff(&r, &l)] {
            let entries = element_entries(&result);
            assert_eq!(entries[0].status, DiffStatus::Unchanged);
            assert!(entries[0].changes.is_empty());
        }
    }

    #[test]
    fn repeated_list_item_removal_is_modified() {
        let l = Graph::builder("l")
            .element(Element::new("e1", "T1").with_property("steps", json!(["a", "a", "b"])))
            .build()
            .unwrap();
        let r = Graph::builder("r")
            .element(Element::new("e1", "T1").with_property("steps", json!(["a", "b"])))
            .build()
            .unwrap();
        let result = diff(&l, &r);
        let entries = element_entries(&result);
        assert_eq!(entries[0].status, DiffStatus::Modified);
        assert_eq!(entries[0].changes[0].path, "steps");
    }

    #[test]
    fn renamed_element_is_matched_structurally() {
        let l = Graph::builder("l")
            .element(Element::new("e1", "T").with_property("x", json!(1)))
            .build()
            .unwrap();
        let r = Graph::builder("r")
            .element(Element::new("e2", "T").with_property("x", json!(1)))
            .build()
            .unwrap();
        let result = diff(&l, &r);
        let e = result.find(EntityKind::Element, "e1").unwrap();
        assert_eq!(e.status, DiffStatus::Unchanged);
        assert_eq!(e.confidence, Some(MatchConfidence::Structural));
        assert_eq!(e.right_id.as_deref(), Some("e2"));
        assert!(e.id_changed());
        assert!(result.to_text().contains("= Element e1 -> e2"));
    }

    #[test]
    fn type_change_reported_first() {
        let l = Graph::builder("l")
            .element(Element::new("e1", "Old").with_property("a", json!(1)))
            .build()
            .unwrap();
        let r = Graph::builder("r")
            .element(Element::new("e1", "New").with_property("a", json!(2)))
            .build()
            .unwrap();
        let result = diff(&l, &r);
        let e = result.find(EntityKind::Element, "e1").unwrap();
        let paths: Vec<&str> = e.changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec![TYPE_PATH, "a"]);
        assert_eq!(e.changes[0].old, json!("Old"));
    }

    #[test]
    fn container_move_reported() {
        let l = Graph::builder("l")
            .element(Element::new("s1", "split"))
            .element(Element::new("s2", "split").with_property("k", json!(2)))
            .element(Element::new("e", "log").in_container("s1"))
            .build()
            .unwrap();
        let r = Graph::builder("r")
            .element(Element::new("s1", "split"))
            .element(Element::new("s2", "split").with_property("k", json!(2)))
            .element(Element::new("e", "log").in_container("s2"))
            .build()
            .unwrap();
        let result = diff(&l, &r);
        let e = result.find(EntityKind::Element, "e").unwrap();
        assert_eq!(
            e.changes,
            vec![PropertyChange::new(CONTAINER_PATH, json!("s1"), json!("s2"))]
        );
    }

    #[test]
    fn renamed_container_is_not_a_move() {
        let l = Graph::builder("l")
            .element(Element::new("s1", "split").with_property("k", json!(1)))
            .element(Element::new("e", "log").in_container("s1"))
            .build()
            .unwrap();
        let r = Graph::builder("r")
            .element(Element::new("s9", "split").with_property("k", json!(1)))
            .element(Element::new("e", "log").in_container("s9"))
            .build()
            .unwrap();
        let result = diff(&l, &r);
        assert!(result.is_empty(), "{}", result.to_text());
    }

    #[test]
    fn positions_ignored_unless_requested() {
        let l = Graph::builder("l")
            .element(Element::new("e", "T").at(0.0, 0.0))
            .build()
            .unwrap();
        let r = Graph::builder("r")
            .element(Element::new("e", "T").at(10.0, 5.0))
            .build()
            .unwrap();
        assert!(diff(&l, &r).is_empty());

        let options = DiffOptions {
            include_positions: true,
            ..Default::default()
        };
        let result = diff_with_options(&l, &r, &options);
        let e = result.find(EntityKind::Element, "e").unwrap();
        assert_eq!(
            e.changes,
            vec![PropertyChange::new(
                POSITION_PATH,
                json!({"x": 0.0, "y": 0.0}),
                json!({"x": 10.0, "y": 5.0})
            )]
        );
    }

    #[test]
    fn added_and_removed_elements_and_connections() {
        let l = Graph::builder("l")
            .element(Element::new("a", "T"))
            .element(Element::new("gone", "X"))
            .connection(Connection::new("c1", "a", "gone"))
            .build()
            .unwrap();
        let r = Graph::builder("r")
            .element(Element::new("a", "T"))
            .element(Element::new("fresh", "Y"))
            .connection(Connection::new("c2", "a", "fresh"))
            .build()
            .unwrap();
        let result = diff(&l, &r);
        let counts = result.counts();
        assert_eq!(counts.added, 2);
        assert_eq!(counts.removed, 2);
        assert_eq!(
            result.find(EntityKind::Element, "gone").unwrap().status,
            DiffStatus::Removed
        );
        assert_eq!(
            result.find(EntityKind::Connection, "c2").unwrap().status,
            DiffStatus::Added
        );
    }

    #[test]
    fn chain_properties_compared() {
        let l = Graph::builder("l")
            .properties(ChainProperties {
                name: "Orders".into(),
                description: String::new(),
                labels: vec!["a".into(), "b".into()],
            })
            .build()
            .unwrap();
        let r = Graph::builder("r")
            .properties(ChainProperties {
                name: "Orders v2".into(),
                description: String::new(),
                labels: vec!["b".into(), "a".into()],
            })
            .build()
            .unwrap();
        let result = diff(&l, &r);
        let chain = result.find(EntityKind::Chain, CHAIN_ENTITY_ID).unwrap();
        assert_eq!(
            chain.changes,
            vec![PropertyChange::new("name", json!("Orders"), json!("Orders v2"))]
        );
        assert_eq!(result.entities.last().unwrap().kind, EntityKind::Chain);
    }

    #[test]
    fn dangling_reference_is_a_warning() {
        let l = Graph::builder("l")
            .element(Element::new("e1", "T"))
            .connection(Connection::new("c1", "e1", "e9"))
            .build()
            .unwrap();
        let r = Graph::builder("r")
            .element(Element::new("e1", "T"))
            .build()
            .unwrap();
        let result = diff(&l, &r);
        assert_eq!(
            result.warnings,
            vec![DiffWarning::DanglingReference {
                side: Side::Left,
                connection_id: "c1".into(),
                element_id: "e9".into(),
                end: ConnectionEnd::Target,
            }]
        );
        assert!(result.to_text().contains("e9"));
    }

    #[test]
    fn entries_ordered_by_kind_then_id() {
        let l = Graph::builder("l")
            .element(Element::new("b", "T"))
            .element(Element::new("a", "U"))
            .connection(Connection::new("z", "a", "b"))
            .build()
            .unwrap();
        let r = Graph::builder("r")
            .element(Element::new("c", "V"))
            .element(Element::new("a", "U"))
            .connection(Connection::new("y", "a", "c"))
            .build()
            .unwrap();
        let result = diff(&l, &r);
        let order: Vec<(EntityKind, &str)> =
            result.entities.iter().map(|e| (e.kind, e.id())).collect();
        assert_eq!(
            order,
            vec![
                (EntityKind::Element, "a"),
                (EntityKind::Element, "b"),
                (EntityKind::Element, "c"),
                (EntityKind::Connection, "y"),
                (EntityKind::Connection, "z"),
                (EntityKind::Chain, CHAIN_ENTITY_ID),
            ]
        );
    }

    #[test]
    fn json_rendering_has_summary() {
        let l = Graph::builder("l")
            .element(Element::new("e1", "T").with_property("x", json!(1)))
            .build()
            .unwrap();
        let r = Graph::builder("r").build().unwrap();
        let v = diff(&l, &r).to_json();
        assert_eq!(v["summary"]["removed"], 1);
        assert_eq!(v["entities"][0]["status"], "REMOVED");
        assert_eq!(v["entities"][0]["left_id"], "e1");
        assert_eq!(v["entities"][0]["right_id"], Value::Null);
    }
}
