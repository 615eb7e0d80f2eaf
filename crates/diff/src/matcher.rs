//! Pairs elements and connections across two graphs.
//!
//! Elements are matched by id first. Leftovers of the same type are matched
//! structurally: every candidate pair is scored by the number of equal
//! top-level properties, ranked, and accepted greedily while both sides are
//! still free. This is intentionally not a globally optimal assignment.
//!
//! Connections are matched afterwards, through the element matching: two
//! connections correspond when their endpoints correspond and their ports
//! are equal.
//!
//! Every ranking key is symmetric in the two graphs and ends with an id
//! tie-break, so the output does not depend on map iteration order and
//! swapping the inputs swaps the output.

use std::collections::{BTreeMap, BTreeSet};

use chainkit_core::{Connection, Element, Graph, Properties};
use serde::Serialize;

use crate::compare::or_null;

/// How a pair was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchConfidence {
    /// Same id on both sides.
    ExactId,
    /// Different ids, paired by content.
    Structural,
}

/// One entity from each graph, considered the same entity.
#[derive(Debug)]
pub struct MatchedPair<'a, T> {
    pub left: &'a T,
    pub right: &'a T,
    pub confidence: MatchConfidence,
}

/// Tuning knobs for structural matching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    /// Minimum share of equal properties (over the union of keys) for two
    /// elements with different ids to be paired. Two empty property bags
    /// count as fully similar.
    pub min_similarity: f64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions {
            min_similarity: 0.5,
        }
    }
}

/// Output of [`match_graphs`]. All lists are sorted by id (pairs by left id).
#[derive(Debug)]
pub struct Matching<'a> {
    pub elements: Vec<MatchedPair<'a, Element>>,
    pub unmatched_left_elements: Vec<&'a Element>,
    pub unmatched_right_elements: Vec<&'a Element>,
    pub connections: Vec<MatchedPair<'a, Connection>>,
    pub unmatched_left_connections: Vec<&'a Connection>,
    pub unmatched_right_connections: Vec<&'a Connection>,
    left_to_right: BTreeMap<&'a str, &'a str>,
}

impl<'a> Matching<'a> {
    /// Id of the right element paired with the given left element.
    pub fn right_for(&self, left_id: &str) -> Option<&'a str> {
        self.left_to_right.get(left_id).copied()
    }
}

pub fn match_graphs<'a>(left: &'a Graph, right: &'a Graph, options: &MatchOptions) -> Matching<'a> {
    let (elements, unmatched_left_elements, unmatched_right_elements) =
        match_elements(left, right, options);

    let left_to_right: BTreeMap<&str, &str> = elements
        .iter()
        .map(|p| (p.left.id.as_str(), p.right.id.as_str()))
        .collect();

    let (connections, unmatched_left_connections, unmatched_right_connections) =
        match_connections(left, right, &left_to_right);

    Matching {
        elements,
        unmatched_left_elements,
        unmatched_right_elements,
        connections,
        unmatched_left_connections,
        unmatched_right_connections,
        left_to_right,
    }
}

type ElementMatch<'a> = (
    Vec<MatchedPair<'a, Element>>,
    Vec<&'a Element>,
    Vec<&'a Element>,
);

fn match_elements<'a>(left: &'a Graph, right: &'a Graph, options: &MatchOptions) -> ElementMatch<'a> {
    let mut pairs = Vec::new();
    let mut free_left = Vec::new();
    for l in left.elements() {
        match right.element(&l.id) {
            Some(r) => pairs.push(MatchedPair {
                left: l,
                right: r,
                confidence: MatchConfidence::ExactId,
            }),
            None => free_left.push(l),
        }
    }
    let free_right: Vec<&Element> = right
        .elements()
        .filter(|r| !left.contains_element(&r.id))
        .collect();

    let mut candidates = Vec::new();
    for &l in &free_left {
        for &r in &free_right {
            if l.element_type != r.element_type {
                continue;
            }
            let (score, similarity) = similarity(&l.properties, &r.properties);
            if similarity < options.min_similarity {
                continue;
            }
            candidates.push(Candidate {
                score,
                distance: distance(l, r),
                key: pair_key(&l.id, &r.id),
                left: l,
                right: r,
            });
        }
    }
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.distance.total_cmp(&b.distance))
            .then_with(|| a.key.cmp(&b.key))
    });

    let mut taken_left = BTreeSet::new();
    let mut taken_right = BTreeSet::new();
    for c in candidates {
        if taken_left.contains(c.left.id.as_str()) || taken_right.contains(c.right.id.as_str()) {
            continue;
        }
        taken_left.insert(c.left.id.as_str());
        taken_right.insert(c.right.id.as_str());
        pairs.push(MatchedPair {
            left: c.left,
            right: c.right,
            confidence: MatchConfidence::Structural,
        });
    }
    pairs.sort_by(|a, b| a.left.id.cmp(&b.left.id));

    let unmatched_left = free_left
        .into_iter()
        .filter(|l| !taken_left.contains(l.id.as_str()))
        .collect();
    let unmatched_right = free_right
        .into_iter()
        .filter(|r| !taken_right.contains(r.id.as_str()))
        .collect();

    (pairs, unmatched_left, unmatched_right)
}

struct Candidate<'a> {
    score: usize,
    distance: f64,
    key: (&'a str, &'a str),
    left: &'a Element,
    right: &'a Element,
}

/// Number of equal key/value pairs, and that count over the key union.
/// A missing key equals an explicit `null`.
fn similarity(a: &Properties, b: &Properties) -> (usize, f64) {
    let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
    if keys.is_empty() {
        return (0, 1.0);
    }
    let equal = keys
        .iter()
        .filter(|k| or_null(a.get(**k)) == or_null(b.get(**k)))
        .count();
    (equal, equal as f64 / keys.len() as f64)
}

/// Canvas distance; pairs without positions rank after any positioned pair.
fn distance(a: &Element, b: &Element) -> f64 {
    match (&a.position, &b.position) {
        (Some(pa), Some(pb)) => pa.distance(pb),
        _ => f64::INFINITY,
    }
}

/// Order-independent id key of a candidate pair.
fn pair_key<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// A connection endpoint as seen from the right graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Endpoint<'a> {
    Element(&'a str),
    /// The endpoint names an element absent from its own graph.
    Dangling(&'a str),
}

type ConnectionKey<'a> = (Endpoint<'a>, Option<&'a str>, Endpoint<'a>, Option<&'a str>);

type ConnectionMatch<'a> = (
    Vec<MatchedPair<'a, Connection>>,
    Vec<&'a Connection>,
    Vec<&'a Connection>,
);

fn match_connections<'a>(
    left: &'a Graph,
    right: &'a Graph,
    left_to_right: &BTreeMap<&'a str, &'a str>,
) -> ConnectionMatch<'a> {
    let left_endpoint = |id: &'a str| -> Option<Endpoint<'a>> {
        if left.contains_element(id) {
            left_to_right.get(id).map(|r| Endpoint::Element(*r))
        } else {
            Some(Endpoint::Dangling(id))
        }
    };
    let right_endpoint = |id: &'a str| -> Endpoint<'a> {
        if right.contains_element(id) {
            Endpoint::Element(id)
        } else {
            Endpoint::Dangling(id)
        }
    };

    let mut by_key: BTreeMap<ConnectionKey<'a>, Vec<&'a Connection>> = BTreeMap::new();
    for r in right.connections() {
        let key = (
            right_endpoint(&r.source),
            r.source_port.as_deref(),
            right_endpoint(&r.target),
            r.target_port.as_deref(),
        );
        by_key.entry(key).or_default().push(r);
    }

    let mut pairs = Vec::new();
    let mut unmatched_left = Vec::new();
    let mut pending = Vec::new();

    // Pass 1: same id and same key.
    for l in left.connections() {
        let key = match (left_endpoint(&l.source), left_endpoint(&l.target)) {
            (Some(s), Some(t)) => (s, l.source_port.as_deref(), t, l.target_port.as_deref()),
            _ => {
                unmatched_left.push(l);
                continue;
            }
        };
        let same_id = by_key
            .get(&key)
            .and_then(|cands| cands.iter().position(|r| r.id == l.id));
        match same_id {
            Some(pos) => {
                let r = by_key.get_mut(&key).map(|cands| cands.remove(pos));
                if let Some(r) = r {
                    pairs.push(MatchedPair {
                        left: l,
                        right: r,
                        confidence: MatchConfidence::ExactId,
                    });
                }
            }
            None => pending.push((l, key)),
        }
    }

    // Pass 2: remaining connections with equal keys, lowest ids first.
    for (l, key) in pending {
        match by_key.get_mut(&key) {
            Some(cands) if !cands.is_empty() => {
                let r = cands.remove(0);
                pairs.push(MatchedPair {
                    left: l,
                    right: r,
                    confidence: MatchConfidence::Structural,
                });
            }
            _ => unmatched_left.push(l),
        }
    }

    pairs.sort_by(|a, b| a.left.id.cmp(&b.left.id));
    unmatched_left.sort_by(|a, b| a.id.cmp(&b.id));
    let mut unmatched_right: Vec<&Connection> = by_key.into_values().flatten().collect();
    unmatched_right.sort_by(|a, b| a.id.cmp(&b.id));

    (pairs, unmatched_left, unmatched_right)
}
