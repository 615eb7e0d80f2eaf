//! Immutable chain graph with copy-on-write reconstruction.
//!
//! Element and connection maps are persistent ordered maps, so cloning a
//! graph is cheap and a rebuilt graph shares every untouched entry with the
//! graph it was derived from. Nothing in this module mutates a graph that
//! has been handed out.

use im::OrdMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::element::{Connection, ConnectionEnd, Element};
use crate::error::IntegrityError;

/// Chain-level properties shown alongside the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainProperties {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl ChainProperties {
    pub fn named(name: impl Into<String>) -> Self {
        ChainProperties {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A connection endpoint that does not resolve to an element.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DanglingReference {
    pub connection_id: String,
    pub element_id: String,
    pub end: ConnectionEnd,
}

/// A chain or a snapshot of a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GraphDocument", into = "GraphDocument")]
pub struct Graph {
    id: String,
    version: Option<String>,
    properties: ChainProperties,
    elements: OrdMap<String, Element>,
    connections: OrdMap<String, Connection>,
}

impl Graph {
    /// An empty graph.
    pub fn new(id: impl Into<String>, properties: ChainProperties) -> Self {
        Graph {
            id: id.into(),
            version: None,
            properties,
            elements: OrdMap::new(),
            connections: OrdMap::new(),
        }
    }

    pub fn builder(id: impl Into<String>) -> GraphBuilder {
        GraphBuilder::new(id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Snapshot version, `None` for a live chain.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn properties(&self) -> &ChainProperties {
        &self.properties
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn contains_element(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    /// Elements in ascending id order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> + '_ {
        self.elements.values()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections.get(id)
    }

    /// Connections in ascending id order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.connections.values()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.connections.is_empty()
    }

    /// Direct children of a container, by ascending id.
    pub fn children(&self, container_id: &str) -> Vec<&Element> {
        self.elements()
            .filter(|e| e.container.as_deref() == Some(container_id))
            .collect()
    }

    /// Elements that are not nested in any container, by ascending id.
    pub fn roots(&self) -> Vec<&Element> {
        self.elements().filter(|e| e.container.is_none()).collect()
    }

    /// Pre-order walk of the containment tree: each root followed by its
    /// descendants, siblings in ascending id order. Every element appears
    /// exactly once.
    pub fn containment_order(&self) -> Vec<&Element> {
        let mut children: BTreeMap<&str, Vec<&Element>> = BTreeMap::new();
        for element in self.elements() {
            if let Some(container) = element.container.as_deref() {
                children.entry(container).or_default().push(element);
            }
        }

        let mut order = Vec::with_capacity(self.element_count());
        let mut stack: Vec<&Element> = self.roots().into_iter().rev().collect();
        while let Some(element) = stack.pop() {
            order.push(element);
            if let Some(kids) = children.get(element.id.as_str()) {
                stack.extend(kids.iter().rev());
            }
        }
        order
    }

    /// Connection endpoints that name elements missing from this graph.
    pub fn dangling_connections(&self) -> Vec<DanglingReference> {
        let mut dangling = Vec::new();
        for connection in self.connections() {
            for end in [ConnectionEnd::Source, ConnectionEnd::Target] {
                let element_id = connection.endpoint(end);
                if !self.contains_element(element_id) {
                    dangling.push(DanglingReference {
                        connection_id: connection.id.clone(),
                        element_id: element_id.to_string(),
                        end,
                    });
                }
            }
        }
        dangling
    }

    /// Build a new graph from this one with the given elements and
    /// connections replacing (or adding to) the entries with the same ids.
    ///
    /// `self` is left untouched. Fails if the replacement set names the same
    /// id twice or if the result violates containment.
    pub fn with_replacements<E, C>(&self, elements: E, connections: C) -> Result<Graph, IntegrityError>
    where
        E: IntoIterator<Item = Element>,
        C: IntoIterator<Item = Connection>,
    {
        let mut next = self.clone();

        let mut seen = BTreeSet::new();
        for element in elements {
            if !seen.insert(element.id.clone()) {
                return Err(IntegrityError::DuplicateElement { id: element.id });
            }
            next.elements.insert(element.id.clone(), element);
        }

        let mut seen = BTreeSet::new();
        for connection in connections {
            if !seen.insert(connection.id.clone()) {
                return Err(IntegrityError::DuplicateConnection { id: connection.id });
            }
            next.connections.insert(connection.id.clone(), connection);
        }

        next.check_containment()?;
        Ok(next)
    }

    fn check_containment(&self) -> Result<(), IntegrityError> {
        for element in self.elements() {
            let Some(container) = element.container.as_deref() else {
                continue;
            };
            if !self.contains_element(container) {
                return Err(IntegrityError::DanglingContainer {
                    element_id: element.id.clone(),
                    container_id: container.to_string(),
                });
            }

            let mut visited = BTreeSet::from([element.id.as_str()]);
            let mut current = Some(container);
            while let Some(id) = current {
                if !visited.insert(id) {
                    return Err(IntegrityError::ContainmentCycle {
                        element_id: element.id.clone(),
                    });
                }
                current = self.element(id).and_then(|e| e.container.as_deref());
            }
        }
        Ok(())
    }
}

/// Incremental constructor for a [`Graph`]; integrity is checked on `build`.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    id: String,
    version: Option<String>,
    properties: ChainProperties,
    elements: Vec<Element>,
    connections: Vec<Connection>,
}

impl GraphBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        GraphBuilder {
            id: id.into(),
            version: None,
            properties: ChainProperties::default(),
            elements: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn properties(mut self, properties: ChainProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.properties.name = name.into();
        self
    }

    pub fn element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    pub fn connection(mut self, connection: Connection) -> Self {
        self.connections.push(connection);
        self
    }

    pub fn build(self) -> Result<Graph, IntegrityError> {
        let mut elements = OrdMap::new();
        for element in self.elements {
            if elements.contains_key(&element.id) {
                return Err(IntegrityError::DuplicateElement { id: element.id });
            }
            elements.insert(element.id.clone(), element);
        }

        let mut connections = OrdMap::new();
        for connection in self.connections {
            if connections.contains_key(&connection.id) {
                return Err(IntegrityError::DuplicateConnection { id: connection.id });
            }
            connections.insert(connection.id.clone(), connection);
        }

        let graph = Graph {
            id: self.id,
            version: self.version,
            properties: self.properties,
            elements,
            connections,
        };
        graph.check_containment()?;
        Ok(graph)
    }
}

/// Wire form of a graph: flat element and connection lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GraphDocument {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(flatten)]
    properties: ChainProperties,
    #[serde(default)]
    elements: Vec<Element>,
    #[serde(default)]
    connections: Vec<Connection>,
}

impl TryFrom<GraphDocument> for Graph {
    type Error = IntegrityError;

    fn try_from(doc: GraphDocument) -> Result<Self, Self::Error> {
        let mut builder = GraphBuilder::new(doc.id).properties(doc.properties);
        builder.version = doc.version;
        builder.elements = doc.elements;
        builder.connections = doc.connections;
        builder.build()
    }
}

impl From<Graph> for GraphDocument {
    fn from(graph: Graph) -> Self {
        GraphDocument {
            id: graph.id,
            version: graph.version,
            properties: graph.properties,
            elements: graph.elements.values().cloned().collect(),
            connections: graph.connections.values().cloned().collect(),
        }
    }
}
