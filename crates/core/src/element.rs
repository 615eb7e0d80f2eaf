use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

/// Property bag of an element. Keys are kept sorted so iteration is stable.
pub type Properties = BTreeMap<String, Value>;

/// Type tag of an element, e.g. `"http-trigger"` or `"script"`.
///
/// The set of types is open: anything the element library does not describe
/// is still a valid type, it just has no known ports or flags.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementType(String);

impl ElementType {
    pub fn new(name: impl Into<String>) -> Self {
        ElementType(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ElementType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementType {
    fn from(name: &str) -> Self {
        ElementType(name.to_string())
    }
}

impl From<String> for ElementType {
    fn from(name: String) -> Self {
        ElementType(name)
    }
}

/// Display position of an element on the chain canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    /// Euclidean distance to another position.
    pub fn distance(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A node of a chain graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Properties,
    /// Id of the enclosing container element, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Element {
    pub fn new(id: impl Into<String>, element_type: impl Into<ElementType>) -> Self {
        Element {
            id: id.into(),
            element_type: element_type.into(),
            version: None,
            properties: Properties::new(),
            container: None,
            position: None,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn in_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }
}

/// Which end of a connection a port or reference belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionEnd {
    Source,
    Target,
}

impl fmt::Display for ConnectionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionEnd::Source => f.write_str("source"),
            ConnectionEnd::Target => f.write_str("target"),
        }
    }
}

/// A directed edge between two element ports.
///
/// A `None` port refers to the element's default port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_port: Option<String>,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<String>,
}

impl Connection {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Connection {
            id: id.into(),
            source: source.into(),
            source_port: None,
            target: target.into(),
            target_port: None,
        }
    }

    pub fn with_ports(
        mut self,
        source_port: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        self.source_port = Some(source_port.into());
        self.target_port = Some(target_port.into());
        self
    }

    /// Element id at the given end.
    pub fn endpoint(&self, end: ConnectionEnd) -> &str {
        match end {
            ConnectionEnd::Source => &self.source,
            ConnectionEnd::Target => &self.target,
        }
    }

    /// Port at the given end.
    pub fn port(&self, end: ConnectionEnd) -> Option<&str> {
        match end {
            ConnectionEnd::Source => self.source_port.as_deref(),
            ConnectionEnd::Target => self.target_port.as_deref(),
        }
    }
}
