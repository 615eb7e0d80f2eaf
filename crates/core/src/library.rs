//! Element library: what the platform knows about each element type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::element::{ConnectionEnd, ElementType};
use crate::graph::Graph;

/// Behavioural flags and declared ports of one element type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    #[serde(rename = "type")]
    pub element_type: ElementType,
    /// Elements of this type may contain other elements.
    #[serde(default)]
    pub container: bool,
    /// The type is slated for replacement.
    #[serde(default)]
    pub deprecated: bool,
    /// Declared input ports; `None` means any port is accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<String>>,
    /// Declared output ports; `None` means any port is accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<String>>,
}

impl ElementDescriptor {
    pub fn new(element_type: impl Into<ElementType>) -> Self {
        ElementDescriptor {
            element_type: element_type.into(),
            container: false,
            deprecated: false,
            inputs: None,
            outputs: None,
        }
    }

    pub fn container(mut self) -> Self {
        self.container = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn with_inputs(mut self, ports: &[&str]) -> Self {
        self.inputs = Some(ports.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn with_outputs(mut self, ports: &[&str]) -> Self {
        self.outputs = Some(ports.iter().map(|p| p.to_string()).collect());
        self
    }

    /// Whether a connection may attach at `port` on the given end.
    ///
    /// Outgoing connections use the source end (outputs), incoming ones the
    /// target end (inputs). The default port (`None`) always exists.
    pub fn accepts_port(&self, end: ConnectionEnd, port: Option<&str>) -> bool {
        let declared = match end {
            ConnectionEnd::Source => &self.outputs,
            ConnectionEnd::Target => &self.inputs,
        };
        match (declared, port) {
            (None, _) | (_, None) => true,
            (Some(ports), Some(port)) => ports.iter().any(|p| p == port),
        }
    }
}

/// An element nested in a parent whose type cannot contain elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainmentViolation {
    pub element_id: String,
    pub container_id: String,
    pub container_type: ElementType,
}

/// Lookup table of element descriptors keyed by type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementLibrary {
    descriptors: BTreeMap<ElementType, ElementDescriptor>,
}

impl ElementLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later descriptors for the same type replace earlier ones.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ElementDescriptor>) -> Self {
        let mut library = Self::new();
        for descriptor in descriptors {
            library.insert(descriptor);
        }
        library
    }

    pub fn insert(&mut self, descriptor: ElementDescriptor) {
        self.descriptors
            .insert(descriptor.element_type.clone(), descriptor);
    }

    pub fn get(&self, element_type: &str) -> Option<&ElementDescriptor> {
        self.descriptors.get(element_type)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ElementDescriptor> + '_ {
        self.descriptors.values()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn is_deprecated(&self, element_type: &str) -> bool {
        self.get(element_type).is_some_and(|d| d.deprecated)
    }

    pub fn is_container(&self, element_type: &str) -> bool {
        self.get(element_type).is_some_and(|d| d.container)
    }

    /// Elements whose container has a known, non-container type.
    ///
    /// Containers of unknown types are given the benefit of the doubt.
    pub fn containment_violations(&self, graph: &Graph) -> Vec<ContainmentViolation> {
        graph
            .elements()
            .filter_map(|element| {
                let container_id = element.container.as_deref()?;
                let container = graph.element(container_id)?;
                let descriptor = self.get(container.element_type.as_str())?;
                (!descriptor.container).then(|| ContainmentViolation {
                    element_id: element.id.clone(),
                    container_id: container_id.to_string(),
                    container_type: container.element_type.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;

    #[test]
    fn undeclared_ports_accept_anything() {
        let d = ElementDescriptor::new("script");
        assert!(d.accepts_port(ConnectionEnd::Source, Some("whatever")));
        assert!(d.accepts_port(ConnectionEnd::Target, None));
    }

    #[test]
    fn declared_ports_are_checked_per_end() {
        let d = ElementDescriptor::new("switch")
            .with_inputs(&["in"])
            .with_outputs(&["case", "default"]);
        assert!(d.accepts_port(ConnectionEnd::Source, Some("case")));
        assert!(!d.accepts_port(ConnectionEnd::Source, Some("in")));
        assert!(d.accepts_port(ConnectionEnd::Target, Some("in")));
        assert!(d.accepts_port(ConnectionEnd::Target, None));
    }

    #[test]
    fn flags_lookup() {
        let lib = ElementLibrary::from_descriptors([
            ElementDescriptor::new("split").container(),
            ElementDescriptor::new("old-http").deprecated(),
        ]);
        assert!(lib.is_container("split"));
        assert!(!lib.is_container("old-http"));
        assert!(lib.is_deprecated("old-http"));
        assert!(!lib.is_deprecated("unknown"));
        assert_eq!(lib.len(), 2);
    }

    #[test]
    fn containment_violations_reported() {
        let lib = ElementLibrary::from_descriptors([
            ElementDescriptor::new("split").container(),
            ElementDescriptor::new("log"),
        ]);
        let g = Graph::builder("g")
            .element(Element::new("s", "split"))
            .element(Element::new("l", "log"))
            .element(Element::new("ok", "script").in_container("s"))
            .element(Element::new("bad", "script").in_container("l"))
            .build()
            .unwrap();
        let violations = lib.containment_violations(&g);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].element_id, "bad");
        assert_eq!(violations[0].container_type.as_str(), "log");
    }
}
