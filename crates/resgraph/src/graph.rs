//! Resource graph container

use crate::error::{Error, Result};
use crate::types::{Edge, EdgeKind, Node, PropertyValue};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A desired-state resource graph
///
/// Nodes keep their construction order for display and logging, but identity
/// is the logical name: two graphs with the same names and edges describe the
/// same desired state regardless of insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "RawGraph")]
pub struct ResourceGraph {
    nodes: Vec<Node>,
    /// Exported stack values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    outputs: BTreeMap<String, PropertyValue>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

#[derive(Deserialize)]
struct RawGraph {
    nodes: Vec<Node>,
    #[serde(default)]
    outputs: BTreeMap<String, PropertyValue>,
}

impl TryFrom<RawGraph> for ResourceGraph {
    type Error = Error;

    fn try_from(raw: RawGraph) -> Result<Self> {
        let mut graph = Self::new();
        for node in raw.nodes {
            graph.add_node(node)?;
        }
        graph.outputs = raw.outputs;
        Ok(graph)
    }
}

impl ResourceGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, rejecting duplicate logical names
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.index.contains_key(&node.name) {
            return Err(Error::DuplicateNode(node.name));
        }
        log::trace!("graph: + {} ({})", node.name, node.resource_type);
        self.index.insert(node.name.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Export a value under `key`
    pub fn add_output(&mut self, key: &str, value: PropertyValue) {
        self.outputs.insert(key.to_string(), value);
    }

    /// Look up a node by logical name
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    /// Whether a node with this logical name exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All nodes in construction order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Exported values
    pub fn outputs(&self) -> &BTreeMap<String, PropertyValue> {
        &self.outputs
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes of a given resource type, in construction order
    pub fn nodes_of_type<'a>(&'a self, resource_type: &'a str) -> impl Iterator<Item = &'a Node> {
        self.nodes
            .iter()
            .filter(move |n| n.resource_type == resource_type)
    }

    /// Number of nodes per resource type
    pub fn count_by_type(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for node in &self.nodes {
            *counts.entry(node.resource_type.as_str()).or_default() += 1;
        }
        counts
    }

    /// Every depends-on edge, implicit and explicit, sorted
    pub fn edges(&self) -> BTreeSet<Edge> {
        let mut edges = BTreeSet::new();
        for node in &self.nodes {
            for target in node.references() {
                edges.insert(Edge {
                    from: node.name.clone(),
                    to: target.to_string(),
                    kind: EdgeKind::Reference,
                });
            }
            for target in &node.depends_on {
                edges.insert(Edge {
                    from: node.name.clone(),
                    to: target.clone(),
                    kind: EdgeKind::Explicit,
                });
            }
        }
        edges
    }

    /// Names this node must be applied after (both edge kinds)
    pub fn dependencies_of(&self, name: &str) -> BTreeSet<&str> {
        let mut deps = BTreeSet::new();
        if let Some(node) = self.node(name) {
            deps.extend(node.references());
            deps.extend(node.depends_on.iter().map(String::as_str));
        }
        deps
    }

    /// Check that every edge points at a node in the graph and that there are
    /// no cycles
    pub fn validate(&self) -> Result<()> {
        for edge in self.edges() {
            if !self.contains(&edge.to) {
                return Err(Error::UnknownDependency {
                    node: edge.from,
                    dependency: edge.to,
                });
            }
        }
        self.apply_waves().map(|_| ())
    }

    /// Keep only nodes matching `predicate`
    ///
    /// Dependencies on dropped nodes are kept as-is, so the result is meant
    /// for display rather than hand-off.
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Node) -> bool,
    {
        let mut filtered = Self::new();
        for node in self.nodes.iter().filter(|n| predicate(n)) {
            filtered.index.insert(node.name.clone(), filtered.nodes.len());
            filtered.nodes.push(node.clone());
        }
        filtered.outputs = self
            .outputs
            .iter()
            .filter(|(_, value)| {
                let mut refs = Vec::new();
                value.referenced_resources(&mut refs);
                refs.iter().all(|r| filtered.contains(r))
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        filtered
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON produced by [`ResourceGraph::to_json`]
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Parse a target string like "type" or "type.name" into (type, name)
pub fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    let parts: Vec<&str> = target.split('.').collect();
    match parts.len() {
        1 => (Some(parts[0].to_string()), None),
        2 => (Some(parts[0].to_string()), Some(parts[1].to_string())),
        _ => (None, Some(target.to_string())),
    }
}
