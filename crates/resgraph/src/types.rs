//! Core types for desired-state resource graphs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A property value on a resource node
///
/// Literal values are passed through to the engine as-is. `Ref` points at an
/// output of another node in the same graph and implies a dependency on it.
/// `Invoke` defers a value to a provider data-source call made by the engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    String(String),
    Bool(bool),
    Int(i64),
    List(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
    /// Output `output` of the node named `resource`
    Ref { resource: String, output: String },
    /// Result of a provider function, e.g. `aws:ssoadmin/getInstances` at `arns[0]`
    Invoke { function: String, path: String },
}

impl PropertyValue {
    /// Reference to another node's output
    pub fn reference(resource: &str, output: &str) -> Self {
        Self::Ref {
            resource: resource.to_string(),
            output: output.to_string(),
        }
    }

    /// Deferred provider function result
    pub fn invoke(function: &str, path: &str) -> Self {
        Self::Invoke {
            function: function.to_string(),
            path: path.to_string(),
        }
    }

    /// Get the value as a string if it is a string literal
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Collect every node name referenced anywhere inside this value
    pub fn referenced_resources<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Ref { resource, .. } => out.push(resource),
            Self::List(items) => {
                for item in items {
                    item.referenced_resources(out);
                }
            }
            Self::Map(entries) => {
                for value in entries.values() {
                    value.referenced_resources(out);
                }
            }
            Self::String(_) | Self::Bool(_) | Self::Int(_) | Self::Invoke { .. } => {}
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            Self::Ref { resource, output } => write!(f, "${{{resource}.{output}}}"),
            Self::Invoke { function, path } => write!(f, "${{{function}().{path}}}"),
        }
    }
}

/// A desired-state resource node
///
/// `name` is the stable logical identity the engine tracks across runs.
/// Renaming a node is equivalent to destroying and recreating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Logical name, unique within a graph
    pub name: String,
    /// Provider resource type token, e.g. `aws:identitystore/user:User`
    pub resource_type: String,
    /// Input properties
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    /// Explicit ordering dependencies (in addition to those implied by `Ref`s)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl Node {
    /// Create a node with no properties
    pub fn new(name: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_type: resource_type.into(),
            properties: BTreeMap::new(),
            depends_on: Vec::new(),
        }
    }

    /// Set a property (builder style)
    pub fn with(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Add an explicit dependency (builder style)
    pub fn depends_on(mut self, name: &str) -> Self {
        if !self.depends_on.iter().any(|d| d == name) {
            self.depends_on.push(name.to_string());
        }
        self
    }

    /// Look up a property
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Names of nodes referenced by this node's properties
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for value in self.properties.values() {
            value.referenced_resources(&mut out);
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// Why one node depends on another
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// A property references an output of the dependency
    Reference,
    /// Declared via `depends_on`
    Explicit,
}

/// A depends-on edge: `from` must be applied after `to`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}
