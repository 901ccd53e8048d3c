//! Diff computation between two planned graphs
//!
//! Compares a previously exported plan with a freshly built one. Nothing here
//! looks at live infrastructure; this is a plan-to-plan comparison.

use crate::graph::ResourceGraph;
use crate::types::{Node, PropertyValue};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Kind of change for a single logical name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Only in the new plan
    Create,
    /// Only in the previous plan
    Delete,
    /// In both, inputs or dependencies differ
    Update,
    /// In both, resource type differs (the engine must destroy and recreate)
    Replace,
}

/// A single property or output change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyChange {
    pub key: String,
    pub from: Option<PropertyValue>,
    pub to: Option<PropertyValue>,
}

/// A diff for one logical name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDiff {
    pub name: String,
    pub resource_type: String,
    pub kind: ChangeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyChange>,
    /// Whether explicit dependencies changed
    #[serde(default)]
    pub dependencies_changed: bool,
}

impl NodeDiff {
    fn compare(previous: &Node, next: &Node) -> Option<Self> {
        if previous.resource_type != next.resource_type {
            return Some(Self {
                name: next.name.clone(),
                resource_type: next.resource_type.clone(),
                kind: ChangeKind::Replace,
                properties: Vec::new(),
                dependencies_changed: false,
            });
        }

        let mut properties = Vec::new();
        let keys: BTreeSet<&String> = previous
            .properties
            .keys()
            .chain(next.properties.keys())
            .collect();
        for key in keys {
            let from = previous.properties.get(key);
            let to = next.properties.get(key);
            if from != to {
                properties.push(PropertyChange {
                    key: key.clone(),
                    from: from.cloned(),
                    to: to.cloned(),
                });
            }
        }

        let mut old_deps = previous.depends_on.clone();
        let mut new_deps = next.depends_on.clone();
        old_deps.sort();
        new_deps.sort();
        let dependencies_changed = old_deps != new_deps;

        if properties.is_empty() && !dependencies_changed {
            return None;
        }

        Some(Self {
            name: next.name.clone(),
            resource_type: next.resource_type.clone(),
            kind: ChangeKind::Update,
            properties,
            dependencies_changed,
        })
    }
}

/// Differences between two plans, sorted by logical name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDiff {
    pub changes: Vec<NodeDiff>,
    /// Exported values added, removed or changed, sorted by key
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<PropertyChange>,
}

impl GraphDiff {
    /// Compute the changes needed to go from `previous` to `next`
    pub fn between(previous: &ResourceGraph, next: &ResourceGraph) -> Self {
        let mut changes: BTreeMap<&str, NodeDiff> = BTreeMap::new();

        for node in next.nodes() {
            match previous.node(&node.name) {
                None => {
                    changes.insert(
                        &node.name,
                        NodeDiff {
                            name: node.name.clone(),
                            resource_type: node.resource_type.clone(),
                            kind: ChangeKind::Create,
                            properties: Vec::new(),
                            dependencies_changed: false,
                        },
                    );
                }
                Some(old) => {
                    if let Some(diff) = NodeDiff::compare(old, node) {
                        changes.insert(&node.name, diff);
                    }
                }
            }
        }

        for node in previous.nodes() {
            if !next.contains(&node.name) {
                changes.insert(
                    &node.name,
                    NodeDiff {
                        name: node.name.clone(),
                        resource_type: node.resource_type.clone(),
                        kind: ChangeKind::Delete,
                        properties: Vec::new(),
                        dependencies_changed: false,
                    },
                );
            }
        }

        let keys: BTreeSet<&String> = previous
            .outputs()
            .keys()
            .chain(next.outputs().keys())
            .collect();
        let outputs = keys
            .into_iter()
            .filter_map(|key| {
                let from = previous.outputs().get(key);
                let to = next.outputs().get(key);
                (from != to).then(|| PropertyChange {
                    key: key.clone(),
                    from: from.cloned(),
                    to: to.cloned(),
                })
            })
            .collect();

        Self {
            changes: changes.into_values().collect(),
            outputs,
        }
    }

    /// Whether the plans are identical, outputs included
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.outputs.is_empty()
    }

    /// Summary counts
    pub fn summary(&self) -> DiffSummary {
        DiffSummary {
            outputs: self.outputs.len(),
            ..DiffSummary::from_changes(&self.changes)
        }
    }

    /// Group changes by resource type
    pub fn group_by_type(&self) -> BTreeMap<&str, Vec<&NodeDiff>> {
        let mut groups: BTreeMap<&str, Vec<&NodeDiff>> = BTreeMap::new();
        for change in &self.changes {
            groups
                .entry(change.resource_type.as_str())
                .or_default()
                .push(change);
        }
        groups
    }
}

/// Diff summary statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub creates: usize,
    pub deletes: usize,
    pub updates: usize,
    pub replaces: usize,
    /// Changed exports; not counted in [`DiffSummary::total`]
    pub outputs: usize,
}

impl DiffSummary {
    /// Create a summary from a list of node diffs
    pub fn from_changes(changes: &[NodeDiff]) -> Self {
        let mut summary = Self::default();
        for change in changes {
            match change.kind {
                ChangeKind::Create => summary.creates += 1,
                ChangeKind::Delete => summary.deletes += 1,
                ChangeKind::Update => summary.updates += 1,
                ChangeKind::Replace => summary.replaces += 1,
            }
        }
        summary
    }

    /// Total number of resource changes
    pub fn total(&self) -> usize {
        self.creates + self.deletes + self.updates + self.replaces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(nodes: Vec<Node>) -> ResourceGraph {
        let mut g = ResourceGraph::new();
        for node in nodes {
            g.add_node(node).unwrap();
        }
        g
    }

    #[test]
    fn test_identical_graphs_have_no_diff() {
        let a = graph(vec![Node::new("x", "t").with("k", "v")]);
        let b = graph(vec![Node::new("x", "t").with("k", "v")]);
        let diff = GraphDiff::between(&a, &b);
        assert!(diff.is_empty());
        assert_eq!(diff.summary(), DiffSummary::default());
    }

    #[test]
    fn test_create_delete_update_replace() {
        let previous = graph(vec![
            Node::new("kept", "t").with("k", "old"),
            Node::new("gone", "t"),
            Node::new("retyped", "a"),
        ]);
        let next = graph(vec![
            Node::new("kept", "t").with("k", "new"),
            Node::new("added", "t"),
            Node::new("retyped", "b"),
        ]);

        let diff = GraphDiff::between(&previous, &next);
        let kinds: Vec<_> = diff.changes.iter().map(|c| (c.name.as_str(), c.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("added", ChangeKind::Create),
                ("gone", ChangeKind::Delete),
                ("kept", ChangeKind::Update),
                ("retyped", ChangeKind::Replace),
            ]
        );

        let kept = &diff.changes[2];
        assert_eq!(kept.properties.len(), 1);
        assert_eq!(kept.properties[0].to, Some(PropertyValue::from("new")));

        assert_eq!(
            diff.summary(),
            DiffSummary {
                creates: 1,
                deletes: 1,
                updates: 1,
                replaces: 1,
                outputs: 0,
            }
        );
    }

    #[test]
    fn test_dependency_change_is_an_update() {
        let previous = graph(vec![Node::new("a", "t"), Node::new("b", "t")]);
        let next = graph(vec![Node::new("a", "t"), Node::new("b", "t").depends_on("a")]);
        let diff = GraphDiff::between(&previous, &next);
        assert_eq!(diff.changes.len(), 1);
        assert!(diff.changes[0].dependencies_changed);
        assert!(diff.changes[0].properties.is_empty());
    }

    #[test]
    fn test_output_only_change_is_reported() {
        let mut previous = graph(vec![Node::new("devs-group", "t")]);
        previous.add_output("devs_group_id", PropertyValue::reference("devs-group", "groupId"));
        previous.add_output("old_id", PropertyValue::from("x"));
        let mut next = graph(vec![Node::new("devs-group", "t")]);
        next.add_output("devs_group_id", PropertyValue::reference("devs-group", "id"));

        let diff = GraphDiff::between(&previous, &next);
        assert!(!diff.is_empty());
        assert!(diff.changes.is_empty());

        let keys: Vec<_> = diff.outputs.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["devs_group_id", "old_id"]);
        assert_eq!(diff.outputs[1].to, None);
        assert_eq!(diff.summary().outputs, 2);
        assert_eq!(diff.summary().total(), 0);
    }
}
