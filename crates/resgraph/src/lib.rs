//! # resgraph
//!
//! Desired-state resource graphs for infrastructure-as-code engines.
//!
//! This crate holds the provider-agnostic half of planning: a graph of
//! logically-named resource nodes, the depends-on edges between them, and the
//! checks that make a graph safe to hand to a convergence engine. It never
//! talks to a cloud API; diffing against live state and applying changes are
//! the engine's job.
//!
//! ## Core Concepts
//!
//! - **Node**: one desired resource, identified by a stable logical name
//! - **PropertyValue**: an input value; `Ref` values point at another node's
//!   output and imply an edge
//! - **ResourceGraph**: the node set plus exported outputs
//! - **Apply waves**: a topological grouping where every dependency of a node
//!   sits in an earlier wave
//! - **GraphDiff**: what changed between two plans
//!
//! ## Example
//!
//! ```
//! use resgraph::{Node, PropertyValue, ResourceGraph};
//!
//! let mut graph = ResourceGraph::new();
//! graph.add_node(Node::new("devs-group", "aws:identitystore/group:Group")).unwrap();
//! graph
//!     .add_node(
//!         Node::new("alice-devs-membership", "aws:identitystore/groupMembership:GroupMembership")
//!             .with("groupId", PropertyValue::reference("devs-group", "groupId")),
//!     )
//!     .unwrap();
//!
//! graph.validate().unwrap();
//! let waves = graph.apply_waves().unwrap();
//! assert_eq!(waves.len(), 2);
//! ```

pub mod diff;
pub mod error;
pub mod graph;
pub mod order;
pub mod types;

// Re-export main types at crate root
pub use diff::{ChangeKind, DiffSummary, GraphDiff, NodeDiff, PropertyChange};
pub use error::{Error, Result};
pub use graph::{ResourceGraph, parse_target};
pub use types::{Edge, EdgeKind, Node, PropertyValue};
