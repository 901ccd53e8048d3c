//! Apply ordering - groups nodes into dependency waves
//!
//! The convergence engine is free to apply everything inside a wave
//! concurrently; every dependency of a node lives in an earlier wave.

use crate::error::{Error, Result};
use crate::graph::ResourceGraph;
use crate::types::Node;
use std::collections::{BTreeMap, BTreeSet};

impl ResourceGraph {
    /// Topologically order the graph into waves (Kahn's algorithm)
    ///
    /// Each wave is sorted by logical name so the result does not depend on
    /// construction order. Dependencies on names outside the graph are
    /// ignored here; use [`ResourceGraph::validate`] to reject them.
    pub fn apply_waves(&self) -> Result<Vec<Vec<&Node>>> {
        let mut pending: BTreeMap<&str, BTreeSet<&str>> = self
            .nodes()
            .iter()
            .map(|node| {
                let deps = self
                    .dependencies_of(&node.name)
                    .into_iter()
                    .filter(|d| self.contains(d))
                    .collect();
                (node.name.as_str(), deps)
            })
            .collect();

        let mut waves = Vec::new();
        while !pending.is_empty() {
            let ready: Vec<&str> = pending
                .iter()
                .filter(|(_, deps)| deps.is_empty())
                .map(|(name, _)| *name)
                .collect();

            if ready.is_empty() {
                let stuck = pending.keys().map(|n| (*n).to_string()).collect();
                return Err(Error::Cycle(stuck));
            }

            for name in &ready {
                pending.remove(name);
            }
            for deps in pending.values_mut() {
                for name in &ready {
                    deps.remove(name);
                }
            }

            log::trace!("wave {}: {}", waves.len(), ready.join(", "));
            waves.push(ready.iter().filter_map(|n| self.node(n)).collect());
        }

        Ok(waves)
    }

    /// Flattened apply order
    pub fn apply_order(&self) -> Result<Vec<&Node>> {
        Ok(self.apply_waves()?.into_iter().flatten().collect())
    }
}
