//! Command implementations

pub mod diff;
pub mod member;
pub mod plan;

use crate::cli::SourceArgs;
use crate::{config, paths};
use anyhow::{Context, Result};
use identitycenter::{IdentityConfig, PlanSettings, ResourceKind, build_graph};
use resgraph::ResourceGraph;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration plus where it came from
pub struct Loaded {
    pub path: PathBuf,
    pub config: IdentityConfig,
}

/// Load the configuration named by the arguments (or the default file)
pub fn load(source: &SourceArgs) -> Result<Loaded> {
    let path = paths::config_file(source.config.as_deref())?;
    let config = config::load(&path)?;
    Ok(Loaded { path, config })
}

/// Resolve settings and build the full graph
pub fn build(source: &SourceArgs) -> Result<(Loaded, PlanSettings, ResourceGraph)> {
    let loaded = load(source)?;
    let settings = PlanSettings::resolve(&loaded.config, source.account_id.as_deref())?;
    let graph = build_graph(&loaded.config, &settings)?;
    Ok((loaded, settings, graph))
}

/// Narrow a graph to `--target`, if given
pub fn apply_target(graph: ResourceGraph, target: Option<&str>) -> ResourceGraph {
    match target {
        Some(target) => {
            let filtered = identitycenter::model::filter_by_target(&graph, target);
            log::info!(
                "Target '{target}' selected {} of {} resources",
                filtered.len(),
                graph.len()
            );
            filtered
        }
        None => graph,
    }
}

/// Serialize as pretty JSON to `out`, or stdout when `None`
pub fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Could not create {}", parent.display()))?;
            }
            fs::write(path, json + "\n")
                .with_context(|| format!("Could not write {}", path.display()))?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// "users (identity store): 2, ..." for the kinds present in the graph
pub fn count_line(graph: &ResourceGraph) -> String {
    let counts = graph.count_by_type();
    ResourceKind::ALL
        .iter()
        .filter_map(|kind| {
            counts
                .get(kind.token())
                .map(|n| format!("{}: {n}", kind.label().to_lowercase()))
        })
        .collect::<Vec<_>>()
        .join(", ")
}
