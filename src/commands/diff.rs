//! `diff` - compare a fresh plan against an exported one

use crate::cli::{DiffArgs, OutputFormat};
use crate::commands::{apply_target, build, write_json};
use crate::{Context, render, ui};
use anyhow::{Context as AnyhowContext, Result};
use resgraph::{GraphDiff, ResourceGraph};
use std::fs;
use std::path::Path;

/// Read a graph previously written by `ssoplan plan --format json`
pub fn read_previous(path: &Path) -> Result<ResourceGraph> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read previous plan {}", path.display()))?;
    ResourceGraph::from_json(&content)
        .with_context(|| format!("Invalid plan JSON in {}", path.display()))
}

pub fn run(ctx: &Context, args: DiffArgs) -> Result<()> {
    let previous = read_previous(&args.previous)?;
    let (_, _, next) = build(&args.source)?;

    let previous = apply_target(previous, args.target.as_deref());
    let next = apply_target(next, args.target.as_deref());
    let diff = GraphDiff::between(&previous, &next);
    log::info!(
        "Compared {} previous with {} planned resources",
        previous.len(),
        next.len()
    );

    if args.format == OutputFormat::Json {
        return write_json(&diff, None);
    }

    if !ctx.quiet {
        ui::header("ssoplan diff");
        ui::kv("previous", &args.previous.display().to_string());
    }
    render::display_diff(&diff);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_previous_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("previous.json");
        let mut graph = ResourceGraph::new();
        graph
            .add_node(resgraph::Node::new("alice-sso-user", "aws:identitystore/user:User"))
            .unwrap();
        fs::write(&path, graph.to_json().unwrap()).unwrap();

        let back = read_previous(&path).unwrap();
        assert!(GraphDiff::between(&graph, &back).is_empty());
    }

    #[test]
    fn test_read_previous_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("previous.json");
        fs::write(&path, "not json").unwrap();
        assert!(read_previous(&path).is_err());
    }
}
