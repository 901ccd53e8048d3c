//! Text rendering of plans, apply waves and plan diffs

use colored::Colorize;
use identitycenter::ResourceKind;
use resgraph::{ChangeKind, GraphDiff, Node, PropertyValue, ResourceGraph};

/// Properties worth a glance, in the order they are shown
const SUMMARY_KEYS: &[&str] = &[
    "userName",
    "displayName",
    "principalType",
    "targetId",
    "sessionDuration",
    "managedPolicyArn",
    "policyArn",
];

/// Human label for a resource type token
pub fn type_label(resource_type: &str) -> &str {
    ResourceKind::from_token(resource_type).map_or(resource_type, |k| k.label())
}

/// One-line description of a node from its most telling properties
pub fn node_summary(node: &Node) -> String {
    let mut parts: Vec<String> = SUMMARY_KEYS
        .iter()
        .filter_map(|key| node.property(key))
        .map(|value| match value {
            PropertyValue::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();

    if !node.depends_on.is_empty() {
        parts.push(format!("after {}", node.depends_on.join(", ")));
    }
    parts.join("  ")
}

/// Nodes grouped by kind, known kinds first in their natural order
fn grouped(graph: &ResourceGraph) -> Vec<(&str, Vec<&Node>)> {
    let mut groups: Vec<(&str, Vec<&Node>)> = ResourceKind::ALL
        .iter()
        .map(|kind| (kind.token(), graph.nodes_of_type(kind.token()).collect()))
        .collect();

    for node in graph.nodes() {
        if ResourceKind::from_token(&node.resource_type).is_some() {
            continue;
        }
        match groups.iter_mut().find(|(t, _)| *t == node.resource_type) {
            Some((_, nodes)) => nodes.push(node),
            None => groups.push((node.resource_type.as_str(), vec![node])),
        }
    }

    groups.retain(|(_, nodes)| !nodes.is_empty());
    groups
}

/// Display a planned graph grouped by resource type
pub fn display_graph(graph: &ResourceGraph) {
    if graph.is_empty() {
        println!();
        println!("  {} Nothing to plan", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Identity Center Plan".bold()
    );
    println!("│");

    for (resource_type, nodes) in grouped(graph) {
        println!("│ {} {}", type_label(resource_type).bold(), format!("({})", nodes.len()).dimmed());
        for node in nodes {
            println!(
                "│   {} {:<40} {}",
                "+".green(),
                node.name,
                node_summary(node).dimmed()
            );
        }
        println!("│");
    }

    if !graph.outputs().is_empty() {
        println!("│ {}", "Outputs".bold());
        for (key, value) in graph.outputs() {
            println!("│   {:<40} {}", key, value.to_string().dimmed());
        }
        println!("│");
    }

    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} resources, {} edges",
        graph.len().to_string().bold(),
        graph.edges().len().to_string().bold()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

/// Display apply waves, one numbered block per wave
pub fn display_waves(waves: &[Vec<&Node>]) {
    for (i, wave) in waves.iter().enumerate() {
        println!();
        println!(
            "{} {}",
            format!("[wave {}/{}]", i + 1, waves.len()).blue().bold(),
            format!("{} resources", wave.len()).dimmed()
        );
        for node in wave {
            println!(
                "  {} {:<40} {}",
                "•".cyan(),
                node.name,
                type_label(&node.resource_type).dimmed()
            );
        }
    }
}

fn change_symbol(kind: ChangeKind) -> colored::ColoredString {
    match kind {
        ChangeKind::Create => "+".green(),
        ChangeKind::Delete => "-".red(),
        ChangeKind::Update => "~".yellow(),
        ChangeKind::Replace => "±".magenta(),
    }
}

fn show(value: &Option<PropertyValue>) -> String {
    value
        .as_ref()
        .map_or_else(|| "(unset)".to_string(), ToString::to_string)
}

/// Display a plan diff in a user-friendly format
pub fn display_diff(diff: &GraphDiff) {
    if diff.is_empty() {
        println!();
        println!("  {} No changes between plans", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Plan Diff".bold()
    );
    println!("│");

    for (resource_type, changes) in diff.group_by_type() {
        println!("│ {}", type_label(resource_type).bold());

        for change in changes {
            let detail = match change.kind {
                ChangeKind::Create => "(new)".to_string(),
                ChangeKind::Delete => "(will be destroyed)".to_string(),
                ChangeKind::Replace => "(type changed, destroy and recreate)".to_string(),
                ChangeKind::Update => {
                    let mut keys: Vec<&str> =
                        change.properties.iter().map(|p| p.key.as_str()).collect();
                    if change.dependencies_changed {
                        keys.push("depends_on");
                    }
                    keys.join(", ")
                }
            };

            println!(
                "│   {} {:<40} {}",
                change_symbol(change.kind),
                change.name,
                detail.dimmed()
            );

            for property in &change.properties {
                println!(
                    "│       {}: {} → {}",
                    property.key,
                    show(&property.from).red(),
                    show(&property.to).green()
                );
            }
        }
        println!("│");
    }

    if !diff.outputs.is_empty() {
        println!("│ {}", "Outputs".bold());
        for output in &diff.outputs {
            let kind = match (&output.from, &output.to) {
                (None, _) => ChangeKind::Create,
                (_, None) => ChangeKind::Delete,
                _ => ChangeKind::Update,
            };
            println!(
                "│   {} {:<40} {} → {}",
                change_symbol(kind),
                output.key,
                show(&output.from).red(),
                show(&output.to).green()
            );
        }
        println!("│");
    }

    let summary = diff.summary();
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} changes ({} create, {} update, {} replace, {} delete), {} outputs",
        summary.total().to_string().bold(),
        summary.creates.to_string().green(),
        summary.updates.to_string().yellow(),
        summary.replaces.to_string().magenta(),
        summary.deletes.to_string().red(),
        summary.outputs.to_string().bold()
    );
    println!("└─────────────────────────────────────────────────────┘");
}
