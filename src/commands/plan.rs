//! `plan`, `validate` and `order`

use crate::cli::{OrderArgs, OutputFormat, PlanArgs, SourceArgs};
use crate::commands::{apply_target, build, count_line, load, write_json};
use crate::{Context, render, ui};
use anyhow::Result;
use identitycenter::{PlanSettings, build_graph};

pub fn plan(ctx: &Context, args: PlanArgs) -> Result<()> {
    let (loaded, settings, graph) = build(&args.source)?;
    let graph = apply_target(graph, args.target.as_deref());

    if args.format == OutputFormat::Json || args.out.is_some() {
        write_json(&graph, args.out.as_deref())?;
        if args.out.is_some() && !ctx.quiet {
            ui::success(&format!("Plan written ({})", ui::plural(graph.len(), "resource")));
        }
        return Ok(());
    }

    if !ctx.quiet {
        ui::header("ssoplan plan");
        ui::kv("config", &loaded.path.display().to_string());
        ui::kv("account", &settings.account_id);
        ui::kv("session", &settings.default_session_duration);
    }
    render::display_graph(&graph);
    Ok(())
}

pub fn validate(ctx: &Context, args: SourceArgs) -> Result<()> {
    let loaded = load(&args)?;
    loaded.config.validate()?;

    let account_known = args.account_id.is_some() || loaded.config.account_id.is_some();
    if !account_known {
        ui::warn("No account id (AWS_ACCOUNT_ID, --account-id or account_id); graph not built");
        ui::success(&format!("{} is valid", loaded.path.display()));
        return Ok(());
    }

    let settings = PlanSettings::resolve(&loaded.config, args.account_id.as_deref())?;
    // build_graph checks edges and cycles before returning
    let graph = build_graph(&loaded.config, &settings)?;

    ui::success(&format!(
        "{} is valid ({})",
        loaded.path.display(),
        ui::plural(graph.len(), "resource")
    ));
    if ctx.verbose > 0 {
        ui::dim(&count_line(&graph));
    }
    Ok(())
}

pub fn order(ctx: &Context, args: OrderArgs) -> Result<()> {
    let (_, _, graph) = build(&args.source)?;
    let waves = graph.apply_waves()?;

    // Filter after ordering so waves stay those of the full graph
    let selected = args
        .target
        .as_deref()
        .map(|t| apply_target(graph.clone(), Some(t)));
    let waves: Vec<Vec<_>> = waves
        .into_iter()
        .map(|wave| {
            wave.into_iter()
                .filter(|n| selected.as_ref().is_none_or(|s| s.contains(&n.name)))
                .collect::<Vec<_>>()
        })
        .filter(|wave| !wave.is_empty())
        .collect();

    if !ctx.quiet {
        ui::header("Apply order");
        ui::dim(&format!(
            "{} in {}",
            ui::plural(graph.len(), "resource"),
            ui::plural(waves.len(), "wave")
        ));
    }
    render::display_waves(&waves);
    Ok(())
}
