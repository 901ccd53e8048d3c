//! `add-member` - plan a membership between identities that already exist

use crate::cli::{AddMemberArgs, OutputFormat};
use crate::commands::write_json;
use crate::{Context, render, ui};
use anyhow::{Context as AnyhowContext, Result};
use identitycenter::{AwsCliLookup, IdentityLookup, existing_membership};
use resgraph::ResourceGraph;

pub fn run(ctx: &Context, args: AddMemberArgs) -> Result<()> {
    let lookup = AwsCliLookup::new()
        .with_profile(args.profile.clone())
        .with_region(args.region.clone());
    let graph = plan_membership(&lookup, &args)?;

    if args.format == OutputFormat::Json || args.out.is_some() {
        return write_json(&graph, args.out.as_deref());
    }

    if !ctx.quiet {
        ui::header("ssoplan add-member");
        ui::kv("user", &args.user);
        ui::kv("group", &args.group);
    }
    render::display_graph(&graph);
    Ok(())
}

/// Resolve both identities and build the one-node graph
pub fn plan_membership(lookup: &dyn IdentityLookup, args: &AddMemberArgs) -> Result<ResourceGraph> {
    log::info!("Looking up user {} and group {}", args.user, args.group);
    existing_membership(
        lookup,
        args.identity_store_id.as_deref(),
        &args.user,
        &args.group,
    )
    .with_context(|| format!("Could not add {} to {}", args.user, args.group))
}

#[cfg(test)]
mod tests {
    use super::*;
    use identitycenter::MockLookup;
    use identitycenter::model::membership_node_name;

    fn args(user: &str, group: &str) -> AddMemberArgs {
        AddMemberArgs {
            user: user.into(),
            group: group.into(),
            identity_store_id: None,
            profile: None,
            region: None,
            format: OutputFormat::Json,
            out: None,
        }
    }

    fn lookup() -> MockLookup {
        MockLookup::new("arn:aws:sso:::instance/ssoins-1", "d-9067")
            .with_user("hadi_dev", "u-1")
            .with_group("devs", "g-1")
    }

    #[test]
    fn test_plan_membership() {
        let graph = plan_membership(&lookup(), &args("hadi_dev", "devs")).unwrap();
        assert!(graph.contains(&membership_node_name("hadi_dev", "devs")));
    }

    #[test]
    fn test_unknown_user_is_not_found() {
        let err = plan_membership(&lookup(), &args("ghost", "devs")).unwrap_err();
        let root = err.downcast_ref::<identitycenter::Error>().unwrap();
        assert_eq!(root.category(), identitycenter::ErrorCategory::NotFound);
    }
}
