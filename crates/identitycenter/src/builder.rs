//! Graph builder - turns an [`IdentityConfig`] into a [`ResourceGraph`]
//!
//! Planning runs in two phases. First every entry is validated into a typed
//! spec; a bad entry aborts before a single node exists. Then nodes are
//! emitted in document order:
//!
//! 1. per user: user, group (first reference only), membership, permission
//!    set, account assignment, one managed-policy attachment per policy
//! 2. groups declared only in the `groups` table
//! 3. group-principal assignments
//! 4. IAM users and roles
//!
//! Every policy attachment carries an explicit dependency on its own
//! assignment, so the engine never attaches a policy to a permission set
//! before that set is provisioned to the account.

use crate::config::{
    IdentityConfig, PlanSettings, looks_like_policy_arn, validate_session_duration,
};
use crate::error::{Error, Result};
use crate::iam::{self, IamUserSpec};
use crate::model::{
    AccountAssignmentSpec, GroupSpec, IdentityRef, MAX_PERMISSION_SET_NAME, MembershipEdge,
    PermissionSetSpec, PolicyAttachmentEdge, Principal, ResourceKind, UserSpec,
    assignment_node_name, attachment_node_name, group_assignment_node_name,
    group_permission_set_name, membership_node_name, permission_set_name,
};
use resgraph::{Node, PropertyValue, ResourceGraph};
use std::collections::{HashMap, HashSet};

/// Build the full resource graph for a configuration
pub fn build_graph(config: &IdentityConfig, settings: &PlanSettings) -> Result<ResourceGraph> {
    let mut builder = GraphBuilder::new(config, settings);
    builder.plan()?;
    builder.finish()
}

/// A permission set assigned to a group principal
#[derive(Debug, Clone)]
struct GroupAssignmentSpec {
    group: String,
    permission_set: PermissionSetSpec,
    policies: Vec<String>,
}

/// Builds the resource graph for one planning run
pub struct GraphBuilder<'a> {
    config: &'a IdentityConfig,
    settings: &'a PlanSettings,
    graph: ResourceGraph,
    /// group name -> logical name of its node, filled on first reference
    groups: HashMap<String, String>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(config: &'a IdentityConfig, settings: &'a PlanSettings) -> Self {
        Self {
            config,
            settings,
            graph: ResourceGraph::new(),
            groups: HashMap::new(),
        }
    }

    /// The graph built so far
    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    /// Validate every entry, then emit all nodes
    pub fn plan(&mut self) -> Result<()> {
        let users = collect_users(self.config)?;
        let group_assignments =
            collect_group_assignments(self.config, &self.settings.default_session_duration)?;
        let iam_users = iam::collect_iam_users(self.config)?;

        log::info!(
            "Planning {} users, {} group assignments, {} IAM users for account {}",
            users.len(),
            group_assignments.len(),
            iam_users.len(),
            self.settings.account_id
        );

        for user in &users {
            self.add_user(user)?;
        }

        let declared: Vec<String> = self.config.groups.keys().cloned().collect();
        for group in &declared {
            self.ensure_group(group)?;
        }

        for assignment in &group_assignments {
            self.add_group_assignment(assignment)?;
        }

        for iam_user in &iam_users {
            self.add_iam_user(iam_user)?;
        }

        Ok(())
    }

    /// Validate edges and hand over the graph
    pub fn finish(self) -> Result<ResourceGraph> {
        self.graph.validate()?;
        log::info!("Planned {} resources", self.graph.len());
        Ok(self.graph)
    }

    /// Return the logical name of the group's node, creating it on first use
    pub fn ensure_group(&mut self, name: &str) -> Result<String> {
        if let Some(existing) = self.groups.get(name) {
            log::debug!("group {name}: reusing {existing}");
            return Ok(existing.clone());
        }

        let spec = GroupSpec {
            name: name.to_string(),
            description: self
                .config
                .groups
                .get(name)
                .and_then(|g| g.description.clone())
                .unwrap_or_else(|| format!("Group {name}")),
        };
        let node_name = spec.node_name();
        let settings = self.settings;
        self.push(spec.to_node(&settings.instance))?;
        self.graph.add_output(
            &format!("{name}_group_id"),
            PropertyValue::reference(&node_name, "groupId"),
        );
        self.groups.insert(name.to_string(), node_name.clone());
        log::debug!("group {name}: created {node_name}");
        Ok(node_name)
    }

    /// Assign a permission set to a principal node on the configured account
    ///
    /// `principal` is a logical name; it must resolve to a user or group node.
    /// `owner` is the user or group name the assignment is named after.
    pub fn assign(
        &mut self,
        owner: &str,
        principal: &str,
        permission_set: &str,
    ) -> Result<AccountAssignmentSpec> {
        let principal = self.resolve_principal(principal)?;

        let is_permission_set = self
            .graph
            .node(permission_set)
            .and_then(|n| ResourceKind::from_token(&n.resource_type))
            == Some(ResourceKind::PermissionSet);
        if !is_permission_set {
            return Err(Error::config(
                permission_set,
                "not a permission set in this plan",
            ));
        }

        let name = match principal {
            Principal::User(_) => assignment_node_name(owner),
            Principal::Group(_) => group_assignment_node_name(owner),
        };
        let spec = AccountAssignmentSpec {
            name,
            permission_set: permission_set.to_string(),
            principal,
            target_account: self.settings.account_id.clone(),
        };
        let settings = self.settings;
        self.push(spec.to_node(&settings.instance))?;
        log::debug!(
            "{}: {} {} -> {}",
            spec.name,
            spec.principal_type(),
            spec.principal.node_name(),
            spec.target_account
        );
        Ok(spec)
    }

    /// Decide the principal variant from the referenced node's resource type
    fn resolve_principal(&self, name: &str) -> Result<Principal> {
        let kind = self
            .graph
            .node(name)
            .and_then(|n| ResourceKind::from_token(&n.resource_type));
        match kind {
            Some(ResourceKind::User) => Ok(Principal::User(name.to_string())),
            Some(ResourceKind::Group) => Ok(Principal::Group(name.to_string())),
            _ => Err(Error::AmbiguousPrincipal(name.to_string())),
        }
    }

    fn add_user(&mut self, user: &UserSpec) -> Result<()> {
        let settings = self.settings;
        let user_node = user.node_name();
        self.push(user.to_node(&settings.instance))?;
        self.graph.add_output(
            &format!("{}_user_id", user.name),
            PropertyValue::reference(&user_node, "userId"),
        );

        if let Some(group) = &user.group {
            let group_node = self.ensure_group(group)?;
            let membership = MembershipEdge {
                group: IdentityRef::Declared(group_node),
                user: IdentityRef::Declared(user_node.clone()),
            };
            let node = membership.to_node(
                membership_node_name(&user.name, group),
                settings.instance.identity_store_id(),
            );
            self.push(node)?;
        }

        let permission_set = PermissionSetSpec {
            name: permission_set_name(&user.name),
            session_duration: user
                .session_duration
                .clone()
                .unwrap_or_else(|| settings.default_session_duration.clone()),
            description: if user.description.trim().is_empty() {
                format!("Permission set for {}", user.name)
            } else {
                user.description.clone()
            },
        };
        self.push(permission_set.to_node(&settings.instance))?;

        let assignment = self.assign(&user.name, &user_node, &permission_set.name)?;
        for policy in &user.policies {
            self.attach_policy(&assignment, policy)?;
        }

        log::info!(
            "user {} planned ({} policies{})",
            user.name,
            user.policies.len(),
            user.group
                .as_ref()
                .map(|g| format!(", group {g}"))
                .unwrap_or_default()
        );
        Ok(())
    }

    fn attach_policy(&mut self, assignment: &AccountAssignmentSpec, policy_arn: &str) -> Result<()> {
        let edge = PolicyAttachmentEdge {
            name: attachment_node_name(&assignment.permission_set, policy_arn),
            account_assignment: assignment.name.clone(),
            permission_set: assignment.permission_set.clone(),
            policy_arn: policy_arn.to_string(),
        };
        let settings = self.settings;
        self.push(edge.to_node(&settings.instance))
    }

    fn add_group_assignment(&mut self, spec: &GroupAssignmentSpec) -> Result<()> {
        let group_node = self
            .groups
            .get(&spec.group)
            .cloned()
            .unwrap_or_else(|| crate::model::group_node_name(&spec.group));

        let settings = self.settings;
        self.push(spec.permission_set.to_node(&settings.instance))?;
        let assignment = self.assign(&spec.group, &group_node, &spec.permission_set.name)?;
        for policy in &spec.policies {
            self.attach_policy(&assignment, policy)?;
        }
        Ok(())
    }

    fn add_iam_user(&mut self, spec: &IamUserSpec) -> Result<()> {
        for node in spec.nodes() {
            self.push(node)?;
        }
        if let Some(role) = &spec.role {
            self.graph.add_output(
                &format!("{}_role_arn", role.name),
                PropertyValue::reference(&role.node_name(), "arn"),
            );
        }
        Ok(())
    }

    fn push(&mut self, node: Node) -> Result<()> {
        self.graph.add_node(node).map_err(|e| match e {
            resgraph::Error::DuplicateNode(name) => Error::config(
                name,
                "logical name is already used by another resource; rename one of the entries",
            ),
            other => Error::Graph(other),
        })
    }
}

// ============================================================================
// Validation phase
// ============================================================================

/// Validate every `users` entry into a [`UserSpec`], in document order
pub(crate) fn collect_users(config: &IdentityConfig) -> Result<Vec<UserSpec>> {
    let mut seen = HashSet::new();
    let mut users = Vec::with_capacity(config.users.len());

    for (key, entry) in &config.users {
        let name = entry
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::config(format!("users.{key}"), "entry has no name"))?;

        if !seen.insert(name.to_string()) {
            return Err(Error::config(
                format!("users.{key}.name"),
                format!("user name '{name}' is declared more than once"),
            ));
        }

        let group = match entry.group.as_deref().map(str::trim) {
            Some("") => {
                return Err(Error::config(
                    format!("users.{key}.group"),
                    "group name is empty",
                ));
            }
            other => other.map(str::to_string),
        };

        let policies = collect_policies(
            &format!("users.{key}.policies"),
            entry.policies.as_deref().unwrap_or_default(),
        )?;

        if let Some(duration) = &entry.session_duration {
            validate_session_duration(&format!("users.{key}.session_duration"), duration)?;
        }

        users.push(UserSpec {
            key: key.clone(),
            name: name.to_string(),
            group,
            policies,
            description: entry.description.clone().unwrap_or_default(),
            given_name: entry.given_name.clone().unwrap_or_else(|| name.to_string()),
            family_name: entry.family_name.clone().unwrap_or_else(|| name.to_string()),
            display_name: entry.display_name.clone().unwrap_or_else(|| name.to_string()),
            session_duration: entry.session_duration.clone(),
        });
    }

    Ok(users)
}

/// Policies must be non-empty and listed once; odd-looking ARNs only warn
pub(crate) fn collect_policies(key: &str, policies: &[String]) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(policies.len());
    for (i, policy) in policies.iter().enumerate() {
        let policy = policy.trim();
        if policy.is_empty() {
            return Err(Error::config(format!("{key}[{i}]"), "policy identifier is empty"));
        }
        if !seen.insert(policy) {
            return Err(Error::config(
                format!("{key}[{i}]"),
                format!("policy '{policy}' is listed more than once"),
            ));
        }
        if !looks_like_policy_arn(policy) {
            log::warn!("{key}[{i}]: '{policy}' does not look like an IAM policy ARN");
        }
        out.push(policy.to_string());
    }
    Ok(out)
}

/// Check every entry without building anything
pub(crate) fn validate_entries(config: &IdentityConfig) -> Result<()> {
    collect_users(config)?;
    collect_group_assignments(config, config.default_session_duration())?;
    iam::collect_iam_users(config)?;
    Ok(())
}

fn collect_group_assignments(
    config: &IdentityConfig,
    default_duration: &str,
) -> Result<Vec<GroupAssignmentSpec>> {
    let mut out = Vec::with_capacity(config.group_assignments.len());
    for (i, entry) in config.group_assignments.iter().enumerate() {
        let key = format!("group_assignments[{i}]");
        let group = entry.group.trim();
        if group.is_empty() {
            return Err(Error::config(format!("{key}.group"), "group name is empty"));
        }
        if let Some(duration) = &entry.session_duration {
            validate_session_duration(&format!("{key}.session_duration"), duration)?;
        }
        let name = match entry.permission_set.as_deref().map(str::trim) {
            None => group_permission_set_name(group),
            Some("") => {
                return Err(Error::config(
                    format!("{key}.permission_set"),
                    "permission set name is empty",
                ));
            }
            Some(name) if name.len() > MAX_PERMISSION_SET_NAME => {
                return Err(Error::config(
                    format!("{key}.permission_set"),
                    format!(
                        "permission set name '{name}' is longer than {MAX_PERMISSION_SET_NAME} characters"
                    ),
                ));
            }
            Some(name) => name.to_string(),
        };

        out.push(GroupAssignmentSpec {
            group: group.to_string(),
            permission_set: PermissionSetSpec {
                description: entry
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("A permission set for {group} users")),
                session_duration: entry
                    .session_duration
                    .clone()
                    .unwrap_or_else(|| default_duration.to_string()),
                name,
            },
            policies: collect_policies(
                &format!("{key}.policies"),
                entry.policies.as_deref().unwrap_or_default(),
            )?,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SsoInstance, TARGET_TYPE_ACCOUNT};
    use resgraph::{Edge, EdgeKind};
    use serde_json::json;
    use std::collections::BTreeSet;

    const READ_ONLY: &str = "arn:aws:iam::aws:policy/ReadOnlyAccess";
    const ADMIN: &str = "arn:aws:iam::aws:policy/AdministratorAccess";

    fn settings() -> PlanSettings {
        PlanSettings::new("252705693666", SsoInstance::Discover, "PT8H").unwrap()
    }

    fn config(value: serde_json::Value) -> IdentityConfig {
        IdentityConfig::from_value(value).unwrap()
    }

    fn alice_and_bob() -> IdentityConfig {
        config(json!({
            "users": {
                "alice": {"name": "alice", "group": "devs", "policies": [READ_ONLY], "description": "d"},
                "bob": {"name": "bob", "group": "devs", "policies": [], "description": "d"}
            }
        }))
    }

    fn count(graph: &ResourceGraph, kind: ResourceKind) -> usize {
        graph.nodes_of_type(kind.token()).count()
    }

    #[test]
    fn test_alice_and_bob_example() {
        let graph = build_graph(&alice_and_bob(), &settings()).unwrap();

        assert_eq!(count(&graph, ResourceKind::User), 2);
        assert_eq!(count(&graph, ResourceKind::Group), 1);
        assert_eq!(count(&graph, ResourceKind::GroupMembership), 2);
        assert_eq!(count(&graph, ResourceKind::PermissionSet), 2);
        assert_eq!(count(&graph, ResourceKind::AccountAssignment), 2);
        assert_eq!(count(&graph, ResourceKind::ManagedPolicyAttachment), 1);

        let group = graph.nodes_of_type(ResourceKind::Group.token()).next().unwrap();
        assert_eq!(group.property("displayName"), Some(&PropertyValue::from("devs")));

        let attachment = graph
            .nodes_of_type(ResourceKind::ManagedPolicyAttachment.token())
            .next()
            .unwrap();
        assert_eq!(
            attachment.name,
            attachment_node_name("alice-permission-set", READ_ONLY)
        );
        assert_eq!(attachment.depends_on, vec!["alice-account-assignment".to_string()]);
    }

    #[test]
    fn test_shared_group_is_created_once() {
        let cfg = config(json!({
            "users": {
                "a": {"name": "a", "group": "devs"},
                "b": {"name": "b", "group": "ops"},
                "c": {"name": "c", "group": "devs"},
                "d": {"name": "d", "group": "devs"},
                "e": {"name": "e"}
            }
        }));
        let graph = build_graph(&cfg, &settings()).unwrap();

        assert_eq!(count(&graph, ResourceKind::Group), 2);
        assert_eq!(count(&graph, ResourceKind::GroupMembership), 4);

        let devs_members: Vec<_> = graph
            .nodes_of_type(ResourceKind::GroupMembership.token())
            .filter(|n| n.property("groupId") == Some(&PropertyValue::reference("devs-group", "groupId")))
            .map(|n| n.name.clone())
            .collect();
        assert_eq!(
            devs_members,
            vec![
                membership_node_name("a", "devs"),
                membership_node_name("c", "devs"),
                membership_node_name("d", "devs"),
            ]
        );
    }

    #[test]
    fn test_one_assignment_per_user() {
        let cfg = config(json!({
            "users": {
                "a": {"name": "a", "policies": [READ_ONLY, ADMIN]},
                "b": {"name": "b", "group": "x"},
                "c": {"name": "c"}
            }
        }));
        let graph = build_graph(&cfg, &settings()).unwrap();
        assert_eq!(
            count(&graph, ResourceKind::AccountAssignment),
            count(&graph, ResourceKind::User)
        );

        for node in graph.nodes_of_type(ResourceKind::AccountAssignment.token()) {
            assert_eq!(node.property("principalType"), Some(&PropertyValue::from("USER")));
            assert_eq!(node.property("targetId"), Some(&PropertyValue::from("252705693666")));
            assert_eq!(
                node.property("targetType"),
                Some(&PropertyValue::from(TARGET_TYPE_ACCOUNT))
            );
        }
    }

    #[test]
    fn test_attachments_depend_only_on_own_assignment() {
        let cfg = config(json!({
            "users": {
                "alice": {"name": "alice", "policies": [READ_ONLY, ADMIN]},
                "bob": {"name": "bob", "policies": [READ_ONLY]}
            }
        }));
        let graph = build_graph(&cfg, &settings()).unwrap();

        let mut seen = 0;
        for node in graph.nodes_of_type(ResourceKind::ManagedPolicyAttachment.token()) {
            assert_eq!(node.depends_on.len(), 1, "{}", node.name);
            let assignment = graph.node(&node.depends_on[0]).unwrap();
            assert_eq!(
                assignment.resource_type,
                ResourceKind::AccountAssignment.token()
            );
            assert_eq!(
                assignment.property("permissionSetArn"),
                node.property("permissionSetArn"),
                "{} depends on a foreign assignment",
                node.name
            );
            seen += 1;
        }
        assert_eq!(seen, 3);
    }

    #[test]
    fn test_assignments_applied_before_attachments() {
        let graph = build_graph(&alice_and_bob(), &settings()).unwrap();
        let order: Vec<_> = graph
            .apply_order()
            .unwrap()
            .iter()
            .map(|n| n.name.clone())
            .collect();
        let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
        assert!(
            pos("alice-account-assignment")
                < pos(&attachment_node_name("alice-permission-set", READ_ONLY))
        );
        assert!(pos("alice-permission-set") < pos("alice-account-assignment"));
        assert!(pos("devs-group") < pos(&membership_node_name("bob", "devs")));
    }

    #[test]
    fn test_planning_is_idempotent_and_order_independent() {
        let forward = alice_and_bob();
        let reversed = config(json!({
            "users": {
                "bob": {"name": "bob", "group": "devs", "policies": [], "description": "d"},
                "alice": {"name": "alice", "group": "devs", "policies": [READ_ONLY], "description": "d"}
            }
        }));

        let first = build_graph(&forward, &settings()).unwrap();
        let second = build_graph(&forward, &settings()).unwrap();
        let flipped = build_graph(&reversed, &settings()).unwrap();

        let names = |g: &ResourceGraph| -> BTreeSet<String> {
            g.nodes().iter().map(|n| n.name.clone()).collect()
        };
        assert_eq!(names(&first), names(&second));
        assert_eq!(first.edges(), second.edges());
        assert_eq!(names(&first), names(&flipped));
        assert_eq!(first.edges(), flipped.edges());
        assert_eq!(first.outputs(), flipped.outputs());
        assert!(resgraph::GraphDiff::between(&first, &flipped).is_empty());

        // construction order does follow the document
        assert_eq!(first.nodes()[0].name, "alice-sso-user");
        assert_eq!(flipped.nodes()[0].name, "bob-sso-user");
    }

    #[test]
    fn test_missing_name_emits_nothing() {
        let cfg = config(json!({
            "users": {
                "alice": {"name": "alice", "group": "devs"},
                "nameless": {"group": "devs", "policies": []}
            }
        }));
        let settings = settings();
        let mut builder = GraphBuilder::new(&cfg, &settings);
        let err = builder.plan().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("users.nameless"));
        assert!(builder.graph().is_empty());
    }

    #[test]
    fn test_blank_name_and_empty_policy_are_rejected() {
        let blank = config(json!({"users": {"x": {"name": "  "}}}));
        assert!(build_graph(&blank, &settings()).unwrap_err().is_configuration());

        let empty_policy = config(json!({"users": {"x": {"name": "x", "policies": [""]}}}));
        assert!(build_graph(&empty_policy, &settings()).unwrap_err().is_configuration());

        let repeated = config(json!({"users": {"x": {"name": "x", "policies": [ADMIN, ADMIN]}}}));
        assert!(build_graph(&repeated, &settings()).unwrap_err().is_configuration());
    }

    #[test]
    fn test_duplicate_user_names_rejected() {
        let cfg = config(json!({
            "users": {
                "first": {"name": "alice"},
                "second": {"name": "alice"}
            }
        }));
        let err = build_graph(&cfg, &settings()).unwrap_err();
        assert!(err.to_string().contains("users.second.name"));
    }

    #[test]
    fn test_bad_session_duration_rejected() {
        let cfg = config(json!({"users": {"x": {"name": "x", "session_duration": "8 hours"}}}));
        assert!(build_graph(&cfg, &settings()).unwrap_err().is_configuration());
    }

    #[test]
    fn test_permission_set_session_duration() {
        let cfg = config(json!({
            "users": {
                "a": {"name": "a"},
                "b": {"name": "b", "session_duration": "PT2H"}
            }
        }));
        let graph = build_graph(&cfg, &settings()).unwrap();
        let duration = |name: &str| graph.node(name).unwrap().property("sessionDuration").cloned();
        assert_eq!(duration("a-permission-set"), Some(PropertyValue::from("PT8H")));
        assert_eq!(duration("b-permission-set"), Some(PropertyValue::from("PT2H")));
    }

    #[test]
    fn test_non_principal_is_ambiguous() {
        let cfg = alice_and_bob();
        let settings = settings();
        let mut builder = GraphBuilder::new(&cfg, &settings);
        builder.plan().unwrap();

        let err = builder
            .assign("odd", "alice-permission-set", "alice-permission-set")
            .unwrap_err();
        assert!(matches!(err, Error::AmbiguousPrincipal(name) if name == "alice-permission-set"));

        let err = builder
            .assign("odd", "nobody", "alice-permission-set")
            .unwrap_err();
        assert!(matches!(err, Error::AmbiguousPrincipal(_)));
    }

    #[test]
    fn test_assign_to_group_principal() {
        let cfg = alice_and_bob();
        let settings = settings();
        let mut builder = GraphBuilder::new(&cfg, &settings);
        builder.plan().unwrap();

        let spec = builder
            .assign("devs", "devs-group", "bob-permission-set")
            .unwrap();
        assert_eq!(spec.principal, Principal::Group("devs-group".into()));
        assert_eq!(spec.principal_type().as_str(), "GROUP");
    }

    #[test]
    fn test_group_assignment_flow() {
        let cfg = config(json!({
            "groups": {"devs": {"description": "A group for dev users"}},
            "group_assignments": [
                {"group": "devs", "permission_set": "devs-example-set", "policies": [ADMIN]}
            ]
        }));
        let graph = build_graph(&cfg, &settings()).unwrap();

        let group = graph.node("devs-group").unwrap();
        assert_eq!(
            group.property("description"),
            Some(&PropertyValue::from("A group for dev users"))
        );

        let assignment = graph.node("devs-group-assignment").unwrap();
        assert_eq!(assignment.property("principalType"), Some(&PropertyValue::from("GROUP")));
        assert_eq!(
            assignment.property("permissionSetArn"),
            Some(&PropertyValue::reference("devs-example-set", "arn"))
        );

        let attachment = graph
            .node(&attachment_node_name("devs-example-set", ADMIN))
            .unwrap();
        assert!(graph
            .edges()
            .contains(&Edge {
                from: attachment.name.clone(),
                to: "devs-group-assignment".into(),
                kind: EdgeKind::Explicit,
            }));
    }

    #[test]
    fn test_group_assignment_to_unknown_group_is_ambiguous() {
        let cfg = config(json!({
            "group_assignments": [{"group": "ghosts"}]
        }));
        let err = build_graph(&cfg, &settings()).unwrap_err();
        assert!(matches!(err, Error::AmbiguousPrincipal(name) if name == "ghosts-group"));
    }

    #[test]
    fn test_group_description_independent_of_user_order() {
        let cfg = config(json!({
            "users": {"a": {"name": "a", "group": "devs"}},
            "groups": {"devs": {"description": "Developers"}, "auditors": {}}
        }));
        let graph = build_graph(&cfg, &settings()).unwrap();
        assert_eq!(count(&graph, ResourceKind::Group), 2);
        assert_eq!(
            graph.node("devs-group").unwrap().property("description"),
            Some(&PropertyValue::from("Developers"))
        );
        assert_eq!(
            graph.node("auditors-group").unwrap().property("description"),
            Some(&PropertyValue::from("Group auditors"))
        );
    }

    #[test]
    fn test_outputs_export_ids() {
        let graph = build_graph(&alice_and_bob(), &settings()).unwrap();
        let keys: Vec<_> = graph.outputs().keys().cloned().collect();
        assert_eq!(keys, vec!["alice_user_id", "bob_user_id", "devs_group_id"]);
    }

    #[test]
    fn test_known_instance_is_literal() {
        let settings = PlanSettings::new(
            "252705693666",
            SsoInstance::Known {
                arn: "arn:aws:sso:::instance/ssoins-1".into(),
                identity_store_id: "d-123".into(),
            },
            "PT8H",
        )
        .unwrap();
        let graph = build_graph(&alice_and_bob(), &settings).unwrap();
        let user = graph.node("alice-sso-user").unwrap();
        assert_eq!(user.property("identityStoreId"), Some(&PropertyValue::from("d-123")));
        let ps = graph.node("alice-permission-set").unwrap();
        assert_eq!(
            ps.property("instanceArn"),
            Some(&PropertyValue::from("arn:aws:sso:::instance/ssoins-1"))
        );
    }

    #[test]
    fn test_policies_sharing_a_basename_both_attach() {
        let cfg = config(json!({
            "users": {
                "alice": {"name": "alice", "policies": [
                    "arn:aws:iam::aws:policy/job-function/ViewOnlyAccess",
                    "arn:aws:iam::123456789012:policy/ViewOnlyAccess"
                ]}
            }
        }));
        let graph = build_graph(&cfg, &settings()).unwrap();

        let arns: BTreeSet<_> = graph
            .nodes_of_type(ResourceKind::ManagedPolicyAttachment.token())
            .filter_map(|n| n.property("managedPolicyArn").cloned())
            .collect();
        assert_eq!(arns.len(), 2);
    }

    #[test]
    fn test_user_and_group_with_the_same_name() {
        let cfg = config(json!({
            "users": {"ops": {"name": "ops", "group": "ops", "policies": [READ_ONLY]}},
            "group_assignments": [{"group": "ops", "policies": [READ_ONLY]}]
        }));
        let graph = build_graph(&cfg, &settings()).unwrap();

        assert!(graph.contains("ops-sso-user"));
        assert!(graph.contains("ops-group"));
        assert!(graph.contains("ops-permission-set"));
        assert!(graph.contains("ops-group-access"));
        assert!(graph.contains("ops-account-assignment"));
        assert!(graph.contains("ops-group-assignment"));
        assert_eq!(count(&graph, ResourceKind::ManagedPolicyAttachment), 2);
    }

    #[test]
    fn test_dashed_user_and_group_names_keep_memberships_apart() {
        let cfg = config(json!({
            "users": {
                "a": {"name": "a", "group": "b-c"},
                "a-b": {"name": "a-b", "group": "c"}
            }
        }));
        let graph = build_graph(&cfg, &settings()).unwrap();
        assert_eq!(count(&graph, ResourceKind::GroupMembership), 2);
        assert!(graph.contains(&membership_node_name("a", "b-c")));
        assert!(graph.contains(&membership_node_name("a-b", "c")));
    }

    #[test]
    fn test_long_user_name_gets_a_short_permission_set() {
        let cfg = config(json!({
            "users": {"jane": {"name": "jane.doe@engineering.example.com", "policies": [READ_ONLY]}}
        }));
        let graph = build_graph(&cfg, &settings()).unwrap();

        let set = graph
            .nodes_of_type(ResourceKind::PermissionSet.token())
            .next()
            .unwrap();
        assert!(set.name.len() <= MAX_PERMISSION_SET_NAME);
        assert_eq!(set.property("name"), Some(&PropertyValue::from(set.name.as_str())));
        assert_eq!(
            graph
                .node("jane.doe@engineering.example.com-account-assignment")
                .unwrap()
                .property("permissionSetArn"),
            Some(&PropertyValue::reference(&set.name, "arn"))
        );
    }

    #[test]
    fn test_overlong_explicit_permission_set_rejected() {
        let cfg = config(json!({
            "group_assignments": [
                {"group": "devs", "permission_set": "developers-with-production-read-access"}
            ]
        }));
        let err = build_graph(&cfg, &settings()).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("group_assignments[0].permission_set"));
    }

    #[test]
    fn test_finish_rejects_dangling_dependency() {
        let cfg = alice_and_bob();
        let settings = settings();
        let mut builder = GraphBuilder::new(&cfg, &settings);
        builder.plan().unwrap();
        builder
            .graph
            .add_node(Node::new("stray", "aws:iam/role:Role").depends_on("missing"))
            .unwrap();

        let err = builder.finish().unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::Graph);
    }
}
