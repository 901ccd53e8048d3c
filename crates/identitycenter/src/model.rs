//! Desired-state descriptions of Identity Center resources and how each one
//! becomes a graph node.

use resgraph::{Node, PropertyValue, ResourceGraph, parse_target};
use std::collections::BTreeMap;
use std::fmt;

/// Function the engine calls to discover the SSO instance
pub const GET_INSTANCES: &str = "aws:ssoadmin/getInstances";

/// Resource kinds this crate emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    User,
    Group,
    GroupMembership,
    PermissionSet,
    AccountAssignment,
    ManagedPolicyAttachment,
    IamUser,
    IamUserPolicyAttachment,
    IamRole,
}

impl ResourceKind {
    pub const ALL: [Self; 9] = [
        Self::User,
        Self::Group,
        Self::GroupMembership,
        Self::PermissionSet,
        Self::AccountAssignment,
        Self::ManagedPolicyAttachment,
        Self::IamUser,
        Self::IamUserPolicyAttachment,
        Self::IamRole,
    ];

    /// Provider type token
    pub fn token(&self) -> &'static str {
        match self {
            Self::User => "aws:identitystore/user:User",
            Self::Group => "aws:identitystore/group:Group",
            Self::GroupMembership => "aws:identitystore/groupMembership:GroupMembership",
            Self::PermissionSet => "aws:ssoadmin/permissionSet:PermissionSet",
            Self::AccountAssignment => "aws:ssoadmin/accountAssignment:AccountAssignment",
            Self::ManagedPolicyAttachment => {
                "aws:ssoadmin/managedPolicyAttachment:ManagedPolicyAttachment"
            }
            Self::IamUser => "aws:iam/user:User",
            Self::IamUserPolicyAttachment => "aws:iam/userPolicyAttachment:UserPolicyAttachment",
            Self::IamRole => "aws:iam/role:Role",
        }
    }

    /// Reverse of [`ResourceKind::token`]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.token() == token)
    }

    /// Human-readable plural label used when grouping output
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "Users (identity store)",
            Self::Group => "Groups (identity store)",
            Self::GroupMembership => "Group memberships",
            Self::PermissionSet => "Permission sets",
            Self::AccountAssignment => "Account assignments",
            Self::ManagedPolicyAttachment => "Managed policy attachments",
            Self::IamUser => "IAM users",
            Self::IamUserPolicyAttachment => "IAM user policy attachments",
            Self::IamRole => "IAM roles",
        }
    }

    /// Whether a `--target` type alias selects this kind
    pub fn matches_alias(&self, alias: &str) -> bool {
        match alias {
            "users" | "user" => *self == Self::User,
            "groups" | "group" => *self == Self::Group,
            "memberships" | "membership" => *self == Self::GroupMembership,
            "permission-sets" | "permission_sets" => *self == Self::PermissionSet,
            "assignments" | "assignment" => *self == Self::AccountAssignment,
            "attachments" | "policies" => *self == Self::ManagedPolicyAttachment,
            "iam" => matches!(
                self,
                Self::IamUser | Self::IamUserPolicyAttachment | Self::IamRole
            ),
            other => self.token() == other,
        }
    }
}

/// Principal discriminant carried on an account assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalType {
    User,
    Group,
}

impl PrincipalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Group => "GROUP",
        }
    }
}

impl fmt::Display for PrincipalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved assignment principal: the logical name of a user or group node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    User(String),
    Group(String),
}

impl Principal {
    pub fn principal_type(&self) -> PrincipalType {
        match self {
            Self::User(_) => PrincipalType::User,
            Self::Group(_) => PrincipalType::Group,
        }
    }

    /// Logical name of the principal node
    pub fn node_name(&self) -> &str {
        match self {
            Self::User(name) | Self::Group(name) => name,
        }
    }

    /// The principal's identity-store id, as an output reference
    pub fn id_value(&self) -> PropertyValue {
        match self {
            Self::User(name) => PropertyValue::reference(name, "userId"),
            Self::Group(name) => PropertyValue::reference(name, "groupId"),
        }
    }
}

/// Assignment target type; only accounts are supported
pub const TARGET_TYPE_ACCOUNT: &str = "AWS_ACCOUNT";

/// One side of a group membership
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityRef {
    /// Node declared in the same graph (logical name)
    Declared(String),
    /// Identity that already exists in the store (opaque id)
    Existing(String),
}

impl IdentityRef {
    fn value(&self, output: &str) -> PropertyValue {
        match self {
            Self::Declared(name) => PropertyValue::reference(name, output),
            Self::Existing(id) => PropertyValue::String(id.clone()),
        }
    }
}

/// Where the SSO instance ARN and identity store id come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SsoInstance {
    /// Values are known up front
    Known {
        arn: String,
        identity_store_id: String,
    },
    /// The engine resolves them through `aws:ssoadmin/getInstances`
    Discover,
}

impl SsoInstance {
    pub fn arn(&self) -> PropertyValue {
        match self {
            Self::Known { arn, .. } => PropertyValue::String(arn.clone()),
            Self::Discover => PropertyValue::invoke(GET_INSTANCES, "arns[0]"),
        }
    }

    pub fn identity_store_id(&self) -> PropertyValue {
        match self {
            Self::Known {
                identity_store_id, ..
            } => PropertyValue::String(identity_store_id.clone()),
            Self::Discover => PropertyValue::invoke(GET_INSTANCES, "identityStoreIds[0]"),
        }
    }
}

/// Keep nodes selected by a `--target` string: `type` or `type.name`
///
/// `type` is a kind alias (`users`, `iam`, ...) or a full type token. A bare
/// name that selects no kind is matched against logical names instead.
pub fn filter_by_target(graph: &ResourceGraph, target: &str) -> ResourceGraph {
    let (kind, name) = parse_target(target);
    let kind_matches = |node: &Node, alias: &str| {
        ResourceKind::from_token(&node.resource_type).is_some_and(|k| k.matches_alias(alias))
            || node.resource_type == alias
    };

    let known = |alias: &str| ResourceKind::ALL.iter().any(|k| k.matches_alias(alias));

    match (kind, name) {
        (Some(alias), None) if known(alias.as_str()) => graph.filter(|n| kind_matches(n, alias.as_str())),
        (Some(alias), Some(name)) if known(alias.as_str()) => {
            graph.filter(|n| kind_matches(n, alias.as_str()) && n.name == name)
        }
        _ => graph.filter(|n| n.name == target),
    }
}

// ============================================================================
// Logical naming
// ============================================================================
//
// Every kind ends in its own fixed suffix, and no suffix ends with another
// kind's suffix. Names built from more than one value also carry a digest of
// the exact values, since user, group and policy names may all contain `-`.

/// Longest permission-set name Identity Center accepts
pub const MAX_PERMISSION_SET_NAME: usize = 32;

const DIGEST_LEN: usize = 8;

/// Short stable digest over the exact name parts
pub fn name_digest(parts: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hasher.finalize().to_hex().as_str()[..DIGEST_LEN].to_string()
}

pub fn user_node_name(user: &str) -> String {
    format!("{user}-sso-user")
}

pub fn group_node_name(group: &str) -> String {
    format!("{group}-group")
}

pub fn membership_node_name(user: &str, group: &str) -> String {
    format!(
        "{user}-{group}-{}-membership",
        name_digest(&[user, group])
    )
}

/// Permission set of a user principal
pub fn permission_set_name(user: &str) -> String {
    bounded_permission_set_name(user, "-permission-set", "-ps")
}

/// Default permission set of a group principal
pub fn group_permission_set_name(group: &str) -> String {
    bounded_permission_set_name(group, "-group-access", "-gps")
}

/// `{owner}{suffix}`, or a truncated owner plus digest when that is too long
fn bounded_permission_set_name(owner: &str, suffix: &str, short_suffix: &str) -> String {
    let full = format!("{owner}{suffix}");
    if full.len() <= MAX_PERMISSION_SET_NAME {
        return full;
    }

    let budget = MAX_PERMISSION_SET_NAME - DIGEST_LEN - 1 - short_suffix.len();
    let mut prefix = String::with_capacity(budget);
    for c in owner.chars() {
        if prefix.len() + c.len_utf8() > budget {
            break;
        }
        prefix.push(c);
    }
    format!("{prefix}-{}{short_suffix}", name_digest(&[owner]))
}

pub fn assignment_node_name(user: &str) -> String {
    format!("{user}-account-assignment")
}

pub fn group_assignment_node_name(group: &str) -> String {
    format!("{group}-group-assignment")
}

/// Attachment of `policy_arn` to the permission set named `permission_set`
pub fn attachment_node_name(permission_set: &str, policy_arn: &str) -> String {
    format!(
        "{permission_set}-{}-{}-attachment",
        policy_short_name(policy_arn),
        name_digest(&[permission_set, policy_arn])
    )
}

/// Final path segment of a policy ARN
pub fn policy_short_name(policy_arn: &str) -> &str {
    policy_arn.rsplit('/').next().unwrap_or(policy_arn)
}

// ============================================================================
// Specs
// ============================================================================

/// A validated identity-store user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSpec {
    /// Configuration key the entry came from
    pub key: String,
    pub name: String,
    pub group: Option<String>,
    pub policies: Vec<String>,
    pub description: String,
    pub given_name: String,
    pub family_name: String,
    pub display_name: String,
    pub session_duration: Option<String>,
}

impl UserSpec {
    pub fn node_name(&self) -> String {
        user_node_name(&self.name)
    }

    pub fn to_node(&self, instance: &SsoInstance) -> Node {
        let mut name = BTreeMap::new();
        name.insert("givenName".to_string(), self.given_name.clone().into());
        name.insert("familyName".to_string(), self.family_name.clone().into());

        Node::new(self.node_name(), ResourceKind::User.token())
            .with("identityStoreId", instance.identity_store_id())
            .with("userName", self.name.as_str())
            .with("displayName", self.display_name.as_str())
            .with("name", PropertyValue::Map(name))
    }
}

/// An identity-store group, created once per distinct name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    pub name: String,
    pub description: String,
}

impl GroupSpec {
    pub fn node_name(&self) -> String {
        group_node_name(&self.name)
    }

    pub fn to_node(&self, instance: &SsoInstance) -> Node {
        Node::new(self.node_name(), ResourceKind::Group.token())
            .with("identityStoreId", instance.identity_store_id())
            .with("displayName", self.name.as_str())
            .with("description", self.description.as_str())
    }
}

/// Group membership: relationship only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipEdge {
    pub group: IdentityRef,
    pub user: IdentityRef,
}

impl MembershipEdge {
    pub fn to_node(&self, name: String, identity_store_id: PropertyValue) -> Node {
        Node::new(name, ResourceKind::GroupMembership.token())
            .with("identityStoreId", identity_store_id)
            .with("groupId", self.group.value("groupId"))
            .with("memberId", self.user.value("userId"))
    }
}

/// A permission set (one per user in the config-driven flow)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSetSpec {
    pub name: String,
    pub session_duration: String,
    pub description: String,
}

impl PermissionSetSpec {
    pub fn to_node(&self, instance: &SsoInstance) -> Node {
        Node::new(self.name.clone(), ResourceKind::PermissionSet.token())
            .with("instanceArn", instance.arn())
            .with("name", self.name.as_str())
            .with("sessionDuration", self.session_duration.as_str())
            .with("description", self.description.as_str())
    }
}

/// Binding of (principal, permission set, account)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountAssignmentSpec {
    /// Logical name of the assignment node
    pub name: String,
    /// Logical name of the permission set node
    pub permission_set: String,
    pub principal: Principal,
    pub target_account: String,
}

impl AccountAssignmentSpec {
    pub fn principal_type(&self) -> PrincipalType {
        self.principal.principal_type()
    }

    pub fn to_node(&self, instance: &SsoInstance) -> Node {
        Node::new(self.name.clone(), ResourceKind::AccountAssignment.token())
            .with("instanceArn", instance.arn())
            .with(
                "permissionSetArn",
                PropertyValue::reference(&self.permission_set, "arn"),
            )
            .with("principalId", self.principal.id_value())
            .with("principalType", self.principal_type().as_str())
            .with("targetId", self.target_account.as_str())
            .with("targetType", TARGET_TYPE_ACCOUNT)
    }
}

/// Managed policy attached to a permission set, ordered after its assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyAttachmentEdge {
    pub name: String,
    pub account_assignment: String,
    pub permission_set: String,
    pub policy_arn: String,
}

impl PolicyAttachmentEdge {
    pub fn to_node(&self, instance: &SsoInstance) -> Node {
        Node::new(self.name.clone(), ResourceKind::ManagedPolicyAttachment.token())
            .with("instanceArn", instance.arn())
            .with(
                "permissionSetArn",
                PropertyValue::reference(&self.permission_set, "arn"),
            )
            .with("managedPolicyArn", self.policy_arn.as_str())
            .depends_on(&self.account_assignment)
    }
}
