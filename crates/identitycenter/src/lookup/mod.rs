//! Identity-store lookups for identities that already exist.
//!
//! The [`IdentityLookup`] trait answers "what is the id of this user/group"
//! for identities created outside the plan, enabling:
//! - Real lookups via the `aws` CLI
//! - In-memory lookups for testing
//!
//! Lookups are read-only. Nothing here creates identities.

pub mod aws_cli;

use crate::error::{Error, IdentityKind, Result};
use crate::model::{IdentityRef, MembershipEdge, SsoInstance, membership_node_name};
use resgraph::{PropertyValue, ResourceGraph};
use std::collections::HashMap;

pub use aws_cli::AwsCliLookup;

/// Read-only access to an identity store.
pub trait IdentityLookup: Send + Sync {
    /// Id of the user whose `UserName` is `user_name`.
    fn find_user_id(&self, identity_store_id: &str, user_name: &str) -> Result<String>;

    /// Id of the group whose `DisplayName` is `group_name`.
    fn find_group_id(&self, identity_store_id: &str, group_name: &str) -> Result<String>;

    /// The account's SSO instance, with literal ARN and identity store id.
    fn sso_instance(&self) -> Result<SsoInstance>;
}

/// Resolve both sides of a membership between existing identities
pub fn resolve_membership(
    lookup: &dyn IdentityLookup,
    identity_store_id: &str,
    user_name: &str,
    group_name: &str,
) -> Result<MembershipEdge> {
    let user_id = lookup.find_user_id(identity_store_id, user_name)?;
    let group_id = lookup.find_group_id(identity_store_id, group_name)?;
    log::debug!("resolved {user_name} -> {user_id}, {group_name} -> {group_id}");
    Ok(MembershipEdge {
        group: IdentityRef::Existing(group_id),
        user: IdentityRef::Existing(user_id),
    })
}

/// Single-node graph adding an existing user to an existing group
///
/// When `identity_store_id` is `None` the store is taken from the lookup's
/// SSO instance.
pub fn existing_membership(
    lookup: &dyn IdentityLookup,
    identity_store_id: Option<&str>,
    user_name: &str,
    group_name: &str,
) -> Result<ResourceGraph> {
    let store = match identity_store_id {
        Some(id) => id.to_string(),
        None => match lookup.sso_instance()? {
            SsoInstance::Known {
                identity_store_id, ..
            } => identity_store_id,
            SsoInstance::Discover => {
                return Err(Error::NotFound {
                    kind: IdentityKind::Instance,
                    name: "identity store".to_string(),
                });
            }
        },
    };

    let edge = resolve_membership(lookup, &store, user_name, group_name)?;
    let mut graph = ResourceGraph::new();
    graph.add_node(edge.to_node(
        membership_node_name(user_name, group_name),
        PropertyValue::String(store),
    ))?;
    Ok(graph)
}

/// In-memory identity store
#[derive(Debug, Clone, Default)]
pub struct MockLookup {
    identity_store_id: String,
    instance_arn: String,
    users: HashMap<String, String>,
    groups: HashMap<String, String>,
}

impl MockLookup {
    pub fn new(instance_arn: &str, identity_store_id: &str) -> Self {
        Self {
            identity_store_id: identity_store_id.to_string(),
            instance_arn: instance_arn.to_string(),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user_name: &str, id: &str) -> Self {
        self.users.insert(user_name.to_string(), id.to_string());
        self
    }

    pub fn with_group(mut self, group_name: &str, id: &str) -> Self {
        self.groups.insert(group_name.to_string(), id.to_string());
        self
    }

    fn find(
        &self,
        table: &HashMap<String, String>,
        store: &str,
        kind: IdentityKind,
        name: &str,
    ) -> Result<String> {
        if store != self.identity_store_id {
            return Err(Error::LookupFailed {
                message: format!("unknown identity store {store}"),
                stderr: String::new(),
            });
        }
        table.get(name).cloned().ok_or_else(|| Error::NotFound {
            kind,
            name: name.to_string(),
        })
    }
}

impl IdentityLookup for MockLookup {
    fn find_user_id(&self, identity_store_id: &str, user_name: &str) -> Result<String> {
        self.find(&self.users, identity_store_id, IdentityKind::User, user_name)
    }

    fn find_group_id(&self, identity_store_id: &str, group_name: &str) -> Result<String> {
        self.find(&self.groups, identity_store_id, IdentityKind::Group, group_name)
    }

    fn sso_instance(&self) -> Result<SsoInstance> {
        Ok(SsoInstance::Known {
            arn: self.instance_arn.clone(),
            identity_store_id: self.identity_store_id.clone(),
        })
    }
}
