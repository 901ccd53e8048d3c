//! Plain IAM users, their managed-policy attachments, and the role each one
//! may assume.

use crate::builder::collect_policies;
use crate::config::IdentityConfig;
use crate::error::{Error, Result};
use crate::model::{ResourceKind, name_digest, policy_short_name};
use resgraph::{Node, PropertyValue};
use std::collections::{BTreeMap, HashSet};

const POLICY_VERSION: &str = "2012-10-17";

/// A validated `iam_users.<key>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IamUserSpec {
    pub name: String,
    pub policies: Vec<String>,
    pub role: Option<IamRoleSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IamRoleSpec {
    pub name: String,
    pub description: String,
}

impl IamRoleSpec {
    pub fn node_name(&self) -> String {
        format!("{}-iam-role", self.name)
    }
}

impl IamUserSpec {
    pub fn node_name(&self) -> String {
        format!("{}-iam-user", self.name)
    }

    pub fn attachment_node_name(&self, policy_arn: &str) -> String {
        format!(
            "{}-{}-{}-iam-attachment",
            self.name,
            policy_short_name(policy_arn),
            name_digest(&[self.name.as_str(), policy_arn])
        )
    }

    /// User node, one attachment per policy, then the role
    pub fn nodes(&self) -> Vec<Node> {
        let user_node = self.node_name();
        let mut nodes = vec![
            Node::new(user_node.clone(), ResourceKind::IamUser.token())
                .with("name", self.name.as_str())
                .with("forceDestroy", true),
        ];

        for policy in &self.policies {
            nodes.push(
                Node::new(
                    self.attachment_node_name(policy),
                    ResourceKind::IamUserPolicyAttachment.token(),
                )
                .with("user", PropertyValue::reference(&user_node, "name"))
                .with("policyArn", policy.as_str()),
            );
        }

        if let Some(role) = &self.role {
            nodes.push(
                Node::new(role.node_name(), ResourceKind::IamRole.token())
                    .with("name", role.name.as_str())
                    .with("description", role.description.as_str())
                    .with(
                        "assumeRolePolicy",
                        assume_role_policy(PropertyValue::reference(&user_node, "arn")),
                    ),
            );
        }

        nodes
    }
}

/// Trust policy letting `principal` call `sts:AssumeRole`
pub fn assume_role_policy(principal: PropertyValue) -> PropertyValue {
    let mut aws = BTreeMap::new();
    aws.insert("AWS".to_string(), principal);

    let mut statement = BTreeMap::new();
    statement.insert("Sid".to_string(), "AllowAssumeRole".into());
    statement.insert("Effect".to_string(), "Allow".into());
    statement.insert("Principal".to_string(), PropertyValue::Map(aws));
    statement.insert("Action".to_string(), "sts:AssumeRole".into());

    let mut document = BTreeMap::new();
    document.insert("Version".to_string(), POLICY_VERSION.into());
    document.insert(
        "Statement".to_string(),
        PropertyValue::List(vec![PropertyValue::Map(statement)]),
    );
    PropertyValue::Map(document)
}

/// Validate every `iam_users` entry; the key doubles as the name
pub(crate) fn collect_iam_users(config: &IdentityConfig) -> Result<Vec<IamUserSpec>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(config.iam_users.len());

    for (key, entry) in &config.iam_users {
        let name = entry.name.as_deref().unwrap_or(key).trim();
        if name.is_empty() {
            return Err(Error::config(format!("iam_users.{key}.name"), "name is empty"));
        }
        if !seen.insert(name.to_string()) {
            return Err(Error::config(
                format!("iam_users.{key}.name"),
                format!("IAM user '{name}' is declared more than once"),
            ));
        }

        let role = match &entry.role {
            Some(role) if role.name.trim().is_empty() => {
                return Err(Error::config(
                    format!("iam_users.{key}.role.name"),
                    "role name is empty",
                ));
            }
            Some(role) => Some(IamRoleSpec {
                name: role.name.trim().to_string(),
                description: role
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("Role assumable by {name}")),
            }),
            None => None,
        };

        out.push(IamUserSpec {
            name: name.to_string(),
            policies: collect_policies(
                &format!("iam_users.{key}.policies"),
                entry.policies.as_deref().unwrap_or_default(),
            )?,
            role,
        });
    }

    Ok(out)
}
