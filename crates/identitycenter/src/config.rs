//! Configuration schema and validation
//!
//! The schema is format-neutral: callers parse TOML, JSON or YAML into a
//! `serde_json::Value` and hand it to [`IdentityConfig::from_value`], so every
//! shape error surfaces as [`Error::Configuration`].

use crate::error::{Error, Result};
use crate::model::SsoInstance;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Session duration used when neither the entry nor the document sets one
pub const DEFAULT_SESSION_DURATION: &str = "PT8H";

static SESSION_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^PT(?:(\d{1,2})H)?(?:(\d{1,3})M)?$").expect("valid regex"));

static POLICY_ARN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^arn:aws[a-z-]*:iam::(aws|\d{12}):policy/\S+$").expect("valid regex")
});

static ACCOUNT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{12}$").expect("valid regex"));

// ============================================================================
// Schema
// ============================================================================

/// The full planning document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Target account; the environment takes precedence
    #[serde(default)]
    pub account_id: Option<String>,

    /// Default permission-set session duration (ISO-8601)
    #[serde(default)]
    pub session_duration: Option<String>,

    /// SSO instance ARN; discovered by the engine when omitted
    #[serde(default)]
    pub instance_arn: Option<String>,

    /// Identity store id; discovered by the engine when omitted
    #[serde(default)]
    pub identity_store_id: Option<String>,

    /// Users, keyed by configuration key, in document order
    #[serde(default)]
    pub users: IndexMap<String, UserEntry>,

    /// Extra group metadata, and groups no user references yet
    #[serde(default)]
    pub groups: IndexMap<String, GroupEntry>,

    /// Permission sets assigned to whole groups
    #[serde(default)]
    pub group_assignments: Vec<GroupAssignmentEntry>,

    /// Plain IAM users (outside Identity Center)
    #[serde(default)]
    pub iam_users: IndexMap<String, IamUserEntry>,
}

/// A `users.<key>` entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub policies: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub session_duration: Option<String>,
}

/// A `groups.<name>` entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupEntry {
    #[serde(default)]
    pub description: Option<String>,
}

/// A permission set assigned to a group principal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupAssignmentEntry {
    pub group: String,
    /// Permission set name; defaults to `<group>-group-access`
    #[serde(default)]
    pub permission_set: Option<String>,
    #[serde(default)]
    pub session_duration: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub policies: Option<Vec<String>>,
}

/// An IAM user with optional policy attachments and an assumable role
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IamUserEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub policies: Option<Vec<String>>,
    #[serde(default)]
    pub role: Option<IamRoleEntry>,
}

/// A role the IAM user may assume
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IamRoleEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl IdentityConfig {
    /// Build from an already-parsed document
    ///
    /// Accepts either the plain schema or an engine stack file whose
    /// `config` table uses `<project>:<key>` names.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let value = unwrap_stack_document(value);
        serde_json::from_value(value).map_err(|e| Error::config("document", e.to_string()))
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| Error::config("document", e.to_string()))?;
        Self::from_value(value)
    }

    /// Check every field the builder depends on, without building anything
    pub fn validate(&self) -> Result<()> {
        if let Some(duration) = &self.session_duration {
            validate_session_duration("session_duration", duration)?;
        }
        if let Some(account) = &self.account_id {
            validate_account_id(account)?;
        }
        self.instance()?;
        crate::builder::validate_entries(self)
    }

    /// Default session duration for permission sets
    pub fn default_session_duration(&self) -> &str {
        self.session_duration
            .as_deref()
            .unwrap_or(DEFAULT_SESSION_DURATION)
    }

    /// Instance source derived from the document
    pub fn instance(&self) -> Result<SsoInstance> {
        match (&self.instance_arn, &self.identity_store_id) {
            (Some(arn), Some(store)) => Ok(SsoInstance::Known {
                arn: arn.clone(),
                identity_store_id: store.clone(),
            }),
            (None, None) => Ok(SsoInstance::Discover),
            _ => Err(Error::config(
                "instance_arn",
                "instance_arn and identity_store_id must be set together",
            )),
        }
    }
}

/// Strip an engine stack wrapper: `{config: {"proj:users": ...}}` -> `{users: ...}`
fn unwrap_stack_document(value: serde_json::Value) -> serde_json::Value {
    let mut root = match value {
        serde_json::Value::Object(root) => root,
        other => return other,
    };
    let is_stack =
        root.len() == 1 && matches!(root.get("config"), Some(serde_json::Value::Object(_)));
    if !is_stack {
        return serde_json::Value::Object(root);
    }
    let config = match root.remove("config") {
        Some(serde_json::Value::Object(config)) => config,
        _ => return serde_json::Value::Object(root),
    };

    log::debug!("reading engine stack document ({} keys)", config.len());
    let flattened = config
        .into_iter()
        .map(|(key, value)| {
            let short = key.rsplit_once(':').map_or(key.as_str(), |(_, k)| k).to_string();
            (short, value)
        })
        .collect();
    serde_json::Value::Object(flattened)
}

// ============================================================================
// Plan settings
// ============================================================================

/// Everything the builder needs besides the entries themselves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSettings {
    pub account_id: String,
    pub instance: SsoInstance,
    pub default_session_duration: String,
}

impl PlanSettings {
    /// Validate and create settings
    pub fn new(account_id: &str, instance: SsoInstance, session_duration: &str) -> Result<Self> {
        validate_account_id(account_id)?;
        validate_session_duration("session_duration", session_duration)?;
        Ok(Self {
            account_id: account_id.to_string(),
            instance,
            default_session_duration: session_duration.to_string(),
        })
    }

    /// Resolve settings from an override (CLI flag or `AWS_ACCOUNT_ID`) and
    /// the document, override first
    pub fn resolve(config: &IdentityConfig, account_override: Option<&str>) -> Result<Self> {
        let account = account_override
            .filter(|a| !a.trim().is_empty())
            .or(config.account_id.as_deref())
            .ok_or_else(|| {
                Error::config(
                    "account_id",
                    "no account id: set AWS_ACCOUNT_ID, pass --account-id, or add account_id to the config",
                )
            })?;
        Self::new(
            account.trim(),
            config.instance()?,
            config.default_session_duration(),
        )
    }
}

// ============================================================================
// Field validation
// ============================================================================

/// Accept `PT<h>H`, `PT<m>M` or `PT<h>H<m>M` between one and twelve hours
pub fn validate_session_duration(key: &str, duration: &str) -> Result<()> {
    let invalid = || {
        Error::config(
            key,
            format!("'{duration}' is not an ISO-8601 duration between PT1H and PT12H"),
        )
    };

    let caps = SESSION_DURATION.captures(duration).ok_or_else(invalid)?;
    let hours = caps.get(1).map(|m| m.as_str().parse::<u32>());
    let minutes = caps.get(2).map(|m| m.as_str().parse::<u32>());
    if hours.is_none() && minutes.is_none() {
        return Err(invalid());
    }

    let total = hours.unwrap_or(Ok(0)).map_err(|_| invalid())? * 60
        + minutes.unwrap_or(Ok(0)).map_err(|_| invalid())?;
    if !(60..=720).contains(&total) {
        return Err(invalid());
    }
    Ok(())
}

/// Twelve ASCII digits
pub fn validate_account_id(account_id: &str) -> Result<()> {
    if ACCOUNT_ID.is_match(account_id) {
        Ok(())
    } else {
        Err(Error::config(
            "account_id",
            format!("'{account_id}' is not a 12-digit AWS account id"),
        ))
    }
}

/// Whether a policy identifier looks like an IAM managed-policy ARN
pub fn looks_like_policy_arn(policy: &str) -> bool {
    POLICY_ARN.is_match(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_users_keep_document_order() {
        let config = IdentityConfig::from_value(json!({
            "users": {
                "zed": {"name": "zed"},
                "alice": {"name": "alice"},
                "mike": {"name": "mike"}
            }
        }))
        .unwrap();
        let keys: Vec<_> = config.users.keys().cloned().collect();
        assert_eq!(keys, vec!["zed", "alice", "mike"]);
    }

    #[test]
    fn test_policies_must_be_strings() {
        let err = IdentityConfig::from_value(json!({
            "users": {"alice": {"name": "alice", "policies": "arn:aws:iam::aws:policy/ReadOnlyAccess"}}
        }))
        .unwrap_err();
        assert!(err.is_configuration());

        let err = IdentityConfig::from_value(json!({
            "users": {"alice": {"name": "alice", "policies": [1, 2]}}
        }))
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_stack_document_is_unwrapped() {
        let config = IdentityConfig::from_value(json!({
            "config": {
                "aws:region": "us-east-1",
                "sso-infra:users": {"alice": {"name": "alice", "group": "devs"}}
            }
        }))
        .unwrap();
        assert_eq!(config.users["alice"].group.as_deref(), Some("devs"));
    }

    #[test]
    fn test_session_duration_validation() {
        for ok in ["PT8H", "PT1H", "PT12H", "PT90M", "PT1H30M"] {
            assert!(validate_session_duration("d", ok).is_ok(), "{ok}");
        }
        for bad in ["8H", "PT", "PT0H", "PT13H", "PT30M", "P1D", "PT1H30"] {
            assert!(validate_session_duration("d", bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_account_id_validation() {
        assert!(validate_account_id("252705693666").is_ok());
        assert!(validate_account_id("2527056936").is_err());
        assert!(validate_account_id("abcdefghijkl").is_err());
    }

    #[test]
    fn test_policy_arn_shape() {
        assert!(looks_like_policy_arn("arn:aws:iam::aws:policy/AdministratorAccess"));
        assert!(looks_like_policy_arn("arn:aws:iam::252705693666:policy/team/Deploy"));
        assert!(!looks_like_policy_arn("AdministratorAccess"));
    }

    #[test]
    fn test_settings_prefer_override() {
        let config = IdentityConfig {
            account_id: Some("111111111111".into()),
            ..Default::default()
        };
        let settings = PlanSettings::resolve(&config, Some("222222222222")).unwrap();
        assert_eq!(settings.account_id, "222222222222");

        let settings = PlanSettings::resolve(&config, None).unwrap();
        assert_eq!(settings.account_id, "111111111111");
        assert_eq!(settings.instance, SsoInstance::Discover);
        assert_eq!(settings.default_session_duration, DEFAULT_SESSION_DURATION);
    }

    #[test]
    fn test_missing_account_is_configuration_error() {
        let err = PlanSettings::resolve(&IdentityConfig::default(), None).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_instance_fields_must_be_paired() {
        let config = IdentityConfig {
            instance_arn: Some("arn:aws:sso:::instance/ssoins-1".into()),
            ..Default::default()
        };
        assert!(config.instance().is_err());
    }
}
