//! Identity lookups through the `aws` CLI.

use crate::error::{Error, IdentityKind, Result};
use crate::lookup::IdentityLookup;
use crate::model::SsoInstance;
use std::process::Command;

/// Lookup that executes `aws identitystore` / `aws sso-admin` commands.
#[derive(Debug, Clone)]
pub struct AwsCliLookup {
    aws_path: String,
    profile: Option<String>,
    region: Option<String>,
}

impl Default for AwsCliLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl AwsCliLookup {
    pub fn new() -> Self {
        Self {
            aws_path: "aws".to_string(),
            profile: None,
            region: None,
        }
    }

    /// Use a named profile instead of the default credential chain
    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    fn base_args(&self) -> Vec<String> {
        let mut args = vec!["--output".to_string(), "json".to_string()];
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        if let Some(region) = &self.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
        args
    }

    /// Run an aws command and return stdout, mapping failures by `kind`.
    fn run_aws(&self, args: &[&str], kind: IdentityKind, name: &str) -> Result<String> {
        log::debug!("aws {}", args.join(" "));
        let output = Command::new(&self.aws_path)
            .args(args)
            .args(self.base_args())
            .output()
            .map_err(|e| Error::LookupFailed {
                message: format!("failed to execute aws: {e}"),
                stderr: String::new(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::from_aws_output(&stderr, kind, name));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl IdentityLookup for AwsCliLookup {
    fn find_user_id(&self, identity_store_id: &str, user_name: &str) -> Result<String> {
        let identifier = alternate_identifier("UserName", user_name);
        let stdout = self.run_aws(
            &[
                "identitystore",
                "get-user-id",
                "--identity-store-id",
                identity_store_id,
                "--alternate-identifier",
                &identifier,
            ],
            IdentityKind::User,
            user_name,
        )?;
        parse_id(&stdout, "UserId", IdentityKind::User, user_name)
    }

    fn find_group_id(&self, identity_store_id: &str, group_name: &str) -> Result<String> {
        let identifier = alternate_identifier("DisplayName", group_name);
        let stdout = self.run_aws(
            &[
                "identitystore",
                "get-group-id",
                "--identity-store-id",
                identity_store_id,
                "--alternate-identifier",
                &identifier,
            ],
            IdentityKind::Group,
            group_name,
        )?;
        parse_id(&stdout, "GroupId", IdentityKind::Group, group_name)
    }

    fn sso_instance(&self) -> Result<SsoInstance> {
        let stdout = self.run_aws(
            &["sso-admin", "list-instances"],
            IdentityKind::Instance,
            "sso-admin",
        )?;
        parse_instances(&stdout)
    }
}

/// `--alternate-identifier` payload matching a unique attribute
fn alternate_identifier(attribute_path: &str, value: &str) -> String {
    serde_json::json!({
        "UniqueAttribute": {
            "AttributePath": attribute_path,
            "AttributeValue": value,
        }
    })
    .to_string()
}

fn parse_id(stdout: &str, field: &str, kind: IdentityKind, name: &str) -> Result<String> {
    let json: serde_json::Value = serde_json::from_str(stdout)?;
    json[field]
        .as_str()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::NotFound {
            kind,
            name: name.to_string(),
        })
}

/// First instance from `aws sso-admin list-instances`
fn parse_instances(stdout: &str) -> Result<SsoInstance> {
    let json: serde_json::Value = serde_json::from_str(stdout)?;
    let first = json["Instances"].as_array().and_then(|arr| arr.first());

    let Some(instance) = first else {
        return Err(Error::NotFound {
            kind: IdentityKind::Instance,
            name: "any".to_string(),
        });
    };

    match (
        instance["InstanceArn"].as_str(),
        instance["IdentityStoreId"].as_str(),
    ) {
        (Some(arn), Some(store)) => Ok(SsoInstance::Known {
            arn: arn.to_string(),
            identity_store_id: store.to_string(),
        }),
        _ => Err(Error::LookupFailed {
            message: "list-instances returned an instance without ARN or identity store id"
                .to_string(),
            stderr: String::new(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternate_identifier() {
        let payload: serde_json::Value =
            serde_json::from_str(&alternate_identifier("UserName", "hadi_dev")).unwrap();
        assert_eq!(payload["UniqueAttribute"]["AttributePath"], "UserName");
        assert_eq!(payload["UniqueAttribute"]["AttributeValue"], "hadi_dev");
    }

    #[test]
    fn test_parse_user_id() {
        let stdout = r#"{"IdentityStoreId": "d-9067", "UserId": "94482488-3041-7026-18f3-be45837cd0e4"}"#;
        assert_eq!(
            parse_id(stdout, "UserId", IdentityKind::User, "hadi_dev").unwrap(),
            "94482488-3041-7026-18f3-be45837cd0e4"
        );
    }

    #[test]
    fn test_parse_missing_id_is_not_found() {
        let err = parse_id("{}", "GroupId", IdentityKind::Group, "devs").unwrap_err();
        assert_eq!(err.to_string(), "group not found in identity store: devs");
    }

    #[test]
    fn test_parse_instances() {
        let stdout = r#"{
            "Instances": [
                {
                    "InstanceArn": "arn:aws:sso:::instance/ssoins-7223a1b2c3d4e5f6",
                    "IdentityStoreId": "d-9067a1b2c3",
                    "Status": "ACTIVE"
                }
            ]
        }"#;
        assert_eq!(
            parse_instances(stdout).unwrap(),
            SsoInstance::Known {
                arn: "arn:aws:sso:::instance/ssoins-7223a1b2c3d4e5f6".into(),
                identity_store_id: "d-9067a1b2c3".into(),
            }
        );
    }

    #[test]
    fn test_parse_no_instances() {
        let err = parse_instances(r#"{"Instances": []}"#).unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound {
                kind: IdentityKind::Instance,
                ..
            }
        ));
    }

    #[test]
    fn test_base_args() {
        let lookup = AwsCliLookup::new()
            .with_profile(Some("sso-admin".into()))
            .with_region(None);
        assert_eq!(
            lookup.base_args(),
            vec!["--output", "json", "--profile", "sso-admin"]
        );
    }
}
