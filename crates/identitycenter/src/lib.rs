//! # identitycenter
//!
//! Plan AWS IAM Identity Center resources as a desired-state graph.
//!
//! This crate provides functionality for:
//! - Reading and validating the users/groups configuration document
//! - Building the resource graph: identity-store users and groups, group
//!   memberships, permission sets, account assignments and managed-policy
//!   attachments
//! - Plain IAM users with an assumable role
//! - Looking up ids of identities that already exist in the store
//!
//! The output is a [`resgraph::ResourceGraph`]. Creating, updating and
//! deleting the resources is left to the engine that consumes it.
//!
//! ## Example
//!
//! ```
//! use identitycenter::model::attachment_node_name;
//! use identitycenter::{IdentityConfig, PlanSettings, build_graph};
//!
//! let config = IdentityConfig::from_json_str(r#"{
//!     "account_id": "252705693666",
//!     "users": {
//!         "alice": {
//!             "name": "alice",
//!             "group": "devs",
//!             "policies": ["arn:aws:iam::aws:policy/ReadOnlyAccess"]
//!         }
//!     }
//! }"#).unwrap();
//!
//! let settings = PlanSettings::resolve(&config, None).unwrap();
//! let graph = build_graph(&config, &settings).unwrap();
//!
//! assert!(graph.contains("alice-account-assignment"));
//! assert!(graph.contains(&attachment_node_name(
//!     "alice-permission-set",
//!     "arn:aws:iam::aws:policy/ReadOnlyAccess",
//! )));
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod iam;
pub mod lookup;
pub mod model;

pub use builder::{GraphBuilder, build_graph};
pub use config::{IdentityConfig, PlanSettings};
pub use error::{Error, ErrorCategory, IdentityKind, Result};
pub use lookup::{AwsCliLookup, IdentityLookup, MockLookup, existing_membership};
pub use model::{PrincipalType, ResourceKind, SsoInstance};
