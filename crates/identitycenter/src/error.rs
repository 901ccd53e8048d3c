//! Error types for Identity Center planning.
//!
//! Every error aborts the planning run: a partially built graph could be
//! missing dependency edges, so nothing is recovered locally.

use std::fmt;
use thiserror::Error;

/// Categories of planning errors for user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed or missing configuration
    Configuration,
    /// Account-assignment principal was neither a user nor a group
    Principal,
    /// Identity-store lookup found nothing
    NotFound,
    /// Identity-store lookup could not be performed
    Lookup,
    /// Graph invariant violated
    Graph,
    /// Lookup output could not be parsed
    Parse,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Configuration => "Invalid configuration",
            Self::Principal => "Unrecognized principal",
            Self::NotFound => "Identity not found",
            Self::Lookup => "Identity lookup failed",
            Self::Graph => "Invalid resource graph",
            Self::Parse => "Unreadable lookup output",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Configuration => "Fix the reported field in the configuration file and re-run",
            Self::Principal => "Assign permission sets only to declared users or groups",
            Self::NotFound => "Check the user name / group display name in the identity store",
            Self::Lookup => "Check that the aws CLI is installed and credentials are valid",
            Self::Graph => "Rename the colliding entries so logical names stay unique",
            Self::Parse => "Check that the aws CLI prints JSON (aws --version, --output json)",
        }
    }
}

/// What kind of identity a lookup was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    User,
    Group,
    Instance,
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Group => write!(f, "group"),
            Self::Instance => write!(f, "SSO instance"),
        }
    }
}

/// Errors that can occur while planning Identity Center resources.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration field is missing or malformed
    #[error("configuration error at '{key}': {message}")]
    Configuration {
        /// Configuration key (entry key or field path)
        key: String,
        /// What is wrong with it
        message: String,
    },

    /// A principal resolved to neither a user nor a group
    #[error("principal '{0}' is neither a user nor a group")]
    AmbiguousPrincipal(String),

    /// No identity matched a lookup
    #[error("{kind} not found in identity store: {name}")]
    NotFound {
        /// Kind of identity searched for
        kind: IdentityKind,
        /// Attribute value searched for
        name: String,
    },

    /// The lookup backend failed for another reason
    #[error("identity lookup failed: {message}")]
    LookupFailed {
        /// Description of the failure
        message: String,
        /// Raw stderr from the backend, if any
        stderr: String,
    },

    /// Graph error (cycle, unknown dependency)
    #[error(transparent)]
    Graph(#[from] resgraph::Error),

    /// Lookup output was not the expected JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a configuration error
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::AmbiguousPrincipal(_) => ErrorCategory::Principal,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::LookupFailed { .. } => ErrorCategory::Lookup,
            Self::Graph(_) => ErrorCategory::Graph,
            Self::Json(_) => ErrorCategory::Parse,
        }
    }

    /// Whether this is a configuration error
    pub fn is_configuration(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    /// Create an error from `aws` command output.
    pub fn from_aws_output(stderr: &str, kind: IdentityKind, name: &str) -> Self {
        if stderr.contains("ResourceNotFoundException") {
            return Self::NotFound {
                kind,
                name: name.to_string(),
            };
        }

        let stderr_lower = stderr.to_lowercase();
        let message = if stderr_lower.contains("unable to locate credentials")
            || stderr_lower.contains("expiredtoken")
            || stderr_lower.contains("token has expired")
        {
            "AWS credentials are missing or expired".to_string()
        } else if stderr_lower.contains("accessdenied") {
            format!("access denied while looking up {kind} {name}")
        } else {
            format!("aws command failed for {kind} {name}")
        };

        Self::LookupFailed {
            message,
            stderr: stderr.trim().to_string(),
        }
    }
}

/// Result type for Identity Center planning
pub type Result<T> = std::result::Result<T, Error>;
