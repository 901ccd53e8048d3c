//! Loading the identity configuration from disk
//!
//! The format follows the file extension: `.toml` (default), `.json`, or
//! `.yaml`/`.yml` for engine stack files. Every format is read into a
//! `serde_json::Value` first so entry order survives into `IdentityConfig`.

use anyhow::{Context, Result, bail};
use identitycenter::IdentityConfig;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            None | Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some(other) => bail!(
                "Unsupported config extension '.{other}' (expected .toml, .json, .yaml or .yml)"
            ),
        }
    }

    /// Parse `content` into a generic document
    pub fn parse(self, content: &str) -> Result<serde_json::Value> {
        let value: serde_json::Value = match self {
            Self::Toml => toml::from_str(content).context("Invalid TOML format")?,
            Self::Json => serde_json::from_str(content).context("Invalid JSON format")?,
            Self::Yaml => serde_yaml::from_str(content).context("Invalid YAML format")?,
        };
        Ok(value)
    }
}

/// Read and parse an identity configuration file
pub fn load(path: &Path) -> Result<IdentityConfig> {
    let format = ConfigFormat::from_path(path)?;
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    let document = format
        .parse(&content)
        .with_context(|| format!("Could not parse {}", path.display()))?;
    log::debug!("Loaded {} as {:?}", path.display(), format);

    IdentityConfig::from_value(document)
        .with_context(|| format!("Invalid configuration in {}", path.display()))
}
