//! Configuration types.
//!
//! The labeler reads a versioned JSON file (default `./config.json`):
//!
//! ```json
//! {
//!   "Version": "1.0.0",
//!   "idle_time_to_archive_days": 14,
//!   "Labels": { "RespondTo": "Reply", "Archive": "Archived" },
//!   "Secrets": {
//!     "project_token_path": "secrets/client_secret.json",
//!     "user_token_path": "secrets/user_token.json"
//!   }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// The only config schema version this build understands.
pub const CONFIG_VERSION: &str = "1.0.0";

/// Upper bound for `idle_time_to_archive_days` (three years).
pub const MAX_IDLE_DAYS: u32 = 1095;

/// Label names as they appear in the mailbox.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelNames {
    /// Threads that still need a reply.
    #[serde(rename = "RespondTo")]
    pub respond_to: String,
    /// Threads that have gone quiet.
    #[serde(rename = "Archive")]
    pub archive: String,
}

/// Credential file locations.
#[derive(Debug, Clone, Deserialize)]
pub struct Secrets {
    /// OAuth client secrets downloaded for the Google Cloud project.
    pub project_token_path: PathBuf,
    /// Authorized-user token file (read and rewritten on refresh).
    pub user_token_path: PathBuf,
}

/// Labeler configuration file, schema v1.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelerConfig {
    #[serde(rename = "Version")]
    pub version: String,
    /// Days a fully-read thread must sit idle before it is archived.
    pub idle_time_to_archive_days: u32,
    #[serde(rename = "Labels")]
    pub labels: LabelNames,
    #[serde(rename = "Secrets")]
    pub secrets: Secrets,
}

impl LabelerConfig {
    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&raw)?;
        tracing::debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Parse and validate config JSON.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version.clone(),
                expected: CONFIG_VERSION.to_string(),
            });
        }
        if self.idle_time_to_archive_days > MAX_IDLE_DAYS {
            return Err(ConfigError::InvalidValue {
                key: "idle_time_to_archive_days".into(),
                message: format!(
                    "{} exceeds the maximum of {MAX_IDLE_DAYS}",
                    self.idle_time_to_archive_days
                ),
            });
        }
        for (key, value) in [
            ("Labels.RespondTo", &self.labels.respond_to),
            ("Labels.Archive", &self.labels.archive),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: "label name must not be empty".into(),
                });
            }
        }
        Ok(())
    }

    /// Build the run-scoped settings the labeler core consumes.
    pub fn run_config(&self, dry_run: bool) -> RunConfig {
        RunConfig {
            idle_days: self.idle_time_to_archive_days,
            reply_label: self.labels.respond_to.clone(),
            archive_label: self.labels.archive.clone(),
            dry_run,
        }
    }
}

/// Settings for a single labeling run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Idle days before a read thread moves from reply to archive.
    pub idle_days: u32,
    /// Name of the "needs reply" label.
    pub reply_label: String,
    /// Name of the "archived" label.
    pub archive_label: String,
    /// Skip every label mutation, logging it instead.
    pub dry_run: bool,
}
