//! Configuration
//!
//! TOML configuration loaded from `.relic/config.toml` when present, with
//! serde-supplied defaults for every field and environment variable
//! overrides for the author identity. Absent file, absent sections, and
//! absent keys all fall back cleanly.

use crate::error::{RelicError, Result};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelicConfig {
    /// Commit identity
    #[serde(default)]
    pub author: AuthorConfig,

    /// Core repository settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Identity recorded on author and committer lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorConfig {
    #[serde(default = "default_author_name")]
    pub name: String,

    #[serde(default = "default_author_email")]
    pub email: String,
}

fn default_author_name() -> String {
    "Relic User".to_string()
}

fn default_author_email() -> String {
    "relic@localhost".to_string()
}

impl Default for AuthorConfig {
    fn default() -> Self {
        Self {
            name: default_author_name(),
            email: default_author_email(),
        }
    }
}

/// Core repository settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Branch a fresh repository starts on
    #[serde(default = "default_branch")]
    pub default_branch: String,
}

fn default_branch() -> String {
    "main".to_string()
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_branch: default_branch(),
        }
    }
}

/// Loads configuration from disk with environment overrides.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from `<control_dir>/config.toml`, or defaults if absent.
    ///
    /// `RELIC_AUTHOR_NAME` and `RELIC_AUTHOR_EMAIL` override the file.
    pub fn load(control_dir: &Path) -> Result<RelicConfig> {
        let path = control_dir.join("config.toml");
        let mut config = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            RelicConfig::default()
        };

        if let Ok(name) = std::env::var("RELIC_AUTHOR_NAME") {
            config.author.name = name;
        }
        if let Ok(email) = std::env::var("RELIC_AUTHOR_EMAIL") {
            config.author.email = email;
        }

        Ok(config)
    }

    /// Parse a specific configuration file.
    pub fn load_from_file(path: &Path) -> Result<RelicConfig> {
        let text = fs::read_to_string(path)?;
        let config: RelicConfig = toml::from_str(&text).map_err(|e| {
            RelicError::Malformed(format!("config file {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}

impl RelicConfig {
    /// The `Name <email>` form used on commit metadata lines.
    pub fn identity(&self) -> String {
        format!("{} <{}>", self.author.name, self.author.email)
    }
}
