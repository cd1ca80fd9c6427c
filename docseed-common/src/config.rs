//! Configuration loading and connection string resolution
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. TOML configuration file (`docseed.toml`)
//! 4. Compiled defaults

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Connection string variables, checked in order; first non-empty wins
pub const CONNECTION_ENV_VARS: [&str; 5] = [
    "DOCSEED_CONNECTION_STRING",
    "MONGODB_CONNECTION_STRING",
    "MONGO_URI",
    "MONGO_URL",
    "DATABASE_URL",
];

/// Config file name looked up in the working directory and the user config dir
pub const CONFIG_FILE_NAME: &str = "docseed.toml";

/// One entity type to seed: where its fixture lives and where it goes
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntitySpec {
    /// Entity type name used in logs and the summary
    pub name: String,

    /// Target collection (defaults to `name`)
    #[serde(default)]
    pub collection: Option<String>,

    /// Fixture path, relative to the data directory unless absolute
    pub fixture: PathBuf,

    /// Candidate wrapper keys, highest priority first
    #[serde(default)]
    pub keys: Vec<String>,
}

impl EntitySpec {
    pub fn new(name: &str, fixture: impl Into<PathBuf>, keys: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            collection: None,
            fixture: fixture.into(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn collection(&self) -> &str {
        self.collection.as_deref().unwrap_or(&self.name)
    }

    /// Absolute or data-dir-relative fixture location
    pub fn fixture_path(&self, data_dir: &Path) -> PathBuf {
        if self.fixture.is_absolute() {
            self.fixture.clone()
        } else {
            data_dir.join(&self.fixture)
        }
    }
}

/// Built-in entity types: users and hotels
pub fn default_entities() -> Vec<EntitySpec> {
    vec![
        EntitySpec::new("users", "test-users.json", &["users", "user"]),
        EntitySpec::new("hotels", "test-hotel.json", &["hotels", "hotel", "properties"]),
    ]
}

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Directory holding fixture files
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Keep source `_id` values instead of letting the store assign new ones
    #[serde(default)]
    pub preserve_ids: Option<bool>,

    /// Sync entity types concurrently
    #[serde(default)]
    pub parallel: Option<bool>,

    /// Replacement for [`CONNECTION_ENV_VARS`]
    #[serde(default)]
    pub connection_env: Option<Vec<String>>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Entity types to seed; empty means [`default_entities`]
    #[serde(default)]
    pub entities: Vec<EntitySpec>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Load configuration
    ///
    /// An explicit path must exist and parse. Without one, `./docseed.toml`
    /// then the per-user config file are tried; if neither exists, defaults
    /// are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
            })?;
            info!("Loaded config file: {}", path.display());
            return Self::from_toml_str(&content);
        }

        for path in default_config_paths() {
            if !path.exists() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    info!("Loaded config file: {}", path.display());
                    return Self::from_toml_str(&content);
                }
                Err(e) => warn!("Skipping unreadable config file {}: {}", path.display(), e),
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Configured entities, or the built-in ones
    pub fn entities_or_default(&self) -> Vec<EntitySpec> {
        if self.entities.is_empty() {
            default_entities()
        } else {
            self.entities.clone()
        }
    }

    /// Configured connection variables, or [`CONNECTION_ENV_VARS`]
    pub fn connection_env_or_default(&self) -> Vec<String> {
        match &self.connection_env {
            Some(names) if !names.is_empty() => names.clone(),
            _ => CONNECTION_ENV_VARS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Candidate config file locations in lookup order
fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("docseed").join(CONFIG_FILE_NAME));
    }
    paths
}

/// Resolve the store connection string
///
/// Priority: explicit value, then the first non-empty variable among
/// `env_names`. Whitespace-only values count as empty.
pub fn resolve_connection_string<S: AsRef<str>>(
    explicit: Option<&str>,
    env_names: &[S],
) -> Result<String> {
    if let Some(value) = explicit.map(str::trim).filter(|v| !v.is_empty()) {
        return Ok(value.to_string());
    }

    for name in env_names {
        if let Ok(value) = std::env::var(name.as_ref()) {
            let value = value.trim();
            if !value.is_empty() {
                debug!("Connection string taken from {}", name.as_ref());
                return Ok(value.to_string());
            }
        }
    }

    let names: Vec<&str> = env_names.iter().map(|n| n.as_ref()).collect();
    Err(Error::Config(format!(
        "Missing connection string: set one of {}",
        names.join(" / ")
    )))
}
