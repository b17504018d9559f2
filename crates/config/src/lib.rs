//! Layered configuration for gelo.
//!
//! Values are merged in this order, later layers winning:
//! 1. built-in defaults;
//! 2. a config file (TOML, YAML or JSON, picked by extension), by default
//!    `config.toml` in the user's config directory;
//! 3. `GELO_` environment variables, with `__` separating nested keys
//!    (`GELO_QUEUE__PARALLEL_REQUESTS=2`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "GELO_";
const ENV_SEPARATOR: &str = "__";
const DEFAULT_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub queue: gelo_queue::Settings,
    pub cache: gelo_cache::Settings,
    pub blacklist: gelo_blacklist::Settings,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Where rule sets and the post cache are kept. Defaults to the user's
    /// data directory.
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Load and validate the configuration.
    ///
    /// An explicit `path` must exist. Without one, the default config file is
    /// used if present.
    #[tracing::instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(path)?.extract().map_err(|e| ErrorKind::Extract(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// All layers, unextracted.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.display().to_string())),
            Some(path) => figment = merge_file(figment, path)?,
            None => match default_path() {
                Ok(path) if path.is_file() => figment = merge_file(figment, &path)?,
                Ok(path) => tracing::debug!(path = %path.display(), "No config file, using defaults"),
                Err(_) => tracing::debug!("No config directory, using defaults"),
            },
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue.parallel_requests == 0 {
            exn::bail!(ErrorKind::Invalid("queue.parallel_requests must be greater than 0".to_string()));
        }
        if self.cache.max_size == 0 {
            exn::bail!(ErrorKind::Invalid("cache.max_size must be greater than 0".to_string()));
        }
        if self.cache.api_base.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("cache.api_base must not be empty".to_string()));
        }
        Ok(())
    }

    /// The configured data directory, or the user's data directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_dirs()?.data_dir().to_path_buf()),
        }
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_ascii_lowercase();
    tracing::debug!(path = %path.display(), "Loading config file");
    Ok(match extension.as_str() {
        "toml" => figment.merge(Toml::file(path)),
        "yaml" | "yml" => figment.merge(Yaml::file(path)),
        "json" => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.display().to_string())),
    })
}

fn project_dirs() -> Result<ProjectDirs> {
    Ok(ProjectDirs::from("", "", "gelo").ok_or(ErrorKind::NoProjectDirs)?)
}

/// `config.toml` in the user's config directory.
pub fn default_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join(DEFAULT_FILE_NAME))
}
