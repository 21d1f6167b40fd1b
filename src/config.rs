use crate::error::{Result, VectorDbError};
use crate::schema::presets::Preset;
use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDbConfig {
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// How long to wait for a dropped collection to disappear before recreating it.
    #[serde(default = "default_settle")]
    pub settle_secs: u64,

    #[serde(default)]
    pub preset: Preset,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    #[serde(default = "default_verify_limit")]
    pub verify_limit: usize,
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
    #[serde(default = "default_verify_snippet_chars")]
    pub verify_snippet_chars: usize,
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_settle() -> u64 {
    2
}

fn default_search_limit() -> usize {
    2
}

fn default_verify_limit() -> usize {
    10
}

fn default_snippet_chars() -> usize {
    200
}

fn default_verify_snippet_chars() -> usize {
    100
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            api_key: None,
            timeout_secs: default_timeout(),
            settle_secs: default_settle(),
            preset: Preset::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            search_limit: default_search_limit(),
            verify_limit: default_verify_limit(),
            snippet_chars: default_snippet_chars(),
            verify_snippet_chars: default_verify_snippet_chars(),
        }
    }
}

impl VectorDbConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    /// Update one setting from its CLI key, e.g. `search-limit`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "url" => self.url = value.to_string(),
            "api-key" => self.api_key = if value.is_empty() { None } else { Some(value.to_string()) },
            "timeout" => self.timeout_secs = parse_number(key, value)?,
            "settle" => self.settle_secs = parse_number(key, value)?,
            "search-limit" => self.output.search_limit = parse_positive(key, value)?,
            "verify-limit" => self.output.verify_limit = parse_positive(key, value)?,
            "snippet-chars" => self.output.snippet_chars = parse_number(key, value)?,
            "verify-snippet-chars" => self.output.verify_snippet_chars = parse_number(key, value)?,
            "preset" => {
                self.preset = match value {
                    "article" => Preset::Article,
                    "document" => Preset::Document,
                    _ => {
                        return Err(VectorDbError::Configuration(format!(
                            "unknown preset '{}' (expected article or document)",
                            value
                        )));
                    }
                }
            }
            _ => return Err(VectorDbError::Configuration(format!("unknown config key '{}'", key))),
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| VectorDbError::Configuration(format!("'{}' is not a valid number for {}", value, key)))
}

fn parse_positive(key: &str, value: &str) -> Result<usize> {
    match parse_number(key, value)? {
        0 => Err(VectorDbError::Configuration(format!("{} must be greater than zero", key))),
        n => Ok(n),
    }
}

pub struct ConfigManager {
    config: VectorDbConfig,
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_path_internal()?;
        Self::at(config_path)
    }

    /// Load from an explicit path instead of the platform config directory.
    pub fn at(config_path: PathBuf) -> Result<Self> {
        let config = Self::load_or_default(&config_path)?;

        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn save(&self) -> Result<()> {
        let toml = toml::to_string_pretty(&self.config)
            .map_err(|e| VectorDbError::Configuration(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.config_path, toml)
            .map_err(|e| VectorDbError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> &VectorDbConfig {
        &self.config
    }

    pub fn get_mut(&mut self) -> &mut VectorDbConfig {
        &mut self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn get_config_path_internal() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "vectordb", "vectordb").ok_or_else(|| {
            VectorDbError::Configuration("Could not determine config directory".to_string())
        })?;

        Ok(project_dirs.config_dir().join("config.toml"))
    }

    /// `VECTORDB_URL`, `VECTORDB_SETTLE_SECS`, `VECTORDB_OUTPUT__SEARCH_LIMIT`, ...
    fn environment() -> Environment {
        Environment::with_prefix("VECTORDB")
            .prefix_separator("_")
            .separator("__")
    }

    fn load_or_default(path: &Path) -> Result<VectorDbConfig> {
        Self::load_layered(path, Self::environment())
    }

    fn load_layered(path: &Path, environment: Environment) -> Result<VectorDbConfig> {
        let mut builder = Config::builder();
        if path.exists() {
            builder = builder.add_source(File::from(path.to_path_buf()));
        }

        let s = builder
            .add_source(environment)
            .build()
            .map_err(|e| VectorDbError::Configuration(format!("Failed to build config: {}", e)))?;

        let config: VectorDbConfig = s.try_deserialize().map_err(|e| {
            VectorDbError::Configuration(format!("Failed to deserialize config: {}", e))
        })?;

        Ok(config)
    }
}
