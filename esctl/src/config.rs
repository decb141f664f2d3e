//! Configuration management for esctl
//!
//! Lookup order when no explicit path is given:
//! `./esctl.toml`, `~/.config/esctl/config.toml`, `/etc/esctl/config.toml`.
//! A missing file is not an error; defaults point at a local cluster.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub elasticsearch: ElasticsearchConfig,
    #[serde(default)]
    pub kibana: KibanaConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ElasticsearchConfig {
    /// Cluster addresses; requests go to the first one
    #[serde(default = "default_es_addresses")]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Path to a PEM CA bundle used to verify the cluster certificate
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,
    /// Skip certificate verification (INSECURE)
    #[serde(default)]
    pub insecure: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Timeout for allocation explain, repository verification, snapshot and restore calls
    #[serde(default = "default_slow_request_timeout_secs")]
    pub slow_request_timeout_secs: u64,
}

fn default_es_addresses() -> Vec<String> {
    vec!["http://localhost:9200".to_string()]
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_slow_request_timeout_secs() -> u64 {
    30
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            addresses: default_es_addresses(),
            username: None,
            password: None,
            ca_cert: None,
            insecure: false,
            request_timeout_secs: default_request_timeout_secs(),
            slow_request_timeout_secs: default_slow_request_timeout_secs(),
        }
    }
}

impl ElasticsearchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn slow_request_timeout(&self) -> Duration {
        Duration::from_secs(self.slow_request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KibanaConfig {
    #[serde(default = "default_kb_addresses")]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,
    #[serde(default)]
    pub insecure: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_kb_addresses() -> Vec<String> {
    vec!["http://localhost:5601".to_string()]
}

impl Default for KibanaConfig {
    fn default() -> Self {
        Self {
            addresses: default_kb_addresses(),
            username: None,
            password: None,
            ca_cert: None,
            insecure: false,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl KibanaConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Table rendering for listing commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Plain => write!(f, "plain"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(OutputFormat::Plain),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(Error::Config(format!(
                "unknown output format '{}', expected plain, json or csv",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is not set
    #[serde(default = "default_level")]
    pub level: String,
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_log_format(),
        }
    }
}

/// Expand ~ to home directory in path
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(rest))
    } else if s == "~" {
        dirs::home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

/// `~/.config/esctl/config.toml`, if a home directory is known
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config/esctl/config.toml"))
}

/// Candidate config files, in lookup order
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("esctl.toml")];
    paths.extend(user_config_path());
    paths.push(PathBuf::from("/etc/esctl/config.toml"));
    paths
}

impl Config {
    /// Load from an explicit path, or search the default locations.
    ///
    /// An explicit path must exist. Returns the config and the file it was
    /// read from, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            let path = expand_tilde(path)?;
            if !path.exists() {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Ok((Self::load_file(&path)?, Some(path)));
        }

        for candidate in default_config_paths() {
            if candidate.exists() {
                return Ok((Self::load_file(&candidate)?, Some(candidate)));
            }
        }

        Ok((Config::default(), None))
    }

    /// Load config from a specific file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.expand_paths()?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Copy with passwords replaced, for display
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        if masked.elasticsearch.password.is_some() {
            masked.elasticsearch.password = Some("********".to_string());
        }
        if masked.kibana.password.is_some() {
            masked.kibana.password = Some("********".to_string());
        }
        masked
    }

    pub fn validate(&self) -> Result<()> {
        if self.elasticsearch.addresses.is_empty() {
            return Err(Error::Config(
                "no Elasticsearch addresses provided".to_string(),
            ));
        }
        if self.kibana.addresses.is_empty() {
            return Err(Error::Config("no Kibana addresses provided".to_string()));
        }
        Ok(())
    }

    fn expand_paths(&mut self) -> Result<()> {
        if let Some(ref ca) = self.elasticsearch.ca_cert {
            self.elasticsearch.ca_cert = Some(expand_tilde(ca)?);
        }
        if let Some(ref ca) = self.kibana.ca_cert {
            self.kibana.ca_cert = Some(expand_tilde(ca)?);
        }
        Ok(())
    }
}
