pub mod agent_policy;
pub mod agents;
pub mod allocation;
pub mod config;
pub mod drain;
pub mod fill;
pub mod package_policy;
pub mod ping;
pub mod repository;
pub mod settings;
pub mod snapshot;

use crate::output::Formatter;
use anyhow::{Context as _, Result};
use esctl::{Config, EsClient, FleetClient};
use std::path::{Path, PathBuf};

/// Effective configuration plus output settings for one invocation
pub struct Context {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub formatter: Formatter,
}

impl Context {
    pub fn es(&self) -> Result<EsClient> {
        EsClient::from_config(&self.config.elasticsearch)
            .context("failed to create Elasticsearch client")
    }

    pub fn fleet(&self) -> Result<FleetClient> {
        FleetClient::from_config(&self.config.kibana).context("failed to create Kibana client")
    }
}

pub(crate) fn yes_no(value: bool) -> String {
    let text = if value { "yes" } else { "no" };
    text.to_string()
}

pub(crate) fn or_dash(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or("-").to_string()
}

pub(crate) fn read_json_file(path: &Path) -> Result<serde_json::Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}
