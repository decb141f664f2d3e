//! Shard allocation exclusions: draining and filling nodes
//!
//! The cluster keeps three comma-joined lists under
//! `cluster.routing.allocation.exclude.{name,ip,host}`. A node in any list
//! receives no new shards, and Elasticsearch relocates its existing shards in
//! the background. This module only edits the rule; it does not wait for
//! relocation to finish.
//!
//! Every operation re-reads the settings, computes the complete new list and
//! writes it back whole. There is no compare-and-swap, so two concurrent
//! invocations can lose one another's edit (last writer wins).

use crate::client::ClusterSettingsApi;
use crate::error::{Error, Result};
use crate::settings::{ClusterSettings, SettingScope, SettingValue, SettingsUpdate};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const EXCLUDE_NAME_KEY: &str = "cluster.routing.allocation.exclude.name";
pub const EXCLUDE_IP_KEY: &str = "cluster.routing.allocation.exclude.ip";
pub const EXCLUDE_HOST_KEY: &str = "cluster.routing.allocation.exclude.host";

/// Which attribute an exclusion matches nodes on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionDimension {
    Name,
    Ip,
    Host,
}

impl ExclusionDimension {
    pub const ALL: [ExclusionDimension; 3] = [
        ExclusionDimension::Name,
        ExclusionDimension::Ip,
        ExclusionDimension::Host,
    ];

    pub fn setting_key(self) -> &'static str {
        match self {
            ExclusionDimension::Name => EXCLUDE_NAME_KEY,
            ExclusionDimension::Ip => EXCLUDE_IP_KEY,
            ExclusionDimension::Host => EXCLUDE_HOST_KEY,
        }
    }
}

impl fmt::Display for ExclusionDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionDimension::Name => write!(f, "name"),
            ExclusionDimension::Ip => write!(f, "IP"),
            ExclusionDimension::Host => write!(f, "host"),
        }
    }
}

/// Current drain configuration, derived from cluster settings.
///
/// Lists keep first-seen order and hold no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExclusionSet {
    pub by_name: Vec<String>,
    pub by_ip: Vec<String>,
    pub by_host: Vec<String>,
}

impl ExclusionSet {
    /// Merge transient and persistent exclusions, ignoring empty segments.
    pub fn from_settings(settings: &ClusterSettings) -> Result<Self> {
        let mut set = ExclusionSet::default();
        for section in [&settings.transient, &settings.persistent] {
            for dim in ExclusionDimension::ALL {
                if let Some(value) = section.get(dim.setting_key()) {
                    for entry in parse_exclusion_value(dim.setting_key(), value)? {
                        let list = set.list_mut(dim);
                        if !list.contains(&entry) {
                            list.push(entry);
                        }
                    }
                }
            }
        }
        Ok(set)
    }

    pub fn get(&self, dim: ExclusionDimension) -> &[String] {
        match dim {
            ExclusionDimension::Name => &self.by_name,
            ExclusionDimension::Ip => &self.by_ip,
            ExclusionDimension::Host => &self.by_host,
        }
    }

    fn list_mut(&mut self, dim: ExclusionDimension) -> &mut Vec<String> {
        match dim {
            ExclusionDimension::Name => &mut self.by_name,
            ExclusionDimension::Ip => &mut self.by_ip,
            ExclusionDimension::Host => &mut self.by_host,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty() && self.by_ip.is_empty() && self.by_host.is_empty()
    }

    /// Name list after draining `node`, or `None` if it is already excluded.
    pub fn with_name(&self, node: &str) -> Option<Vec<String>> {
        if self.by_name.iter().any(|n| n == node) {
            return None;
        }
        let mut names = self.by_name.clone();
        names.push(node.to_string());
        Some(names)
    }

    /// Name list after filling `node`, or `None` if it is not excluded.
    pub fn without_name(&self, node: &str) -> Option<Vec<String>> {
        if !self.by_name.iter().any(|n| n == node) {
            return None;
        }
        Some(self.by_name.iter().filter(|n| *n != node).cloned().collect())
    }
}

/// Split one exclusion setting into its entries.
///
/// The cluster normally returns a comma-joined string; a JSON list is also
/// accepted. Anything else is a malformed payload.
pub fn parse_exclusion_value(key: &str, value: &SettingValue) -> Result<Vec<String>> {
    match value {
        SettingValue::Null => Ok(Vec::new()),
        SettingValue::Text(s) => Ok(split_list(s)),
        SettingValue::List(items) => {
            let mut entries = Vec::new();
            for item in items {
                match item {
                    SettingValue::Text(s) => entries.extend(split_list(s)),
                    other => {
                        return Err(Error::decode(
                            "get cluster settings",
                            format!("unexpected entry in {}: {}", key, other),
                        ))
                    }
                }
            }
            Ok(entries)
        }
        other => Err(Error::decode(
            "get cluster settings",
            format!("expected a comma-separated string for {}, got {}", key, other),
        )),
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate_node_name(node: &str) -> Result<()> {
    if node.trim().is_empty() || node.contains(',') {
        return Err(Error::InvalidNodeName(node.to_string()));
    }
    Ok(())
}

/// Result of a drain or fill
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameExclusions {
    /// Full list of node names excluded after the operation
    pub excluded: Vec<String>,
    /// False when the call was a no-op
    pub changed: bool,
}

/// Drains and fills nodes by editing the exclusion settings
pub struct ExclusionCoordinator {
    api: Arc<dyn ClusterSettingsApi>,
}

impl ExclusionCoordinator {
    pub fn new(api: Arc<dyn ClusterSettingsApi>) -> Self {
        Self { api }
    }

    /// Read the current exclusion set (persistent and transient).
    pub async fn exclusion_set(&self) -> Result<ExclusionSet> {
        let settings = self.api.get_settings(false).await?;
        let set = ExclusionSet::from_settings(&settings)?;
        debug!(?set, "Read exclusion set");
        Ok(set)
    }

    /// Exclude `node` by name. Draining an already drained node is a no-op.
    pub async fn drain(&self, node: &str) -> Result<NameExclusions> {
        validate_node_name(node)?;
        let current = self.exclusion_set().await?;

        let Some(names) = current.with_name(node) else {
            info!(node, "Node is already excluded from allocation");
            return Ok(NameExclusions {
                excluded: current.by_name,
                changed: false,
            });
        };

        self.write_names(&names).await?;
        info!(node, excluded = names.len(), "Node excluded from allocation");
        Ok(NameExclusions {
            excluded: names,
            changed: true,
        })
    }

    /// Remove `node` from the name exclusions. Filling a node that is not
    /// excluded is a no-op.
    pub async fn fill(&self, node: &str) -> Result<NameExclusions> {
        validate_node_name(node)?;
        let current = self.exclusion_set().await?;

        let Some(names) = current.without_name(node) else {
            info!(node, "Node is not excluded from allocation");
            return Ok(NameExclusions {
                excluded: current.by_name,
                changed: false,
            });
        };

        self.write_names(&names).await?;
        info!(node, excluded = names.len(), "Node removed from allocation exclusions");
        Ok(NameExclusions {
            excluded: names,
            changed: true,
        })
    }

    /// Clear all three persistent exclusion keys in one request, then re-read.
    ///
    /// Transient exclusions are not touched and show up in the returned set.
    pub async fn fill_all(&self) -> Result<ExclusionSet> {
        let update = ExclusionDimension::ALL
            .iter()
            .fold(SettingsUpdate::new(), |update, dim| {
                update.clear(SettingScope::Persistent, dim.setting_key())
            });
        self.api.put_settings(&update).await?;
        info!("Cleared persistent allocation exclusions");

        let remaining = self.exclusion_set().await?;
        if !remaining.is_empty() {
            warn!(?remaining, "Exclusions remain after clearing persistent settings");
        }
        Ok(remaining)
    }

    /// Write the whole name list; an empty list clears the key.
    async fn write_names(&self, names: &[String]) -> Result<()> {
        let update = if names.is_empty() {
            SettingsUpdate::new().clear(SettingScope::Persistent, EXCLUDE_NAME_KEY)
        } else {
            SettingsUpdate::new().set(SettingScope::Persistent, EXCLUDE_NAME_KEY, names.join(","))
        };
        self.api.put_settings(&update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(value: serde_json::Value) -> ClusterSettings {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_ignores_empty_segments() {
        let set = ExclusionSet::from_settings(&settings(json!({
            "persistent": {
                "cluster.routing.allocation.exclude.name": "node-1,,node-2,",
                "cluster.routing.allocation.exclude.ip": "",
                "cluster.routing.allocation.exclude.host": "host-a"
            }
        })))
        .unwrap();

        assert_eq!(set.by_name, vec!["node-1", "node-2"]);
        assert!(set.by_ip.is_empty());
        assert_eq!(set.by_host, vec!["host-a"]);
    }

    #[test]
    fn test_parse_merges_transient_and_persistent_without_duplicates() {
        let set = ExclusionSet::from_settings(&settings(json!({
            "transient": {"cluster.routing.allocation.exclude.name": "node-3,node-1"},
            "persistent": {"cluster.routing.allocation.exclude.name": "node-1,node-2"}
        })))
        .unwrap();

        assert_eq!(set.by_name, vec!["node-3", "node-1", "node-2"]);
    }

    #[test]
    fn test_parse_accepts_list_values() {
        let set = ExclusionSet::from_settings(&settings(json!({
            "persistent": {"cluster.routing.allocation.exclude.ip": ["10.0.0.1", "10.0.0.2"]}
        })))
        .unwrap();
        assert_eq!(set.by_ip, vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn test_parse_rejects_malformed_values() {
        let err = ExclusionSet::from_settings(&settings(json!({
            "persistent": {"cluster.routing.allocation.exclude.name": 42}
        })))
        .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_with_and_without_name() {
        let set = ExclusionSet {
            by_name: vec!["node-1".into()],
            ..Default::default()
        };

        assert_eq!(
            set.with_name("node-2"),
            Some(vec!["node-1".to_string(), "node-2".to_string()])
        );
        assert_eq!(set.with_name("node-1"), None);
        assert_eq!(set.without_name("node-1"), Some(vec![]));
        assert_eq!(set.without_name("node-9"), None);
    }

    #[test]
    fn test_node_name_validation() {
        assert!(validate_node_name("node-1").is_ok());
        assert!(matches!(validate_node_name(""), Err(Error::InvalidNodeName(_))));
        assert!(matches!(validate_node_name("a,b"), Err(Error::InvalidNodeName(_))));
    }
}
