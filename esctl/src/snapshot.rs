//! Snapshot repositories and snapshots
//!
//! Request types validate locally and render the bodies and query strings
//! [`EsClient`](crate::EsClient) sends. Creating a repository, verifying it,
//! taking a snapshot and restoring one run under the slow request timeout.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// One entry of `GET _snapshot`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RepositoryInfo {
    #[serde(rename = "type")]
    pub repo_type: String,
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
}

impl RepositoryInfo {
    /// Settings rendered as `key=value` pairs, sorted by key.
    pub fn settings_summary(&self) -> String {
        self.settings
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{}={}", k, s),
                other => format!("{}={}", k, other),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ShardStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub successful: u64,
    #[serde(default)]
    pub failed: u64,
}

/// A snapshot as reported by `GET _snapshot/<repo>/_all`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SnapshotInfo {
    pub snapshot: String,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub indices: Vec<String>,
    #[serde(default)]
    pub include_global_state: bool,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub duration_in_millis: u64,
    #[serde(default)]
    pub failures: Vec<Value>,
    #[serde(default)]
    pub shards: ShardStats,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SnapshotList {
    #[serde(default)]
    pub snapshots: Vec<SnapshotInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedSnapshot {
    pub snapshot: SnapshotInfo,
}

/// `POST _snapshot/<repo>/_verify` response
#[derive(Debug, Deserialize)]
pub(crate) struct VerifyResponse {
    #[serde(default)]
    pub nodes: BTreeMap<String, VerifiedNode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VerifiedNode {
    #[serde(default)]
    pub name: String,
}

/// Register (or re-register) a repository
#[derive(Debug, Clone, PartialEq)]
pub struct NewRepository {
    pub name: String,
    pub repo_type: String,
    pub settings: BTreeMap<String, Value>,
    /// Let the cluster check every node can reach the repository
    pub verify: bool,
}

impl NewRepository {
    pub fn body(&self) -> Value {
        json!({
            "type": self.repo_type,
            "settings": self.settings,
        })
    }
}

/// Parse `key=value` pairs into repository settings.
///
/// `true`/`false` and integers keep their JSON type; everything else is a
/// string.
pub fn parse_repository_settings<S: AsRef<str>>(pairs: &[S]) -> Result<BTreeMap<String, Value>> {
    let mut settings = BTreeMap::new();
    for pair in pairs {
        let pair = pair.as_ref();
        let (key, value) = pair
            .split_once('=')
            .filter(|(k, _)| !k.trim().is_empty())
            .ok_or_else(|| Error::InvalidRepositorySetting(pair.to_string()))?;
        let value = match value {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            v => v
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(v.to_string())),
        };
        settings.insert(key.trim().to_string(), value);
    }
    Ok(settings)
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSnapshot {
    pub repository: String,
    pub name: String,
    /// Index patterns; empty means every index
    pub indices: Vec<String>,
    pub include_global_state: bool,
    pub wait_for_completion: bool,
}

impl NewSnapshot {
    pub fn body(&self) -> Value {
        let indices = if self.indices.is_empty() {
            "_all".to_string()
        } else {
            self.indices.join(",")
        };
        json!({
            "indices": indices,
            "include_global_state": self.include_global_state,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoreRequest {
    pub repository: String,
    pub name: String,
    /// Indices to restore; empty restores all of them
    pub indices: Vec<String>,
    pub rename_pattern: Option<String>,
    pub rename_replacement: Option<String>,
    pub wait_for_completion: bool,
}

impl RestoreRequest {
    /// Request body. A rename needs both the pattern and the replacement.
    pub fn body(&self) -> Result<Value> {
        let mut body = Map::new();
        if !self.indices.is_empty() {
            body.insert("indices".to_string(), Value::String(self.indices.join(",")));
        }
        match (&self.rename_pattern, &self.rename_replacement) {
            (Some(pattern), Some(replacement)) => {
                body.insert("rename_pattern".to_string(), Value::String(pattern.clone()));
                body.insert(
                    "rename_replacement".to_string(),
                    Value::String(replacement.clone()),
                );
            }
            (None, None) => {}
            _ => return Err(Error::IncompleteRename),
        }
        Ok(Value::Object(body))
    }
}
