//! Cluster-wide shard allocation switch and allocation explanations

use crate::client::ClusterSettingsApi;
use crate::error::{Error, Result};
use crate::settings::{SettingScope, SettingSource, SettingsUpdate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use tracing::info;

pub const ALLOCATION_ENABLE_KEY: &str = "cluster.routing.allocation.enable";

/// Value of `cluster.routing.allocation.enable`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    All,
    Primaries,
    NewPrimaries,
    None,
}

impl AllocationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AllocationStatus::All => "all",
            AllocationStatus::Primaries => "primaries",
            AllocationStatus::NewPrimaries => "new_primaries",
            AllocationStatus::None => "none",
        }
    }
}

impl FromStr for AllocationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(AllocationStatus::All),
            "primaries" => Ok(AllocationStatus::Primaries),
            "new_primaries" => Ok(AllocationStatus::NewPrimaries),
            "none" => Ok(AllocationStatus::None),
            other => Err(Error::InvalidAllocationStatus(other.to_string())),
        }
    }
}

impl fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective allocation status and where it was read from.
///
/// `source` is `None` when the key is absent everywhere and the cluster
/// default of `all` applies.
pub async fn get_status(
    api: &dyn ClusterSettingsApi,
) -> Result<(AllocationStatus, Option<SettingSource>)> {
    let settings = api.get_settings(true).await?;
    match settings.lookup(ALLOCATION_ENABLE_KEY) {
        Some((value, source)) => {
            let text = value.as_str().ok_or_else(|| {
                Error::decode(
                    "get cluster settings",
                    format!("unexpected value for {}: {}", ALLOCATION_ENABLE_KEY, value),
                )
            })?;
            let status = text.parse().map_err(|_| {
                Error::decode(
                    "get cluster settings",
                    format!("unknown allocation status '{}'", text),
                )
            })?;
            Ok((status, Some(source)))
        }
        None => Ok((AllocationStatus::All, None)),
    }
}

/// Persistently set the allocation status.
pub async fn set_status(api: &dyn ClusterSettingsApi, status: AllocationStatus) -> Result<()> {
    api.put_settings(&SettingsUpdate::new().set(
        SettingScope::Persistent,
        ALLOCATION_ENABLE_KEY,
        status.as_str(),
    ))
    .await?;
    info!(%status, "Updated shard allocation status");
    Ok(())
}

/// Which shard to explain. With neither index nor shard, Elasticsearch
/// explains the first unassigned shard it finds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplainRequest {
    pub index: Option<String>,
    pub shard: Option<u32>,
    pub primary: bool,
}

impl ExplainRequest {
    /// Request body, or `None` for the unassigned-shard form.
    pub fn body(&self) -> Result<Option<serde_json::Value>> {
        let index = self.index.as_deref().filter(|i| !i.is_empty());
        match (index, self.shard) {
            (None, None) => Ok(None),
            (None, Some(_)) => Err(Error::ShardWithoutIndex),
            (Some(_), None) => Err(Error::IndexWithoutShard),
            (Some(index), Some(shard)) => Ok(Some(json!({
                "index": index,
                "shard": shard,
                "primary": self.primary,
            }))),
        }
    }
}

/// The parts of `_cluster/allocation/explain` worth showing
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AllocationExplanation {
    #[serde(default)]
    pub index: String,
    #[serde(default)]
    pub shard: u32,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub current_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_node: Option<NodeRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unassigned_info: Option<UnassignedInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_allocate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_remain_on_current_node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocate_explanation: Option<String>,
    #[serde(default)]
    pub node_allocation_decisions: Vec<NodeDecision>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NodeRef {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UnassignedInfo {
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_allocation_status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NodeDecision {
    #[serde(default)]
    pub node_name: String,
    #[serde(default)]
    pub node_decision: String,
    #[serde(default)]
    pub deciders: Vec<Decider>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Decider {
    #[serde(default)]
    pub decider: String,
    #[serde(default)]
    pub decision: String,
    #[serde(default)]
    pub explanation: String,
}

impl AllocationExplanation {
    /// Human readable reason, whichever field the cluster filled in
    pub fn reason(&self) -> Option<&str> {
        self.allocate_explanation
            .as_deref()
            .or(self.unassigned_info.as_ref().map(|u| u.reason.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_display() {
        for text in ["all", "primaries", "new_primaries", "none"] {
            let status: AllocationStatus = text.parse().unwrap();
            assert_eq!(status.to_string(), text);
        }
        assert!(matches!(
            "some".parse::<AllocationStatus>(),
            Err(Error::InvalidAllocationStatus(_))
        ));
    }

    #[test]
    fn test_explain_body_validation() {
        assert_eq!(ExplainRequest::default().body().unwrap(), None);

        let shard_only = ExplainRequest {
            shard: Some(0),
            ..Default::default()
        };
        assert!(matches!(shard_only.body(), Err(Error::ShardWithoutIndex)));

        let index_only = ExplainRequest {
            index: Some("logs".into()),
            ..Default::default()
        };
        assert!(matches!(index_only.body(), Err(Error::IndexWithoutShard)));

        let full = ExplainRequest {
            index: Some("logs".into()),
            shard: Some(2),
            primary: true,
        };
        assert_eq!(
            full.body().unwrap(),
            Some(json!({"index": "logs", "shard": 2, "primary": true}))
        );
    }

    #[test]
    fn test_explanation_decodes_partial_payload() {
        let explanation: AllocationExplanation = serde_json::from_value(json!({
            "index": "logs",
            "shard": 0,
            "primary": false,
            "current_state": "unassigned",
            "unassigned_info": {"reason": "NODE_LEFT", "at": "2024-01-01T00:00:00Z"},
            "can_allocate": "no",
            "node_allocation_decisions": [{
                "node_name": "node-1",
                "node_decision": "no",
                "deciders": [{"decider": "filter", "decision": "NO", "explanation": "excluded"}]
            }]
        }))
        .unwrap();

        assert_eq!(explanation.reason(), Some("NODE_LEFT"));
        assert_eq!(explanation.node_allocation_decisions[0].deciders[0].decider, "filter");
    }
}
