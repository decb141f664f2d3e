//! Fleet data model: agent policies, agents and the Fleet response envelopes

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Largest page the Fleet agents API accepts
pub const MAX_AGENTS_PER_PAGE: u32 = 1000;

/// Deepest `page * perPage` the agents index serves (`index.max_result_window`)
pub const MAX_AGENT_RESULT_WINDOW: u64 = 10_000;

const MAX_POLICY_ID_LEN: usize = 36;

/// A Fleet agent policy
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AgentPolicy {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub revision: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub monitoring_enabled: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_managed: bool,
}

/// A Fleet-enrolled agent
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub policy_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checkin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Body for creating an agent policy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAgentPolicy {
    /// Custom ID; Fleet generates one when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub monitoring_enabled: Vec<String>,
}

/// Fields to change on an existing policy; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentPolicyUpdate {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub description: Option<String>,
    pub monitoring_enabled: Option<Vec<String>>,
}

impl AgentPolicyUpdate {
    /// Merge onto an existing policy, producing the full PUT body.
    pub fn merge_onto(&self, existing: &AgentPolicy) -> AgentPolicyBody {
        AgentPolicyBody {
            name: self.name.clone().unwrap_or_else(|| existing.name.clone()),
            namespace: self
                .namespace
                .clone()
                .unwrap_or_else(|| existing.namespace.clone()),
            description: self
                .description
                .clone()
                .or_else(|| existing.description.clone()),
            monitoring_enabled: self
                .monitoring_enabled
                .clone()
                .unwrap_or_else(|| existing.monitoring_enabled.clone()),
        }
    }
}

/// Full body for `PUT /api/fleet/agent_policies/{id}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentPolicyBody {
    pub name: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub monitoring_enabled: Vec<String>,
}

/// Query for the agents list endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct AgentQuery {
    pub kuery: Option<String>,
    pub page: u32,
    pub per_page: u32,
    /// Include offline, unenrolled and other inactive agents
    pub show_inactive: bool,
}

impl AgentQuery {
    /// Every agent bound to one policy, inactive ones included, first page
    pub fn bound_to(policy_id: &str) -> Self {
        Self {
            kuery: Some(format!("policy_id:{}", quote_kuery(policy_id))),
            page: 1,
            per_page: MAX_AGENTS_PER_PAGE,
            show_inactive: true,
        }
    }

    pub fn next_page(&self) -> Self {
        Self {
            page: self.page + 1,
            ..self.clone()
        }
    }

    /// Whether this page still lies inside the agents result window.
    pub fn within_result_window(&self) -> bool {
        u64::from(self.page) * u64::from(self.per_page) <= MAX_AGENT_RESULT_WINDOW
    }
}

impl Default for AgentQuery {
    fn default() -> Self {
        Self {
            kuery: None,
            page: 1,
            per_page: 20,
            show_inactive: false,
        }
    }
}

/// Quote a value for a KQL term, escaping backslashes and double quotes.
pub fn quote_kuery(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// One page of agents plus the total matching count
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentPage {
    #[serde(default)]
    pub items: Vec<Agent>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default, rename = "perPage")]
    pub per_page: u32,
}

/// Changes to one agent; `None` leaves the field alone
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<serde_json::Value>,
}

impl AgentUpdate {
    pub fn is_empty(&self) -> bool {
        self.tags.is_none() && self.user_metadata.is_none()
    }
}

/// Integration package a package policy installs
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PackageRef {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A Fleet package policy (an integration attached to an agent policy)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PackagePolicy {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub policy_id: String,
    pub package: PackageRef,
    #[serde(default)]
    pub inputs: serde_json::Value,
    #[serde(default)]
    pub revision: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Body for creating a package policy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPackagePolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub namespace: String,
    /// Agent policy the integration is attached to
    pub policy_id: String,
    pub package: PackageRef,
    pub inputs: serde_json::Value,
}

/// Fields to change on a package policy; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackagePolicyUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub namespace: Option<String>,
    pub inputs: Option<serde_json::Value>,
}

impl PackagePolicyUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge onto an existing package policy, producing the full PUT body.
    pub fn merge_onto(&self, existing: &PackagePolicy) -> PackagePolicyBody {
        PackagePolicyBody {
            name: self.name.clone().unwrap_or_else(|| existing.name.clone()),
            description: self
                .description
                .clone()
                .or_else(|| existing.description.clone()),
            namespace: self
                .namespace
                .clone()
                .unwrap_or_else(|| existing.namespace.clone()),
            policy_id: existing.policy_id.clone(),
            package: existing.package.clone(),
            inputs: self
                .inputs
                .clone()
                .unwrap_or_else(|| existing.inputs.clone()),
        }
    }
}

/// Full body for `PUT /api/fleet/package_policies/{id}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackagePolicyBody {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub namespace: String,
    pub policy_id: String,
    pub package: PackageRef,
    pub inputs: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PackagePolicyList {
    #[serde(default)]
    pub items: Vec<PackagePolicy>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PackagePolicyItem {
    pub item: PackagePolicy,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AgentItem {
    pub item: Agent,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PolicyList {
    #[serde(default)]
    pub items: Vec<AgentPolicy>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PolicyItem {
    pub item: AgentPolicy,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReassignBody<'a> {
    pub policy_id: &'a str,
}

fn policy_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new("^[a-z0-9][a-z0-9_-]*$").expect("static policy id pattern is valid")
    })
}

/// Check a custom policy ID. An empty ID is accepted; Fleet generates one.
pub fn validate_policy_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Ok(());
    }
    if id.len() > MAX_POLICY_ID_LEN {
        return Err(Error::InvalidPolicyId {
            id: id.to_string(),
            reason: format!("exceeds maximum length of {} characters", MAX_POLICY_ID_LEN),
        });
    }
    if !policy_id_pattern().is_match(id) {
        return Err(Error::InvalidPolicyId {
            id: id.to_string(),
            reason: "must contain only lowercase letters, numbers, hyphens, and underscores, \
                     and start with a letter or number"
                .to_string(),
        });
    }
    Ok(())
}
