//! Remote state accessors for Elasticsearch and Kibana Fleet
//!
//! The coordinators only see the two traits below. [`EsClient`] and
//! [`FleetClient`] implement them over HTTP; tests substitute in-memory fakes.
//!
//! Every call is a single request with a per-request timeout. Nothing here
//! retries.

mod elasticsearch;
mod fleet;
mod http;

pub use elasticsearch::{ClusterHealth, ClusterInfo, EsClient};
pub use fleet::{FleetClient, KibanaStatus};

use crate::error::Result;
use crate::fleet::{AgentPage, AgentPolicy, AgentQuery};
use crate::settings::{ClusterSettings, SettingsUpdate};
use async_trait::async_trait;

/// Read and write access to `_cluster/settings`
#[async_trait]
pub trait ClusterSettingsApi: Send + Sync {
    /// Fetch persistent and transient settings (and defaults when asked).
    async fn get_settings(&self, include_defaults: bool) -> Result<ClusterSettings>;

    /// Write an update. The cluster replaces each listed key wholesale.
    async fn put_settings(&self, update: &SettingsUpdate) -> Result<()>;
}

/// The Fleet operations the policy deletion cascade depends on
#[async_trait]
pub trait FleetApi: Send + Sync {
    async fn list_agent_policies(&self) -> Result<Vec<AgentPolicy>>;

    async fn list_agents(&self, query: &AgentQuery) -> Result<AgentPage>;

    async fn reassign_agent(&self, agent_id: &str, policy_id: &str) -> Result<()>;

    /// Plain delete. Fleet refuses it while agents still reference the policy.
    async fn delete_agent_policy(&self, policy_id: &str) -> Result<()>;
}
