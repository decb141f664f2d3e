//! HTTP accessor for Kibana and its Fleet API

use super::http::{build_client, send, send_json, Endpoint};
use super::FleetApi;
use crate::config::KibanaConfig;
use crate::error::{Error, Result};
use crate::fleet::{
    validate_policy_id, Agent, AgentItem, AgentPage, AgentPolicy, AgentPolicyUpdate, AgentQuery,
    AgentUpdate, NewAgentPolicy, NewPackagePolicy, PackagePolicy, PackagePolicyItem,
    PackagePolicyList, PackagePolicyUpdate, PolicyItem, PolicyList, ReassignBody,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Page size used when listing agent and package policies
const POLICY_PAGE_SIZE: &str = "1000";

const AGENT_POLICIES: &str = "/api/fleet/agent_policies";
const AGENTS: &str = "/api/fleet/agents";
const PACKAGE_POLICIES: &str = "/api/fleet/package_policies";

/// Summary of `GET /api/status`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KibanaStatus {
    #[serde(default)]
    pub name: String,
    pub version: KibanaVersion,
    pub status: KibanaOverall,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KibanaVersion {
    pub number: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KibanaOverall {
    pub overall: KibanaOverallStatus,
}

/// Kibana 8 reports `level`, 7.x reports `state`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KibanaOverallStatus {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl KibanaStatus {
    pub fn overall(&self) -> &str {
        self.status
            .overall
            .level
            .as_deref()
            .or(self.status.overall.state.as_deref())
            .unwrap_or("unknown")
    }
}

/// Kibana client with Fleet methods
pub struct FleetClient {
    http: Client,
    endpoint: Endpoint,
}

impl FleetClient {
    pub fn from_config(config: &KibanaConfig) -> Result<Self> {
        let http = build_client(config.ca_cert.as_deref(), config.insecure)?;
        let endpoint = Endpoint::new(
            &config.addresses,
            config.username.clone(),
            config.password.clone(),
            config.request_timeout(),
        )?;
        debug!(base_url = %endpoint.base_url, "Created Kibana client");
        Ok(Self { http, endpoint })
    }

    pub fn base_url(&self) -> &str {
        &self.endpoint.base_url
    }

    fn request(&self, req: RequestBuilder) -> RequestBuilder {
        self.endpoint
            .prepare(req, self.endpoint.timeout)
            .header("kbn-xsrf", "true")
    }

    pub async fn status(&self) -> Result<KibanaStatus> {
        let req = self.request(self.http.get(self.endpoint.url("/api/status")));
        send_json("get Kibana status", req).await
    }

    /// Create a policy, refusing invalid or already used custom IDs.
    pub async fn create_agent_policy(&self, policy: &NewAgentPolicy) -> Result<AgentPolicy> {
        if let Some(ref id) = policy.id {
            validate_policy_id(id)?;
            let existing = self.list_agent_policies().await?;
            if existing.iter().any(|p| &p.id == id) {
                return Err(Error::PolicyExists(id.clone()));
            }
        }

        let req = self
            .request(self.http.post(self.endpoint.url(AGENT_POLICIES)))
            .json(policy);
        let created: PolicyItem = send_json("create agent policy", req).await?;
        info!(policy_id = %created.item.id, name = %created.item.name, "Created agent policy");
        Ok(created.item)
    }

    /// Update only the provided fields of an existing policy.
    pub async fn update_agent_policy(
        &self,
        policy_id: &str,
        update: &AgentPolicyUpdate,
    ) -> Result<AgentPolicy> {
        let url = self.endpoint.url_for(AGENT_POLICIES, &[policy_id])?;
        let policies = self.list_agent_policies().await?;
        let existing = policies
            .iter()
            .find(|p| p.id == policy_id)
            .ok_or_else(|| Error::PolicyNotFound(policy_id.to_string()))?;

        let body = update.merge_onto(existing);
        let req = self.request(self.http.put(url)).json(&body);
        let updated: PolicyItem = send_json("update agent policy", req).await?;
        info!(policy_id, revision = updated.item.revision, "Updated agent policy");
        Ok(updated.item)
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        let url = self.endpoint.url_for(AGENTS, &[agent_id])?;
        let found: AgentItem = send_json("get agent", self.request(self.http.get(url))).await?;
        Ok(found.item)
    }

    /// Replace an agent's tags and/or user metadata.
    pub async fn update_agent(&self, agent_id: &str, update: &AgentUpdate) -> Result<()> {
        let url = self.endpoint.url_for(AGENTS, &[agent_id])?;
        let req = self.request(self.http.put(url)).json(update);
        send("update agent", req).await?;
        info!(agent_id, "Updated agent");
        Ok(())
    }

    /// Delete an agent. `force` also removes agents that are offline.
    pub async fn delete_agent(&self, agent_id: &str, force: bool) -> Result<()> {
        let url = self.endpoint.url_for(AGENTS, &[agent_id])?;
        let mut req = self.request(self.http.delete(url));
        if force {
            req = req.query(&[("force", "true")]);
        }
        send("delete agent", req).await?;
        info!(agent_id, force, "Deleted agent");
        Ok(())
    }

    pub async fn list_package_policies(&self) -> Result<Vec<PackagePolicy>> {
        let req = self
            .request(self.http.get(self.endpoint.url(PACKAGE_POLICIES)))
            .query(&[("perPage", POLICY_PAGE_SIZE)]);
        let list: PackagePolicyList = send_json("list package policies", req).await?;
        Ok(list.items)
    }

    /// Create a package policy. A custom ID follows the agent policy ID rules
    /// and must not be taken.
    pub async fn create_package_policy(&self, policy: &NewPackagePolicy) -> Result<PackagePolicy> {
        if let Some(ref id) = policy.id {
            validate_policy_id(id)?;
            let existing = self.list_package_policies().await?;
            if existing.iter().any(|p| &p.id == id) {
                return Err(Error::PackagePolicyExists(id.clone()));
            }
        }

        let req = self
            .request(self.http.post(self.endpoint.url(PACKAGE_POLICIES)))
            .json(policy);
        let created: PackagePolicyItem = send_json("create package policy", req).await?;
        info!(
            package_policy_id = %created.item.id,
            package = %created.item.package.name,
            agent_policy = %created.item.policy_id,
            "Created package policy"
        );
        Ok(created.item)
    }

    pub async fn update_package_policy(
        &self,
        package_policy_id: &str,
        update: &PackagePolicyUpdate,
    ) -> Result<PackagePolicy> {
        let url = self.endpoint.url_for(PACKAGE_POLICIES, &[package_policy_id])?;
        let policies = self.list_package_policies().await?;
        let existing = policies
            .iter()
            .find(|p| p.id == package_policy_id)
            .ok_or_else(|| Error::PackagePolicyNotFound(package_policy_id.to_string()))?;

        let body = update.merge_onto(existing);
        let req = self.request(self.http.put(url)).json(&body);
        let updated: PackagePolicyItem = send_json("update package policy", req).await?;
        info!(package_policy_id, revision = updated.item.revision, "Updated package policy");
        Ok(updated.item)
    }

    /// Delete a package policy. `force` deletes it even from managed agent policies.
    pub async fn delete_package_policy(&self, package_policy_id: &str, force: bool) -> Result<()> {
        let url = self.endpoint.url_for(PACKAGE_POLICIES, &[package_policy_id])?;
        let mut req = self.request(self.http.delete(url));
        if force {
            req = req.query(&[("force", "true")]);
        }
        send("delete package policy", req).await?;
        info!(package_policy_id, force, "Deleted package policy");
        Ok(())
    }
}

#[async_trait]
impl FleetApi for FleetClient {
    async fn list_agent_policies(&self) -> Result<Vec<AgentPolicy>> {
        let req = self
            .request(self.http.get(self.endpoint.url(AGENT_POLICIES)))
            .query(&[("perPage", POLICY_PAGE_SIZE)]);
        let list: PolicyList = send_json("list agent policies", req).await?;
        Ok(list.items)
    }

    async fn list_agents(&self, query: &AgentQuery) -> Result<AgentPage> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(ref kuery) = query.kuery {
            params.push(("kuery", kuery.clone()));
        }
        if query.page > 0 {
            params.push(("page", query.page.to_string()));
        }
        if query.per_page > 0 {
            params.push(("perPage", query.per_page.to_string()));
        }
        if query.show_inactive {
            params.push(("showInactive", "true".to_string()));
        }

        let req = self
            .request(self.http.get(self.endpoint.url(AGENTS)))
            .query(&params);
        send_json("list agents", req).await
    }

    async fn reassign_agent(&self, agent_id: &str, policy_id: &str) -> Result<()> {
        let url = self.endpoint.url_for(AGENTS, &[agent_id, "reassign"])?;
        let req = self
            .request(self.http.post(url))
            .json(&ReassignBody { policy_id });
        send("reassign agent", req).await?;
        Ok(())
    }

    async fn delete_agent_policy(&self, policy_id: &str) -> Result<()> {
        let url = self.endpoint.url_for(AGENT_POLICIES, &[policy_id])?;
        send("delete agent policy", self.request(self.http.delete(url))).await?;
        Ok(())
    }
}
