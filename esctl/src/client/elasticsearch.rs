//! HTTP accessor for the Elasticsearch REST API

use super::http::{build_client, decode, send, send_json, Endpoint};
use super::ClusterSettingsApi;
use crate::allocation::{AllocationExplanation, ExplainRequest};
use crate::config::ElasticsearchConfig;
use crate::error::{Error, Result};
use crate::settings::{ClusterSettings, SettingsUpdate};
use crate::snapshot::{
    CreatedSnapshot, NewRepository, NewSnapshot, RepositoryInfo, RestoreRequest, SnapshotInfo,
    SnapshotList, VerifiedNode, VerifyResponse,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// `GET /` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub cluster_uuid: String,
    pub version: VersionInfo,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VersionInfo {
    pub number: String,
}

/// One row of `_cat/health?format=json`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterHealth {
    pub status: String,
    #[serde(rename = "node.total")]
    pub node_total: String,
    #[serde(rename = "node.data")]
    pub node_data: String,
    pub shards: String,
    pub pri: String,
    pub relo: String,
    pub init: String,
    pub unassign: String,
}

/// Elasticsearch client
pub struct EsClient {
    http: Client,
    endpoint: Endpoint,
    slow_timeout: Duration,
}

impl EsClient {
    pub fn from_config(config: &ElasticsearchConfig) -> Result<Self> {
        let http = build_client(config.ca_cert.as_deref(), config.insecure)?;
        let endpoint = Endpoint::new(
            &config.addresses,
            config.username.clone(),
            config.password.clone(),
            config.request_timeout(),
        )?;
        debug!(base_url = %endpoint.base_url, "Created Elasticsearch client");
        Ok(Self {
            http,
            endpoint,
            slow_timeout: config.slow_request_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.endpoint.base_url
    }

    /// Cluster name and version
    pub async fn info(&self) -> Result<ClusterInfo> {
        let req = self.endpoint.prepare(
            self.http.get(self.endpoint.url("/")),
            self.endpoint.timeout,
        );
        send_json("get cluster info", req).await
    }

    pub async fn cat_health(&self) -> Result<ClusterHealth> {
        let req = self
            .endpoint
            .prepare(
                self.http.get(self.endpoint.url("/_cat/health")),
                self.endpoint.timeout,
            )
            .query(&[
                ("format", "json"),
                ("h", "status,node.total,node.data,shards,pri,relo,init,unassign"),
            ]);
        let rows: Vec<ClusterHealth> = send_json("get cluster health", req).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::decode("get cluster health", "no health data returned"))
    }

    /// Explain why a shard is (or is not) allocated where it is.
    ///
    /// The request is validated before anything is sent.
    pub async fn allocation_explain(
        &self,
        request: &ExplainRequest,
    ) -> Result<AllocationExplanation> {
        let body = request.body()?;
        let url = self.endpoint.url("/_cluster/allocation/explain");
        let req = match body {
            Some(body) => self.http.post(url).json(&body),
            None => self.http.get(url),
        };
        let req = self.endpoint.prepare(req, self.slow_timeout);
        send_json("explain shard allocation", req).await
    }

    pub async fn list_repositories(&self) -> Result<BTreeMap<String, RepositoryInfo>> {
        let req = self.endpoint.prepare(
            self.http.get(self.endpoint.url("/_snapshot")),
            self.endpoint.timeout,
        );
        send_json("list snapshot repositories", req).await
    }

    /// Register a repository; with `verify` the cluster checks it on every node.
    pub async fn create_repository(&self, repo: &NewRepository) -> Result<()> {
        let url = self.endpoint.url_for("/_snapshot", &[&repo.name])?;
        let verify = if repo.verify { "true" } else { "false" };
        let req = self
            .endpoint
            .prepare(self.http.put(url), self.slow_timeout)
            .query(&[("verify", verify)])
            .json(&repo.body());
        send("create snapshot repository", req).await?;
        info!(repository = %repo.name, repo_type = %repo.repo_type, "Registered snapshot repository");
        Ok(())
    }

    pub async fn delete_repository(&self, name: &str) -> Result<()> {
        let url = self.endpoint.url_for("/_snapshot", &[name])?;
        let req = self.endpoint.prepare(self.http.delete(url), self.endpoint.timeout);
        send("delete snapshot repository", req).await?;
        info!(repository = name, "Removed snapshot repository");
        Ok(())
    }

    /// Nodes that could reach the repository, keyed by node ID.
    pub async fn verify_repository(&self, name: &str) -> Result<BTreeMap<String, VerifiedNode>> {
        let url = self.endpoint.url_for("/_snapshot", &[name, "_verify"])?;
        let req = self.endpoint.prepare(self.http.post(url), self.slow_timeout);
        let verified: VerifyResponse = send_json("verify snapshot repository", req).await?;
        if verified.nodes.is_empty() {
            return Err(Error::decode(
                "verify snapshot repository",
                "no nodes responded",
            ));
        }
        Ok(verified.nodes)
    }

    pub async fn list_snapshots(&self, repository: &str) -> Result<Vec<SnapshotInfo>> {
        let url = self.endpoint.url_for("/_snapshot", &[repository, "_all"])?;
        let req = self.endpoint.prepare(self.http.get(url), self.endpoint.timeout);
        let list: SnapshotList = send_json("list snapshots", req).await?;
        Ok(list.snapshots)
    }

    /// Start a snapshot. Only a waited-for snapshot comes back with its details.
    pub async fn create_snapshot(&self, snapshot: &NewSnapshot) -> Result<Option<SnapshotInfo>> {
        let url = self
            .endpoint
            .url_for("/_snapshot", &[&snapshot.repository, &snapshot.name])?;
        let wait = if snapshot.wait_for_completion { "true" } else { "false" };
        let req = self
            .endpoint
            .prepare(self.http.put(url), self.slow_timeout)
            .query(&[("wait_for_completion", wait)])
            .json(&snapshot.body());
        let body = send("create snapshot", req).await?;
        info!(
            repository = %snapshot.repository,
            snapshot = %snapshot.name,
            wait = snapshot.wait_for_completion,
            "Started snapshot"
        );

        if !snapshot.wait_for_completion {
            return Ok(None);
        }
        let created: CreatedSnapshot = decode("create snapshot", &body)?;
        Ok(Some(created.snapshot))
    }

    pub async fn delete_snapshot(&self, repository: &str, name: &str) -> Result<()> {
        let url = self.endpoint.url_for("/_snapshot", &[repository, name])?;
        let req = self.endpoint.prepare(self.http.delete(url), self.slow_timeout);
        send("delete snapshot", req).await?;
        info!(repository, snapshot = name, "Deleted snapshot");
        Ok(())
    }

    /// Restore a snapshot. The request is validated before anything is sent.
    pub async fn restore_snapshot(&self, restore: &RestoreRequest) -> Result<()> {
        let body = restore.body()?;
        let url = self
            .endpoint
            .url_for("/_snapshot", &[&restore.repository, &restore.name, "_restore"])?;
        let wait = if restore.wait_for_completion { "true" } else { "false" };
        let req = self
            .endpoint
            .prepare(self.http.post(url), self.slow_timeout)
            .query(&[("wait_for_completion", wait)])
            .json(&body);
        send("restore snapshot", req).await?;
        info!(repository = %restore.repository, snapshot = %restore.name, "Restore started");
        Ok(())
    }
}

#[async_trait]
impl ClusterSettingsApi for EsClient {
    async fn get_settings(&self, include_defaults: bool) -> Result<ClusterSettings> {
        let include_defaults = if include_defaults { "true" } else { "false" };
        let req = self
            .endpoint
            .prepare(
                self.http.get(self.endpoint.url("/_cluster/settings")),
                self.endpoint.timeout,
            )
            .query(&[
                ("flat_settings", "true"),
                ("include_defaults", include_defaults),
            ]);
        send_json("get cluster settings", req).await
    }

    async fn put_settings(&self, update: &SettingsUpdate) -> Result<()> {
        let req = self
            .endpoint
            .prepare(
                self.http.put(self.endpoint.url("/_cluster/settings")),
                self.endpoint.timeout,
            )
            .json(update);
        send("update cluster settings", req).await?;
        Ok(())
    }
}
