//! Agent policy deletion with reassignment of bound agents
//!
//! Fleet refuses to delete a policy that agents still reference, active or
//! inactive. A forced deletion therefore moves every bound agent to the
//! default policy first and only then deletes. The steps are not
//! transactional: if a reassignment fails the agents already moved stay
//! moved, the rest keep the old policy, and the policy is not deleted.
//! Running the same deletion again picks up where the failed run stopped.
//!
//! Agents are listed page by page until the listed count reaches the total
//! Fleet reports. The agents index serves at most
//! [`MAX_AGENT_RESULT_WINDOW`] results per query, so a policy with more
//! agents is emptied in passes: list what the window allows, move those
//! agents, list again.

use crate::client::FleetApi;
use crate::error::{Error, Result};
use crate::fleet::{AgentPolicy, AgentQuery, MAX_AGENT_RESULT_WINDOW};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a successful deletion did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionOutcome {
    pub policy_id: String,
    /// Policy the bound agents were moved to (forced deletions only)
    pub reassigned_to: Option<String>,
    pub reassigned_agents: Vec<String>,
}

/// Agents bound to a policy as seen by one listing pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundAgents {
    pub ids: Vec<String>,
    /// Matching total reported by Fleet
    pub total: u64,
    /// The pass hit the result window before listing `total` agents
    pub truncated: bool,
}

pub struct PolicyDeletionCoordinator {
    api: Arc<dyn FleetApi>,
}

impl PolicyDeletionCoordinator {
    pub fn new(api: Arc<dyn FleetApi>) -> Self {
        Self { api }
    }

    /// Delete `policy_id`.
    ///
    /// Without `force` the delete is sent as is and a refusal comes back as
    /// `Error::Remote` carrying Fleet's status and body. With `force` bound
    /// agents are reassigned to the default policy first; the default policy
    /// itself cannot be force-deleted.
    pub async fn delete_policy(&self, policy_id: &str, force: bool) -> Result<DeletionOutcome> {
        if !force {
            self.api.delete_agent_policy(policy_id).await?;
            info!(policy_id, "Deleted agent policy");
            return Ok(DeletionOutcome {
                policy_id: policy_id.to_string(),
                reassigned_to: None,
                reassigned_agents: Vec::new(),
            });
        }

        let default = self.find_default_policy().await?;
        if default.id == policy_id {
            return Err(Error::CannotDeleteDefaultPolicy(policy_id.to_string()));
        }

        let mut reassigned: Vec<String> = Vec::new();
        let mut moved: HashSet<String> = HashSet::new();
        loop {
            let pass = self.list_bound_agents(policy_id).await?;
            let pending: Vec<String> = pass
                .ids
                .into_iter()
                .filter(|id| !moved.contains(id))
                .collect();
            info!(
                policy_id,
                default_policy = %default.id,
                agents = pending.len(),
                total = pass.total,
                "Reassigning agents before deleting policy"
            );

            for (done, agent_id) in pending.iter().enumerate() {
                if let Err(err) = self.api.reassign_agent(agent_id, &default.id).await {
                    warn!(
                        policy_id,
                        agent_id = %agent_id,
                        reassigned = reassigned.len(),
                        remaining = pending.len() - done,
                        error = %err,
                        "Reassignment failed; policy was not deleted"
                    );
                    return Err(err);
                }
                debug!(agent_id = %agent_id, to = %default.id, "Reassigned agent");
                moved.insert(agent_id.clone());
                reassigned.push(agent_id.clone());
            }

            if !pass.truncated || pending.is_empty() {
                break;
            }
        }

        self.api.delete_agent_policy(policy_id).await?;
        info!(policy_id, reassigned = reassigned.len(), "Deleted agent policy");

        Ok(DeletionOutcome {
            policy_id: policy_id.to_string(),
            reassigned_to: Some(default.id),
            reassigned_agents: reassigned,
        })
    }

    /// The policy flagged `is_default`, if exactly one can be found.
    pub async fn find_default_policy(&self) -> Result<AgentPolicy> {
        let policies = self.api.list_agent_policies().await?;
        let mut defaults = policies.into_iter().filter(|p| p.is_default);
        let default = defaults.next().ok_or(Error::NoDefaultPolicy)?;
        if let Some(other) = defaults.next() {
            warn!(
                chosen = %default.id,
                other = %other.id,
                "More than one agent policy is marked default"
            );
        }
        Ok(default)
    }

    /// IDs of the agents bound to `policy_id` that one listing pass can reach.
    pub async fn find_bound_agents(&self, policy_id: &str) -> Result<Vec<String>> {
        Ok(self.list_bound_agents(policy_id).await?.ids)
    }

    /// Walk the pages until the listed count reaches the reported total, a
    /// page comes back empty, or the next page would leave the result window.
    pub async fn list_bound_agents(&self, policy_id: &str) -> Result<BoundAgents> {
        let mut query = AgentQuery::bound_to(policy_id);
        let mut seen: HashSet<String> = HashSet::new();
        let mut ids = Vec::new();
        let mut listed: u64 = 0;

        loop {
            let page = self.api.list_agents(&query).await?;
            let fetched = page.items.len();
            listed += fetched as u64;
            for agent in page.items {
                let bound = agent.policy_id.is_empty() || agent.policy_id == policy_id;
                if bound && seen.insert(agent.id.clone()) {
                    ids.push(agent.id);
                }
            }
            debug!(policy_id, page = query.page, fetched, listed, total = page.total, "Listed bound agents");

            if fetched == 0 || listed >= page.total {
                return Ok(BoundAgents {
                    ids,
                    total: page.total,
                    truncated: false,
                });
            }

            let next = query.next_page();
            if !next.within_result_window() {
                warn!(
                    policy_id,
                    listed,
                    total = page.total,
                    window = MAX_AGENT_RESULT_WINDOW,
                    "Agent listing reached the result window; remaining agents need another pass"
                );
                return Ok(BoundAgents {
                    ids,
                    total: page.total,
                    truncated: true,
                });
            }
            query = next;
        }
    }
}
