//! In-memory stand-in for a cluster and its Fleet, shared by integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use esctl::client::{ClusterSettingsApi, FleetApi};
use esctl::fleet::{Agent, AgentPage, AgentPolicy, AgentQuery, MAX_AGENT_RESULT_WINDOW};
use esctl::settings::{ClusterSettings, SettingValue, SettingsUpdate};
use esctl::{Error, Result};
use parking_lot::Mutex;

#[derive(Default)]
struct State {
    settings: ClusterSettings,
    policies: Vec<AgentPolicy>,
    agents: Vec<Agent>,
    calls: Vec<String>,
    fail_reassign_for: Option<String>,
    fail_put: bool,
    page_limit: Option<u32>,
}

/// Fake remote implementing both accessor traits.
///
/// Every call is recorded in order so tests can assert on what was sent.
#[derive(Default)]
pub struct FakeRemote {
    state: Mutex<State>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_persistent(self, key: &str, value: &str) -> Self {
        self.state
            .lock()
            .settings
            .persistent
            .insert(key.to_string(), SettingValue::Text(value.to_string()));
        self
    }

    pub fn with_transient(self, key: &str, value: &str) -> Self {
        self.state
            .lock()
            .settings
            .transient
            .insert(key.to_string(), SettingValue::Text(value.to_string()));
        self
    }

    pub fn with_policy(self, id: &str, is_default: bool) -> Self {
        self.state.lock().policies.push(policy(id, is_default));
        self
    }

    pub fn with_agents(self, policy_id: &str, ids: &[&str]) -> Self {
        {
            let mut state = self.state.lock();
            for id in ids {
                state.agents.push(agent(id, policy_id));
            }
        }
        self
    }

    /// Agents that Fleet only lists when `showInactive=true`.
    pub fn with_inactive_agents(self, policy_id: &str, ids: &[&str]) -> Self {
        {
            let mut state = self.state.lock();
            for id in ids {
                let mut inactive = agent(id, policy_id);
                inactive.status = Some("inactive".to_string());
                state.agents.push(inactive);
            }
        }
        self
    }

    /// Serve at most `limit` agents per page whatever page size is asked for.
    pub fn with_page_limit(self, limit: u32) -> Self {
        self.state.lock().page_limit = Some(limit);
        self
    }

    pub fn with_agent_count(self, policy_id: &str, count: usize) -> Self {
        {
            let mut state = self.state.lock();
            for i in 0..count {
                state.agents.push(agent(&format!("agent-{:05}", i), policy_id));
            }
        }
        self
    }

    pub fn fail_reassign_for(self, agent_id: &str) -> Self {
        self.state.lock().fail_reassign_for = Some(agent_id.to_string());
        self
    }

    /// Let previously failing reassignments succeed from now on.
    pub fn heal(&self) {
        self.state.lock().fail_reassign_for = None;
    }

    pub fn fail_put(self) -> Self {
        self.state.lock().fail_put = true;
        self
    }

    pub fn settings(&self) -> ClusterSettings {
        self.state.lock().settings.clone()
    }

    pub fn agent_policy_of(&self, agent_id: &str) -> Option<String> {
        self.state
            .lock()
            .agents
            .iter()
            .find(|a| a.id == agent_id)
            .map(|a| a.policy_id.clone())
    }

    pub fn agents_on(&self, policy_id: &str) -> usize {
        self.state
            .lock()
            .agents
            .iter()
            .filter(|a| a.policy_id == policy_id)
            .count()
    }

    pub fn has_policy(&self, id: &str) -> bool {
        self.state.lock().policies.iter().any(|p| p.id == id)
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

pub fn policy(id: &str, is_default: bool) -> AgentPolicy {
    AgentPolicy {
        id: id.to_string(),
        name: id.to_string(),
        namespace: "default".to_string(),
        description: None,
        status: Some("active".to_string()),
        revision: 1,
        updated_at: None,
        monitoring_enabled: vec![],
        is_default,
        is_managed: false,
    }
}

pub fn agent(id: &str, policy_id: &str) -> Agent {
    Agent {
        id: id.to_string(),
        policy_id: policy_id.to_string(),
        status: Some("online".to_string()),
        agent_type: Some("PERMANENT".to_string()),
        last_checkin: None,
        enrolled_at: None,
        tags: vec![],
    }
}

fn remote_error(operation: &'static str, status: u16, message: &str) -> Error {
    Error::Remote {
        operation,
        status: Some(status),
        message: message.to_string(),
    }
}

/// Extract the policy id from a `policy_id:"<id>"` kuery, undoing escapes.
fn kuery_policy(kuery: &str) -> Option<String> {
    let quoted = kuery
        .strip_prefix("policy_id:\"")?
        .strip_suffix('"')?;
    let mut id = String::new();
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            id.extend(chars.next());
        } else {
            id.push(c);
        }
    }
    Some(id)
}

fn is_inactive(agent: &Agent) -> bool {
    matches!(agent.status.as_deref(), Some("inactive" | "unenrolled"))
}

#[async_trait]
impl ClusterSettingsApi for FakeRemote {
    async fn get_settings(&self, _include_defaults: bool) -> Result<ClusterSettings> {
        let mut state = self.state.lock();
        state.calls.push("get_settings".to_string());
        Ok(state.settings.clone())
    }

    async fn put_settings(&self, update: &SettingsUpdate) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(format!(
            "put_settings {}",
            serde_json::to_string(update).unwrap_or_default()
        ));
        if state.fail_put {
            return Err(remote_error("update cluster settings", 503, "cluster unavailable"));
        }
        state.settings.apply(update);
        Ok(())
    }
}

#[async_trait]
impl FleetApi for FakeRemote {
    async fn list_agent_policies(&self) -> Result<Vec<AgentPolicy>> {
        let mut state = self.state.lock();
        state.calls.push("list_agent_policies".to_string());
        Ok(state.policies.clone())
    }

    async fn list_agents(&self, query: &AgentQuery) -> Result<AgentPage> {
        let mut state = self.state.lock();
        state.calls.push(format!("list_agents page={}", query.page));

        let filter = query.kuery.as_deref().and_then(kuery_policy);
        let matching: Vec<Agent> = state
            .agents
            .iter()
            .filter(|a| filter.as_deref().map_or(true, |p| a.policy_id == p))
            .filter(|a| query.show_inactive || !is_inactive(a))
            .cloned()
            .collect();

        let per_page = state
            .page_limit
            .map_or(query.per_page, |limit| query.per_page.min(limit))
            .max(1);
        let page = query.page.max(1);
        if u64::from(page) * u64::from(per_page) > MAX_AGENT_RESULT_WINDOW {
            return Err(remote_error(
                "list agents",
                400,
                "Result window is too large, from + size must be less than or equal to: [10000]",
            ));
        }
        let start = (page as usize - 1) * per_page as usize;
        let items = matching
            .iter()
            .skip(start)
            .take(per_page as usize)
            .cloned()
            .collect();

        Ok(AgentPage {
            items,
            total: matching.len() as u64,
            page,
            per_page,
        })
    }

    async fn reassign_agent(&self, agent_id: &str, policy_id: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(format!("reassign {} -> {}", agent_id, policy_id));
        if state.fail_reassign_for.as_deref() == Some(agent_id) {
            return Err(remote_error("reassign agent", 500, "agent is unenrolling"));
        }
        match state.agents.iter_mut().find(|a| a.id == agent_id) {
            Some(agent) => {
                agent.policy_id = policy_id.to_string();
                Ok(())
            }
            None => Err(remote_error("reassign agent", 404, "agent not found")),
        }
    }

    async fn delete_agent_policy(&self, policy_id: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(format!("delete {}", policy_id));
        if state.agents.iter().any(|a| a.policy_id == policy_id) {
            return Err(remote_error(
                "delete agent policy",
                400,
                "Cannot delete an agent policy that is assigned to any active or inactive agents",
            ));
        }
        let before = state.policies.len();
        state.policies.retain(|p| p.id != policy_id);
        if state.policies.len() == before {
            return Err(remote_error("delete agent policy", 404, "Agent policy not found"));
        }
        Ok(())
    }
}
