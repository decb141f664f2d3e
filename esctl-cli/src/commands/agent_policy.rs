use super::{or_dash, yes_no, Context};
use anyhow::{Context as _, Result};
use esctl::{AgentPolicy, AgentPolicyUpdate, FleetApi, NewAgentPolicy, PolicyDeletionCoordinator};
use std::sync::Arc;

fn policy_rows(policies: &[AgentPolicy]) -> Vec<Vec<String>> {
    policies
        .iter()
        .map(|p| {
            vec![
                p.id.clone(),
                p.name.clone(),
                p.namespace.clone(),
                or_dash(p.status.as_deref()),
                p.revision.to_string(),
                yes_no(p.is_default),
                yes_no(p.is_managed),
                or_dash(p.updated_at.as_deref()),
            ]
        })
        .collect()
}

const POLICY_HEADERS: [&str; 8] = [
    "ID", "Name", "Namespace", "Status", "Revision", "Default", "Managed", "Updated",
];

pub async fn run_list(ctx: &Context) -> Result<()> {
    let fleet = ctx.fleet()?;
    let policies = fleet
        .list_agent_policies()
        .await
        .context("failed to list agent policies")?;
    ctx.formatter.write(&POLICY_HEADERS, &policy_rows(&policies))
}

pub async fn run_create(ctx: &Context, policy: NewAgentPolicy) -> Result<()> {
    let fleet = ctx.fleet()?;
    let created = fleet
        .create_agent_policy(&policy)
        .await
        .context("failed to create agent policy")?;
    ctx.formatter.message("Agent policy created");
    ctx.formatter.write(&POLICY_HEADERS, &policy_rows(&[created]))
}

pub async fn run_update(ctx: &Context, policy_id: &str, update: AgentPolicyUpdate) -> Result<()> {
    if update == AgentPolicyUpdate::default() {
        anyhow::bail!("nothing to update: pass at least one of --name, --namespace, --description, --monitoring");
    }
    let fleet = ctx.fleet()?;
    let updated = fleet
        .update_agent_policy(policy_id, &update)
        .await
        .with_context(|| format!("failed to update agent policy {}", policy_id))?;
    ctx.formatter.message("Agent policy updated");
    ctx.formatter.write(&POLICY_HEADERS, &policy_rows(&[updated]))
}

/// Delete a policy; with `force`, bound agents move to the default policy first
pub async fn run_delete(ctx: &Context, policy_id: &str, force: bool) -> Result<()> {
    let coord = PolicyDeletionCoordinator::new(Arc::new(ctx.fleet()?));
    let outcome = coord
        .delete_policy(policy_id, force)
        .await
        .with_context(|| format!("failed to delete agent policy {}", policy_id))?;

    if let Some(ref target) = outcome.reassigned_to {
        ctx.formatter.message(&format!(
            "Reassigned {} agent(s) to default policy {}",
            outcome.reassigned_agents.len(),
            target
        ));
    }
    ctx.formatter
        .message(&format!("Agent policy {} deleted", outcome.policy_id));
    Ok(())
}
