use super::{or_dash, read_json_file, Context};
use anyhow::{Context as _, Result};
use esctl::{Agent, AgentQuery, AgentUpdate, FleetApi};
use std::path::Path;

const AGENT_HEADERS: [&str; 6] = ["ID", "Policy", "Status", "Type", "Last Checkin", "Tags"];

fn agent_row(a: &Agent) -> Vec<String> {
    vec![
        a.id.clone(),
        or_dash(Some(a.policy_id.as_str())),
        or_dash(a.status.as_deref()),
        or_dash(a.agent_type.as_deref()),
        or_dash(a.last_checkin.as_deref()),
        a.tags.join(","),
    ]
}

pub async fn run_list(ctx: &Context, query: AgentQuery) -> Result<()> {
    let fleet = ctx.fleet()?;
    let page = fleet
        .list_agents(&query)
        .await
        .context("failed to list agents")?;

    let rows: Vec<Vec<String>> = page.items.iter().map(agent_row).collect();
    ctx.formatter.write(&AGENT_HEADERS, &rows)?;
    ctx.formatter.message(&format!(
        "Showing {} of {} agent(s) (page {})",
        page.items.len(),
        page.total,
        query.page
    ));
    Ok(())
}

pub async fn run_reassign(ctx: &Context, agent_id: &str, policy_id: &str) -> Result<()> {
    let fleet = ctx.fleet()?;
    fleet
        .reassign_agent(agent_id, policy_id)
        .await
        .with_context(|| format!("failed to reassign agent {}", agent_id))?;
    ctx.formatter
        .message(&format!("Agent {} reassigned to policy {}", agent_id, policy_id));
    Ok(())
}

pub async fn run_get(ctx: &Context, agent_id: &str) -> Result<()> {
    let fleet = ctx.fleet()?;
    let agent = fleet
        .get_agent(agent_id)
        .await
        .with_context(|| format!("failed to get agent {}", agent_id))?;
    ctx.formatter.write(&AGENT_HEADERS, &[agent_row(&agent)])
}

pub async fn run_update(
    ctx: &Context,
    agent_id: &str,
    tags: Option<Vec<String>>,
    metadata_file: Option<&Path>,
) -> Result<()> {
    let user_metadata = match metadata_file {
        Some(path) => {
            let value = read_json_file(path)?;
            if !value.is_object() {
                anyhow::bail!("{} must contain a JSON object", path.display());
            }
            Some(value)
        }
        None => None,
    };
    let update = AgentUpdate {
        tags,
        user_metadata,
    };
    if update.is_empty() {
        anyhow::bail!("nothing to update: pass --tags and/or --metadata-file");
    }

    let fleet = ctx.fleet()?;
    fleet
        .update_agent(agent_id, &update)
        .await
        .with_context(|| format!("failed to update agent {}", agent_id))?;
    ctx.formatter.message(&format!("Agent {} updated", agent_id));
    Ok(())
}

pub async fn run_delete(ctx: &Context, agent_id: &str, force: bool) -> Result<()> {
    let fleet = ctx.fleet()?;
    fleet
        .delete_agent(agent_id, force)
        .await
        .with_context(|| format!("failed to delete agent {}", agent_id))?;
    ctx.formatter.message(&format!("Agent {} deleted", agent_id));
    Ok(())
}
