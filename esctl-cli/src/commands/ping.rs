use super::Context;
use anyhow::{Context as _, Result};

pub async fn run_ping_es(ctx: &Context) -> Result<()> {
    let es = ctx.es()?;
    let info = es
        .info()
        .await
        .with_context(|| format!("failed to reach Elasticsearch at {}", es.base_url()))?;
    let health = es
        .cat_health()
        .await
        .context("failed to get cluster health")?;

    ctx.formatter.write(
        &[
            "Cluster", "Version", "Status", "Nodes", "Data Nodes", "Shards", "Primaries",
            "Relocating", "Initializing", "Unassigned",
        ],
        &[vec![
            info.cluster_name,
            info.version.number,
            health.status,
            health.node_total,
            health.node_data,
            health.shards,
            health.pri,
            health.relo,
            health.init,
            health.unassign,
        ]],
    )
}

pub async fn run_ping_kibana(ctx: &Context) -> Result<()> {
    let fleet = ctx.fleet()?;
    let status = fleet
        .status()
        .await
        .with_context(|| format!("failed to reach Kibana at {}", fleet.base_url()))?;

    ctx.formatter.write(
        &["Name", "Version", "Status"],
        &[vec![
            status.name.clone(),
            status.version.number.clone(),
            status.overall().to_string(),
        ]],
    )
}
