use super::Context;
use anyhow::{Context as _, Result};
use esctl::exclusion::ExclusionDimension;
use esctl::{ExclusionCoordinator, ExclusionSet};
use std::sync::Arc;

/// Start (or with `stop`, end) draining a node by name
pub async fn run_drain_server(ctx: &Context, name: &str, stop: bool) -> Result<()> {
    let coord = ExclusionCoordinator::new(Arc::new(ctx.es()?));

    let (action, result) = if stop {
        ("stop draining", coord.fill(name).await)
    } else {
        ("draining", coord.drain(name).await)
    };
    let result = result.with_context(|| format!("failed to {} node {}", action, name))?;

    if !result.changed {
        let state = if stop { "was not being drained" } else { "is already draining" };
        ctx.formatter.message(&format!("Node {} {}", name, state));
    } else {
        ctx.formatter.message(&format!("{} node: {}", action, name));
    }
    print_name_list(ctx, &result.excluded)
}

pub(crate) fn print_name_list(ctx: &Context, names: &[String]) -> Result<()> {
    if names.is_empty() {
        ctx.formatter.message("No nodes are currently being drained");
        return Ok(());
    }
    ctx.formatter.message("Current excluded nodes:");
    let rows: Vec<Vec<String>> = names.iter().map(|n| vec![n.clone()]).collect();
    ctx.formatter.write(&["Node Name"], &rows)
}

/// Show every node currently excluded from allocation
pub async fn run_drain_status(ctx: &Context) -> Result<()> {
    let coord = ExclusionCoordinator::new(Arc::new(ctx.es()?));
    let set = coord
        .exclusion_set()
        .await
        .context("failed to get drain status")?;
    print_exclusion_set(ctx, &set, true)
}

/// One table per non-empty dimension. Names are always reported.
pub(crate) fn print_exclusion_set(ctx: &Context, set: &ExclusionSet, always_names: bool) -> Result<()> {
    for dim in ExclusionDimension::ALL {
        let entries = set.get(dim);
        if entries.is_empty() {
            if dim == ExclusionDimension::Name && always_names {
                ctx.formatter.message("No nodes are excluded by name");
            }
            continue;
        }

        let header = match dim {
            ExclusionDimension::Name => "Node Name",
            ExclusionDimension::Ip => "IP Address",
            ExclusionDimension::Host => "Hostname",
        };
        ctx.formatter.message(&format!("Nodes excluded by {}:", dim));
        let rows: Vec<Vec<String>> = entries.iter().map(|e| vec![e.clone()]).collect();
        ctx.formatter.write(&[header], &rows)?;
    }
    Ok(())
}
