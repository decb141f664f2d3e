use super::drain::{print_exclusion_set, print_name_list};
use super::Context;
use anyhow::{Context as _, Result};
use esctl::ExclusionCoordinator;
use std::sync::Arc;
use tracing::warn;

/// Make a single drained node eligible for shards again
pub async fn run_fill_server(ctx: &Context, name: &str) -> Result<()> {
    let coord = ExclusionCoordinator::new(Arc::new(ctx.es()?));
    let result = coord
        .fill(name)
        .await
        .with_context(|| format!("failed to fill node {}", name))?;

    if result.changed {
        ctx.formatter.message(&format!("Node {} is no longer excluded from allocation", name));
    } else {
        ctx.formatter.message(&format!("Node {} was not excluded from allocation", name));
    }
    print_name_list(ctx, &result.excluded)
}

/// Remove every persistent exclusion
pub async fn run_fill_all(ctx: &Context) -> Result<()> {
    let coord = ExclusionCoordinator::new(Arc::new(ctx.es()?));
    let remaining = coord
        .fill_all()
        .await
        .context("failed to clear allocation exclusions")?;

    if remaining.is_empty() {
        ctx.formatter.message("All allocation exclusions cleared");
        return Ok(());
    }

    warn!("Some exclusions are still set, most likely as transient settings");
    ctx.formatter
        .message("Warning: these exclusions are still set (transient settings are not cleared):");
    print_exclusion_set(ctx, &remaining, false)
}
