use super::{or_dash, yes_no, Context};
use anyhow::{Context as _, Result};
use esctl::snapshot::SnapshotInfo;
use esctl::{NewSnapshot, RestoreRequest};

const SNAPSHOT_HEADERS: [&str; 7] = [
    "Snapshot", "State", "Indices", "Global State", "Start", "Duration (ms)", "Shards OK/Total",
];

fn snapshot_row(s: &SnapshotInfo) -> Vec<String> {
    vec![
        s.snapshot.clone(),
        or_dash(s.state.as_deref()),
        s.indices.len().to_string(),
        yes_no(s.include_global_state),
        or_dash(s.start_time.as_deref()),
        s.duration_in_millis.to_string(),
        format!("{}/{}", s.shards.successful, s.shards.total),
    ]
}

pub async fn run_list(ctx: &Context, repository: &str) -> Result<()> {
    let es = ctx.es()?;
    let snapshots = es
        .list_snapshots(repository)
        .await
        .with_context(|| format!("failed to list snapshots in {}", repository))?;
    let rows: Vec<Vec<String>> = snapshots.iter().map(snapshot_row).collect();
    ctx.formatter.write(&SNAPSHOT_HEADERS, &rows)
}

pub async fn run_create(ctx: &Context, snapshot: NewSnapshot) -> Result<()> {
    let es = ctx.es()?;
    let created = es
        .create_snapshot(&snapshot)
        .await
        .with_context(|| format!("failed to create snapshot {}", snapshot.name))?;
    match created {
        Some(info) => {
            ctx.formatter.message("Snapshot completed");
            ctx.formatter.write(&SNAPSHOT_HEADERS, &[snapshot_row(&info)])
        }
        None => {
            ctx.formatter.message(&format!(
                "Snapshot {} started in repository {}",
                snapshot.name, snapshot.repository
            ));
            Ok(())
        }
    }
}

pub async fn run_delete(ctx: &Context, repository: &str, name: &str) -> Result<()> {
    let es = ctx.es()?;
    es.delete_snapshot(repository, name)
        .await
        .with_context(|| format!("failed to delete snapshot {}", name))?;
    ctx.formatter
        .message(&format!("Snapshot {} deleted from {}", name, repository));
    Ok(())
}

pub async fn run_restore(ctx: &Context, restore: RestoreRequest) -> Result<()> {
    let es = ctx.es()?;
    es.restore_snapshot(&restore)
        .await
        .with_context(|| format!("failed to restore snapshot {}", restore.name))?;
    let verb = if restore.wait_for_completion { "restored" } else { "restore started" };
    ctx.formatter
        .message(&format!("Snapshot {} {}", restore.name, verb));
    Ok(())
}
