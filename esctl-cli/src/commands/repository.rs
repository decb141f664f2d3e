use super::Context;
use anyhow::{Context as _, Result};
use esctl::snapshot::parse_repository_settings;
use esctl::NewRepository;

pub async fn run_list(ctx: &Context) -> Result<()> {
    let es = ctx.es()?;
    let repos = es
        .list_repositories()
        .await
        .context("failed to list snapshot repositories")?;
    let rows: Vec<Vec<String>> = repos
        .iter()
        .map(|(name, repo)| vec![name.clone(), repo.repo_type.clone(), repo.settings_summary()])
        .collect();
    ctx.formatter.write(&["Name", "Type", "Settings"], &rows)
}

pub async fn run_register(
    ctx: &Context,
    name: &str,
    repo_type: &str,
    settings: &[String],
    verify: bool,
) -> Result<()> {
    let repo = NewRepository {
        name: name.to_string(),
        repo_type: repo_type.to_string(),
        settings: parse_repository_settings(settings)?,
        verify,
    };
    let es = ctx.es()?;
    es.create_repository(&repo)
        .await
        .with_context(|| format!("failed to register repository {}", name))?;
    ctx.formatter
        .message(&format!("Repository {} registered ({})", name, repo_type));
    Ok(())
}

pub async fn run_verify(ctx: &Context, name: &str) -> Result<()> {
    let es = ctx.es()?;
    let nodes = es
        .verify_repository(name)
        .await
        .with_context(|| format!("failed to verify repository {}", name))?;
    let rows: Vec<Vec<String>> = nodes
        .iter()
        .map(|(id, node)| vec![id.clone(), node.name.clone()])
        .collect();
    ctx.formatter
        .message(&format!("Repository {} verified on {} node(s)", name, rows.len()));
    ctx.formatter.write(&["Node ID", "Node Name"], &rows)
}

pub async fn run_remove(ctx: &Context, name: &str) -> Result<()> {
    let es = ctx.es()?;
    es.delete_repository(name)
        .await
        .with_context(|| format!("failed to remove repository {}", name))?;
    ctx.formatter.message(&format!("Repository {} removed", name));
    Ok(())
}
