use super::{or_dash, Context};
use anyhow::{Context as _, Result};
use esctl::allocation::{self, AllocationStatus, ExplainRequest};
use esctl::OutputFormat;

pub async fn run_status(ctx: &Context) -> Result<()> {
    let es = ctx.es()?;
    let (status, source) = allocation::get_status(&es)
        .await
        .context("failed to get allocation status")?;
    let source = source.map(|s| s.to_string()).unwrap_or_else(|| "built-in".to_string());
    ctx.formatter
        .write(&["Allocation", "Source"], &[vec![status.to_string(), source]])
}

/// Validates `status` locally before anything is sent.
pub async fn run_set(ctx: &Context, status: &str) -> Result<()> {
    let status: AllocationStatus = status.parse()?;
    let es = ctx.es()?;
    allocation::set_status(&es, status)
        .await
        .context("failed to set allocation status")?;
    ctx.formatter
        .message(&format!("Shard allocation set to {}", status));
    Ok(())
}

pub async fn run_explain(ctx: &Context, request: ExplainRequest) -> Result<()> {
    // Checked before the client is built so bad flags fail without a connection
    request.body()?;
    let es = ctx.es()?;
    let explanation = es
        .allocation_explain(&request)
        .await
        .context("failed to explain shard allocation")?;

    if ctx.formatter.format() == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&explanation)?);
        return Ok(());
    }

    ctx.formatter.write(
        &["Index", "Shard", "Primary", "State", "Node", "Can Allocate", "Reason"],
        &[vec![
            explanation.index.clone(),
            explanation.shard.to_string(),
            explanation.primary.to_string(),
            explanation.current_state.clone(),
            or_dash(explanation.current_node.as_ref().map(|n| n.name.as_str())),
            or_dash(explanation.can_allocate.as_deref()),
            or_dash(explanation.reason()),
        ]],
    )?;

    let rows: Vec<Vec<String>> = explanation
        .node_allocation_decisions
        .iter()
        .flat_map(|node| {
            node.deciders.iter().map(move |d| {
                vec![
                    node.node_name.clone(),
                    node.node_decision.clone(),
                    d.decider.clone(),
                    d.decision.clone(),
                    d.explanation.clone(),
                ]
            })
        })
        .collect();
    if !rows.is_empty() {
        ctx.formatter.message("");
        ctx.formatter
            .write(&["Node", "Decision", "Decider", "Result", "Explanation"], &rows)?;
    }
    Ok(())
}
