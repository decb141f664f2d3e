use super::{or_dash, read_json_file, Context};
use anyhow::{Context as _, Result};
use esctl::{NewPackagePolicy, PackagePolicy, PackagePolicyUpdate};
use serde_json::Value;
use std::path::Path;

const PACKAGE_POLICY_HEADERS: [&str; 6] =
    ["ID", "Name", "Package", "Version", "Agent Policy", "Revision"];

fn package_policy_rows(policies: &[PackagePolicy]) -> Vec<Vec<String>> {
    policies
        .iter()
        .map(|p| {
            vec![
                p.id.clone(),
                p.name.clone(),
                p.package.name.clone(),
                p.package.version.clone(),
                or_dash(Some(p.policy_id.as_str())),
                p.revision.to_string(),
            ]
        })
        .collect()
}

/// Integration inputs from a JSON file holding either a full package policy
/// (its `inputs` field is used) or the inputs alone.
pub fn read_inputs(path: &Path) -> Result<Value> {
    let value = read_json_file(path)?;
    Ok(match value {
        Value::Object(mut map) if map.contains_key("inputs") => {
            map.remove("inputs").unwrap_or(Value::Null)
        }
        other => other,
    })
}

pub async fn run_list(ctx: &Context) -> Result<()> {
    let fleet = ctx.fleet()?;
    let policies = fleet
        .list_package_policies()
        .await
        .context("failed to list package policies")?;
    ctx.formatter
        .write(&PACKAGE_POLICY_HEADERS, &package_policy_rows(&policies))
}

pub async fn run_create(
    ctx: &Context,
    mut policy: NewPackagePolicy,
    config_json: Option<&Path>,
) -> Result<()> {
    if let Some(path) = config_json {
        policy.inputs = read_inputs(path)?;
    }
    let fleet = ctx.fleet()?;
    let created = fleet
        .create_package_policy(&policy)
        .await
        .context("failed to create package policy")?;
    ctx.formatter.message("Package policy created");
    ctx.formatter
        .write(&PACKAGE_POLICY_HEADERS, &package_policy_rows(&[created]))
}

pub async fn run_update(
    ctx: &Context,
    package_policy_id: &str,
    mut update: PackagePolicyUpdate,
    config_json: Option<&Path>,
) -> Result<()> {
    if let Some(path) = config_json {
        update.inputs = Some(read_inputs(path)?);
    }
    if update.is_empty() {
        anyhow::bail!(
            "nothing to update: pass at least one of --name, --description, --namespace, --config-json"
        );
    }
    let fleet = ctx.fleet()?;
    let updated = fleet
        .update_package_policy(package_policy_id, &update)
        .await
        .with_context(|| format!("failed to update package policy {}", package_policy_id))?;
    ctx.formatter.message("Package policy updated");
    ctx.formatter
        .write(&PACKAGE_POLICY_HEADERS, &package_policy_rows(&[updated]))
}

pub async fn run_delete(ctx: &Context, package_policy_id: &str, force: bool) -> Result<()> {
    let fleet = ctx.fleet()?;
    fleet
        .delete_package_policy(package_policy_id, force)
        .await
        .with_context(|| format!("failed to delete package policy {}", package_policy_id))?;
    ctx.formatter
        .message(&format!("Package policy {} deleted", package_policy_id));
    Ok(())
}
