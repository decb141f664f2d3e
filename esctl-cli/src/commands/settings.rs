use super::Context;
use anyhow::{Context as _, Result};
use esctl::settings::{self, SettingScope};
use esctl::ClusterSettingsApi;

pub async fn run_list(ctx: &Context, include_defaults: bool) -> Result<()> {
    let es = ctx.es()?;
    let all = es
        .get_settings(include_defaults)
        .await
        .context("failed to get cluster settings")?;

    let mut rows = Vec::new();
    for (source, section) in [
        ("transient", &all.transient),
        ("persistent", &all.persistent),
        ("default", &all.defaults),
    ] {
        for (name, value) in section {
            rows.push(vec![name.clone(), value.to_string(), source.to_string()]);
        }
    }
    ctx.formatter.write(&["Setting", "Value", "Source"], &rows)
}

pub async fn run_get(ctx: &Context, name: &str, include_defaults: bool) -> Result<()> {
    let es = ctx.es()?;
    let (value, source) = settings::get_setting(&es, name, include_defaults)
        .await
        .with_context(|| format!("failed to get setting {}", name))?;
    ctx.formatter.write(
        &["Setting", "Value", "Source"],
        &[vec![name.to_string(), value.to_string(), source.to_string()]],
    )
}

pub async fn run_set(ctx: &Context, name: &str, value: &str, scope: &str) -> Result<()> {
    let scope: SettingScope = scope.parse()?;
    let es = ctx.es()?;
    settings::update_setting(&es, scope, name, value)
        .await
        .with_context(|| format!("failed to update setting {}", name))?;
    ctx.formatter
        .message(&format!("Setting {} = {} ({})", name, value, scope));
    Ok(())
}

pub async fn run_reset(ctx: &Context, name: &str, scope: &str) -> Result<()> {
    let scope: SettingScope = scope.parse()?;
    let es = ctx.es()?;
    settings::reset_setting(&es, scope, name)
        .await
        .with_context(|| format!("failed to reset setting {}", name))?;
    ctx.formatter
        .message(&format!("Setting {} reset to default ({})", name, scope));
    Ok(())
}
