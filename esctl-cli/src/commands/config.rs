use super::Context;
use anyhow::{Context as _, Result};
use esctl::config::{expand_tilde, user_config_path};
use esctl::Config;
use std::path::{Path, PathBuf};

/// Print the effective configuration with passwords masked
pub fn run_show(ctx: &Context) -> Result<()> {
    match ctx.config_path {
        Some(ref path) => eprintln!("# loaded from {}", path.display()),
        None => eprintln!("# no config file found, using defaults"),
    }
    let rendered = toml::to_string_pretty(&ctx.config.masked())?;
    print!("{}", rendered);
    Ok(())
}

/// Write a default config file, refusing to overwrite unless forced
pub fn run_init(path: Option<&Path>, force: bool) -> Result<()> {
    let path = match path {
        Some(p) => expand_tilde(p)?,
        None => user_config_path().unwrap_or_else(|| PathBuf::from("esctl.toml")),
    };

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    Config::default()
        .save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
