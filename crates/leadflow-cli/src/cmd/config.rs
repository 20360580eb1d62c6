use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use leadflow_core::config::{Config, WarnLevel};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective config (file plus environment), API key masked
    Show,

    /// Validate the config for common mistakes
    Validate,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(path: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(path, json),
        ConfigSubcommand::Validate => validate(path, json),
        ConfigSubcommand::Init { force } => init(path, force),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(path: &Path, json: bool) -> anyhow::Result<()> {
    let mut config = super::load_config(path)?;
    if let Some(key) = config.completion.api_key.as_mut() {
        *key = mask(key);
    }

    if json {
        print_json(&config)?;
    } else {
        println!("# {}", path.display());
        print!("{}", serde_yaml::to_string(&config)?);
    }
    Ok(())
}

fn mask(key: &str) -> String {
    let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    if key.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("****{tail}")
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(path: &Path, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(path)?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Config::default()
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
