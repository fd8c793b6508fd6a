use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use raos_core::config::{Config, WarnLevel};
use raos_core::paths;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Write a default .raos/config.yaml (kept if it already exists)
    Init {
        /// Overwrite an existing config file with defaults
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Validate the config for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Init { force } => init(root, force, json),
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
    }
}

fn init(root: &Path, force: bool, json: bool) -> anyhow::Result<()> {
    let path = paths::config_path(root);
    raos_core::io::ensure_dir(&paths::requirements_dir(root))?;

    let written = force || !path.exists();
    if written {
        Config::default()
            .save(root)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if json {
        print_json(&serde_json::json!({ "path": path, "written": written }))?;
    } else if written {
        println!("Wrote {}", path.display());
    } else {
        println!("{} already exists (use --force to overwrite)", path.display());
    }
    Ok(())
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root)?;
    if json {
        print_json(&config)
    } else {
        print!("{}", serde_yaml::to_string(&config)?);
        Ok(())
    }
}

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root)?;
    let warnings = config.validate();

    if json {
        print_json(&warnings)?;
    } else if warnings.is_empty() {
        println!("Config OK.");
    } else {
        for w in &warnings {
            let tag = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("{tag}: {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("configuration has errors");
    }
    Ok(())
}
