use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dynaform_types::DynamicFormSettings;
use dynaform_util::{default_settings_path, load_settings, load_settings_from, save_settings_to};
use serde_json::Value;
use tracing::{Level, debug, info};

mod meal_planner;
mod scenario;

use scenario::Scenario;

/// Drive the meal planner demo form from the command line.
#[derive(Parser, Debug)]
#[command(name = "dynaform", version, about)]
struct Cli {
    /// Settings file to use instead of the configured one
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a YAML scenario of submissions, one fresh form per step
    Replay {
        /// Scenario file with `initial` data and a list of `submissions`
        scenario: PathBuf,
    },
    /// Print the form as populated from initial data
    Show {
        /// Initial data as a JSON object
        #[arg(long)]
        data: Option<String>,
    },
    /// Write the default settings to a file (the configured path by default)
    InitSettings {
        /// Destination file
        path: Option<PathBuf>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let Cli {
        settings,
        pretty,
        command,
    } = Cli::parse();

    let output = match command {
        Command::Replay { scenario } => {
            let settings = resolve_settings(settings)?;
            let scenario = Scenario::from_path(&scenario)?;
            serde_json::to_value(scenario.replay(&settings)?)?
        }
        Command::Show { data } => {
            let settings = resolve_settings(settings)?;
            let initial = match data {
                Some(raw) => serde_json::from_str::<Value>(&raw).context("--data must be valid JSON")?,
                None => meal_planner::default_data(),
            };
            serde_json::to_value(meal_planner::build(initial, &settings)?.view())?
        }
        Command::InitSettings { path, force } => {
            let path = path.or(settings).unwrap_or_else(default_settings_path);
            init_settings(&path, force)?;
            Value::String(path.display().to_string())
        }
    };

    let rendered = if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{rendered}");
    Ok(())
}

fn resolve_settings(path: Option<PathBuf>) -> Result<DynamicFormSettings> {
    let settings = match path {
        Some(path) => load_settings_from(&path).with_context(|| format!("loading settings from {}", path.display()))?,
        None => load_settings()?,
    };
    debug!(error_field = %settings.error_field_name, "settings resolved");
    Ok(settings)
}

fn init_settings(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists; pass --force to replace it", path.display());
    }
    save_settings_to(path, &DynamicFormSettings::default())
        .with_context(|| format!("writing settings to {}", path.display()))?;
    info!(path = %path.display(), "default settings written");
    Ok(())
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_settings_writes_loadable_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("settings.json");

        init_settings(&path, false).expect("write settings");

        let loaded = load_settings_from(&path).expect("load written settings");
        assert_eq!(loaded, DynamicFormSettings::default());
    }

    #[test]
    fn init_settings_keeps_an_existing_file_unless_forced() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"error_message": "Custom"}"#).expect("seed settings");

        let error = init_settings(&path, false).expect_err("existing file is kept");
        assert!(error.to_string().contains("already exists"));
        assert_eq!(load_settings_from(&path).expect("load").error_message, "Custom");

        init_settings(&path, true).expect("forced overwrite");
        assert_eq!(load_settings_from(&path).expect("load"), DynamicFormSettings::default());
    }
}
