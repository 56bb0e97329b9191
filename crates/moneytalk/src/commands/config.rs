//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use console::Style;

use moneytalk_config::{CONFIG_KEYS, MoneytalkConfig};

use super::{Context, print_json, print_success};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Show configuration file path
    Path,

    /// Print one value
    Get {
        /// Dotted key, e.g. report.author
        key: String,
    },

    /// Set one value in the user config file
    Set {
        /// Dotted key, e.g. report.author
        key: String,

        value: String,

        /// Write to ./moneytalk.toml instead of the user config
        #[arg(long)]
        local: bool,
    },

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./moneytalk.toml) instead of user config
        #[arg(long)]
        local: bool,
    },
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Path => cmd_path(ctx),
        ConfigCommand::Get { key } => cmd_get(ctx, &key),
        ConfigCommand::Set { key, value, local } => cmd_set(&key, &value, local),
        ConfigCommand::Init { local } => cmd_init(local),
    }
}

fn target_path(local: bool) -> Result<PathBuf> {
    if local {
        return Ok(PathBuf::from("moneytalk.toml"));
    }
    match moneytalk_config::user_config_path() {
        Some(path) => Ok(path),
        None => bail!("could not determine the user config directory"),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    if ctx.json_output {
        return print_json(&ctx.config);
    }

    let dim = Style::new().dim();
    println!("# Moneytalk Configuration\n");
    println!("{}", dim.apply_to(format!("# database: {}", ctx.db_path.display())));
    println!();
    // Fill in defaults so every section shows up
    let resolved = MoneytalkConfig {
        storage: Some(ctx.config.storage()),
        logging: Some(ctx.config.logging()),
        report: Some(ctx.config.report()),
        remote: Some(ctx.config.remote()),
    };
    print!("{}", resolved.to_toml()?);
    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    let loaded = moneytalk_config::load_config(None)?;
    if ctx.json_output {
        let sources: Vec<_> = loaded
            .sources
            .iter()
            .map(|s| serde_json::json!({ "path": s.path, "loaded": s.loaded }))
            .collect();
        return print_json(&serde_json::json!({
            "sources": sources,
            "warnings": loaded.warnings,
        }));
    }

    let dim = Style::new().dim();
    let green = Style::new().green();
    println!("Config sources (lowest precedence first):");
    for source in &loaded.sources {
        if source.loaded {
            println!("  {} {}", green.apply_to("✓"), source.path.display());
        } else {
            println!("  {} {}", dim.apply_to("·"), dim.apply_to(source.path.display()));
        }
    }
    for warning in &loaded.warnings {
        println!("  {} {}", Style::new().yellow().apply_to("!"), warning);
    }
    Ok(())
}

fn cmd_path(ctx: &Context) -> Result<()> {
    let path = target_path(false)?;
    if ctx.json_output {
        return print_json(&serde_json::json!({ "path": path }));
    }
    println!("{}", path.display());
    Ok(())
}

fn cmd_get(ctx: &Context, key: &str) -> Result<()> {
    let value = ctx.config.get(key)?;
    if ctx.json_output {
        return print_json(&serde_json::json!({ "key": key, "value": value }));
    }
    match value {
        Some(value) => println!("{value}"),
        None => println!("{}", Style::new().dim().apply_to("(unset)")),
    }
    Ok(())
}

fn cmd_set(key: &str, value: &str, local: bool) -> Result<()> {
    if !CONFIG_KEYS.contains(&key) {
        bail!("unknown config key '{key}' (known: {})", CONFIG_KEYS.join(", "));
    }

    let path = target_path(local)?;
    let mut config = if path.is_file() {
        moneytalk_config::load_config_file(&path)?
    } else {
        MoneytalkConfig::new()
    };
    config.set(key, value)?;
    moneytalk_config::save_config(&config, &path)?;
    print_success(format!("{key} = {value} ({})", path.display()));
    Ok(())
}

fn cmd_init(local: bool) -> Result<()> {
    let path = target_path(local)?;
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    let config = MoneytalkConfig {
        storage: None,
        logging: Some(Default::default()),
        report: Some(Default::default()),
        remote: None,
    };
    moneytalk_config::save_config(&config, &path)?;
    print_success(format!("Created {}", path.display()));
    Ok(())
}
