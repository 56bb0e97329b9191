//! Remote command - query the remote startup configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::Style;

use moneytalk_config::{HttpRemoteConfig, RemoteConfigSource, RetrievalState};

use super::{Context, print_json};

/// Arguments for the remote command.
#[derive(Args, Debug)]
pub struct RemoteArgs {
    #[command(subcommand)]
    pub command: RemoteCommand,
}

#[derive(Subcommand, Debug)]
pub enum RemoteCommand {
    /// Fetch the target URL and check that it is reachable
    Check,
}

/// Run the remote command.
pub async fn run(args: RemoteArgs, ctx: &Context) -> Result<()> {
    match args.command {
        RemoteCommand::Check => cmd_check(ctx).await,
    }
}

async fn cmd_check(ctx: &Context) -> Result<()> {
    let remote = ctx.config.remote();
    let dim = Style::new().dim();

    if !remote.is_enabled() {
        if ctx.json_output {
            return print_json(&serde_json::json!({ "enabled": false }));
        }
        println!("{}", dim.apply_to("Remote configuration is not set up (remote.endpoint)"));
        return Ok(());
    }

    let source = HttpRemoteConfig::from_config(&remote)?;
    if ctx.verbose {
        println!("{}", dim.apply_to(format!("Fetching {}", source.endpoint())));
    }
    let retrieval = source.retrieve_target_url().await;

    if ctx.json_output {
        return print_json(&retrieval);
    }

    let state = match &retrieval.state {
        RetrievalState::Completed => Style::new().green().apply_to(retrieval.state.to_string()),
        RetrievalState::RateLimited | RetrievalState::Pending => {
            Style::new().yellow().apply_to(retrieval.state.to_string())
        }
        RetrievalState::Failed(_) => Style::new().red().apply_to(retrieval.state.to_string()),
    };
    println!("State:  {state}");
    match &retrieval.url {
        Some(url) => println!("URL:    {url}"),
        None => println!("URL:    {}", dim.apply_to("(none)")),
    }
    Ok(())
}
