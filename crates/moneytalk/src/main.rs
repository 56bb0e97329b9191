//! Moneytalk - a journal for conversations about money
//!
//! Main entry point for the moneytalk CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{
    calendar, category, config, contact, conversation, export, import, insights, phrase, remote,
    report, reset, timeline,
};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Moneytalk - a journal for conversations about money
#[derive(Parser)]
#[command(name = "moneytalk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Journal database file
    #[arg(long, global = true, env = "MONEYTALK_DB_PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record, edit and browse conversations
    Conversation(conversation::ConversationArgs),

    /// Manage the people you talk with
    Contact(contact::ContactArgs),

    /// Manage conversation categories
    Category(category::CategoryArgs),

    /// Manage reusable template phrases
    Phrase(phrase::PhraseArgs),

    /// Filtered timeline of conversations
    Timeline(timeline::TimelineArgs),

    /// Averages, success rate and trends
    Insights(insights::InsightsArgs),

    /// Conversations by day
    Calendar(calendar::CalendarArgs),

    /// Write a JSON backup
    Export(export::ExportArgs),

    /// Restore a JSON backup into the journal
    Import(import::ImportArgs),

    /// Generate a yearly PDF report
    Report(report::ReportArgs),

    /// Delete every record in the journal
    Reset(reset::ResetArgs),

    /// Configuration management
    Config(config::ConfigArgs),

    /// Query the remote startup configuration
    Remote(remote::RemoteArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

const CRATES: &[&str] = &[
    "moneytalk",
    "moneytalk_store",
    "moneytalk_backup",
    "moneytalk_config",
];

fn filter_for(level: &str, fallback: &str) -> String {
    let mut directives: Vec<String> = CRATES.iter().map(|c| format!("{c}={level}")).collect();
    directives.push(fallback.to_string());
    directives.join(",")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = moneytalk_config::load_config(None)?;
    let logging = loaded.config.logging();

    // Console (human-readable, stderr) + daily-rolling JSON file
    let console_filter = if cli.verbose {
        filter_for("debug", "info")
    } else {
        filter_for(&logging.level, "warn")
    };

    let log_dir = moneytalk_config::config_dir().map(|d| moneytalk_config::log_dir(&d));
    let (file_writer, _guard) = match log_dir {
        Some(dir) if logging.json_file => {
            let appender = tracing_appender::rolling::daily(dir, "moneytalk.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        _ => (None, None),
    };

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(console_filter)),
                ),
        )
        .with(file_writer.map(|writer| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(tracing_subscriber::EnvFilter::new(filter_for("trace", "info")))
        }))
        .init();

    for warning in &loaded.warnings {
        tracing::warn!("{warning}");
    }

    let db_path = cli
        .db
        .unwrap_or_else(|| loaded.config.storage().effective_db_path());

    let ctx = commands::Context {
        db_path,
        config: loaded.config,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Conversation(args) => conversation::run(args, &ctx).await,
        Commands::Contact(args) => contact::run(args, &ctx).await,
        Commands::Category(args) => category::run(args, &ctx).await,
        Commands::Phrase(args) => phrase::run(args, &ctx).await,
        Commands::Timeline(args) => timeline::run(args, &ctx).await,
        Commands::Insights(args) => insights::run(args, &ctx).await,
        Commands::Calendar(args) => calendar::run(args, &ctx).await,
        Commands::Export(args) => export::run(args, &ctx).await,
        Commands::Import(args) => import::run(args, &ctx).await,
        Commands::Report(args) => report::run(args, &ctx).await,
        Commands::Reset(args) => reset::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
        Commands::Remote(args) => remote::run(args, &ctx).await,
    }
}
