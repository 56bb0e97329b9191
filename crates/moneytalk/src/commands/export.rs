//! Export command - write a JSON backup.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use moneytalk_backup::{export_document, export_json, write_backup, write_backup_to};

use super::{Context, print_json, print_success};

/// Arguments for the export command.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Directory for the backup file (default: current directory)
    #[arg(short, long, conflicts_with = "file")]
    pub dir: Option<PathBuf>,

    /// Exact file to write
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Print the backup to stdout instead of writing a file
    #[arg(long, conflicts_with_all = ["dir", "file"])]
    pub stdout: bool,
}

/// Run the export command.
pub async fn run(args: ExportArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let snapshot = store.snapshot();

    if args.stdout {
        println!("{}", export_json(&snapshot)?);
        return Ok(());
    }

    let path = match args.file {
        Some(file) => {
            write_backup_to(&export_document(&snapshot, chrono::Utc::now()), &file)?;
            file
        }
        None => write_backup(&snapshot, &args.dir.unwrap_or_else(|| PathBuf::from(".")))?,
    };

    if ctx.json_output {
        print_json(&serde_json::json!({
            "path": path,
            "conversations": snapshot.conversations().len(),
            "contacts": snapshot.contacts().len(),
            "categories": snapshot.categories().len(),
            "templatePhrases": snapshot.template_phrases().len(),
        }))?;
    } else {
        print_success(format!("Backup written to {}", path.display()));
    }
    Ok(())
}
