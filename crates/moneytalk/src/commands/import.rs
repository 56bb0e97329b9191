//! Import command - restore a JSON backup into the journal.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::Style;

use moneytalk_backup::import_file;

use super::{Context, print_header, print_json, print_success};

/// Arguments for the import command.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Backup file to import
    pub file: PathBuf,
}

/// Run the import command.
pub async fn run(args: ImportArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let report = import_file(&store, &args.file)?;

    if ctx.json_output {
        return print_json(&report);
    }

    print_success(format!(
        "Imported {} records from {}",
        report.total_created(),
        args.file.display()
    ));
    let dim = Style::new().dim();
    println!(
        "{}",
        dim.apply_to(format!(
            "  contacts {} · categories {} · phrases {} · conversations {}",
            report.contacts.created,
            report.categories.created,
            report.template_phrases.created,
            report.conversations.created,
        ))
    );
    if report.dropped_references > 0 {
        println!(
            "{}",
            dim.apply_to(format!(
                "  {} references to missing records were dropped",
                report.dropped_references
            ))
        );
    }

    if !report.is_clean() {
        let yellow = Style::new().yellow();
        println!();
        print_header(&format!("{} rows skipped", report.total_failed()));
        for failure in &report.failures {
            println!("  {} {}", yellow.apply_to("!"), failure);
        }
    }
    Ok(())
}
