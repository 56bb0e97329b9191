//! Report command - a year of conversations as PDF or text.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{Datelike, Local};
use clap::Args;

use moneytalk_backup::{ReportMeta, build_year_report, render_text, write_report};

use super::{Context, print_json, print_success};

/// Arguments for the report command.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Year to report (default: this year)
    #[arg(short, long)]
    pub year: Option<i32>,

    /// Directory for the PDF (default: current directory)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Print the report as plain text instead of writing a PDF
    #[arg(long, conflicts_with = "dir")]
    pub text: bool,
}

/// Run the report command.
pub async fn run(args: ReportArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let year = args.year.unwrap_or_else(|| Local::now().year());
    let report = build_year_report(&store.snapshot(), year, &Local)?;

    if args.text {
        print!("{}", render_text(&report));
        return Ok(());
    }

    let meta = ReportMeta {
        author: ctx.config.report().author,
        ..ReportMeta::default()
    };
    let dir = args.dir.unwrap_or_else(|| PathBuf::from("."));
    let path = write_report(&report, &meta, &dir)?;

    if ctx.json_output {
        print_json(&serde_json::json!({
            "path": path,
            "year": year,
            "entries": report.entries.len(),
            "pages": report.pages.len(),
        }))?;
    } else {
        print_success(format!(
            "Report for {year} written to {} ({} pages)",
            path.display(),
            report.pages.len()
        ));
    }
    Ok(())
}
