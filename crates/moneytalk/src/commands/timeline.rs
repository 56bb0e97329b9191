//! Timeline command - conversations filtered by person, category and outcome.

use anyhow::{Result, anyhow};
use clap::Args;
use console::Style;

use moneytalk_store::{OutcomeBucket, TimelineFilter};

use super::{Context, find_category, find_contact, print_conversation_line, print_header, print_json};

/// Arguments for the timeline command.
#[derive(Args, Debug)]
pub struct TimelineArgs {
    /// Only conversations with this contact
    #[arg(short, long)]
    pub contact: Option<String>,

    /// Only conversations in this category
    #[arg(long)]
    pub category: Option<String>,

    /// all, successful (8+), neutral (5-7) or difficult (below 5)
    #[arg(short, long, default_value = "all")]
    pub outcome: String,

    /// Maximum conversations to show
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Run the timeline command.
pub async fn run(args: TimelineArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let snapshot = store.snapshot();
    let dim = Style::new().dim();

    let outcome: OutcomeBucket = args.outcome.parse().map_err(|e: String| anyhow!(e))?;
    let mut filter = TimelineFilter::new().with_outcome(outcome);
    if let Some(contact) = &args.contact {
        filter = filter.with_contact(find_contact(&snapshot, contact)?.id);
    }
    if let Some(category) = &args.category {
        filter = filter.with_category(find_category(&snapshot, category)?.id);
    }

    let mut conversations = snapshot.timeline(&filter);
    let total = conversations.len();
    if let Some(limit) = args.limit {
        conversations.truncate(limit);
    }

    if ctx.json_output {
        return print_json(&conversations);
    }

    print_header("Timeline");
    if conversations.is_empty() {
        println!("{}", dim.apply_to("No conversations match"));
        return Ok(());
    }
    for conversation in &conversations {
        print_conversation_line(&snapshot, conversation);
    }
    if total > conversations.len() {
        println!();
        println!(
            "{}",
            dim.apply_to(format!("... and {} more", total - conversations.len()))
        );
    }

    Ok(())
}
