//! Calendar command - conversations by day.

use anyhow::{Context as _, Result, bail};
use chrono::{Datelike, Local, NaiveDate};
use clap::Args;
use console::{Style, style};

use super::{Context, print_conversation_line, print_header, print_json};

/// Arguments for the calendar command.
#[derive(Args, Debug)]
pub struct CalendarArgs {
    /// Year to show (default: this year)
    #[arg(short, long)]
    pub year: Option<i32>,

    /// Month to show, 1-12 (default: this month)
    #[arg(short, long)]
    pub month: Option<u32>,

    /// List the conversations on one day (YYYY-MM-DD)
    #[arg(short, long, conflicts_with_all = ["year", "month"])]
    pub day: Option<String>,

    /// List the years that have conversations
    #[arg(long, conflicts_with_all = ["year", "month", "day"])]
    pub years: bool,
}

/// Run the calendar command.
pub async fn run(args: CalendarArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let snapshot = store.snapshot();
    let dim = Style::new().dim();

    if args.years {
        let years = snapshot.years(&Local);
        if ctx.json_output {
            return print_json(&years);
        }
        print_header("Years");
        for year in years {
            println!("  {year}");
        }
        return Ok(());
    }

    if let Some(day) = args.day {
        let day = NaiveDate::parse_from_str(day.trim(), "%Y-%m-%d")
            .with_context(|| format!("unrecognized day '{day}' (expected YYYY-MM-DD)"))?;
        let conversations = snapshot.conversations_on_day(day, &Local);
        if ctx.json_output {
            return print_json(&conversations);
        }
        print_header(&day.format("%A, %B %-d, %Y").to_string());
        if conversations.is_empty() {
            println!("{}", dim.apply_to("No conversations on this day"));
        }
        for conversation in conversations {
            print_conversation_line(&snapshot, conversation);
        }
        return Ok(());
    }

    let today = Local::now().date_naive();
    let year = args.year.unwrap_or(today.year());
    let month = args.month.unwrap_or(today.month());
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        bail!("invalid month {year}-{month}");
    };
    let marked = snapshot.days_with_conversations(year, month, &Local);

    if ctx.json_output {
        return print_json(&serde_json::json!({
            "year": year,
            "month": month,
            "days": marked,
        }));
    }

    print_header(&first.format("%B %Y").to_string());
    println!("{}", dim.apply_to(" Mo  Tu  We  Th  Fr  Sa  Su"));

    let days_in_month = first
        .checked_add_months(chrono::Months::new(1))
        .map(|next| next.signed_duration_since(first).num_days() as u32)
        .unwrap_or(31);
    let offset = first.weekday().num_days_from_monday() as usize;
    let mut line = "    ".repeat(offset);
    for day in 1..=days_in_month {
        let cell = format!("{day:>3}");
        if marked.contains(&day) {
            line.push_str(&format!("{}*", style(cell).bold().green()));
        } else {
            line.push_str(&format!("{cell} "));
        }
        if (offset + day as usize) % 7 == 0 {
            println!("{}", line.trim_end());
            line.clear();
        }
    }
    if !line.is_empty() {
        println!("{}", line.trim_end());
    }
    println!();
    println!(
        "{}",
        dim.apply_to(format!("{} days with conversations", marked.len()))
    );

    Ok(())
}
