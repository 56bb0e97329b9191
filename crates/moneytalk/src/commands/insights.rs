//! Insights command - averages, success rate and trends.

use anyhow::Result;
use chrono::Local;
use clap::Args;
use console::{Style, style};
use serde::Serialize;

use moneytalk_store::{JournalStats, MonthCount, RECENT_LIMIT};

use super::{Context, format_local, print_conversation_line, print_header, print_json};

/// Arguments for the insights command.
#[derive(Args, Debug)]
pub struct InsightsArgs {
    /// Also show the rating of every conversation over time
    #[arg(long)]
    pub trend: bool,

    /// Recent conversations to list
    #[arg(long, default_value_t = RECENT_LIMIT)]
    pub recent: usize,
}

#[derive(Serialize)]
struct TrendPoint {
    date: chrono::DateTime<chrono::Utc>,
    rating: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Insights {
    #[serde(flatten)]
    stats: JournalStats,
    most_discussed_contact: Option<String>,
    most_discussed_category: Option<String>,
    per_month: Vec<MonthCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trend: Option<Vec<TrendPoint>>,
}

/// Run the insights command.
pub async fn run(args: InsightsArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let snapshot = store.snapshot();

    let insights = Insights {
        stats: snapshot.stats(),
        most_discussed_contact: snapshot.most_discussed_contact().map(|c| c.name.clone()),
        most_discussed_category: snapshot.most_discussed_category().map(|c| c.name.clone()),
        per_month: snapshot.conversations_per_month(&Local),
        trend: args.trend.then(|| {
            snapshot
                .emotional_trend()
                .into_iter()
                .map(|(date, rating)| TrendPoint { date, rating })
                .collect()
        }),
    };

    if ctx.json_output {
        return print_json(&insights);
    }

    let dim = Style::new().dim();
    print_header("Insights");
    if insights.stats.total == 0 {
        println!("{}", dim.apply_to("No conversations recorded yet"));
        return Ok(());
    }

    println!("Conversations:     {}", insights.stats.total);
    println!("Resolved:          {}", insights.stats.resolved);
    println!("Average rating:    {:.1}/10", insights.stats.average_rating);
    println!("Success rate:      {:.0}%", insights.stats.success_rate);
    if let Some(name) = &insights.most_discussed_contact {
        println!("Most talked with:  {name}");
    }
    if let Some(name) = &insights.most_discussed_category {
        println!("Top category:      {name}");
    }

    println!();
    println!("{}", style("Per month").bold());
    let widest = insights.per_month.iter().map(|m| m.count).max().unwrap_or(1);
    for month in &insights.per_month {
        let bar = "█".repeat((month.count * 30).div_ceil(widest));
        println!("  {:<9} {:>3} {}", month.label, month.count, dim.apply_to(bar));
    }

    if let Some(trend) = &insights.trend {
        println!();
        println!("{}", style("Rating trend").bold());
        for point in trend {
            println!(
                "  {} {:>2} {}",
                dim.apply_to(format_local(point.date)),
                point.rating,
                "•".repeat(point.rating.max(0) as usize)
            );
        }
    }

    let recent = snapshot.recent_conversations(args.recent);
    if !recent.is_empty() {
        println!();
        println!("{}", style("Recent").bold());
        for conversation in recent {
            print_conversation_line(&snapshot, conversation);
        }
    }

    Ok(())
}
