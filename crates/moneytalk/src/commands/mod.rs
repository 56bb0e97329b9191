//! CLI command handlers.

pub mod calendar;
pub mod category;
pub mod config;
pub mod contact;
pub mod conversation;
pub mod export;
pub mod import;
pub mod insights;
pub mod phrase;
pub mod remote;
pub mod report;
pub mod reset;
pub mod timeline;

use std::fmt::Display;
use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use console::{Style, style};
use serde::Serialize;

use moneytalk_config::MoneytalkConfig;
use moneytalk_store::{Category, Contact, Conversation, JournalStore, Snapshot, TemplatePhrase};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Journal database file.
    pub db_path: PathBuf,
    /// Merged configuration.
    pub config: MoneytalkConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    pub fn open_store(&self) -> Result<JournalStore> {
        JournalStore::open(&self.db_path)
            .with_context(|| format!("failed to open journal at {}", self.db_path.display()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_header(title: &str) {
    let dim = Style::new().dim();
    println!("{}", style(title).bold());
    println!("{}", dim.apply_to("─".repeat(50)));
}

pub fn print_success(message: impl Display) {
    let green = Style::new().green();
    println!("{} {}", green.apply_to("✓"), message);
}

/// First eight characters of an id.
pub fn short_id(id: impl Display) -> String {
    id.to_string().chars().take(8).collect()
}

pub fn format_local(date: DateTime<Utc>) -> String {
    date.with_timezone(&Local)
        .format("%b %-d, %Y %-I:%M %p")
        .to_string()
}

pub fn print_conversation_line(snapshot: &Snapshot, conversation: &Conversation) {
    let dim = Style::new().dim();
    let people: Vec<&str> = snapshot
        .contacts_of(conversation)
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    let category = snapshot
        .category_of(conversation)
        .map(|c| format!(" #{}", c.name))
        .unwrap_or_default();
    let resolved = if conversation.is_resolved { " ✓" } else { "" };
    println!(
        "{} {} {}{}{} {}",
        dim.apply_to(format!("[{}]", short_id(conversation.id))),
        dim.apply_to(format_local(conversation.date)),
        conversation.title,
        category,
        resolved,
        dim.apply_to(format!("({}/10)", conversation.emotional_rating)),
    );
    if !people.is_empty() {
        println!("           {}", dim.apply_to(format!("with {}", people.join(", "))));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Input
// ─────────────────────────────────────────────────────────────────────────────

/// Parse a date as RFC 3339, `YYYY-MM-DD HH:MM` or `YYYY-MM-DD` (local time).
pub fn parse_date(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M"))
        .or_else(|_| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .map(|d| d.and_time(NaiveTime::MIN + Duration::hours(12)))
        })
        .with_context(|| format!("unrecognized date '{input}' (expected YYYY-MM-DD [HH:MM])"))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("'{input}' does not exist in the local time zone"))
}

/// Find one item by exact id, unique id prefix, or case-insensitive name.
fn find<'a, T>(
    items: &'a [T],
    query: &str,
    kind: &str,
    id: impl Fn(&T) -> String,
    name: impl Fn(&T) -> &str,
) -> Result<&'a T> {
    let query = query.trim();
    if let Some(item) = items.iter().find(|item| id(*item) == query) {
        return Ok(item);
    }

    let by_prefix: Vec<&T> = if query.len() >= 4 {
        items.iter().filter(|item| id(*item).starts_with(query)).collect()
    } else {
        Vec::new()
    };
    let candidates = if by_prefix.is_empty() {
        items
            .iter()
            .filter(|item| name(*item).eq_ignore_ascii_case(query))
            .collect()
    } else {
        by_prefix
    };

    match candidates.as_slice() {
        [item] => Ok(*item),
        [] => bail!("no {kind} matches '{query}'"),
        _ => bail!("'{query}' matches more than one {kind}; use the full id"),
    }
}

pub fn find_conversation<'a>(snapshot: &'a Snapshot, query: &str) -> Result<&'a Conversation> {
    find(
        snapshot.conversations(),
        query,
        "conversation",
        |c| c.id.to_string(),
        |c| c.title.as_str(),
    )
}

pub fn find_contact<'a>(snapshot: &'a Snapshot, query: &str) -> Result<&'a Contact> {
    find(
        snapshot.contacts(),
        query,
        "contact",
        |c| c.id.to_string(),
        |c| c.name.as_str(),
    )
}

pub fn find_category<'a>(snapshot: &'a Snapshot, query: &str) -> Result<&'a Category> {
    find(
        snapshot.categories(),
        query,
        "category",
        |c| c.id.to_string(),
        |c| c.name.as_str(),
    )
}

pub fn find_phrase<'a>(snapshot: &'a Snapshot, query: &str) -> Result<&'a TemplatePhrase> {
    find(
        snapshot.template_phrases(),
        query,
        "phrase",
        |p| p.id.to_string(),
        |p| p.text.as_str(),
    )
}

#[cfg(test)]
mod tests {
    use moneytalk_store::{NewCategory, NewContact};

    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let utc = parse_date("2025-03-01T12:00:00Z").unwrap();
        assert_eq!(utc, Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap());

        let local = parse_date("2025-03-01 18:30").unwrap().with_timezone(&Local);
        assert_eq!(local.format("%Y-%m-%d %H:%M").to_string(), "2025-03-01 18:30");

        let day = parse_date("2025-03-01").unwrap().with_timezone(&Local);
        assert_eq!(day.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());

        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn test_find_by_name_and_prefix() {
        let store = JournalStore::open_in_memory().unwrap();
        let dana = store.create_contact(NewContact::new("Dana")).unwrap();
        store.create_contact(NewContact::new("Sam")).unwrap();
        store.create_category(NewCategory::new("Rent")).unwrap();
        let snapshot = store.snapshot();

        assert_eq!(find_contact(&snapshot, "dana").unwrap().id, dana.id);
        assert_eq!(
            find_contact(&snapshot, &dana.id.to_string()[..8]).unwrap().id,
            dana.id
        );
        assert!(find_contact(&snapshot, "Alex").is_err());
        assert_eq!(find_category(&snapshot, "RENT").unwrap().name, "Rent");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
    }
}
