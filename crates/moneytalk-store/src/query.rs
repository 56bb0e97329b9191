//! Derived views over a loaded [`Snapshot`].
//!
//! Everything here is read-only and never touches storage. Views borrow from
//! the snapshot they were computed on, so a caller holding an
//! `Arc<Snapshot>` sees one consistent state even while the store commits new
//! writes.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::types::{
    Category, CategoryId, Contact, ContactId, Conversation, ConversationId, DIFFICULT_THRESHOLD,
    SUCCESS_THRESHOLD, TemplatePhrase, TemplatePhraseId,
};

/// Conversations per page in paginated listings.
pub const ITEMS_PER_PAGE: usize = 20;

/// Conversations shown in the dashboard's recent list.
pub const RECENT_LIMIT: usize = 10;

/// Past conversations offered when preparing a new one.
pub const SIMILAR_LIMIT: usize = 5;

// ─────────────────────────────────────────────────────────────────────────────
// Snapshot
// ─────────────────────────────────────────────────────────────────────────────

/// The four collections as of one committed store version.
///
/// Conversations are ordered by date descending, contacts and categories by
/// name ascending (case-insensitive), template phrases by insertion.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub(crate) conversations: Vec<Conversation>,
    pub(crate) contacts: Vec<Contact>,
    pub(crate) categories: Vec<Category>,
    pub(crate) template_phrases: Vec<TemplatePhrase>,
}

impl Snapshot {
    /// Build a snapshot, applying the default sort orders.
    pub fn new(
        conversations: Vec<Conversation>,
        contacts: Vec<Contact>,
        categories: Vec<Category>,
        template_phrases: Vec<TemplatePhrase>,
    ) -> Self {
        let mut snapshot = Self {
            conversations,
            contacts,
            categories,
            template_phrases,
        };
        snapshot.sort();
        snapshot
    }

    pub(crate) fn sort(&mut self) {
        self.conversations.sort_by(|a, b| b.date.cmp(&a.date));
        self.contacts.sort_by(|a, b| name_order(&a.name, &b.name));
        self.categories.sort_by(|a, b| name_order(&a.name, &b.name));
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn template_phrases(&self) -> &[TemplatePhrase] {
        &self.template_phrases
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
            && self.contacts.is_empty()
            && self.categories.is_empty()
            && self.template_phrases.is_empty()
    }

    pub fn conversation(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn contact(&self, id: ContactId) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn template_phrase(&self, id: TemplatePhraseId) -> Option<&TemplatePhrase> {
        self.template_phrases.iter().find(|p| p.id == id)
    }

    /// Contacts of a conversation, in attach order.
    pub fn contacts_of(&self, conversation: &Conversation) -> Vec<&Contact> {
        conversation
            .contact_ids
            .iter()
            .filter_map(|id| self.contact(*id))
            .collect()
    }

    pub fn category_of(&self, conversation: &Conversation) -> Option<&Category> {
        conversation.category_id.and_then(|id| self.category(id))
    }
}

/// ASCII case-insensitive, then exact, matching `COLLATE NOCASE, name`.
fn name_order(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_ascii_lowercase()
        .cmp(&b.to_ascii_lowercase())
        .then_with(|| a.cmp(b))
}

// ─────────────────────────────────────────────────────────────────────────────
// Filters
// ─────────────────────────────────────────────────────────────────────────────

impl Snapshot {
    pub fn conversations_with_contact(&self, contact: ContactId) -> Vec<&Conversation> {
        self.conversations
            .iter()
            .filter(|c| c.involves(contact))
            .collect()
    }

    pub fn conversations_in_category(&self, category: CategoryId) -> Vec<&Conversation> {
        self.conversations
            .iter()
            .filter(|c| c.category_id == Some(category))
            .collect()
    }

    /// Conversations on the same calendar day as `date`, in `date`'s zone.
    pub fn conversations_on_date<Tz: TimeZone>(&self, date: &DateTime<Tz>) -> Vec<&Conversation> {
        self.conversations_on_day(date.date_naive(), &date.timezone())
    }

    /// Conversations whose date falls on `day` in `tz`.
    pub fn conversations_on_day<Tz: TimeZone>(&self, day: NaiveDate, tz: &Tz) -> Vec<&Conversation> {
        self.conversations
            .iter()
            .filter(|c| c.date.with_timezone(tz).date_naive() == day)
            .collect()
    }

    /// Conversations in `year` (in `tz`), oldest first.
    pub fn conversations_in_year<Tz: TimeZone>(&self, year: i32, tz: &Tz) -> Vec<&Conversation> {
        let mut matching: Vec<&Conversation> = self
            .conversations
            .iter()
            .filter(|c| c.date.with_timezone(tz).year() == year)
            .collect();
        matching.sort_by_key(|c| c.date);
        matching
    }

    /// Apply the timeline filter, newest first.
    pub fn timeline(&self, filter: &TimelineFilter) -> Vec<&Conversation> {
        let mut matching: Vec<&Conversation> = self
            .conversations
            .iter()
            .filter(|c| filter.matches(c))
            .collect();
        matching.sort_by(|a, b| b.date.cmp(&a.date));
        matching
    }

    /// One page of conversations. Pages are zero-based.
    pub fn conversations_page(&self, page: usize, page_size: usize) -> &[Conversation] {
        if page_size == 0 {
            return &[];
        }
        let start = page.saturating_mul(page_size).min(self.conversations.len());
        let end = start.saturating_add(page_size).min(self.conversations.len());
        &self.conversations[start..end]
    }

    pub fn page_count(&self, page_size: usize) -> usize {
        if page_size == 0 {
            return 0;
        }
        self.conversations.len().div_ceil(page_size)
    }

    pub fn recent_conversations(&self, limit: usize) -> &[Conversation] {
        &self.conversations[..limit.min(self.conversations.len())]
    }

    /// Most recent conversations in a category, for preparing a new one.
    pub fn similar_conversations(&self, category: CategoryId, limit: usize) -> Vec<&Conversation> {
        self.conversations
            .iter()
            .filter(|c| c.category_id == Some(category))
            .take(limit)
            .collect()
    }

    /// Phrases owned by `category`, or every phrase when `None`.
    pub fn template_phrases_for(&self, category: Option<CategoryId>) -> Vec<&TemplatePhrase> {
        self.template_phrases
            .iter()
            .filter(|p| category.is_none() || p.category_id == category)
            .collect()
    }

    /// Case-insensitive substring match on name. Empty query matches all.
    pub fn search_contacts(&self, query: &str) -> Vec<&Contact> {
        let needle = query.trim().to_lowercase();
        self.contacts
            .iter()
            .filter(|c| needle.is_empty() || c.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn search_categories(&self, query: &str) -> Vec<&Category> {
        let needle = query.trim().to_lowercase();
        self.categories
            .iter()
            .filter(|c| needle.is_empty() || c.name.to_lowercase().contains(&needle))
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Aggregates
// ─────────────────────────────────────────────────────────────────────────────

/// Number of conversations in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub year: i32,
    pub month: u32,
    /// Short label such as `Mar 2026`.
    pub label: String,
    pub count: usize,
}

/// Dashboard summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalStats {
    pub total: usize,
    pub resolved: usize,
    pub average_rating: f64,
    pub success_rate: f64,
}

impl Snapshot {
    /// Mean emotional rating; 0 with no conversations.
    pub fn average_emotional_rating(&self) -> f64 {
        if self.conversations.is_empty() {
            return 0.0;
        }
        let sum: i64 = self
            .conversations
            .iter()
            .map(|c| i64::from(c.emotional_rating))
            .sum();
        sum as f64 / self.conversations.len() as f64
    }

    /// Percentage of conversations rated 8 or higher; 0 with none.
    pub fn success_rate(&self) -> f64 {
        if self.conversations.is_empty() {
            return 0.0;
        }
        let successful = self
            .conversations
            .iter()
            .filter(|c| c.is_successful())
            .count();
        successful as f64 / self.conversations.len() as f64 * 100.0
    }

    pub fn resolved_count(&self) -> usize {
        self.conversations.iter().filter(|c| c.is_resolved).count()
    }

    /// Contact appearing in the most conversations. Ties go to the contact
    /// encountered first (newest conversation, then attach order).
    pub fn most_discussed_contact(&self) -> Option<&Contact> {
        let id = most_frequent(
            self.conversations
                .iter()
                .flat_map(|c| c.contact_ids.iter().copied()),
        )?;
        self.contact(id)
    }

    /// Category attached to the most conversations, ties as above.
    pub fn most_discussed_category(&self) -> Option<&Category> {
        let id = most_frequent(self.conversations.iter().filter_map(|c| c.category_id))?;
        self.category(id)
    }

    /// Conversation counts per calendar month in `tz`, oldest month first.
    pub fn conversations_per_month<Tz: TimeZone>(&self, tz: &Tz) -> Vec<MonthCount> {
        let mut counts: BTreeMap<(i32, u32), usize> = BTreeMap::new();
        for c in &self.conversations {
            let local = c.date.with_timezone(tz);
            *counts.entry((local.year(), local.month())).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|((year, month), count)| MonthCount {
                year,
                month,
                label: month_label(year, month),
                count,
            })
            .collect()
    }

    /// Per-month counts in the local time zone.
    pub fn conversations_per_local_month(&self) -> Vec<MonthCount> {
        self.conversations_per_month(&Local)
    }

    /// `(date, rating)` pairs, oldest first.
    pub fn emotional_trend(&self) -> Vec<(DateTime<Utc>, i32)> {
        let mut trend: Vec<_> = self
            .conversations
            .iter()
            .map(|c| (c.date, c.emotional_rating))
            .collect();
        trend.sort_by_key(|(date, _)| *date);
        trend
    }

    /// Years with at least one conversation, newest first.
    pub fn years<Tz: TimeZone>(&self, tz: &Tz) -> Vec<i32> {
        let years: BTreeSet<i32> = self
            .conversations
            .iter()
            .map(|c| c.date.with_timezone(tz).year())
            .collect();
        years.into_iter().rev().collect()
    }

    /// Days of `year`/`month` (in `tz`) that have a conversation.
    pub fn days_with_conversations<Tz: TimeZone>(
        &self,
        year: i32,
        month: u32,
        tz: &Tz,
    ) -> BTreeSet<u32> {
        self.conversations
            .iter()
            .map(|c| c.date.with_timezone(tz))
            .filter(|d| d.year() == year && d.month() == month)
            .map(|d| d.day())
            .collect()
    }

    pub fn stats(&self) -> JournalStats {
        JournalStats {
            total: self.conversations.len(),
            resolved: self.resolved_count(),
            average_rating: self.average_emotional_rating(),
            success_rate: self.success_rate(),
        }
    }
}

/// Most frequent item; first-encountered wins ties.
fn most_frequent<T: Copy + Eq + std::hash::Hash>(items: impl Iterator<Item = T>) -> Option<T> {
    let mut counts: HashMap<T, usize> = HashMap::new();
    let mut order: Vec<T> = Vec::new();
    for item in items {
        let count = counts.entry(item).or_insert(0);
        if *count == 0 {
            order.push(item);
        }
        *count += 1;
    }

    let mut best: Option<(T, usize)> = None;
    for item in order {
        let count = counts[&item];
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((item, count));
        }
    }
    best.map(|(item, _)| item)
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|| format!("{month:02}/{year}"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Timeline Filter
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome buckets by emotional rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutcomeBucket {
    #[default]
    All,
    /// Rating 8 or higher.
    Successful,
    /// Rating below 5.
    Difficult,
    /// Rating 5 through 7.
    Neutral,
}

impl OutcomeBucket {
    pub fn matches(&self, rating: i32) -> bool {
        match self {
            Self::All => true,
            Self::Successful => rating >= SUCCESS_THRESHOLD,
            Self::Difficult => rating < DIFFICULT_THRESHOLD,
            Self::Neutral => (DIFFICULT_THRESHOLD..SUCCESS_THRESHOLD).contains(&rating),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Successful => "successful",
            Self::Difficult => "difficult",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for OutcomeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutcomeBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "successful" | "success" => Ok(Self::Successful),
            "difficult" => Ok(Self::Difficult),
            "neutral" => Ok(Self::Neutral),
            other => Err(format!(
                "unknown outcome '{other}' (expected all, successful, difficult, neutral)"
            )),
        }
    }
}

/// Conjunction of person, category, and outcome predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineFilter {
    pub contact: Option<ContactId>,
    pub category: Option<CategoryId>,
    pub outcome: OutcomeBucket,
}

impl TimelineFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contact(mut self, contact: ContactId) -> Self {
        self.contact = Some(contact);
        self
    }

    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_outcome(mut self, outcome: OutcomeBucket) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn matches(&self, conversation: &Conversation) -> bool {
        self.contact.is_none_or(|id| conversation.involves(id))
            && self
                .category
                .is_none_or(|id| conversation.category_id == Some(id))
            && self.outcome.matches(conversation.emotional_rating)
    }
}
