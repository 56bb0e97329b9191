//! Backup document into a store.
//!
//! Rows are created through the store's normal create operations, so every
//! row is validated exactly as if it had been entered by hand. Order matters:
//! contacts, then categories, then template phrases, then conversations, so
//! that relationship ids can be resolved against entities created earlier in
//! the same import. References that do not resolve are dropped from the
//! relationship. A row that fails to parse or validate is recorded in the
//! [`ImportReport`] and skipped; only storage failures abort the import.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use moneytalk_store::{
    CategoryId, ContactId, EntityKind, ErrorKind, JournalStore, NewCategory, NewContact,
    NewConversation, NewTemplatePhrase, StoreError,
};
use moneytalk_store::types::{DEFAULT_ACCENT_COLOR, DEFAULT_ICON};

use crate::error::{BackupError, Result};
use crate::format::{BACKUP_VERSION, CategoryRow, ContactRow, ConversationRow, TemplatePhraseRow};

// ─────────────────────────────────────────────────────────────────────────────
// Import Report
// ─────────────────────────────────────────────────────────────────────────────

/// Created and failed row counts for one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub created: usize,
    pub failed: usize,
}

/// One row that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFailure {
    #[serde(serialize_with = "serialize_kind")]
    pub collection: EntityKind,
    /// Zero-based index of the row within its array.
    pub row: usize,
    pub reason: String,
}

impl fmt::Display for ImportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}: {}", self.collection, self.row, self.reason)
    }
}

fn serialize_kind<S: serde::Serializer>(kind: &EntityKind, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(kind.as_str())
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub contacts: Tally,
    pub categories: Tally,
    pub template_phrases: Tally,
    pub conversations: Tally,
    pub failures: Vec<ImportFailure>,
    /// Relationship ids that matched nothing created by this import.
    pub dropped_references: usize,
}

impl ImportReport {
    pub fn total_created(&self) -> usize {
        self.contacts.created
            + self.categories.created
            + self.template_phrases.created
            + self.conversations.created
    }

    pub fn total_failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn tally_mut(&mut self, kind: EntityKind) -> &mut Tally {
        match kind {
            EntityKind::Contact => &mut self.contacts,
            EntityKind::Category => &mut self.categories,
            EntityKind::TemplatePhrase => &mut self.template_phrases,
            EntityKind::Conversation => &mut self.conversations,
        }
    }

    fn created(&mut self, kind: EntityKind) {
        self.tally_mut(kind).created += 1;
    }

    fn failed(&mut self, kind: EntityKind, row: usize, reason: String) {
        warn!(collection = %kind, row, %reason, "skipped import row");
        self.tally_mut(kind).failed += 1;
        self.failures.push(ImportFailure {
            collection: kind,
            row,
            reason,
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Envelope
// ─────────────────────────────────────────────────────────────────────────────

/// The document with rows left unparsed, so one bad row cannot sink the rest.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(default)]
    conversations: Vec<Value>,
    #[serde(default)]
    contacts: Vec<Value>,
    #[serde(default)]
    categories: Vec<Value>,
    #[serde(default)]
    template_phrases: Vec<Value>,
    #[serde(default)]
    version: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Import
// ─────────────────────────────────────────────────────────────────────────────

/// Import backup JSON into `store`.
pub fn import_json(store: &JournalStore, json: &[u8]) -> Result<ImportReport> {
    let envelope: Envelope = serde_json::from_slice(json)
        .map_err(|e| BackupError::Import(format!("Invalid backup file: {e}")))?;

    match envelope.version.as_deref() {
        Some(BACKUP_VERSION) => {}
        Some(other) => warn!(version = other, "importing backup with unknown version"),
        None => warn!("importing backup without a version"),
    }

    let mut report = ImportReport::default();
    let mut contacts: HashMap<String, ContactId> = HashMap::new();
    let mut categories: HashMap<String, CategoryId> = HashMap::new();

    for (i, value) in envelope.contacts.into_iter().enumerate() {
        let Some(row) = parse_row::<ContactRow>(&mut report, EntityKind::Contact, i, value) else {
            continue;
        };
        let mut draft = NewContact::new(row.name);
        draft.relationship_tag = row.relationship_tag;
        draft.photo_data = row.photo_data;
        match store.create_contact(draft) {
            Ok(contact) => {
                contacts.insert(row.id, contact.id);
                report.created(EntityKind::Contact);
            }
            Err(e) => row_error(&mut report, EntityKind::Contact, i, e)?,
        }
    }

    for (i, value) in envelope.categories.into_iter().enumerate() {
        let Some(row) = parse_row::<CategoryRow>(&mut report, EntityKind::Category, i, value)
        else {
            continue;
        };
        let draft = NewCategory::new(row.name)
            .with_icon(row.icon_name.unwrap_or_else(|| DEFAULT_ICON.to_string()))
            .with_accent_color(
                row.accent_color
                    .unwrap_or_else(|| DEFAULT_ACCENT_COLOR.to_string()),
            );
        match store.create_category(draft) {
            Ok(category) => {
                categories.insert(row.id, category.id);
                report.created(EntityKind::Category);
            }
            Err(e) => row_error(&mut report, EntityKind::Category, i, e)?,
        }
    }

    for (i, value) in envelope.template_phrases.into_iter().enumerate() {
        let Some(row) =
            parse_row::<TemplatePhraseRow>(&mut report, EntityKind::TemplatePhrase, i, value)
        else {
            continue;
        };
        let mut draft = NewTemplatePhrase::new(row.text);
        draft.category_id = resolve(&categories, row.category_id.as_deref(), &mut report);
        match store.create_template_phrase(draft) {
            Ok(_) => report.created(EntityKind::TemplatePhrase),
            Err(e) => row_error(&mut report, EntityKind::TemplatePhrase, i, e)?,
        }
    }

    for (i, value) in envelope.conversations.into_iter().enumerate() {
        let Some(row) =
            parse_row::<ConversationRow>(&mut report, EntityKind::Conversation, i, value)
        else {
            continue;
        };
        let contact_ids: Vec<ContactId> = row
            .contact_ids
            .iter()
            .filter_map(|id| resolve(&contacts, Some(id), &mut report))
            .collect();
        let category_id = resolve(&categories, row.category_id.as_deref(), &mut report);

        let draft = NewConversation {
            title: row.title,
            date: row.date,
            goal: row.goal,
            outcome: row.outcome,
            emotional_rating: row.emotional_rating,
            notes: row.notes,
            is_resolved: row.is_resolved,
            contact_ids,
            category_id,
        };
        match store.create_conversation(draft) {
            Ok(_) => report.created(EntityKind::Conversation),
            Err(e) => row_error(&mut report, EntityKind::Conversation, i, e)?,
        }
    }

    info!(
        created = report.total_created(),
        failed = report.total_failed(),
        dropped_references = report.dropped_references,
        "import finished"
    );
    Ok(report)
}

/// Read and import a backup file.
pub fn import_file(store: &JournalStore, path: &Path) -> Result<ImportReport> {
    let bytes = std::fs::read(path)?;
    import_json(store, &bytes)
}

fn parse_row<T: DeserializeOwned>(
    report: &mut ImportReport,
    kind: EntityKind,
    row: usize,
    value: Value,
) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            report.failed(kind, row, format!("malformed row: {e}"));
            None
        }
    }
}

/// Validation and image failures skip the row; storage failures abort.
fn row_error(report: &mut ImportReport, kind: EntityKind, row: usize, err: StoreError) -> Result<()> {
    match err.kind() {
        ErrorKind::Validation | ErrorKind::ImageProcessing => {
            report.failed(kind, row, err.to_string());
            Ok(())
        }
        ErrorKind::Storage => Err(err.into()),
    }
}

fn resolve<T: Copy>(
    created: &HashMap<String, T>,
    id: Option<&str>,
    report: &mut ImportReport,
) -> Option<T> {
    let id = id?;
    let found = created.get(id).copied();
    if found.is_none() {
        report.dropped_references += 1;
    }
    found
}
