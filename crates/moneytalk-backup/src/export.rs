//! Snapshot to backup document.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use moneytalk_store::Snapshot;

use crate::error::Result;
use crate::format::{
    BACKUP_VERSION, BackupDocument, CategoryRow, ContactRow, ConversationRow, TemplatePhraseRow,
};

/// Flatten every collection into a backup document stamped `exported_at`.
pub fn export_document(snapshot: &Snapshot, exported_at: DateTime<Utc>) -> BackupDocument {
    BackupDocument {
        conversations: snapshot
            .conversations()
            .iter()
            .map(ConversationRow::from)
            .collect(),
        contacts: snapshot.contacts().iter().map(ContactRow::from).collect(),
        categories: snapshot.categories().iter().map(CategoryRow::from).collect(),
        template_phrases: snapshot
            .template_phrases()
            .iter()
            .map(TemplatePhraseRow::from)
            .collect(),
        export_date: exported_at,
        version: BACKUP_VERSION.to_string(),
    }
}

/// Pretty-printed backup JSON.
pub fn export_json(snapshot: &Snapshot) -> Result<String> {
    let document = export_document(snapshot, Utc::now());
    Ok(serde_json::to_string_pretty(&document)?)
}

/// `MoneyConversations_Backup_<unix-seconds>.json`
pub fn backup_file_name(at: DateTime<Utc>) -> String {
    format!("MoneyConversations_Backup_{}.json", at.timestamp())
}

/// Write a backup into `dir` under the default file name.
pub fn write_backup(snapshot: &Snapshot, dir: &Path) -> Result<PathBuf> {
    let now = Utc::now();
    let document = export_document(snapshot, now);
    let path = dir.join(backup_file_name(now));
    write_backup_to(&document, &path)?;
    Ok(path)
}

/// Write `document` to `path`, creating parent directories.
pub fn write_backup_to(document: &BackupDocument, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(document)?;
    std::fs::write(path, json)?;
    info!(
        path = %path.display(),
        conversations = document.conversations.len(),
        contacts = document.contacts.len(),
        categories = document.categories.len(),
        template_phrases = document.template_phrases.len(),
        "backup written"
    );
    Ok(())
}
