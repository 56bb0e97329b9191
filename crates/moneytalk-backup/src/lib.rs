//! Getting data in and out of the money conversation journal.
//!
//! - [`export`]: flatten a [`Snapshot`](moneytalk_store::Snapshot) into a
//!   versioned JSON [`BackupDocument`].
//! - [`import`]: merge a backup into a live store, row by row, tolerating
//!   bad rows and reporting them in an [`ImportReport`].
//! - [`report`]: lay out and render a year of conversations as PDF or text,
//!   measured and encoded with the Helvetica metrics in [`font`].
//!
//! ```no_run
//! use std::path::Path;
//! use chrono::Utc;
//! use moneytalk_backup::{ReportMeta, build_year_report, import_file, write_backup, write_report};
//! use moneytalk_store::JournalStore;
//!
//! let store = JournalStore::open("journal.db")?;
//! let backup = write_backup(&store.snapshot(), Path::new("backups"))?;
//!
//! let fresh = JournalStore::open("restored.db")?;
//! let outcome = import_file(&fresh, &backup)?;
//! println!("restored {} records", outcome.total_created());
//!
//! let report = build_year_report(&fresh.snapshot(), 2025, &Utc)?;
//! write_report(&report, &ReportMeta::default(), Path::new("reports"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod export;
pub mod font;
pub mod format;
pub mod import;
pub mod report;

pub use error::{BackupError, Result};

pub use export::{backup_file_name, export_document, export_json, write_backup, write_backup_to};

pub use format::{
    BACKUP_VERSION, BackupDocument, CategoryRow, ContactRow, ConversationRow, TemplatePhraseRow,
};

pub use import::{ImportFailure, ImportReport, Tally, import_file, import_json};

pub use report::{
    Page, PlacedText, ReportEntry, ReportMeta, TextStyle, YearReport, build_year_report, layout,
    render_pdf, render_text, report_file_name, write_report,
};
