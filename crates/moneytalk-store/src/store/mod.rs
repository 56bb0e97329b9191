//! Journal store backed by SQLite.
//!
//! The store owns the database connection and the current [`Snapshot`].
//! Every mutation follows the same path: validate, open a transaction, write,
//! apply delete rules, re-read the affected collections inside the
//! transaction, commit, then swap the snapshot and publish a change event.
//! A failure anywhere before the commit rolls back and leaves the snapshot
//! untouched.

mod category_ops;
mod contact_ops;
mod conversation_ops;
mod phrase_ops;

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::{Mutex, RwLock};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::notify::{ChangeNotifier, ChangeSubscription};
use crate::photo::{JpegPhotoProcessor, PhotoProcessor};
use crate::policy::{self, DeletePolicy, EntityKind, Relationship};
use crate::query::Snapshot;
use crate::types::{
    Category, CategoryId, Contact, ContactId, Conversation, ConversationId, TemplatePhrase,
};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

// ─────────────────────────────────────────────────────────────────────────────
// Journal Store
// ─────────────────────────────────────────────────────────────────────────────

/// The single owner of the journal's entities.
///
/// Construct one at startup and share it by reference. Writes are serialized
/// through the connection mutex; reads go through [`JournalStore::snapshot`]
/// and never block on the database.
pub struct JournalStore {
    conn: Mutex<Connection>,
    snapshot: RwLock<Arc<Snapshot>>,
    notifier: ChangeNotifier,
    photos: Box<dyn PhotoProcessor>,
}

impl std::fmt::Debug for JournalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("JournalStore")
            .field("conversations", &snapshot.conversations.len())
            .field("contacts", &snapshot.contacts.len())
            .field("categories", &snapshot.categories.len())
            .field("template_phrases", &snapshot.template_phrases.len())
            .field("version", &self.notifier.version())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Initialization
// ─────────────────────────────────────────────────────────────────────────────

impl JournalStore {
    /// Open (or create) the journal at `path` and run pending migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let store = Self::initialize(conn)?;
        info!(path = %path.display(), "journal store opened");
        Ok(store)
    }

    /// Open an in-memory journal (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let store = Self::initialize(conn)?;
        debug!("in-memory journal store created");
        Ok(store)
    }

    fn initialize(mut conn: Connection) -> Result<Self> {
        let report = embedded::migrations::runner()
            .run(&mut conn)
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        for migration in report.applied_migrations() {
            info!(migration = %migration, "applied migration");
        }

        let store = Self {
            conn: Mutex::new(conn),
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
            notifier: ChangeNotifier::new(),
            photos: Box::new(JpegPhotoProcessor::default()),
        };
        store.load_all()?;
        Ok(store)
    }

    /// Replace the photo normalizer used by contact writes.
    pub fn with_photo_processor(mut self, processor: impl PhotoProcessor + 'static) -> Self {
        self.photos = Box::new(processor);
        self
    }

    /// Reload all four collections from storage.
    pub fn load_all(&self) -> Result<Arc<Snapshot>> {
        let conn = self.conn.lock();
        let next = Arc::new(Snapshot::new(
            load_conversations(&conn)?,
            load_contacts(&conn)?,
            load_categories(&conn)?,
            load_template_phrases(&conn)?,
        ));
        *self.snapshot.write() = Arc::clone(&next);
        debug!(
            conversations = next.conversations.len(),
            contacts = next.contacts.len(),
            categories = next.categories.len(),
            template_phrases = next.template_phrases.len(),
            "loaded all collections"
        );
        Ok(next)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reads and Notifications
// ─────────────────────────────────────────────────────────────────────────────

impl JournalStore {
    /// The state as of the last committed write.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read())
    }

    pub fn subscribe(&self) -> ChangeSubscription {
        self.notifier.subscribe()
    }

    /// Number of committed mutations since open.
    pub fn version(&self) -> u64 {
        self.notifier.version()
    }

    pub fn conversation(&self, id: ConversationId) -> Option<Conversation> {
        self.snapshot().conversation(id).cloned()
    }

    pub fn contact(&self, id: ContactId) -> Option<Contact> {
        self.snapshot().contact(id).cloned()
    }

    pub fn category(&self, id: CategoryId) -> Option<Category> {
        self.snapshot().category(id).cloned()
    }

    /// Delete every entity in one transaction.
    pub fn reset_all(&self) -> Result<()> {
        self.write(|conn, touched| {
            conn.execute_batch(
                "DELETE FROM conversation_contacts;
                 DELETE FROM conversations;
                 DELETE FROM template_phrases;
                 DELETE FROM contacts;
                 DELETE FROM categories;",
            )?;
            touched.extend([
                EntityKind::Conversation,
                EntityKind::Contact,
                EntityKind::Category,
                EntityKind::TemplatePhrase,
            ]);
            Ok(())
        })?;
        info!("journal reset");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Write Path
// ─────────────────────────────────────────────────────────────────────────────

impl JournalStore {
    /// Run `f` in a transaction, reload what it touched, commit, then publish.
    ///
    /// `f` records the collections it changed in `touched`. The snapshot is
    /// swapped only after the commit succeeds.
    pub(crate) fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection, &mut BTreeSet<EntityKind>) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let mut touched = BTreeSet::new();
        let value = f(&tx, &mut touched)?;

        let mut next = Snapshot::clone(&self.snapshot());
        for kind in &touched {
            match kind {
                EntityKind::Conversation => next.conversations = load_conversations(&tx)?,
                EntityKind::Contact => next.contacts = load_contacts(&tx)?,
                EntityKind::Category => next.categories = load_categories(&tx)?,
                EntityKind::TemplatePhrase => next.template_phrases = load_template_phrases(&tx)?,
            }
        }
        next.sort();

        tx.commit()?;

        *self.snapshot.write() = Arc::new(next);
        let event = self.notifier.publish(touched.into_iter().collect());
        debug!(version = event.version, collections = ?event.collections, "committed");
        Ok(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Delete Rules
// ─────────────────────────────────────────────────────────────────────────────

fn table_of(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Conversation => "conversations",
        EntityKind::Contact => "contacts",
        EntityKind::Category => "categories",
        EntityKind::TemplatePhrase => "template_phrases",
    }
}

/// How a relationship is stored.
enum Link {
    /// `table.column` holds the owner's id.
    ForeignKey {
        table: &'static str,
        column: &'static str,
    },
    /// Membership rows; conversations hold the in-memory side.
    Join {
        table: &'static str,
        owner_column: &'static str,
        dependent_column: &'static str,
    },
}

fn link_for(rel: &Relationship) -> Option<Link> {
    use EntityKind::*;
    match (rel.owner, rel.dependent) {
        (Contact, Conversation) => Some(Link::Join {
            table: "conversation_contacts",
            owner_column: "contact_id",
            dependent_column: "conversation_id",
        }),
        (Conversation, Contact) => Some(Link::Join {
            table: "conversation_contacts",
            owner_column: "conversation_id",
            dependent_column: "contact_id",
        }),
        (Category, Conversation) => Some(Link::ForeignKey {
            table: "conversations",
            column: "category_id",
        }),
        (Category, TemplatePhrase) => Some(Link::ForeignKey {
            table: "template_phrases",
            column: "category_id",
        }),
        _ => None,
    }
}

/// Delete one entity after applying every rule it owns.
///
/// Returns the number of rows removed for the entity itself (0 or 1).
pub(crate) fn delete_with_rules(
    conn: &Connection,
    kind: EntityKind,
    id: &str,
    touched: &mut BTreeSet<EntityKind>,
) -> Result<usize> {
    for rule in policy::rules_for(kind) {
        let link = link_for(rule).ok_or_else(|| {
            StoreError::InvalidData(format!(
                "no storage link for {} -> {}",
                rule.owner, rule.dependent
            ))
        })?;

        match (link, rule.policy) {
            (Link::ForeignKey { table, column }, DeletePolicy::Nullify) => {
                let n = conn.execute(
                    &format!("UPDATE {table} SET {column} = NULL WHERE {column} = ?1"),
                    params![id],
                )?;
                debug!(owner = %kind, dependent = %rule.dependent, rows = n, "nullified");
                touched.insert(rule.dependent);
            }
            (Link::ForeignKey { table, column }, DeletePolicy::Cascade) => {
                let ids = select_ids(
                    conn,
                    &format!("SELECT id FROM {table} WHERE {column} = ?1"),
                    id,
                )?;
                debug!(owner = %kind, dependent = %rule.dependent, rows = ids.len(), "cascading");
                for dependent in ids {
                    delete_with_rules(conn, rule.dependent, &dependent, touched)?;
                }
                touched.insert(rule.dependent);
            }
            (
                Link::Join {
                    table,
                    owner_column,
                    ..
                },
                DeletePolicy::Nullify,
            ) => {
                let n = conn.execute(
                    &format!("DELETE FROM {table} WHERE {owner_column} = ?1"),
                    params![id],
                )?;
                if n > 0 {
                    debug!(owner = %kind, rows = n, "unlinked memberships");
                }
                touched.insert(EntityKind::Conversation);
            }
            (
                Link::Join {
                    table,
                    owner_column,
                    dependent_column,
                },
                DeletePolicy::Cascade,
            ) => {
                let ids = select_ids(
                    conn,
                    &format!("SELECT {dependent_column} FROM {table} WHERE {owner_column} = ?1"),
                    id,
                )?;
                conn.execute(
                    &format!("DELETE FROM {table} WHERE {owner_column} = ?1"),
                    params![id],
                )?;
                for dependent in ids {
                    delete_with_rules(conn, rule.dependent, &dependent, touched)?;
                }
                touched.insert(rule.dependent);
                touched.insert(EntityKind::Conversation);
            }
        }
    }

    let removed = conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1", table_of(kind)),
        params![id],
    )?;
    touched.insert(kind);
    Ok(removed)
}

fn select_ids(conn: &Connection, sql: &str, id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map(params![id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}

/// Fail with `NotFound` unless an entity of `kind` with `id` exists.
pub(crate) fn ensure_exists(conn: &Connection, kind: EntityKind, id: &str) -> Result<()> {
    let found: Option<i64> = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE id = ?1", table_of(kind)),
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(StoreError::NotFound(format!("{kind} {id}"))),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row Mapping
// ─────────────────────────────────────────────────────────────────────────────

/// Fixed-precision RFC 3339 so that text order is chronological.
pub(crate) fn format_dt(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_dt(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_id<T>(idx: usize, s: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = uuid::Error>,
{
    s.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_conversation(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    let category: Option<String> = row.get(8)?;
    Ok(Conversation {
        id: parse_id(0, &row.get::<_, String>(0)?)?,
        title: row.get(1)?,
        date: parse_dt(2, &row.get::<_, String>(2)?)?,
        goal: row.get(3)?,
        outcome: row.get(4)?,
        emotional_rating: row.get(5)?,
        notes: row.get(6)?,
        is_resolved: row.get::<_, i32>(7)? != 0,
        contact_ids: Vec::new(),
        category_id: category.map(|s| parse_id(8, &s)).transpose()?,
    })
}

fn row_to_contact(row: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: parse_id(0, &row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        relationship_tag: row.get(2)?,
        photo_data: row.get(3)?,
    })
}

fn row_to_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: parse_id(0, &row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        icon_name: row.get(2)?,
        accent_color: row.get(3)?,
    })
}

fn row_to_template_phrase(row: &Row<'_>) -> rusqlite::Result<TemplatePhrase> {
    let category: Option<String> = row.get(2)?;
    Ok(TemplatePhrase {
        id: parse_id(0, &row.get::<_, String>(0)?)?,
        text: row.get(1)?,
        category_id: category.map(|s| parse_id(2, &s)).transpose()?,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Collection Loading
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) fn load_conversations(conn: &Connection) -> Result<Vec<Conversation>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, date, goal, outcome, emotional_rating, notes, is_resolved, category_id
         FROM conversations
         ORDER BY date DESC, rowid ASC",
    )?;
    let mut conversations = stmt
        .query_map([], row_to_conversation)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut members: HashMap<ConversationId, Vec<ContactId>> = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT conversation_id, contact_id FROM conversation_contacts
         ORDER BY conversation_id, position",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let conversation: ConversationId = parse_id(0, &row.get::<_, String>(0)?)?;
        let contact: ContactId = parse_id(1, &row.get::<_, String>(1)?)?;
        members.entry(conversation).or_default().push(contact);
    }

    for conversation in &mut conversations {
        if let Some(contacts) = members.remove(&conversation.id) {
            conversation.contact_ids = contacts;
        }
    }
    Ok(conversations)
}

pub(crate) fn load_contacts(conn: &Connection) -> Result<Vec<Contact>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, relationship_tag, photo_data FROM contacts
         ORDER BY name COLLATE NOCASE, name",
    )?;
    let contacts = stmt
        .query_map([], row_to_contact)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(contacts)
}

pub(crate) fn load_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, icon_name, accent_color FROM categories
         ORDER BY name COLLATE NOCASE, name",
    )?;
    let categories = stmt
        .query_map([], row_to_category)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(categories)
}

pub(crate) fn load_template_phrases(conn: &Connection) -> Result<Vec<TemplatePhrase>> {
    let mut stmt =
        conn.prepare("SELECT id, text, category_id FROM template_phrases ORDER BY rowid")?;
    let phrases = stmt
        .query_map([], row_to_template_phrase)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(phrases)
}
