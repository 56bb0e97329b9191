//! Conversation create, update, and delete.

use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::policy::EntityKind;
use crate::types::{Conversation, ConversationId, NewConversation};
use crate::validation::{validate_conversation, validate_new_conversation};

use super::{JournalStore, delete_with_rules, ensure_exists, format_dt};

impl JournalStore {
    /// Validate and persist a new conversation.
    ///
    /// Referenced contacts and category must exist.
    pub fn create_conversation(&self, draft: NewConversation) -> Result<Conversation> {
        validate_new_conversation(&draft, Utc::now())?;
        let conversation = draft.into_conversation();

        self.write(|conn, touched| {
            check_references(conn, &conversation)?;
            conn.execute(
                "INSERT INTO conversations
                    (id, title, date, goal, outcome, emotional_rating, notes, is_resolved, category_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    conversation.id.to_string(),
                    conversation.title,
                    format_dt(&conversation.date),
                    conversation.goal,
                    conversation.outcome,
                    conversation.emotional_rating,
                    conversation.notes,
                    conversation.is_resolved as i32,
                    conversation.category_id.map(|id| id.to_string()),
                ],
            )?;
            write_memberships(conn, &conversation)?;
            touched.insert(EntityKind::Conversation);
            Ok(())
        })?;

        debug!(id = %conversation.id, "created conversation");
        Ok(conversation)
    }

    /// Persist a conversation the caller mutated in place.
    ///
    /// The entity is trimmed and re-validated first; on failure nothing is
    /// written. Returns the stored form.
    pub fn update_conversation(&self, conversation: &Conversation) -> Result<Conversation> {
        let mut updated = conversation.clone();
        updated.normalize();
        validate_conversation(&updated, Utc::now())?;

        self.write(|conn, touched| {
            check_references(conn, &updated)?;
            let rows = conn.execute(
                "UPDATE conversations
                 SET title = ?2, date = ?3, goal = ?4, outcome = ?5, emotional_rating = ?6,
                     notes = ?7, is_resolved = ?8, category_id = ?9
                 WHERE id = ?1",
                params![
                    updated.id.to_string(),
                    updated.title,
                    format_dt(&updated.date),
                    updated.goal,
                    updated.outcome,
                    updated.emotional_rating,
                    updated.notes,
                    updated.is_resolved as i32,
                    updated.category_id.map(|id| id.to_string()),
                ],
            )?;
            if rows == 0 {
                return Err(StoreError::NotFound(format!("conversation {}", updated.id)));
            }
            write_memberships(conn, &updated)?;
            touched.insert(EntityKind::Conversation);
            Ok(())
        })?;

        debug!(id = %updated.id, "updated conversation");
        Ok(updated)
    }

    /// Remove a conversation. Its contacts and category are untouched.
    pub fn delete_conversation(&self, id: ConversationId) -> Result<()> {
        self.write(|conn, touched| {
            let removed =
                delete_with_rules(conn, EntityKind::Conversation, &id.to_string(), touched)?;
            if removed == 0 {
                return Err(StoreError::NotFound(format!("conversation {id}")));
            }
            Ok(())
        })?;
        debug!(%id, "deleted conversation");
        Ok(())
    }

    /// Mark a conversation resolved or open.
    pub fn set_resolved(&self, id: ConversationId, resolved: bool) -> Result<Conversation> {
        let mut conversation = self
            .conversation(id)
            .ok_or_else(|| StoreError::NotFound(format!("conversation {id}")))?;
        conversation.is_resolved = resolved;
        self.update_conversation(&conversation)
    }
}

fn check_references(conn: &Connection, conversation: &Conversation) -> Result<()> {
    for contact in &conversation.contact_ids {
        ensure_exists(conn, EntityKind::Contact, &contact.to_string())?;
    }
    if let Some(category) = conversation.category_id {
        ensure_exists(conn, EntityKind::Category, &category.to_string())?;
    }
    Ok(())
}

/// Replace the conversation's contact links, keeping attach order.
fn write_memberships(conn: &Connection, conversation: &Conversation) -> Result<()> {
    let id = conversation.id.to_string();
    conn.execute(
        "DELETE FROM conversation_contacts WHERE conversation_id = ?1",
        params![id],
    )?;
    let mut stmt = conn.prepare(
        "INSERT INTO conversation_contacts (conversation_id, contact_id, position)
         VALUES (?1, ?2, ?3)",
    )?;
    for (position, contact) in conversation.contact_ids.iter().enumerate() {
        stmt.execute(params![id, contact.to_string(), position as i64])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::error::ErrorKind;
    use crate::types::{ContactId, NewCategory, NewContact};
    use crate::validation::{Field, ValidationError};

    fn store() -> JournalStore {
        JournalStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_create_conversation_trims_and_reloads() {
        let store = store();
        let date = Utc.with_ymd_and_hms(2025, 4, 2, 18, 30, 0).unwrap();
        let created = store
            .create_conversation(
                NewConversation::new("  Asked for a raise ", date)
                    .with_goal(" 10% ")
                    .with_notes("   ")
                    .with_rating(8),
            )
            .unwrap();

        assert_eq!(created.title, "Asked for a raise");
        assert_eq!(created.goal.as_deref(), Some("10%"));
        assert_eq!(created.notes, None);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.conversations().len(), 1);
        assert_eq!(snapshot.conversation(created.id), Some(&created));
        assert_eq!(store.version(), 1);

        // Reload from storage sees the same thing
        let reloaded = store.load_all().unwrap();
        assert_eq!(reloaded.conversation(created.id), Some(&created));
    }

    #[test]
    fn test_invalid_title_writes_nothing() {
        let store = store();
        for title in [String::new(), "x".repeat(201)] {
            let err = store
                .create_conversation(NewConversation::new(title, Utc::now()))
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
        assert!(store.snapshot().conversations().is_empty());
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_far_future_date_rejected() {
        let store = store();
        let err = store
            .create_conversation(NewConversation::new("Later", Utc::now() + Duration::days(400)))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::DateTooFarInFuture)
        ));
    }

    #[test]
    fn test_unknown_contact_is_not_found() {
        let store = store();
        let err = store
            .create_conversation(
                NewConversation::new("Lunch", Utc::now()).with_contacts([ContactId::new()]),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(store.snapshot().conversations().is_empty());
    }

    #[test]
    fn test_contact_order_is_preserved() {
        let store = store();
        let zed = store.create_contact(NewContact::new("Zed")).unwrap();
        let amy = store.create_contact(NewContact::new("Amy")).unwrap();
        let created = store
            .create_conversation(
                NewConversation::new("Split the bill", Utc::now()).with_contacts([zed.id, amy.id]),
            )
            .unwrap();

        let reloaded = store.load_all().unwrap();
        assert_eq!(
            reloaded.conversation(created.id).unwrap().contact_ids,
            vec![zed.id, amy.id]
        );
    }

    #[test]
    fn test_update_revalidates() {
        let store = store();
        let created = store
            .create_conversation(NewConversation::new("Budget", Utc::now()))
            .unwrap();

        let mut edited = created.clone();
        edited.title = "   ".into();
        let err = store.update_conversation(&edited).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::Empty { field: Field::Title })
        ));
        assert_eq!(store.snapshot().conversation(created.id), Some(&created));

        edited.title = " Budget review ".into();
        edited.emotional_rating = 9;
        let updated = store.update_conversation(&edited).unwrap();
        assert_eq!(updated.title, "Budget review");
        assert_eq!(
            store.snapshot().conversation(created.id).unwrap().emotional_rating,
            9
        );
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let store = store();
        let ghost = NewConversation::new("Ghost", Utc::now()).into_conversation();
        assert!(matches!(
            store.update_conversation(&ghost),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_conversation_keeps_contacts_and_category() {
        let store = store();
        let dana = store.create_contact(NewContact::new("Dana")).unwrap();
        let rent = store.create_category(NewCategory::new("Rent")).unwrap();
        let created = store
            .create_conversation(
                NewConversation::new("Rent talk", Utc::now())
                    .with_contacts([dana.id])
                    .with_category(rent.id),
            )
            .unwrap();

        store.delete_conversation(created.id).unwrap();
        let snapshot = store.snapshot();
        assert!(snapshot.conversations().is_empty());
        assert_eq!(snapshot.contacts().len(), 1);
        assert_eq!(snapshot.categories().len(), 1);

        assert!(matches!(
            store.delete_conversation(created.id),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_set_resolved() {
        let store = store();
        let created = store
            .create_conversation(NewConversation::new("Loan", Utc::now()))
            .unwrap();
        assert!(!created.is_resolved);
        let resolved = store.set_resolved(created.id, true).unwrap();
        assert!(resolved.is_resolved);
        assert_eq!(store.snapshot().resolved_count(), 1);
    }
}
