//! Contact create, update, photo, and delete.

use rusqlite::{OptionalExtension, params};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::policy::EntityKind;
use crate::types::{Contact, ContactId, NewContact};
use crate::validation::{validate_contact, validate_new_contact};

use super::{JournalStore, delete_with_rules};

impl JournalStore {
    /// Validate and persist a new contact. A photo, if given, is normalized
    /// before anything is written.
    pub fn create_contact(&self, draft: NewContact) -> Result<Contact> {
        validate_new_contact(&draft)?;
        let photo_data = draft
            .photo_data
            .as_deref()
            .map(|data| self.photos.normalize(data))
            .transpose()?;

        let mut contact = Contact {
            id: ContactId::new(),
            name: draft.name,
            relationship_tag: draft.relationship_tag,
            photo_data,
        };
        contact.normalize();

        self.write(|conn, touched| {
            conn.execute(
                "INSERT INTO contacts (id, name, relationship_tag, photo_data)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    contact.id.to_string(),
                    contact.name,
                    contact.relationship_tag,
                    contact.photo_data,
                ],
            )?;
            touched.insert(EntityKind::Contact);
            Ok(())
        })?;

        debug!(id = %contact.id, has_photo = contact.has_photo(), "created contact");
        Ok(contact)
    }

    /// Persist a renamed or re-tagged contact.
    ///
    /// Photo bytes are not written here; use [`JournalStore::set_contact_photo`].
    pub fn update_contact(&self, contact: &Contact) -> Result<Contact> {
        let mut updated = contact.clone();
        updated.normalize();
        validate_contact(&updated)?;

        let updated = self.write(|conn, touched| {
            let id = updated.id.to_string();
            let rows = conn.execute(
                "UPDATE contacts SET name = ?2, relationship_tag = ?3 WHERE id = ?1",
                params![id, updated.name, updated.relationship_tag],
            )?;
            if rows == 0 {
                return Err(StoreError::NotFound(format!("contact {id}")));
            }
            let photo_data: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT photo_data FROM contacts WHERE id = ?1",
                    params![id],
                    |row| row.get::<_, Option<Vec<u8>>>(0),
                )
                .optional()?
                .flatten();
            touched.insert(EntityKind::Contact);
            Ok(Contact {
                photo_data,
                ..updated
            })
        })?;

        debug!(id = %updated.id, "updated contact");
        Ok(updated)
    }

    /// Replace or clear a contact's photo.
    pub fn set_contact_photo(&self, id: ContactId, data: Option<&[u8]>) -> Result<Contact> {
        let photo_data = data.map(|d| self.photos.normalize(d)).transpose()?;

        self.write(|conn, touched| {
            let rows = conn.execute(
                "UPDATE contacts SET photo_data = ?2 WHERE id = ?1",
                params![id.to_string(), photo_data],
            )?;
            if rows == 0 {
                return Err(StoreError::NotFound(format!("contact {id}")));
            }
            touched.insert(EntityKind::Contact);
            Ok(())
        })?;

        self.contact(id)
            .ok_or_else(|| StoreError::NotFound(format!("contact {id}")))
    }

    /// Remove a contact and unlink it from every conversation.
    pub fn delete_contact(&self, id: ContactId) -> Result<()> {
        self.write(|conn, touched| {
            let removed = delete_with_rules(conn, EntityKind::Contact, &id.to_string(), touched)?;
            if removed == 0 {
                return Err(StoreError::NotFound(format!("contact {id}")));
            }
            Ok(())
        })?;
        debug!(%id, "deleted contact");
        Ok(())
    }
}
