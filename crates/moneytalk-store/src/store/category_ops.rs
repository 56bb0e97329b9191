//! Category create, update, and delete.

use rusqlite::params;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::policy::EntityKind;
use crate::types::{Category, CategoryId, NewCategory};
use crate::validation::{validate_category, validate_new_category};

use super::{JournalStore, delete_with_rules};

impl JournalStore {
    pub fn create_category(&self, draft: NewCategory) -> Result<Category> {
        validate_new_category(&draft)?;
        let category = draft.into_category();

        self.write(|conn, touched| {
            conn.execute(
                "INSERT INTO categories (id, name, icon_name, accent_color) VALUES (?1, ?2, ?3, ?4)",
                params![
                    category.id.to_string(),
                    category.name,
                    category.icon_name,
                    category.accent_color,
                ],
            )?;
            touched.insert(EntityKind::Category);
            Ok(())
        })?;

        debug!(id = %category.id, name = %category.name, "created category");
        Ok(category)
    }

    pub fn update_category(&self, category: &Category) -> Result<Category> {
        let mut updated = category.clone();
        updated.normalize();
        validate_category(&updated)?;

        self.write(|conn, touched| {
            let rows = conn.execute(
                "UPDATE categories SET name = ?2, icon_name = ?3, accent_color = ?4 WHERE id = ?1",
                params![
                    updated.id.to_string(),
                    updated.name,
                    updated.icon_name,
                    updated.accent_color,
                ],
            )?;
            if rows == 0 {
                return Err(StoreError::NotFound(format!("category {}", updated.id)));
            }
            touched.insert(EntityKind::Category);
            Ok(())
        })?;

        debug!(id = %updated.id, "updated category");
        Ok(updated)
    }

    /// Remove a category. Its conversations lose their category; its template
    /// phrases are deleted with it.
    pub fn delete_category(&self, id: CategoryId) -> Result<()> {
        self.write(|conn, touched| {
            let removed =
                delete_with_rules(conn, EntityKind::Category, &id.to_string(), touched)?;
            if removed == 0 {
                return Err(StoreError::NotFound(format!("category {id}")));
            }
            Ok(())
        })?;
        debug!(%id, "deleted category");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::types::{NewConversation, NewTemplatePhrase};

    fn store() -> JournalStore {
        JournalStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_create_category_normalizes_color() {
        let store = store();
        let category = store
            .create_category(
                NewCategory::new(" Salary ")
                    .with_icon("briefcase")
                    .with_accent_color("#6b9e78"),
            )
            .unwrap();
        assert_eq!(category.name, "Salary");
        assert_eq!(category.accent_color.as_deref(), Some("6B9E78"));
        assert_eq!(store.snapshot().category(category.id), Some(&category));
    }

    #[test]
    fn test_invalid_color_rejected() {
        let store = store();
        let err = store
            .create_category(NewCategory::new("Rent").with_accent_color("teal"))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(store.snapshot().categories().is_empty());
    }

    #[test]
    fn test_delete_category_nullifies_and_cascades() {
        let store = store();
        let rent = store.create_category(NewCategory::new("Rent")).unwrap();
        let other = store.create_category(NewCategory::new("Other")).unwrap();

        let mut ids = Vec::new();
        for title in ["June rent", "July rent", "Deposit"] {
            let c = store
                .create_conversation(NewConversation::new(title, Utc::now()).with_category(rent.id))
                .unwrap();
            ids.push(c.id);
        }
        store
            .create_template_phrase(NewTemplatePhrase::new("Can we split it?").with_category(rent.id))
            .unwrap();
        store
            .create_template_phrase(NewTemplatePhrase::new("Is this fair?").with_category(rent.id))
            .unwrap();
        let kept = store
            .create_template_phrase(NewTemplatePhrase::new("Let's plan.").with_category(other.id))
            .unwrap();

        store.delete_category(rent.id).unwrap();

        let snapshot = store.snapshot();
        assert!(snapshot.category(rent.id).is_none());
        for id in ids {
            assert_eq!(snapshot.conversation(id).unwrap().category_id, None);
        }
        assert_eq!(snapshot.template_phrases().len(), 1);
        assert_eq!(snapshot.template_phrases()[0].id, kept.id);

        // Survives a reload from storage
        let reloaded = store.load_all().unwrap();
        assert!(reloaded.conversations().iter().all(|c| c.category_id.is_none()));
        assert_eq!(reloaded.template_phrases().len(), 1);
    }

    #[test]
    fn test_update_missing_category() {
        let store = store();
        let ghost = NewCategory::new("Ghost").into_category();
        assert!(matches!(
            store.update_category(&ghost),
            Err(StoreError::NotFound(_))
        ));
    }
}
