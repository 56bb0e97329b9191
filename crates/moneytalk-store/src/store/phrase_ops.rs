//! Template phrase create, update, and delete.

use rusqlite::{Connection, params};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::policy::EntityKind;
use crate::types::{NewTemplatePhrase, TemplatePhrase, TemplatePhraseId};
use crate::validation::{validate_new_template_phrase, validate_template_phrase_entity};

use super::{JournalStore, delete_with_rules, ensure_exists};

impl JournalStore {
    pub fn create_template_phrase(&self, draft: NewTemplatePhrase) -> Result<TemplatePhrase> {
        validate_new_template_phrase(&draft)?;
        let phrase = draft.into_phrase();

        self.write(|conn, touched| {
            check_category(conn, &phrase)?;
            conn.execute(
                "INSERT INTO template_phrases (id, text, category_id) VALUES (?1, ?2, ?3)",
                params![
                    phrase.id.to_string(),
                    phrase.text,
                    phrase.category_id.map(|id| id.to_string()),
                ],
            )?;
            touched.insert(EntityKind::TemplatePhrase);
            Ok(())
        })?;

        debug!(id = %phrase.id, "created template phrase");
        Ok(phrase)
    }

    pub fn update_template_phrase(&self, phrase: &TemplatePhrase) -> Result<TemplatePhrase> {
        let mut updated = phrase.clone();
        updated.normalize();
        validate_template_phrase_entity(&updated)?;

        self.write(|conn, touched| {
            check_category(conn, &updated)?;
            let rows = conn.execute(
                "UPDATE template_phrases SET text = ?2, category_id = ?3 WHERE id = ?1",
                params![
                    updated.id.to_string(),
                    updated.text,
                    updated.category_id.map(|id| id.to_string()),
                ],
            )?;
            if rows == 0 {
                return Err(StoreError::NotFound(format!("template phrase {}", updated.id)));
            }
            touched.insert(EntityKind::TemplatePhrase);
            Ok(())
        })?;

        debug!(id = %updated.id, "updated template phrase");
        Ok(updated)
    }

    pub fn delete_template_phrase(&self, id: TemplatePhraseId) -> Result<()> {
        self.write(|conn, touched| {
            let removed =
                delete_with_rules(conn, EntityKind::TemplatePhrase, &id.to_string(), touched)?;
            if removed == 0 {
                return Err(StoreError::NotFound(format!("template phrase {id}")));
            }
            Ok(())
        })?;
        debug!(%id, "deleted template phrase");
        Ok(())
    }
}

fn check_category(conn: &Connection, phrase: &TemplatePhrase) -> Result<()> {
    match phrase.category_id {
        Some(category) => ensure_exists(conn, EntityKind::Category, &category.to_string()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CategoryId, NewCategory};

    fn store() -> JournalStore {
        JournalStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_phrases_keep_insertion_order() {
        let store = store();
        for text in ["zeta", "alpha", "mid"] {
            store
                .create_template_phrase(NewTemplatePhrase::new(text))
                .unwrap();
        }
        let texts: Vec<_> = store
            .snapshot()
            .template_phrases()
            .iter()
            .map(|p| p.text.clone())
            .collect();
        assert_eq!(texts, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_phrase_with_unknown_category() {
        let store = store();
        let err = store
            .create_template_phrase(NewTemplatePhrase::new("Hi").with_category(CategoryId::new()))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_update_and_delete_phrase() {
        let store = store();
        let rent = store.create_category(NewCategory::new("Rent")).unwrap();
        let mut phrase = store
            .create_template_phrase(NewTemplatePhrase::new(" Can we talk? "))
            .unwrap();
        assert_eq!(phrase.text, "Can we talk?");

        phrase.category_id = Some(rent.id);
        phrase.text = "Can we talk about rent?".into();
        store.update_template_phrase(&phrase).unwrap();
        assert_eq!(store.snapshot().template_phrases_for(Some(rent.id)).len(), 1);

        phrase.text = String::new();
        assert!(store.update_template_phrase(&phrase).unwrap_err().is_validation());

        store.delete_template_phrase(phrase.id).unwrap();
        assert!(store.snapshot().template_phrases().is_empty());
        // Deleting a phrase leaves its category alone
        assert_eq!(store.snapshot().categories().len(), 1);
    }
}
