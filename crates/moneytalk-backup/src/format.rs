//! The backup document.
//!
//! ```json
//! {
//!   "conversations": [{ "id", "title", "date", "goal", "outcome",
//!                       "emotionalRating", "notes", "isResolved",
//!                       "contactIds": [..], "categoryId" }],
//!   "contacts":      [{ "id", "name", "relationshipTag", "photoData" }],
//!   "categories":    [{ "id", "name", "iconName", "accentColor" }],
//!   "templatePhrases": [{ "id", "text", "categoryId" }],
//!   "exportDate": "2026-01-31T18:04:05Z",
//!   "version": "1.0"
//! }
//! ```
//!
//! Relationships are id references into the same file. Dates are ISO-8601 in
//! UTC with whole seconds; fractional seconds are accepted on read. The store
//! keeps microseconds, so a restored date can be up to a second earlier than
//! the one exported. Photo bytes are standard base64.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use moneytalk_store::{Category, Contact, Conversation, TemplatePhrase};

/// Format version written by this crate.
pub const BACKUP_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub conversations: Vec<ConversationRow>,
    pub contacts: Vec<ContactRow>,
    pub categories: Vec<CategoryRow>,
    pub template_phrases: Vec<TemplatePhraseRow>,
    #[serde(with = "iso8601")]
    pub export_date: DateTime<Utc>,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRow {
    pub id: String,
    pub title: String,
    #[serde(with = "iso8601")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    pub emotional_rating: i32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_resolved: bool,
    #[serde(default)]
    pub contact_ids: Vec<String>,
    #[serde(default)]
    pub category_id: Option<String>,
}

impl From<&Conversation> for ConversationRow {
    fn from(c: &Conversation) -> Self {
        Self {
            id: c.id.to_string(),
            title: c.title.clone(),
            date: c.date,
            goal: c.goal.clone(),
            outcome: c.outcome.clone(),
            emotional_rating: c.emotional_rating,
            notes: c.notes.clone(),
            is_resolved: c.is_resolved,
            contact_ids: c.contact_ids.iter().map(ToString::to_string).collect(),
            category_id: c.category_id.map(|id| id.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub relationship_tag: Option<String>,
    #[serde(default, with = "base64_bytes")]
    pub photo_data: Option<Vec<u8>>,
}

impl From<&Contact> for ContactRow {
    fn from(c: &Contact) -> Self {
        Self {
            id: c.id.to_string(),
            name: c.name.clone(),
            relationship_tag: c.relationship_tag.clone(),
            photo_data: c.photo_data.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon_name: Option<String>,
    #[serde(default)]
    pub accent_color: Option<String>,
}

impl From<&Category> for CategoryRow {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id.to_string(),
            name: c.name.clone(),
            icon_name: c.icon_name.clone(),
            accent_color: c.accent_color.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePhraseRow {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub category_id: Option<String>,
}

impl From<&TemplatePhrase> for TemplatePhraseRow {
    fn from(p: &TemplatePhrase) -> Self {
        Self {
            id: p.id.to_string(),
            text: p.text.clone(),
            category_id: p.category_id.map(|id| id.to_string()),
        }
    }
}

/// Whole-second UTC timestamps, lenient on read.
pub(crate) mod iso8601 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| de::Error::custom(format!("invalid date '{raw}': {e}")))
    }
}

/// Optional bytes as standard base64.
pub(crate) mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(data: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match data {
            Some(bytes) => s.serialize_str(&STANDARD.encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.filter(|s| !s.is_empty())
            .map(|s| STANDARD.decode(s.trim()))
            .transpose()
            .map_err(|e| de::Error::custom(format!("invalid photo data: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_conversation_row_field_names() {
        let row = ConversationRow {
            id: "c1".into(),
            title: "Rent".into(),
            date: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            goal: None,
            outcome: Some("Agreed".into()),
            emotional_rating: 8,
            notes: None,
            is_resolved: true,
            contact_ids: vec!["p1".into()],
            category_id: None,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["date"], "2025-03-01T12:00:00Z");
        assert_eq!(value["emotionalRating"], 8);
        assert_eq!(value["isResolved"], true);
        assert_eq!(value["contactIds"], json!(["p1"]));
        assert!(value["categoryId"].is_null());
    }

    #[test]
    fn test_date_drops_sub_seconds_on_write() {
        let date = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 7).unwrap()
            + chrono::Duration::microseconds(999_999);
        let conversation = ConversationRow {
            id: "c1".into(),
            title: "Rent".into(),
            date,
            goal: None,
            outcome: None,
            emotional_rating: 5,
            notes: None,
            is_resolved: false,
            contact_ids: vec![],
            category_id: None,
        };
        let value = serde_json::to_value(&conversation).unwrap();
        assert_eq!(value["date"], "2025-03-01T12:00:07Z");
        let back: ConversationRow = serde_json::from_value(value).unwrap();
        assert!(date - back.date < chrono::Duration::seconds(1));
        assert_eq!(back.date.timestamp(), date.timestamp());
    }

    #[test]
    fn test_date_accepts_fractional_seconds_and_offsets() {
        let row: ConversationRow = serde_json::from_value(json!({
            "id": "c1",
            "title": "Rent",
            "date": "2025-03-01T14:00:00.250+02:00",
            "emotionalRating": 5
        }))
        .unwrap();
        assert_eq!(row.date.to_rfc3339(), "2025-03-01T12:00:00.250+00:00");
        assert!(!row.is_resolved);
        assert!(row.contact_ids.is_empty());
    }

    #[test]
    fn test_photo_is_base64() {
        let row = ContactRow {
            id: "p1".into(),
            name: "Dana".into(),
            relationship_tag: None,
            photo_data: Some(vec![0xff, 0xd8, 0xff]),
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["photoData"], "/9j/");

        let back: ContactRow = serde_json::from_value(value).unwrap();
        assert_eq!(back.photo_data, Some(vec![0xff, 0xd8, 0xff]));
    }

    #[test]
    fn test_bad_photo_is_row_error() {
        let result: Result<ContactRow, _> = serde_json::from_value(json!({
            "id": "p1",
            "name": "Dana",
            "photoData": "!!not base64!!"
        }));
        assert!(result.is_err());
    }
}
