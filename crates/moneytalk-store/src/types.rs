//! Core types for the journal store.
//!
//! - [`Conversation`]: one journaled money conversation
//! - [`Contact`]: a person conversations can involve
//! - [`Category`]: a topic grouping conversations and template phrases
//! - [`TemplatePhrase`]: a reusable opener, optionally owned by a category
//!
//! Each entity has a `New*` draft used for creation. Drafts carry no id; the
//! store assigns one.

use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{normalize_optional, normalize_text};

// ─────────────────────────────────────────────────────────────────────────────
// ID Types
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random ID.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a conversation.
    ConversationId
);
entity_id!(
    /// Unique identifier for a contact.
    ContactId
);
entity_id!(
    /// Unique identifier for a category.
    CategoryId
);
entity_id!(
    /// Unique identifier for a template phrase.
    TemplatePhraseId
);

// ─────────────────────────────────────────────────────────────────────────────
// Category Palette
// ─────────────────────────────────────────────────────────────────────────────

/// Icon assigned to categories created without one.
pub const DEFAULT_ICON: &str = "folder";

/// Accent color assigned to categories created without one.
pub const DEFAULT_ACCENT_COLOR: &str = "4A7C9B";

/// Icon names offered when creating a category.
pub const AVAILABLE_ICONS: &[&str] = &[
    "folder",
    "dollarsign.circle",
    "house",
    "briefcase",
    "heart",
    "person.2",
    "chart.bar",
    "creditcard",
    "gift",
    "cart",
    "banknote",
    "wallet.pass",
    "bag",
    "tag",
    "star",
];

/// Named accent colors offered when creating a category.
pub const NAMED_COLORS: &[(&str, &str)] = &[
    ("Trust Blue", "4A7C9B"),
    ("Calm Green", "6B9E78"),
    ("Soft Beige", "D4A574"),
    ("Warm Orange", "E8A87C"),
    ("Gentle Purple", "9B7CAA"),
    ("Coral", "FF6B6B"),
    ("Sky Blue", "4ECDC4"),
    ("Lavender", "A8A8D8"),
];

/// Rating given to conversations when none is chosen.
pub const DEFAULT_EMOTIONAL_RATING: i32 = 5;

/// Ratings at or above this count as successful.
pub const SUCCESS_THRESHOLD: i32 = 8;

/// Ratings below this count as difficult.
pub const DIFFICULT_THRESHOLD: i32 = 5;

// ─────────────────────────────────────────────────────────────────────────────
// Conversation
// ─────────────────────────────────────────────────────────────────────────────

/// A journaled money conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    pub emotional_rating: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub is_resolved: bool,
    /// Contacts in the order they were attached.
    #[serde(default)]
    pub contact_ids: Vec<ContactId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
}

impl Conversation {
    pub fn involves(&self, contact: ContactId) -> bool {
        self.contact_ids.contains(&contact)
    }

    pub fn is_successful(&self) -> bool {
        self.emotional_rating >= SUCCESS_THRESHOLD
    }

    /// Trim text fields in place, mapping blank optionals to `None`. Dates
    /// keep microsecond precision, as stored.
    pub fn normalize(&mut self) {
        self.date = self.date.trunc_subsecs(6);
        self.title = normalize_text(&self.title);
        self.goal = normalize_optional(self.goal.as_deref());
        self.outcome = normalize_optional(self.outcome.as_deref());
        self.notes = normalize_optional(self.notes.as_deref());
        dedup_in_order(&mut self.contact_ids);
    }
}

/// Fields for creating a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewConversation {
    pub title: String,
    pub date: DateTime<Utc>,
    pub goal: Option<String>,
    pub outcome: Option<String>,
    pub emotional_rating: i32,
    pub notes: Option<String>,
    pub is_resolved: bool,
    pub contact_ids: Vec<ContactId>,
    pub category_id: Option<CategoryId>,
}

impl NewConversation {
    pub fn new(title: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            date,
            goal: None,
            outcome: None,
            emotional_rating: DEFAULT_EMOTIONAL_RATING,
            notes: None,
            is_resolved: false,
            contact_ids: Vec::new(),
            category_id: None,
        }
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = Some(goal.into());
        self
    }

    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = Some(outcome.into());
        self
    }

    pub fn with_rating(mut self, rating: i32) -> Self {
        self.emotional_rating = rating;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_contacts(mut self, contacts: impl IntoIterator<Item = ContactId>) -> Self {
        self.contact_ids = contacts.into_iter().collect();
        self
    }

    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category_id = Some(category);
        self
    }

    pub fn resolved(mut self, resolved: bool) -> Self {
        self.is_resolved = resolved;
        self
    }

    /// Build the stored entity under a fresh id, with text trimmed.
    pub(crate) fn into_conversation(self) -> Conversation {
        let mut conversation = Conversation {
            id: ConversationId::new(),
            title: self.title,
            date: self.date,
            goal: self.goal,
            outcome: self.outcome,
            emotional_rating: self.emotional_rating,
            notes: self.notes,
            is_resolved: self.is_resolved,
            contact_ids: self.contact_ids,
            category_id: self.category_id,
        };
        conversation.normalize();
        conversation
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Contact
// ─────────────────────────────────────────────────────────────────────────────

/// A person money conversations are held with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_tag: Option<String>,
    /// Normalized JPEG bytes.
    #[serde(skip_serializing, default)]
    pub photo_data: Option<Vec<u8>>,
}

impl Contact {
    pub fn has_photo(&self) -> bool {
        self.photo_data.is_some()
    }

    /// Two-letter initials shown in place of a missing photo.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }

    pub fn normalize(&mut self) {
        self.name = normalize_text(&self.name);
        self.relationship_tag = normalize_optional(self.relationship_tag.as_deref());
    }
}

/// Fields for creating a contact.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewContact {
    pub name: String,
    pub relationship_tag: Option<String>,
    /// Raw image bytes in any supported format; normalized before storage.
    pub photo_data: Option<Vec<u8>>,
}

impl NewContact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_relationship(mut self, tag: impl Into<String>) -> Self {
        self.relationship_tag = Some(tag.into());
        self
    }

    pub fn with_photo(mut self, data: Vec<u8>) -> Self {
        self.photo_data = Some(data);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Category
// ─────────────────────────────────────────────────────────────────────────────

/// A topic that groups conversations and owns template phrases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_name: Option<String>,
    /// Six hex digits, no leading `#`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
}

impl Category {
    pub fn icon_or_default(&self) -> &str {
        self.icon_name.as_deref().unwrap_or(DEFAULT_ICON)
    }

    pub fn accent_or_default(&self) -> &str {
        self.accent_color.as_deref().unwrap_or(DEFAULT_ACCENT_COLOR)
    }

    pub fn normalize(&mut self) {
        self.name = normalize_text(&self.name);
        self.icon_name = normalize_optional(self.icon_name.as_deref());
        self.accent_color = normalize_color(self.accent_color.as_deref());
    }
}

/// Fields for creating a category.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewCategory {
    pub name: String,
    pub icon_name: Option<String>,
    pub accent_color: Option<String>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon_name = Some(icon.into());
        self
    }

    pub fn with_accent_color(mut self, color: impl Into<String>) -> Self {
        self.accent_color = Some(color.into());
        self
    }

    pub(crate) fn into_category(self) -> Category {
        let mut category = Category {
            id: CategoryId::new(),
            name: self.name,
            icon_name: self.icon_name,
            accent_color: self.accent_color,
        };
        category.normalize();
        category
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Template Phrase
// ─────────────────────────────────────────────────────────────────────────────

/// A reusable conversation opener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatePhrase {
    pub id: TemplatePhraseId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
}

impl TemplatePhrase {
    pub fn normalize(&mut self) {
        self.text = normalize_text(&self.text);
    }
}

/// Fields for creating a template phrase.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewTemplatePhrase {
    pub text: String,
    pub category_id: Option<CategoryId>,
}

impl NewTemplatePhrase {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category_id: None,
        }
    }

    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category_id = Some(category);
        self
    }

    pub(crate) fn into_phrase(self) -> TemplatePhrase {
        let mut phrase = TemplatePhrase {
            id: TemplatePhraseId::new(),
            text: self.text,
            category_id: self.category_id,
        };
        phrase.normalize();
        phrase
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Trim, strip a leading `#` and uppercase an accent color.
pub fn normalize_color(color: Option<&str>) -> Option<String> {
    normalize_optional(color).map(|c| c.trim_start_matches('#').to_ascii_uppercase())
}

fn dedup_in_order<T: PartialEq + Copy>(items: &mut Vec<T>) {
    let mut seen: Vec<T> = Vec::with_capacity(items.len());
    items.retain(|item| {
        if seen.contains(item) {
            false
        } else {
            seen.push(*item);
            true
        }
    });
}
