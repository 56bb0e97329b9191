//! Field validation for journal entities.
//!
//! Every validator is pure: it takes one field value (and, for dates, the
//! current time) and either accepts it or returns a [`ValidationError`]
//! naming the field and the reason. String values are trimmed of leading and
//! trailing whitespace before their length is checked; the store stores the
//! trimmed form.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::types::{
    Category, Contact, Conversation, NewCategory, NewContact, NewConversation, NewTemplatePhrase,
    TemplatePhrase,
};

// ─────────────────────────────────────────────────────────────────────────────
// Limits
// ─────────────────────────────────────────────────────────────────────────────

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_GOAL_LENGTH: usize = 1000;
pub const MAX_OUTCOME_LENGTH: usize = 1000;
pub const MAX_NOTES_LENGTH: usize = 2000;
pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_RELATIONSHIP_TAG_LENGTH: usize = 50;
pub const MAX_CATEGORY_NAME_LENGTH: usize = 50;
pub const MAX_TEMPLATE_PHRASE_LENGTH: usize = 500;

/// Largest accepted photo payload, before compression (5 MB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub const MIN_EMOTIONAL_RATING: i32 = 1;
pub const MAX_EMOTIONAL_RATING: i32 = 10;

/// How far into the future a conversation may be dated.
pub const MAX_FUTURE_DAYS: i64 = 365;

// ─────────────────────────────────────────────────────────────────────────────
// Validation Error
// ─────────────────────────────────────────────────────────────────────────────

/// The entity field a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Goal,
    Outcome,
    Notes,
    Name,
    RelationshipTag,
    CategoryName,
    AccentColor,
    TemplatePhrase,
    EmotionalRating,
    Date,
    Photo,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Goal => "goal",
            Self::Outcome => "outcome",
            Self::Notes => "notes",
            Self::Name => "name",
            Self::RelationshipTag => "relationship tag",
            Self::CategoryName => "category name",
            Self::AccentColor => "accent color",
            Self::TemplatePhrase => "template phrase",
            Self::EmotionalRating => "emotional rating",
            Self::Date => "date",
            Self::Photo => "photo",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field value that was rejected, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required text field is empty after trimming.
    #[error("{field} cannot be empty")]
    Empty { field: Field },

    /// A text field exceeds its character limit after trimming.
    #[error("{field} must be {max} characters or less (got {actual})")]
    TooLong {
        field: Field,
        max: usize,
        actual: usize,
    },

    /// Emotional rating outside [1, 10].
    #[error("emotional rating must be between 1 and 10 (got {0})")]
    RatingOutOfRange(i32),

    /// Conversation dated more than a year ahead.
    #[error("date cannot be more than 1 year in the future")]
    DateTooFarInFuture,

    /// Photo payload larger than the upload limit.
    #[error("image size must be 5MB or less (got {0} bytes)")]
    ImageTooLarge(usize),

    /// Accent color is not a six-digit hex string.
    #[error("accent color '{0}' is not a hex color")]
    InvalidAccentColor(String),
}

impl ValidationError {
    /// The field this failure refers to.
    pub fn field(&self) -> Field {
        match self {
            Self::Empty { field } | Self::TooLong { field, .. } => *field,
            Self::RatingOutOfRange(_) => Field::EmotionalRating,
            Self::DateTooFarInFuture => Field::Date,
            Self::ImageTooLarge(_) => Field::Photo,
            Self::InvalidAccentColor(_) => Field::AccentColor,
        }
    }
}

type ValidationResult = std::result::Result<(), ValidationError>;

// ─────────────────────────────────────────────────────────────────────────────
// Normalization
// ─────────────────────────────────────────────────────────────────────────────

/// Trim leading and trailing whitespace.
pub fn normalize_text(value: &str) -> String {
    value.trim().to_string()
}

/// Trim an optional value, mapping empty results to `None`.
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn char_len(value: &str) -> usize {
    value.trim().chars().count()
}

fn required(field: Field, value: &str, max: usize) -> ValidationResult {
    let len = char_len(value);
    if len == 0 {
        return Err(ValidationError::Empty { field });
    }
    if len > max {
        return Err(ValidationError::TooLong {
            field,
            max,
            actual: len,
        });
    }
    Ok(())
}

fn bounded(field: Field, value: &str, max: usize) -> ValidationResult {
    let len = char_len(value);
    if len > max {
        return Err(ValidationError::TooLong {
            field,
            max,
            actual: len,
        });
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Field Validators
// ─────────────────────────────────────────────────────────────────────────────

pub fn validate_title(title: &str) -> ValidationResult {
    required(Field::Title, title, MAX_TITLE_LENGTH)
}

pub fn validate_goal(goal: &str) -> ValidationResult {
    bounded(Field::Goal, goal, MAX_GOAL_LENGTH)
}

pub fn validate_outcome(outcome: &str) -> ValidationResult {
    bounded(Field::Outcome, outcome, MAX_OUTCOME_LENGTH)
}

pub fn validate_notes(notes: &str) -> ValidationResult {
    bounded(Field::Notes, notes, MAX_NOTES_LENGTH)
}

pub fn validate_contact_name(name: &str) -> ValidationResult {
    required(Field::Name, name, MAX_NAME_LENGTH)
}

pub fn validate_relationship_tag(tag: &str) -> ValidationResult {
    bounded(Field::RelationshipTag, tag, MAX_RELATIONSHIP_TAG_LENGTH)
}

pub fn validate_category_name(name: &str) -> ValidationResult {
    required(Field::CategoryName, name, MAX_CATEGORY_NAME_LENGTH)
}

pub fn validate_template_phrase(text: &str) -> ValidationResult {
    required(Field::TemplatePhrase, text, MAX_TEMPLATE_PHRASE_LENGTH)
}

pub fn validate_emotional_rating(rating: i32) -> ValidationResult {
    if !(MIN_EMOTIONAL_RATING..=MAX_EMOTIONAL_RATING).contains(&rating) {
        return Err(ValidationError::RatingOutOfRange(rating));
    }
    Ok(())
}

/// Reject dates later than `now` plus one year.
pub fn validate_date(date: DateTime<Utc>, now: DateTime<Utc>) -> ValidationResult {
    if date > now + Duration::days(MAX_FUTURE_DAYS) {
        return Err(ValidationError::DateTooFarInFuture);
    }
    Ok(())
}

pub fn validate_image_size(data: &[u8]) -> ValidationResult {
    if data.len() > MAX_IMAGE_BYTES {
        return Err(ValidationError::ImageTooLarge(data.len()));
    }
    Ok(())
}

/// Accept `RRGGBB` with an optional leading `#`.
pub fn validate_accent_color(color: &str) -> ValidationResult {
    let hex = color.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidAccentColor(color.to_string()));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Entity Validators
// ─────────────────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn check_conversation(
    title: &str,
    goal: Option<&str>,
    outcome: Option<&str>,
    notes: Option<&str>,
    rating: i32,
    date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> ValidationResult {
    validate_title(title)?;
    validate_goal(goal.unwrap_or_default())?;
    validate_outcome(outcome.unwrap_or_default())?;
    validate_notes(notes.unwrap_or_default())?;
    validate_emotional_rating(rating)?;
    validate_date(date, now)
}

/// Validate every field of a conversation draft.
pub fn validate_new_conversation(draft: &NewConversation, now: DateTime<Utc>) -> ValidationResult {
    check_conversation(
        &draft.title,
        draft.goal.as_deref(),
        draft.outcome.as_deref(),
        draft.notes.as_deref(),
        draft.emotional_rating,
        draft.date,
        now,
    )
}

/// Validate a conversation that was mutated in place.
pub fn validate_conversation(conversation: &Conversation, now: DateTime<Utc>) -> ValidationResult {
    check_conversation(
        &conversation.title,
        conversation.goal.as_deref(),
        conversation.outcome.as_deref(),
        conversation.notes.as_deref(),
        conversation.emotional_rating,
        conversation.date,
        now,
    )
}

pub fn validate_new_contact(draft: &NewContact) -> ValidationResult {
    validate_contact_name(&draft.name)?;
    if let Some(tag) = &draft.relationship_tag {
        validate_relationship_tag(tag)?;
    }
    if let Some(photo) = &draft.photo_data {
        validate_image_size(photo)?;
    }
    Ok(())
}

/// Photo bytes on an existing contact were normalized at creation and are not
/// re-checked here.
pub fn validate_contact(contact: &Contact) -> ValidationResult {
    validate_contact_name(&contact.name)?;
    if let Some(tag) = &contact.relationship_tag {
        validate_relationship_tag(tag)?;
    }
    Ok(())
}

fn check_category(name: &str, accent_color: Option<&str>) -> ValidationResult {
    validate_category_name(name)?;
    if let Some(color) = accent_color {
        validate_accent_color(color)?;
    }
    Ok(())
}

pub fn validate_new_category(draft: &NewCategory) -> ValidationResult {
    check_category(&draft.name, draft.accent_color.as_deref())
}

pub fn validate_category(category: &Category) -> ValidationResult {
    check_category(&category.name, category.accent_color.as_deref())
}

pub fn validate_new_template_phrase(draft: &NewTemplatePhrase) -> ValidationResult {
    validate_template_phrase(&draft.text)
}

pub fn validate_template_phrase_entity(phrase: &TemplatePhrase) -> ValidationResult {
    validate_template_phrase(&phrase.text)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
