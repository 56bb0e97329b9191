//! Journal storage for money conversations.
//!
//! This crate owns the four entity collections (conversations, contacts,
//! categories, template phrases), their relationships, and the read-only
//! views computed over them. It uses SQLite for durability and keeps an
//! immutable in-memory [`Snapshot`] that is swapped after every committed
//! write.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  JournalStore                                                           │
//! │  - Single SQLite file with WAL mode, refinery migrations                │
//! │  - Validate → transaction → delete rules → reload → commit → publish    │
//! │  - Arc<Snapshot> for readers; ChangeNotifier for subscribers            │
//! └─────────────────────────────────────────────────────────────────────────┘
//!                │ snapshot()
//!                ▼
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Snapshot (query.rs)                                                    │
//! │  - Filters, timeline buckets, pagination                                │
//! │  - Averages, most-discussed, per-month counts, success rate             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use chrono::Utc;
//! use moneytalk_store::{JournalStore, NewCategory, NewContact, NewConversation};
//!
//! let store = JournalStore::open("journal.db")?;
//!
//! let dana = store.create_contact(NewContact::new("Dana").with_relationship("Partner"))?;
//! let rent = store.create_category(NewCategory::new("Rent"))?;
//! store.create_conversation(
//!     NewConversation::new("Split the rent", Utc::now())
//!         .with_contacts([dana.id])
//!         .with_category(rent.id)
//!         .with_rating(8),
//! )?;
//!
//! let snapshot = store.snapshot();
//! println!("average rating {:.1}", snapshot.average_emotional_rating());
//! # Ok::<(), moneytalk_store::StoreError>(())
//! ```

pub mod error;
pub mod notify;
pub mod photo;
pub mod policy;
pub mod query;
pub mod store;
pub mod types;
pub mod validation;

// Re-export error types
pub use error::{ErrorKind, Result, StoreError};

// Re-export store
pub use store::JournalStore;

// Re-export notifications
pub use notify::{ChangeEvent, ChangeNotifier, ChangeSubscription};

// Re-export photo processing
pub use photo::{JpegPhotoProcessor, PassthroughPhotoProcessor, PhotoProcessor};

// Re-export delete rules
pub use policy::{DeletePolicy, EntityKind, RELATIONSHIPS, Relationship};

// Re-export query types
pub use query::{
    ITEMS_PER_PAGE, JournalStats, MonthCount, OutcomeBucket, RECENT_LIMIT, SIMILAR_LIMIT,
    Snapshot, TimelineFilter,
};

// Re-export types
pub use types::{
    Category, CategoryId, Contact, ContactId, Conversation, ConversationId, NewCategory,
    NewContact, NewConversation, NewTemplatePhrase, TemplatePhrase, TemplatePhraseId,
};

// Re-export validation
pub use validation::{Field, ValidationError};
