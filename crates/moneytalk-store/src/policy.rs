//! Delete rules between entity kinds.
//!
//! The store consults [`RELATIONSHIPS`] inside every delete transaction and
//! applies each rule whose owner matches the entity being removed.

use std::fmt;

/// The four entity kinds held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Conversation,
    Contact,
    Category,
    TemplatePhrase,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conversation => "conversation",
            Self::Contact => "contact",
            Self::Category => "category",
            Self::TemplatePhrase => "template phrase",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to dependents when their owner is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Clear the dependent's reference to the owner.
    Nullify,
    /// Delete the dependent as well.
    Cascade,
}

/// One directed edge of the entity graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relationship {
    pub owner: EntityKind,
    pub dependent: EntityKind,
    pub policy: DeletePolicy,
}

impl Relationship {
    const fn new(owner: EntityKind, dependent: EntityKind, policy: DeletePolicy) -> Self {
        Self {
            owner,
            dependent,
            policy,
        }
    }
}

/// Every relationship the store maintains.
///
/// Conversation and contact membership is nullified from both sides: deleting
/// either end removes only the link. A category owns its template phrases.
pub const RELATIONSHIPS: &[Relationship] = &[
    Relationship::new(
        EntityKind::Contact,
        EntityKind::Conversation,
        DeletePolicy::Nullify,
    ),
    Relationship::new(
        EntityKind::Conversation,
        EntityKind::Contact,
        DeletePolicy::Nullify,
    ),
    Relationship::new(
        EntityKind::Category,
        EntityKind::Conversation,
        DeletePolicy::Nullify,
    ),
    Relationship::new(
        EntityKind::Category,
        EntityKind::TemplatePhrase,
        DeletePolicy::Cascade,
    ),
];

/// Rules that fire when an entity of `owner` kind is deleted.
pub fn rules_for(owner: EntityKind) -> impl Iterator<Item = &'static Relationship> {
    RELATIONSHIPS.iter().filter(move |r| r.owner == owner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_rules_are_asymmetric() {
        let rules: Vec<_> = rules_for(EntityKind::Category).collect();
        assert_eq!(rules.len(), 2);
        assert!(rules.iter().any(|r| r.dependent == EntityKind::Conversation
            && r.policy == DeletePolicy::Nullify));
        assert!(rules.iter().any(|r| r.dependent == EntityKind::TemplatePhrase
            && r.policy == DeletePolicy::Cascade));
    }

    #[test]
    fn test_template_phrase_owns_nothing() {
        assert_eq!(rules_for(EntityKind::TemplatePhrase).count(), 0);
    }

    #[test]
    fn test_nothing_cascades_into_contacts() {
        assert!(
            RELATIONSHIPS
                .iter()
                .filter(|r| r.dependent == EntityKind::Contact)
                .all(|r| r.policy == DeletePolicy::Nullify)
        );
    }
}
