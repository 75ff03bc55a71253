//! Archetype classification by exact composition of a deck's core cards.
//!
//! A deck is split into core cards (defining the strategy) and flex cards
//! (tech and utility slots). Decks with the same core multiset belong to the
//! same archetype, whatever their flex slots hold.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::debug;

use crate::engine::canonical::CardTypes;
use crate::engine::signature::SignatureBuilder;
use crate::models::{Archetype, ArchetypeId, CardIdentity, CardType, DeckList, Signature};

/// Decides which cards of a deck define its archetype.
pub trait CorePolicy {
    fn is_core(&self, card: &CardIdentity, card_type: CardType) -> bool;
}

/// Core iff the card's catalog type is in a configured set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardTypePolicy {
    core_types: BTreeSet<CardType>,
}

impl CardTypePolicy {
    pub fn new<I: IntoIterator<Item = CardType>>(core_types: I) -> Self {
        Self {
            core_types: core_types.into_iter().collect(),
        }
    }

    pub fn core_types(&self) -> impl Iterator<Item = &CardType> {
        self.core_types.iter()
    }
}

impl Default for CardTypePolicy {
    fn default() -> Self {
        Self::new([CardType::Pokemon])
    }
}

impl CorePolicy for CardTypePolicy {
    fn is_core(&self, _card: &CardIdentity, card_type: CardType) -> bool {
        self.core_types.contains(&card_type)
    }
}

// ---------------------------------------------------------------------------
// ArchetypeRegistry: the core signature to archetype mapping of one run
// ---------------------------------------------------------------------------

/// Archetypes discovered so far, keyed by id.
///
/// Passed explicitly to the classifier so independent runs (one per format or
/// season) never share state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArchetypeRegistry {
    archetypes: BTreeMap<ArchetypeId, Archetype>,
}

impl ArchetypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from persisted archetypes.
    pub fn from_archetypes<I: IntoIterator<Item = Archetype>>(archetypes: I) -> Self {
        Self {
            archetypes: archetypes.into_iter().map(|a| (a.id.clone(), a)).collect(),
        }
    }

    pub fn get(&self, id: &ArchetypeId) -> Option<&Archetype> {
        self.archetypes.get(id)
    }

    pub fn by_core_signature(&self, core: &Signature) -> Option<&Archetype> {
        self.archetypes.get(&ArchetypeId::from_core(core))
    }

    pub fn contains(&self, id: &ArchetypeId) -> bool {
        self.archetypes.contains_key(id)
    }

    /// Archetypes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.values()
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    /// Record one sighting of a core signature. Returns the archetype id.
    fn observe(
        &mut self,
        core_signature: Signature,
        core: DeckList,
        deck: &DeckList,
        date: NaiveDate,
    ) -> ArchetypeId {
        let id = ArchetypeId::from_core(&core_signature);
        match self.archetypes.get_mut(&id) {
            Some(existing) => {
                if date < existing.first_seen {
                    existing.first_seen = date;
                    existing.representative = deck.clone();
                }
            }
            None => {
                debug!(archetype = id.short(), %date, "new archetype");
                self.archetypes.insert(
                    id.clone(),
                    Archetype {
                        id: id.clone(),
                        core_signature,
                        core,
                        representative: deck.clone(),
                        first_seen: date,
                    },
                );
            }
        }
        id
    }
}

// ---------------------------------------------------------------------------
// ArchetypeClassifier
// ---------------------------------------------------------------------------

pub struct ArchetypeClassifier {
    policy: Box<dyn CorePolicy>,
    signatures: SignatureBuilder,
}

impl ArchetypeClassifier {
    pub fn new(policy: Box<dyn CorePolicy>, signatures: SignatureBuilder) -> Self {
        Self { policy, signatures }
    }

    /// Core cards of a deck. Cards missing from `types` count as
    /// [`CardType::Unknown`].
    pub fn core_of(&self, deck: &DeckList, types: &CardTypes) -> DeckList {
        deck.filter(|card| {
            let card_type = types.get(card).copied().unwrap_or(CardType::Unknown);
            self.policy.is_core(card, card_type)
        })
    }

    /// Signature of the core subset, or `full` when the deck has no core cards.
    pub fn core_signature(&self, core: &DeckList, full: &Signature) -> Signature {
        if core.is_empty() {
            full.clone()
        } else {
            self.signatures.subset_signature(core.iter())
        }
    }

    /// Resolve a deck to its archetype, registering the archetype if unseen.
    ///
    /// `full` is the deck's own signature. An occurrence dated before the
    /// archetype's first sighting moves `first_seen` back and becomes the
    /// representative.
    pub fn classify(
        &self,
        registry: &mut ArchetypeRegistry,
        deck: &DeckList,
        full: &Signature,
        date: NaiveDate,
        types: &CardTypes,
    ) -> ArchetypeId {
        let core = self.core_of(deck, types);
        let core_signature = self.core_signature(&core, full);
        registry.observe(core_signature, core, deck, date)
    }
}

impl Default for ArchetypeClassifier {
    fn default() -> Self {
        Self::new(Box::new(CardTypePolicy::default()), SignatureBuilder::default())
    }
}
