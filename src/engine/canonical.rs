//! Card canonicalization: raw card references to stable identities.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::catalog::CardCatalog;
use crate::error::{MetagameError, Result};
use crate::models::{CardIdentity, CardType, DeckList, RawCardRef};

/// Set code tournament exports use for basic energy listed by bare name.
pub const ENERGY_SET: &str = "Energy";

/// Card types of the cards in one deck list.
pub type CardTypes = HashMap<CardIdentity, CardType>;

/// Memoizing front for a [`CardCatalog`].
///
/// Memoization never changes results: a memo hit returns exactly what the
/// catalog returned the first time. Misses (`UnknownCard`) are not cached.
pub struct Canonicalizer<'c> {
    catalog: &'c dyn CardCatalog,
    resolved: RefCell<HashMap<(String, String, String), CardIdentity>>,
    types: RefCell<HashMap<String, CardType>>,
}

impl<'c> Canonicalizer<'c> {
    pub fn new(catalog: &'c dyn CardCatalog) -> Self {
        Self {
            catalog,
            resolved: RefCell::new(HashMap::new()),
            types: RefCell::new(HashMap::new()),
        }
    }

    /// Resolve one raw reference to the identity of its canonical print.
    pub fn resolve(&self, card: &RawCardRef) -> Result<CardIdentity> {
        let key = card.lookup_key();
        if let Some(identity) = self.resolved.borrow().get(&key) {
            return Ok(identity.clone());
        }

        let identity = if card.set == ENERGY_SET {
            self.basic_energy(card)?
        } else {
            self.catalog.resolve(card)?
        };

        self.resolved.borrow_mut().insert(key, identity.clone());
        Ok(identity)
    }

    /// Basic energy is not in the card database; its identity is its name.
    fn basic_energy(&self, card: &RawCardRef) -> Result<CardIdentity> {
        let name = card.name.trim();
        if name.is_empty() {
            return Err(MetagameError::UnknownCard {
                name: card.name.clone(),
                set: card.set.clone(),
                number: card.number.clone(),
            });
        }
        let identity = CardIdentity::new(&format!("{}_{}", ENERGY_SET, name), name);
        self.types
            .borrow_mut()
            .insert(identity.key.clone(), CardType::Energy);
        Ok(identity)
    }

    pub fn card_type(&self, card: &CardIdentity) -> Result<CardType> {
        if let Some(t) = self.types.borrow().get(&card.key) {
            return Ok(*t);
        }
        let card_type = self.catalog.card_type(card)?;
        self.types.borrow_mut().insert(card.key.clone(), card_type);
        Ok(card_type)
    }

    /// Resolve every reference of a raw deck list. Print variants of the same
    /// card are merged into one entry.
    pub fn resolve_deck(&self, cards: &[RawCardRef]) -> Result<DeckList> {
        let mut deck = DeckList::new();
        for card in cards {
            deck.add(self.resolve(card)?, card.count);
        }
        Ok(deck)
    }

    /// Card types for every card of a resolved deck.
    pub fn card_types(&self, deck: &DeckList) -> Result<CardTypes> {
        deck.cards()
            .map(|card| Ok((card.clone(), self.card_type(card)?)))
            .collect()
    }

    /// Number of distinct references resolved so far.
    pub fn memo_len(&self) -> usize {
        self.resolved.borrow().len()
    }
}
