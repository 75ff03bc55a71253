//! Deterministic, order-independent deck signatures.
//!
//! Pairs are sorted by catalog key, serialized as `<key length>:key×count`
//! separated by `;`, prefixed with a versioned domain tag and hashed with
//! SHA-256. The length prefix keeps keys that contain `×` or `;` from running
//! into their neighbours. The
//! version is part of both the hash input and the formatted signature, so a
//! change of algorithm is visible in every stored id.

use sha2::{Digest, Sha256};

use crate::config::{DeckRules, SIGNATURE_VERSION};
use crate::error::{MetagameError, Result};
use crate::models::{CardIdentity, DeckList, Signature};

/// Builds signatures for deck lists under a set of deck rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureBuilder {
    rules: DeckRules,
}

impl SignatureBuilder {
    pub fn new(rules: DeckRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> DeckRules {
        self.rules
    }

    /// Check a deck list against the deck size and copy limit.
    pub fn validate(&self, deck: &DeckList) -> Result<()> {
        self.validate_with(deck, |_| false)
    }

    /// Like [`validate`](Self::validate), but cards for which `unlimited`
    /// returns true (basic energy) are exempt from the copy limit.
    pub fn validate_with<F>(&self, deck: &DeckList, unlimited: F) -> Result<()>
    where
        F: Fn(&CardIdentity) -> bool,
    {
        let total = deck.total_copies();
        if total == 0 {
            return Err(MetagameError::EmptyDeck);
        }
        if total != self.rules.deck_size {
            return Err(MetagameError::MalformedDeck(format!(
                "{} cards, expected {}",
                total, self.rules.deck_size
            )));
        }
        if let Some((card, count)) = deck
            .iter()
            .find(|(card, n)| *n > self.rules.copy_limit && !unlimited(*card))
        {
            return Err(MetagameError::MalformedDeck(format!(
                "{} copies of {}, limit is {}",
                count, card, self.rules.copy_limit
            )));
        }
        Ok(())
    }

    /// Signature of a complete, legal deck list.
    pub fn deck_signature(&self, deck: &DeckList) -> Result<Signature> {
        self.validate(deck)?;
        Ok(self.subset_signature(deck.iter()))
    }

    /// [`deck_signature`](Self::deck_signature) with a copy-limit exemption.
    pub fn deck_signature_with<F>(&self, deck: &DeckList, unlimited: F) -> Result<Signature>
    where
        F: Fn(&CardIdentity) -> bool,
    {
        self.validate_with(deck, unlimited)?;
        Ok(self.subset_signature(deck.iter()))
    }

    /// Signature of an arbitrary card multiset, without deck-size validation.
    ///
    /// Input order does not matter; duplicate identities are summed.
    pub fn subset_signature<'a, I>(&self, cards: I) -> Signature
    where
        I: IntoIterator<Item = (&'a CardIdentity, u32)>,
    {
        let canonical: DeckList = cards
            .into_iter()
            .map(|(card, count)| (card.clone(), count))
            .collect();

        let mut hasher = Sha256::new();
        hasher.update(format!("deck-signature/v{}\n", SIGNATURE_VERSION).as_bytes());
        hasher.update(canonical_form(&canonical).as_bytes());
        Signature::new(SIGNATURE_VERSION, &hex::encode(hasher.finalize()))
    }
}

/// The hashed text of a deck list. Keys carry their byte length.
fn canonical_form(deck: &DeckList) -> String {
    deck.iter()
        .map(|(card, count)| format!("{}:{}\u{d7}{}", card.key.len(), card.key, count))
        .collect::<Vec<_>>()
        .join(";")
}
