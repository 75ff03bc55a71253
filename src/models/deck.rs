use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::archetype::{ArchetypeId, Signature};
use super::card::CardIdentity;
use super::stats::Outcome;

// ---------------------------------------------------------------------------
// DeckList: card composition of one deck instance
// ---------------------------------------------------------------------------

/// One `(card, copies)` line of a deck list, the serialized form of [`DeckList`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckEntry {
    pub card: CardIdentity,
    pub count: u32,
}

/// Mapping of card identity to copy count, ordered by catalog key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<DeckEntry>", from = "Vec<DeckEntry>")]
pub struct DeckList {
    cards: BTreeMap<CardIdentity, u32>,
}

impl DeckList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add copies of a card. References that canonicalized to the same identity
    /// (print variants) are merged. Zero counts are ignored.
    pub fn add(&mut self, card: CardIdentity, count: u32) {
        if count == 0 {
            return;
        }
        *self.cards.entry(card).or_insert(0) += count;
    }

    pub fn total_copies(&self) -> u32 {
        self.cards.values().sum()
    }

    /// Number of distinct cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn count_of(&self, card: &CardIdentity) -> u32 {
        self.cards.get(card).copied().unwrap_or(0)
    }

    /// Whether a card with the given catalog key is in the deck.
    pub fn contains_key(&self, key: &str) -> bool {
        self.cards.keys().any(|c| c.key == key)
    }

    /// Cards in catalog-key order.
    pub fn iter(&self) -> impl Iterator<Item = (&CardIdentity, u32)> {
        self.cards.iter().map(|(card, count)| (card, *count))
    }

    pub fn cards(&self) -> impl Iterator<Item = &CardIdentity> {
        self.cards.keys()
    }

    /// The sub-list of cards matching a predicate.
    pub fn filter<F>(&self, mut keep: F) -> DeckList
    where
        F: FnMut(&CardIdentity) -> bool,
    {
        DeckList {
            cards: self
                .cards
                .iter()
                .filter(|(card, _)| keep(card))
                .map(|(card, count)| (card.clone(), *count))
                .collect(),
        }
    }
}

impl FromIterator<(CardIdentity, u32)> for DeckList {
    fn from_iter<I: IntoIterator<Item = (CardIdentity, u32)>>(iter: I) -> Self {
        let mut deck = DeckList::new();
        for (card, count) in iter {
            deck.add(card, count);
        }
        deck
    }
}

impl From<DeckList> for Vec<DeckEntry> {
    fn from(deck: DeckList) -> Self {
        deck.cards
            .into_iter()
            .map(|(card, count)| DeckEntry { card, count })
            .collect()
    }
}

impl From<Vec<DeckEntry>> for DeckList {
    fn from(entries: Vec<DeckEntry>) -> Self {
        entries.into_iter().map(|e| (e.card, e.count)).collect()
    }
}

// ---------------------------------------------------------------------------
// DeckOccurrence: one appearance of a deck list by one player
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckOccurrence {
    pub tournament_id: String,
    pub player_id: String,
    pub date: NaiveDate,
    pub outcome: Outcome,
    pub deck: DeckList,
    pub signature: Signature,
    pub archetype_id: ArchetypeId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(key: &str) -> CardIdentity {
        CardIdentity::new(key, key)
    }

    #[test]
    fn add_merges_duplicate_identities() {
        let mut deck = DeckList::new();
        deck.add(card("A1_1"), 1);
        deck.add(card("A1_1"), 1);
        deck.add(card("A1_2"), 0);
        assert_eq!(deck.len(), 1);
        assert_eq!(deck.count_of(&card("A1_1")), 2);
        assert_eq!(deck.total_copies(), 2);
    }

    #[test]
    fn iteration_is_key_ordered_regardless_of_insertion() {
        let deck: DeckList = vec![(card("B"), 1), (card("A"), 2), (card("C"), 1)]
            .into_iter()
            .collect();
        let keys: Vec<&str> = deck.cards().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
    }

    #[test]
    fn serializes_as_entry_list() {
        let deck: DeckList = vec![(card("A1_1"), 2)].into_iter().collect();
        let json = serde_json::to_value(&deck).unwrap();
        assert_eq!(json[0]["card"]["key"], "A1_1");
        assert_eq!(json[0]["count"], 2);
        let back: DeckList = serde_json::from_value(json).unwrap();
        assert_eq!(back, deck);
    }
}
