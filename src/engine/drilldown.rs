//! Concrete deck-list variants observed within each archetype.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::classifier::ArchetypeRegistry;
use crate::models::{win_rate, ArchetypeId, DeckEntry, DeckList, DeckOccurrence, Signature};

/// One distinct deck list mapped into an archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub signature: Signature,
    pub deck: DeckList,
    pub occurrences: u32,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl Variant {
    fn new(occurrence: &DeckOccurrence) -> Self {
        Self {
            signature: occurrence.signature.clone(),
            deck: occurrence.deck.clone(),
            occurrences: 0,
            first_seen: occurrence.date,
            last_seen: occurrence.date,
            wins: 0,
            losses: 0,
            draws: 0,
        }
    }

    fn add(&mut self, occurrence: &DeckOccurrence) {
        self.occurrences += 1;
        self.first_seen = self.first_seen.min(occurrence.date);
        self.last_seen = self.last_seen.max(occurrence.date);
        self.wins += occurrence.outcome.wins;
        self.losses += occurrence.outcome.losses;
        self.draws += occurrence.outcome.draws;
    }

    fn absorb(&mut self, other: &Variant) {
        self.occurrences += other.occurrences;
        self.first_seen = self.first_seen.min(other.first_seen);
        self.last_seen = self.last_seen.max(other.last_seen);
        self.wins += other.wins;
        self.losses += other.losses;
        self.draws += other.draws;
    }

    pub fn win_rate(&self) -> Option<f64> {
        win_rate(self.wins, self.losses)
    }
}

/// Card-count differences of a variant against a reference list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDiff {
    /// Copies the variant has beyond the reference.
    pub added: Vec<DeckEntry>,
    /// Copies the reference has beyond the variant.
    pub removed: Vec<DeckEntry>,
}

impl VariantDiff {
    pub fn between(reference: &DeckList, variant: &DeckList) -> Self {
        let mut diff = VariantDiff::default();
        for (card, count) in variant.iter() {
            let base = reference.count_of(card);
            if count > base {
                diff.added.push(DeckEntry { card: card.clone(), count: count - base });
            }
        }
        for (card, count) in reference.iter() {
            let other = variant.count_of(card);
            if count > other {
                diff.removed.push(DeckEntry { card: card.clone(), count: count - other });
            }
        }
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrilldownIndex {
    variants: BTreeMap<ArchetypeId, BTreeMap<Signature, Variant>>,
}

impl DrilldownIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, occurrence: &DeckOccurrence) {
        self.variants
            .entry(occurrence.archetype_id.clone())
            .or_default()
            .entry(occurrence.signature.clone())
            .or_insert_with(|| Variant::new(occurrence))
            .add(occurrence);
    }

    /// Fold another index into this one.
    pub fn merge(&mut self, other: DrilldownIndex) {
        for (id, variants) in other.variants {
            let target = self.variants.entry(id).or_default();
            for (signature, variant) in variants {
                match target.get_mut(&signature) {
                    Some(existing) => existing.absorb(&variant),
                    None => {
                        target.insert(signature, variant);
                    }
                }
            }
        }
    }

    /// Variants of an archetype, earliest first; ties broken by signature.
    pub fn variants(&self, id: &ArchetypeId) -> Vec<&Variant> {
        let mut list: Vec<&Variant> = self
            .variants
            .get(id)
            .map(|v| v.values().collect())
            .unwrap_or_default();
        list.sort_by(|a, b| {
            a.first_seen
                .cmp(&b.first_seen)
                .then_with(|| a.signature.cmp(&b.signature))
        });
        list
    }

    /// The variant with the most occurrences. Ties go to the earlier variant.
    pub fn most_common(&self, id: &ArchetypeId) -> Option<&Variant> {
        self.variants(id)
            .into_iter()
            .fold(None, |best: Option<&Variant>, v| match best {
                Some(b) if b.occurrences >= v.occurrences => Some(b),
                _ => Some(v),
            })
    }

    /// Differences of one variant against the archetype's most common list.
    pub fn diff(&self, id: &ArchetypeId, signature: &Signature) -> Option<VariantDiff> {
        let reference = self.most_common(id)?;
        let variant = self.variants.get(id)?.get(signature)?;
        Some(VariantDiff::between(&reference.deck, &variant.deck))
    }

    /// Display name: the core cards of the most common list. Never used for
    /// grouping.
    pub fn representative_name(&self, id: &ArchetypeId, registry: &ArchetypeRegistry) -> Option<String> {
        let archetype = registry.get(id)?;
        if archetype.is_full_list() {
            let mut named = archetype.clone();
            if let Some(common) = self.most_common(id) {
                named.representative = common.deck.clone();
            }
            return Some(named.core_name());
        }
        Some(archetype.core_name())
    }

    pub fn archetype_ids(&self) -> impl Iterator<Item = &ArchetypeId> {
        self.variants.keys()
    }

    /// Total occurrences recorded for an archetype.
    pub fn occurrences(&self, id: &ArchetypeId) -> u32 {
        self.variants
            .get(id)
            .map(|v| v.values().map(|x| x.occurrences).sum())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CardIdentity, Outcome};

    fn card(key: &str) -> CardIdentity {
        CardIdentity::new(key, key)
    }

    fn occurrence(day: u32, cards: &[(&str, u32)], wins: u32) -> DeckOccurrence {
        let deck: DeckList = cards.iter().map(|(k, n)| (card(k), *n)).collect();
        let key = cards.iter().map(|(k, n)| format!("{}{}", k, n)).collect::<String>();
        DeckOccurrence {
            tournament_id: "t".into(),
            player_id: format!("p{}", day),
            date: NaiveDate::from_ymd_opt(2025, 4, day).unwrap(),
            outcome: Outcome { wins, losses: 1, draws: 0, placement: None },
            deck,
            signature: Signature::new(1, &key),
            archetype_id: ArchetypeId::from_core(&Signature::new(1, "core")),
        }
    }

    #[test]
    fn variants_ordered_by_first_seen() {
        let mut idx = DrilldownIndex::new();
        idx.record(&occurrence(9, &[("mon", 2), ("b", 2)], 1));
        idx.record(&occurrence(3, &[("mon", 2), ("a", 2)], 1));
        idx.record(&occurrence(7, &[("mon", 2), ("b", 2)], 1));

        let id = ArchetypeId::from_core(&Signature::new(1, "core"));
        let variants = idx.variants(&id);
        assert_eq!(variants.len(), 2);
        assert!(variants[0].deck.contains_key("a"));
        assert_eq!(variants[1].first_seen, NaiveDate::from_ymd_opt(2025, 4, 7).unwrap());
        assert_eq!(variants[1].last_seen, NaiveDate::from_ymd_opt(2025, 4, 9).unwrap());
        assert_eq!(variants[1].occurrences, 2);
        assert_eq!(idx.occurrences(&id), 3);
    }

    #[test]
    fn diff_against_most_common() {
        let mut idx = DrilldownIndex::new();
        let common = occurrence(1, &[("mon", 2), ("a", 2)], 1);
        idx.record(&common);
        idx.record(&occurrence(2, &[("mon", 2), ("a", 2)], 0));
        let tech = occurrence(3, &[("mon", 2), ("a", 1), ("b", 1)], 2);
        idx.record(&tech);

        let id = common.archetype_id.clone();
        assert_eq!(idx.most_common(&id).unwrap().signature, common.signature);

        let diff = idx.diff(&id, &tech.signature).unwrap();
        assert_eq!(diff.added, vec![DeckEntry { card: card("b"), count: 1 }]);
        assert_eq!(diff.removed, vec![DeckEntry { card: card("a"), count: 1 }]);
        assert!(idx.diff(&id, &common.signature).unwrap().is_empty());
    }

    #[test]
    fn merge_combines_matching_variants() {
        let mut left = DrilldownIndex::new();
        left.record(&occurrence(2, &[("mon", 2)], 1));
        let mut right = DrilldownIndex::new();
        right.record(&occurrence(5, &[("mon", 2)], 1));
        right.record(&occurrence(6, &[("mon", 1), ("a", 1)], 1));
        left.merge(right);

        let id = ArchetypeId::from_core(&Signature::new(1, "core"));
        let variants = left.variants(&id);
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].occurrences, 2);
        assert_eq!(variants[0].last_seen, NaiveDate::from_ymd_opt(2025, 4, 5).unwrap());
    }

    #[test]
    fn unknown_archetype_is_empty() {
        let idx = DrilldownIndex::new();
        let id = ArchetypeId::from_core(&Signature::new(1, "none"));
        assert!(idx.variants(&id).is_empty());
        assert!(idx.most_common(&id).is_none());
    }
}
