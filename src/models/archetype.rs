use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::card::CardIdentity;
use super::deck::DeckList;

// ---------------------------------------------------------------------------
// Signature: versioned digest of a card multiset
// ---------------------------------------------------------------------------

/// Formatted as `v<version>-<sha256 hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    pub fn new(version: u32, digest_hex: &str) -> Self {
        Self(format!("v{}-{}", version, digest_hex))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hash function version the signature was produced with.
    pub fn version(&self) -> Option<u32> {
        self.0
            .strip_prefix('v')
            .and_then(|rest| rest.split('-').next())
            .and_then(|v| v.parse().ok())
    }

    /// First 8 hex digits, for display.
    pub fn short(&self) -> &str {
        let hex = self.0.split_once('-').map(|(_, h)| h).unwrap_or(&self.0);
        &hex[..hex.len().min(8)]
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ArchetypeId: derived from the core signature only
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchetypeId(String);

impl ArchetypeId {
    pub fn from_core(core: &Signature) -> Self {
        Self(format!("arch-{}", core.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        let hex = self.0.rsplit_once('-').map(|(_, h)| h).unwrap_or(&self.0);
        &hex[..hex.len().min(8)]
    }
}

impl fmt::Display for ArchetypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Archetype
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    pub id: ArchetypeId,
    pub core_signature: Signature,
    /// Core cards with their copy counts; empty when the deck fell back to
    /// its full-list signature.
    pub core: DeckList,
    pub representative: DeckList,
    pub first_seen: NaiveDate,
}

impl Archetype {
    /// Whether the archetype is keyed by a full list rather than a core subset.
    pub fn is_full_list(&self) -> bool {
        self.core.is_empty()
    }

    /// Display name from the core cards, most copies first.
    pub fn core_name(&self) -> String {
        let source = if self.core.is_empty() {
            &self.representative
        } else {
            &self.core
        };
        let mut cards: Vec<(&CardIdentity, u32)> = source.iter().collect();
        cards.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.name.cmp(&b.0.name)));
        let mut names: Vec<&str> = Vec::new();
        for (card, _) in cards {
            if !names.contains(&card.name.as_str()) {
                names.push(&card.name);
            }
        }
        names.join(" / ")
    }
}
