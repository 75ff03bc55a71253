use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const CARD_DB_BASE: &str =
    "https://raw.githubusercontent.com/flibustier/pokemon-tcg-pocket-database/main/dist";

/// Bumped whenever the signature serialization or hash changes.
pub const SIGNATURE_VERSION: u32 = 1;

/// Card database files that the cache manager knows how to fetch.
pub fn json_files() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("cards", "cards.json"),
        ("cards_extra", "cards.extra.json"),
        ("sets", "sets.json"),
    ])
}

/// Deck categories found in tournament standings exports.
pub const DECK_CATEGORIES: [&str; 3] = ["pokemon", "trainer", "energy"];

/// Age after which cached card database files are downloaded again.
pub const DEFAULT_REFRESH_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("archetype-trends")
    } else {
        PathBuf::from(".archetype-trends-cache")
    }
}

/// Deck construction rules of the game being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckRules {
    /// Exact number of cards in a legal deck.
    pub deck_size: u32,
    /// Maximum copies of a single card.
    pub copy_limit: u32,
}

impl Default for DeckRules {
    fn default() -> Self {
        Self {
            deck_size: 20,
            copy_limit: 2,
        }
    }
}
