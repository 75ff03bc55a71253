//! Card catalog lookups used by the canonicalizer.
//!
//! [`CardCatalog`] is the seam between the engine and the card reference
//! database. [`DuckDbCatalog`] queries the cached card database through
//! DuckDB; [`StaticCatalog`] keeps a small catalog in memory.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::debug;

use crate::connection::Connection;
use crate::error::{MetagameError, Result};
use crate::models::{CardIdentity, CardType, CatalogCard, RawCardRef};
use crate::queries::CardQuery;

/// Resolves raw card references to stable identities and exposes card types.
pub trait CardCatalog {
    /// Resolve a raw reference to the identity of its canonical print.
    ///
    /// Fails with [`MetagameError::UnknownCard`] when nothing matches.
    fn resolve(&self, card: &RawCardRef) -> Result<CardIdentity>;

    /// Card type of a resolved identity.
    fn card_type(&self, card: &CardIdentity) -> Result<CardType>;
}

fn unknown(card: &RawCardRef) -> MetagameError {
    MetagameError::UnknownCard {
        name: card.name.clone(),
        set: card.set.clone(),
        number: card.number.clone(),
    }
}

// ---------------------------------------------------------------------------
// DuckDbCatalog
// ---------------------------------------------------------------------------

/// Catalog backed by the `cards` view of a [`Connection`].
pub struct DuckDbCatalog<'a> {
    conn: &'a Connection,
    types: RefCell<HashMap<String, CardType>>,
}

impl<'a> DuckDbCatalog<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            types: RefCell::new(HashMap::new()),
        }
    }

    fn remember(&self, canonical: &CatalogCard) -> CardIdentity {
        let identity = canonical.identity();
        self.types
            .borrow_mut()
            .insert(identity.key.clone(), canonical.card_type());
        identity
    }
}

impl CardCatalog for DuckDbCatalog<'_> {
    fn resolve(&self, card: &RawCardRef) -> Result<CardIdentity> {
        let query = CardQuery::new(self.conn);

        if !card.set.is_empty() && !card.number.is_empty() {
            if let Some(print) = query.get_by_print(&card.set, &card.number)? {
                let canonical = query.canonical_print(&print)?;
                return Ok(self.remember(&canonical));
            }
        }

        if !card.name.is_empty() {
            let set = (!card.set.is_empty()).then_some(card.set.as_str());
            let mut prints = query.get_by_name(&card.name, set)?;
            if prints.is_empty() && set.is_some() {
                prints = query.get_by_name(&card.name, None)?;
            }
            if let Some(print) = prints.first() {
                debug!(name = %card.name, set = %print.set_code, "resolved card by name");
                let canonical = query.canonical_print(print)?;
                return Ok(self.remember(&canonical));
            }
        }

        Err(unknown(card))
    }

    fn card_type(&self, card: &CardIdentity) -> Result<CardType> {
        if let Some(t) = self.types.borrow().get(&card.key) {
            return Ok(*t);
        }
        let (set, number) = card.key.rsplit_once('_').ok_or_else(|| {
            MetagameError::InvalidArgument(format!("Malformed catalog key: {}", card.key))
        })?;
        let print = CardQuery::new(self.conn)
            .get_by_print(set, number)?
            .ok_or_else(|| MetagameError::NotFound(format!("Card {} not in catalog", card.key)))?;
        let card_type = print.card_type();
        self.types.borrow_mut().insert(card.key.clone(), card_type);
        Ok(card_type)
    }
}

// ---------------------------------------------------------------------------
// StaticCatalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StaticEntry {
    set: String,
    number: String,
    name: String,
    card_type: CardType,
}

impl StaticEntry {
    fn numeric(&self) -> Option<u64> {
        self.number.parse().ok()
    }

    fn identity(&self) -> CardIdentity {
        CardIdentity::from_print(&self.set, &self.number, &self.name)
    }
}

/// In-memory catalog following the same canonical-print rule as
/// [`DuckDbCatalog`].
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entries: Vec<StaticEntry>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one print. Chainable.
    pub fn with(mut self, set: &str, number: &str, name: &str, card_type: CardType) -> Self {
        self.insert(set, number, name, card_type);
        self
    }

    pub fn insert(&mut self, set: &str, number: &str, name: &str, card_type: CardType) {
        self.entries.push(StaticEntry {
            set: set.to_string(),
            number: number.to_string(),
            name: name.to_string(),
            card_type,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn canonical<'s>(&'s self, print: &'s StaticEntry) -> &'s StaticEntry {
        self.entries
            .iter()
            .filter(|e| e.set == print.set && e.name == print.name && e.card_type == print.card_type)
            .min_by(|a, b| {
                a.numeric()
                    .unwrap_or(u64::MAX)
                    .cmp(&b.numeric().unwrap_or(u64::MAX))
                    .then_with(|| a.number.cmp(&b.number))
            })
            .unwrap_or(print)
    }

    fn same_number(a: &str, b: &str) -> bool {
        a == b
            || matches!((a.parse::<u64>(), b.parse::<u64>()), (Ok(x), Ok(y)) if x == y)
    }
}

impl CardCatalog for StaticCatalog {
    fn resolve(&self, card: &RawCardRef) -> Result<CardIdentity> {
        let by_print = self
            .entries
            .iter()
            .find(|e| e.set == card.set && Self::same_number(&e.number, &card.number));

        let found = by_print.or_else(|| {
            let mut named: Vec<&StaticEntry> = self
                .entries
                .iter()
                .filter(|e| !card.name.is_empty() && e.name.eq_ignore_ascii_case(&card.name))
                .collect();
            named.sort_by(|a, b| {
                let other_set = |e: &StaticEntry| e.set != card.set;
                other_set(a)
                    .cmp(&other_set(b))
                    .then_with(|| a.set.cmp(&b.set))
                    .then_with(|| a.numeric().unwrap_or(u64::MAX).cmp(&b.numeric().unwrap_or(u64::MAX)))
            });
            named.first().copied()
        });

        found
            .map(|print| self.canonical(print).identity())
            .ok_or_else(|| unknown(card))
    }

    fn card_type(&self, card: &CardIdentity) -> Result<CardType> {
        self.entries
            .iter()
            .find(|e| e.identity().key == card.key)
            .map(|e| e.card_type)
            .ok_or_else(|| MetagameError::NotFound(format!("Card {} not in catalog", card.key)))
    }
}
