//! Label-free deck archetype detection and daily metagame trends.
//!
//! Tournament deck lists are canonicalized against a card reference database,
//! fingerprinted with versioned signatures, grouped into archetypes by the
//! exact composition of their core cards, and aggregated into a per-day,
//! per-archetype trend series with drill-down into concrete variants.
//!
//! The card database is downloaded lazily, cached locally, and queried
//! in-process via DuckDB.
//!
//! # Quick start
//!
//! ```no_run
//! use archetype_trends::engine::ArchetypeRegistry;
//! use archetype_trends::source::{DirectorySource, TournamentSource};
//! use archetype_trends::Metagame;
//!
//! let meta = Metagame::builder().build().unwrap();
//! let records = DirectorySource::new("data/tournaments").tournaments().unwrap();
//!
//! let mut registry = ArchetypeRegistry::new();
//! let report = meta.aggregate(&mut registry, &records).unwrap();
//! println!("{} archetypes, {} skipped", registry.len(), report.skipped.len());
//! ```

pub mod analysis;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod connection;
pub mod engine;
pub mod error;
pub mod models;
pub mod queries;
pub mod source;
pub mod sql_builder;
pub mod store;

pub use cache::CacheManager;
pub use catalog::{CardCatalog, DuckDbCatalog, StaticCatalog};
pub use config::DeckRules;
pub use connection::Connection;
pub use error::{MetagameError, Result, SkippedOccurrence};
pub use sql_builder::SqlBuilder;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::engine::{ArchetypeRegistry, CardTypePolicy, DailyAggregator, Pipeline, RunReport};
use crate::models::{CardType, TournamentRecord};

// ---------------------------------------------------------------------------
// MetagameBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`Metagame`].
pub struct MetagameBuilder {
    cache_dir: Option<PathBuf>,
    offline: bool,
    timeout: Duration,
    refresh_after: Duration,
    base_url: Option<String>,
    rules: DeckRules,
    core_types: Vec<CardType>,
}

impl Default for MetagameBuilder {
    fn default() -> Self {
        Self {
            cache_dir: None,
            offline: false,
            timeout: Duration::from_secs(120),
            refresh_after: config::DEFAULT_REFRESH_AFTER,
            base_url: None,
            rules: DeckRules::default(),
            core_types: vec![CardType::Pokemon],
        }
    }
}

impl MetagameBuilder {
    /// Set a custom cache directory for the card database.
    ///
    /// If not set, the platform cache directory is used (e.g.
    /// `~/.cache/archetype-trends` on Linux).
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Never download; use cached card database files only.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// HTTP timeout for card database downloads. Defaults to 120 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Age after which the cached card database is downloaded again.
    pub fn refresh_after(mut self, age: Duration) -> Self {
        self.refresh_after = age;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Deck size and copy limit. Defaults to 20 cards, 2 copies.
    pub fn rules(mut self, rules: DeckRules) -> Self {
        self.rules = rules;
        self
    }

    /// Card types that define an archetype. Defaults to Pokémon only.
    pub fn core_types(mut self, types: &[CardType]) -> Self {
        self.core_types = types.to_vec();
        self
    }

    /// Build the metagame, initializing the cache and DuckDB connection.
    ///
    /// No card data is downloaded here; the card database is fetched lazily
    /// on the first lookup.
    pub fn build(self) -> Result<Metagame> {
        if self.rules.deck_size == 0 || self.rules.copy_limit == 0 {
            return Err(MetagameError::InvalidArgument(format!(
                "deck size and copy limit must be positive, got {:?}",
                self.rules
            )));
        }
        let mut cache = CacheManager::new(self.cache_dir, self.offline, self.timeout)?
            .with_refresh_after(self.refresh_after);
        if let Some(url) = self.base_url {
            cache = cache.with_base_url(url);
        }
        let conn = Connection::new(cache)?;
        Ok(Metagame {
            conn,
            rules: self.rules,
            core_types: self.core_types,
        })
    }
}

// ---------------------------------------------------------------------------
// Metagame
// ---------------------------------------------------------------------------

/// Entry point: owns the card database connection and the run configuration.
///
/// Archetype registries are not owned here; each aggregation run gets its own
/// explicitly passed registry.
pub struct Metagame {
    conn: Connection,
    rules: DeckRules,
    core_types: Vec<CardType>,
}

impl Metagame {
    pub fn builder() -> MetagameBuilder {
        MetagameBuilder::default()
    }

    /// Wrap an existing connection, e.g. one with a test catalog loaded.
    pub fn from_connection(conn: Connection, rules: DeckRules) -> Self {
        Self {
            conn,
            rules,
            core_types: vec![CardType::Pokemon],
        }
    }

    pub fn rules(&self) -> DeckRules {
        self.rules
    }

    pub fn core_policy(&self) -> CardTypePolicy {
        CardTypePolicy::new(self.core_types.iter().copied())
    }

    // -- Query accessors ---------------------------------------------------

    /// Card reference database queries.
    pub fn cards(&self) -> queries::cards::CardQuery<'_> {
        queries::cards::CardQuery::new(&self.conn)
    }

    /// Card catalog over the DuckDB-backed card database.
    pub fn catalog(&self) -> DuckDbCatalog<'_> {
        DuckDbCatalog::new(&self.conn)
    }

    /// Use a local card database file instead of the downloaded one.
    pub fn use_card_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MetagameError::NotFound(format!(
                "Card database file {} does not exist",
                path.display()
            )));
        }
        let path_str = path.to_string_lossy().replace('\\', "/");
        self.conn.register_cards_view(&path_str)
    }

    // -- Aggregation -------------------------------------------------------

    /// Run the engine over a batch of tournament records.
    pub fn aggregate(
        &self,
        registry: &mut ArchetypeRegistry,
        records: &[TournamentRecord],
    ) -> Result<RunReport> {
        self.resume(registry, DailyAggregator::new(), records)
    }

    /// Run the engine on top of previously aggregated totals.
    pub fn resume(
        &self,
        registry: &mut ArchetypeRegistry,
        aggregator: DailyAggregator,
        records: &[TournamentRecord],
    ) -> Result<RunReport> {
        let catalog = self.catalog();
        let pipeline = Pipeline::new(&catalog, self.rules, Box::new(self.core_policy()));
        pipeline.resume(registry, aggregator, records)
    }

    // -- Metadata and utility methods --------------------------------------

    /// Registered DuckDB view names.
    pub fn views(&self) -> Vec<String> {
        self.conn.views()
    }

    /// Execute a raw SQL query against the card database.
    ///
    /// `query` uses `?` positional placeholders bound to `params`.
    pub fn sql(
        &self,
        query: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        self.conn.execute(query, params)
    }

    /// Drop a stale cached card database so the next lookup downloads it again.
    ///
    /// Returns `true` if the cache was stale and has been cleared.
    pub fn refresh(&self) -> Result<bool> {
        let stale = {
            let cache = self.conn.cache.borrow();
            let files = config::json_files();
            let cards = files.get("cards").copied().unwrap_or("cards.json");
            cache.is_stale(&cache.cache_dir.join(cards)) && !cache.offline
        };
        if stale {
            self.conn.cache.borrow().clear()?;
            self.conn.reset_views();
            info!("card database was stale; cache cleared and views reset");
        }
        Ok(stale)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Metagame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let views = self.conn.views();
        let cache = self.conn.cache.borrow();
        write!(
            f,
            "Metagame(cache_dir={}, views=[{}], offline={}, deck_size={}, copy_limit={})",
            cache.cache_dir.display(),
            views.join(", "),
            cache.offline,
            self.rules.deck_size,
            self.rules.copy_limit
        )
    }
}
