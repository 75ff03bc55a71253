//! Per-day, per-archetype accumulation of occurrence counts and outcomes.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{ArchetypeId, DailyArchetypeStat, DeckOccurrence, TrendSeries};

/// Streaming accumulator for [`TrendSeries`].
///
/// Totals are commutative: occurrences may arrive in any order, and partial
/// aggregators (for instance one per date) can be merged.
#[derive(Debug, Clone, Default)]
pub struct DailyAggregator {
    stats: BTreeMap<(NaiveDate, ArchetypeId), DailyArchetypeStat>,
}

impl DailyAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a previously produced series.
    pub fn from_series(series: &TrendSeries) -> Self {
        let mut agg = Self::new();
        for point in series.iter() {
            agg.absorb(point);
        }
        agg
    }

    pub fn record(&mut self, occurrence: &DeckOccurrence) {
        self.stats
            .entry((occurrence.date, occurrence.archetype_id.clone()))
            .or_insert_with(|| {
                DailyArchetypeStat::new(occurrence.date, occurrence.archetype_id.clone())
            })
            .add(&occurrence.outcome);
    }

    /// Fold another aggregator's totals into this one.
    pub fn merge(&mut self, other: DailyAggregator) {
        for stat in other.stats.into_values() {
            self.absorb(&stat);
        }
    }

    fn absorb(&mut self, stat: &DailyArchetypeStat) {
        self.stats
            .entry((stat.date, stat.archetype_id.clone()))
            .or_insert_with(|| DailyArchetypeStat::new(stat.date, stat.archetype_id.clone()))
            .absorb(stat);
    }

    /// Number of (date, archetype) cells.
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Snapshot of the accumulated stats, ordered by (date, archetype id).
    pub fn series(&self) -> TrendSeries {
        TrendSeries {
            points: self.stats.values().cloned().collect(),
        }
    }
}
