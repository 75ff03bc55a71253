//! Daily metagame share, normalized to 100% and smoothed with a rolling mean.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::ArchetypeRegistry;
use crate::models::{ArchetypeId, TrendSeries};

/// Options for [`daily_share`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareOptions {
    /// Rolling window in days (rows); `1` disables smoothing.
    pub window: usize,
    /// Days whose filtered total is below this are dropped.
    pub min_total_players: u32,
    /// Keep only archetypes whose representative list holds all of these cards.
    pub include_cards: Vec<String>,
    /// Drop archetypes whose representative list holds any of these cards.
    pub exclude_cards: Vec<String>,
}

impl Default for ShareOptions {
    fn default() -> Self {
        Self {
            window: 7,
            min_total_players: 5,
            include_cards: Vec::new(),
            exclude_cards: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareRow {
    pub date: NaiveDate,
    /// Percent share per archetype; every column of the table is present.
    pub shares: BTreeMap<ArchetypeId, f64>,
    /// Share of archetypes folded away by [`ShareTable::collapse_top`].
    #[serde(default)]
    pub others: f64,
}

impl ShareRow {
    pub fn total(&self) -> f64 {
        self.shares.values().sum::<f64>() + self.others
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShareTable {
    pub archetypes: Vec<ArchetypeId>,
    pub rows: Vec<ShareRow>,
}

impl ShareTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Mean share of an archetype across all rows.
    pub fn average(&self, id: &ArchetypeId) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.rows.iter().filter_map(|r| r.shares.get(id)).sum();
        sum / self.rows.len() as f64
    }

    /// Share on the last row.
    pub fn latest(&self, id: &ArchetypeId) -> f64 {
        self.rows
            .last()
            .and_then(|r| r.shares.get(id))
            .copied()
            .unwrap_or(0.0)
    }

    /// Keep the `n` archetypes with the highest average share; fold the rest
    /// into `others`.
    pub fn collapse_top(&self, n: usize) -> ShareTable {
        let mut ranked: Vec<(&ArchetypeId, f64)> =
            self.archetypes.iter().map(|id| (id, self.average(id))).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let kept: BTreeSet<&ArchetypeId> = ranked.iter().take(n).map(|(id, _)| *id).collect();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut shares = BTreeMap::new();
                let mut others = row.others;
                for (id, share) in &row.shares {
                    if kept.contains(id) {
                        shares.insert(id.clone(), *share);
                    } else {
                        others += share;
                    }
                }
                ShareRow { date: row.date, shares, others }
            })
            .collect();

        ShareTable {
            archetypes: ranked.into_iter().take(n).map(|(id, _)| id.clone()).collect(),
            rows,
        }
    }
}

fn card_names(registry: &ArchetypeRegistry, id: &ArchetypeId) -> BTreeSet<String> {
    registry
        .get(id)
        .map(|a| a.representative.cards().map(|c| c.name.clone()).collect())
        .unwrap_or_default()
}

/// Archetypes passing the include/exclude card filters.
fn passes_filters(names: &BTreeSet<String>, options: &ShareOptions) -> bool {
    options.include_cards.iter().all(|c| names.contains(c))
        && !options.exclude_cards.iter().any(|c| names.contains(c))
}

/// Per-day percent share of each archetype.
///
/// Days whose filtered occurrence total is below `min_total_players` are
/// dropped before normalization. Archetypes absent on a kept day count as
/// zero there; the rolling mean runs over kept rows.
pub fn daily_share(
    trend: &TrendSeries,
    registry: &ArchetypeRegistry,
    options: &ShareOptions,
) -> ShareTable {
    let filtering = !options.include_cards.is_empty() || !options.exclude_cards.is_empty();
    let valid: BTreeSet<ArchetypeId> = trend
        .archetype_ids()
        .into_iter()
        .filter(|id| !filtering || passes_filters(&card_names(registry, id), options))
        .collect();

    let mut counts: Vec<(NaiveDate, BTreeMap<ArchetypeId, u32>)> = Vec::new();
    for date in trend.dates() {
        let day: BTreeMap<ArchetypeId, u32> = trend
            .on(date)
            .into_iter()
            .filter(|p| valid.contains(&p.archetype_id))
            .map(|p| (p.archetype_id.clone(), p.occurrences))
            .collect();
        let total: u32 = day.values().sum();
        if total > 0 && total >= options.min_total_players {
            counts.push((date, day));
        }
    }

    let columns: BTreeSet<ArchetypeId> = counts
        .iter()
        .flat_map(|(_, day)| day.keys().cloned())
        .collect();

    let normalized: Vec<BTreeMap<ArchetypeId, f64>> = counts
        .iter()
        .map(|(_, day)| {
            let total: u32 = day.values().sum();
            columns
                .iter()
                .map(|id| {
                    let n = day.get(id).copied().unwrap_or(0);
                    (id.clone(), n as f64 * 100.0 / total as f64)
                })
                .collect()
        })
        .collect();

    let window = options.window.max(1);
    let rows = counts
        .iter()
        .enumerate()
        .map(|(i, (date, _))| {
            let start = (i + 1).saturating_sub(window);
            let span = &normalized[start..=i];
            let shares = columns
                .iter()
                .map(|id| {
                    let sum: f64 = span.iter().filter_map(|r| r.get(id)).sum();
                    (id.clone(), sum / span.len() as f64)
                })
                .collect();
            ShareRow {
                date: *date,
                shares,
                others: 0.0,
            }
        })
        .collect();

    ShareTable {
        archetypes: columns.into_iter().collect(),
        rows,
    }
}
