//! Per-archetype statistics over a date range.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::{ArchetypeRegistry, DrilldownIndex};
use crate::models::{wilson_interval, win_rate, ArchetypeId, TrendSeries};

/// z-score of the 95% confidence interval.
pub const Z_95: f64 = 1.96;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeSummary {
    pub archetype_id: ArchetypeId,
    /// Display name; never used for grouping.
    pub name: String,
    pub first_seen: Option<NaiveDate>,
    pub occurrences: u32,
    /// Percent of all occurrences in the period.
    pub share: f64,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub win_rate: Option<f64>,
    /// 95% Wilson interval of the win rate over decisive games.
    pub win_rate_low: f64,
    pub win_rate_high: f64,
    /// Distinct deck lists seen, when a drill-down index is available.
    pub variants: usize,
}

#[derive(Default)]
struct Totals {
    occurrences: u32,
    wins: u32,
    losses: u32,
    draws: u32,
}

/// Summaries for every archetype with occurrences between `from` and `to`
/// (inclusive), most played first.
pub fn summarize(
    trend: &TrendSeries,
    registry: &ArchetypeRegistry,
    drilldown: Option<&DrilldownIndex>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<ArchetypeSummary> {
    let period = trend.between(from, to);

    let mut totals: BTreeMap<&ArchetypeId, Totals> = BTreeMap::new();
    for point in period.iter() {
        let t = totals.entry(&point.archetype_id).or_default();
        t.occurrences += point.occurrences;
        t.wins += point.wins;
        t.losses += point.losses;
        t.draws += point.draws;
    }
    let all: u32 = totals.values().map(|t| t.occurrences).sum();

    let mut summaries: Vec<ArchetypeSummary> = totals
        .into_iter()
        .map(|(id, t)| {
            let archetype = registry.get(id);
            let name = match (drilldown, archetype) {
                (Some(index), Some(_)) => index.representative_name(id, registry),
                (None, Some(a)) => Some(a.core_name()),
                _ => None,
            }
            .unwrap_or_else(|| id.short().to_string());
            let (low, high) = wilson_interval(t.wins, t.wins + t.losses, Z_95);

            ArchetypeSummary {
                archetype_id: id.clone(),
                name,
                first_seen: archetype.map(|a| a.first_seen),
                occurrences: t.occurrences,
                share: if all == 0 {
                    0.0
                } else {
                    t.occurrences as f64 * 100.0 / all as f64
                },
                wins: t.wins,
                losses: t.losses,
                draws: t.draws,
                win_rate: win_rate(t.wins, t.losses),
                win_rate_low: low,
                win_rate_high: high,
                variants: drilldown.map_or(0, |d| d.variants(id).len()),
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.occurrences
            .cmp(&a.occurrences)
            .then_with(|| a.archetype_id.cmp(&b.archetype_id))
    });
    summaries
}
