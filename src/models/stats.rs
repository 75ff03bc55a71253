use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::archetype::ArchetypeId;

// ---------------------------------------------------------------------------
// Outcome: one player's result in one tournament
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub placement: Option<u32>,
}

impl Outcome {
    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.draws
    }
}

/// `wins / (wins + losses)`, or `None` without decisive games.
pub fn win_rate(wins: u32, losses: u32) -> Option<f64> {
    let decisive = wins + losses;
    if decisive == 0 {
        None
    } else {
        Some(wins as f64 / decisive as f64)
    }
}

/// Wilson score interval for a binomial proportion, as fractions in `[0, 1]`.
///
/// Returns `(0.0, 0.0)` when there are no trials. `z = 1.96` gives 95%.
pub fn wilson_interval(successes: u32, trials: u32, z: f64) -> (f64, f64) {
    if trials == 0 {
        return (0.0, 0.0);
    }
    let n = trials as f64;
    let p = successes as f64 / n;
    let z2 = z * z;

    let denominator = 1.0 + z2 / n;
    let center = p + z2 / (2.0 * n);
    let spread = z * ((p * (1.0 - p) + z2 / (4.0 * n)) / n).sqrt();

    let lower = ((center - spread) / denominator).clamp(0.0, 1.0);
    let upper = ((center + spread) / denominator).clamp(0.0, 1.0);
    (lower, upper)
}

// ---------------------------------------------------------------------------
// DailyArchetypeStat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyArchetypeStat {
    pub date: NaiveDate,
    pub archetype_id: ArchetypeId,
    pub occurrences: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// Serialized as `null` when no decisive games were played.
    pub win_rate: Option<f64>,
}

impl DailyArchetypeStat {
    pub fn new(date: NaiveDate, archetype_id: ArchetypeId) -> Self {
        Self {
            date,
            archetype_id,
            occurrences: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            win_rate: None,
        }
    }

    pub fn add(&mut self, outcome: &Outcome) {
        self.occurrences += 1;
        self.wins += outcome.wins;
        self.losses += outcome.losses;
        self.draws += outcome.draws;
        self.win_rate = win_rate(self.wins, self.losses);
    }

    /// Fold another partial aggregate for the same (date, archetype).
    pub fn absorb(&mut self, other: &DailyArchetypeStat) {
        self.occurrences += other.occurrences;
        self.wins += other.wins;
        self.losses += other.losses;
        self.draws += other.draws;
        self.win_rate = win_rate(self.wins, self.losses);
    }
}

// ---------------------------------------------------------------------------
// TrendSeries: date-ordered per-archetype stats
// ---------------------------------------------------------------------------

/// Ordered by `(date, archetype_id)`. Days without occurrences for an
/// archetype have no entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub points: Vec<DailyArchetypeStat>,
}

impl TrendSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DailyArchetypeStat> {
        self.points.iter()
    }

    /// Distinct dates in ascending order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let dates: BTreeSet<NaiveDate> = self.points.iter().map(|p| p.date).collect();
        dates.into_iter().collect()
    }

    /// Distinct archetype ids in ascending order.
    pub fn archetype_ids(&self) -> Vec<ArchetypeId> {
        let ids: BTreeSet<&ArchetypeId> = self.points.iter().map(|p| &p.archetype_id).collect();
        ids.into_iter().cloned().collect()
    }

    pub fn on(&self, date: NaiveDate) -> Vec<&DailyArchetypeStat> {
        self.points.iter().filter(|p| p.date == date).collect()
    }

    pub fn for_archetype(&self, id: &ArchetypeId) -> Vec<&DailyArchetypeStat> {
        self.points
            .iter()
            .filter(|p| &p.archetype_id == id)
            .collect()
    }

    pub fn get(&self, date: NaiveDate, id: &ArchetypeId) -> Option<&DailyArchetypeStat> {
        self.points
            .iter()
            .find(|p| p.date == date && &p.archetype_id == id)
    }

    /// Total occurrences across all archetypes on a date.
    pub fn total_on(&self, date: NaiveDate) -> u32 {
        self.points
            .iter()
            .filter(|p| p.date == date)
            .map(|p| p.occurrences)
            .sum()
    }

    /// Restrict to an inclusive date range.
    pub fn between(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> TrendSeries {
        TrendSeries {
            points: self
                .points
                .iter()
                .filter(|p| from.map_or(true, |f| p.date >= f) && to.map_or(true, |t| p.date <= t))
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_rate_is_none_without_decisive_games() {
        assert_eq!(win_rate(0, 0), None);
        assert_eq!(win_rate(3, 1), Some(0.75));
    }

    #[test]
    fn wilson_interval_brackets_the_proportion() {
        let (lo, hi) = wilson_interval(60, 100, 1.96);
        assert!(lo < 0.6 && 0.6 < hi);
        assert!((lo - 0.502).abs() < 0.01);
        assert!((hi - 0.691).abs() < 0.01);
    }

    #[test]
    fn wilson_interval_handles_edges() {
        assert_eq!(wilson_interval(0, 0, 1.96), (0.0, 0.0));
        let (lo, hi) = wilson_interval(5, 5, 1.96);
        assert!(lo > 0.0 && hi <= 1.0);
    }

    #[test]
    fn stat_add_tracks_win_rate() {
        let id = ArchetypeId::from_core(&super::super::archetype::Signature::new(1, "ab"));
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut stat = DailyArchetypeStat::new(date, id);
        stat.add(&Outcome { wins: 0, losses: 0, draws: 2, placement: None });
        assert_eq!(stat.win_rate, None);
        stat.add(&Outcome { wins: 3, losses: 1, draws: 0, placement: Some(1) });
        assert_eq!(stat.occurrences, 2);
        assert_eq!(stat.win_rate, Some(0.75));
    }
}
