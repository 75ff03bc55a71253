//! Archetype-versus-archetype results from tournament pairings.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::MatchupObservation;
use crate::models::{ArchetypeId, MatchResult, Signature};

/// Results of `archetype` against `opponent`, with `archetype < opponent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupStat {
    pub archetype: ArchetypeId,
    pub opponent: ArchetypeId,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl MatchupStat {
    /// Draws count as half a win.
    pub fn score(&self) -> Option<f64> {
        if self.games == 0 {
            None
        } else {
            Some((self.wins as f64 + 0.5 * self.draws as f64) / self.games as f64)
        }
    }

    /// The same matchup seen from the other side.
    pub fn flipped(&self) -> MatchupStat {
        MatchupStat {
            archetype: self.opponent.clone(),
            opponent: self.archetype.clone(),
            games: self.games,
            wins: self.losses,
            losses: self.wins,
            draws: self.draws,
        }
    }
}

/// Aggregate observations into one row per unordered archetype pair.
///
/// Mirror matches are dropped, as are pairs with fewer than `min_games`
/// games. Rows are ordered by games played, most first.
pub fn matchup_table(
    observations: &[MatchupObservation],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    min_games: u32,
) -> Vec<MatchupStat> {
    let mut pairs: BTreeMap<(&ArchetypeId, &ArchetypeId), MatchupStat> = BTreeMap::new();

    let in_period = |d: NaiveDate| from.map_or(true, |f| d >= f) && to.map_or(true, |t| d <= t);
    for obs in observations.iter().filter(|o| in_period(o.date)) {
        if obs.archetype == obs.opponent {
            continue;
        }
        let (a, b, result) = if obs.archetype < obs.opponent {
            (&obs.archetype, &obs.opponent, obs.result)
        } else {
            (&obs.opponent, &obs.archetype, obs.result.flipped())
        };

        let stat = pairs.entry((a, b)).or_insert_with(|| MatchupStat {
            archetype: a.clone(),
            opponent: b.clone(),
            games: 0,
            wins: 0,
            losses: 0,
            draws: 0,
        });
        stat.games += 1;
        match result {
            MatchResult::Win => stat.wins += 1,
            MatchResult::Loss => stat.losses += 1,
            MatchResult::Draw => stat.draws += 1,
        }
    }

    let mut table: Vec<MatchupStat> = pairs
        .into_values()
        .filter(|s| s.games >= min_games)
        .collect();
    table.sort_by(|a, b| b.games.cmp(&a.games));
    table
}

/// All recorded matchups of one archetype, from its side.
pub fn matchups_for(table: &[MatchupStat], id: &ArchetypeId) -> Vec<MatchupStat> {
    table
        .iter()
        .filter_map(|s| {
            if &s.archetype == id {
                Some(s.clone())
            } else if &s.opponent == id {
                Some(s.flipped())
            } else {
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Match history of one deck variant
// ---------------------------------------------------------------------------

/// One game played with a given deck list, seen from that list's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchHistoryEntry {
    pub date: NaiveDate,
    pub tournament_id: String,
    pub round: Option<u32>,
    pub player_id: String,
    pub opponent_id: String,
    pub archetype: ArchetypeId,
    pub opponent: ArchetypeId,
    pub opponent_signature: Signature,
    pub result: MatchResult,
}

/// Every recorded game of the variant with full signature `signature`, in
/// date, tournament and round order.
///
/// A game between two copies of the same list appears once per side.
pub fn match_history(observations: &[MatchupObservation], signature: &Signature) -> Vec<MatchHistoryEntry> {
    let mut history = Vec::new();
    for obs in observations {
        if &obs.signature == signature {
            history.push(MatchHistoryEntry {
                date: obs.date,
                tournament_id: obs.tournament_id.clone(),
                round: obs.round,
                player_id: obs.player_id.clone(),
                opponent_id: obs.opponent_id.clone(),
                archetype: obs.archetype.clone(),
                opponent: obs.opponent.clone(),
                opponent_signature: obs.opponent_signature.clone(),
                result: obs.result,
            });
        }
        if &obs.opponent_signature == signature {
            history.push(MatchHistoryEntry {
                date: obs.date,
                tournament_id: obs.tournament_id.clone(),
                round: obs.round,
                player_id: obs.opponent_id.clone(),
                opponent_id: obs.player_id.clone(),
                archetype: obs.opponent.clone(),
                opponent: obs.archetype.clone(),
                opponent_signature: obs.signature.clone(),
                result: obs.result.flipped(),
            });
        }
    }
    history.sort_by(|a, b| {
        (a.date, &a.tournament_id, a.round).cmp(&(b.date, &b.tournament_id, b.round))
    });
    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Signature;

    fn id(tag: &str) -> ArchetypeId {
        ArchetypeId::from_core(&Signature::new(1, tag))
    }

    fn obs(a: &str, b: &str, result: MatchResult) -> MatchupObservation {
        MatchupObservation {
            date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            tournament_id: "t".into(),
            round: Some(1),
            player_id: format!("{}-player", a),
            opponent_id: format!("{}-player", b),
            archetype: id(a),
            opponent: id(b),
            signature: Signature::new(1, &format!("{}-list", a)),
            opponent_signature: Signature::new(1, &format!("{}-list", b)),
            result,
        }
    }

    #[test]
    fn pairs_are_unordered_and_mirrors_dropped() {
        let table = matchup_table(
            &[
                obs("a", "b", MatchResult::Win),
                obs("b", "a", MatchResult::Win),
                obs("b", "a", MatchResult::Draw),
                obs("a", "a", MatchResult::Win),
            ],
            None,
            None,
            0,
        );
        assert_eq!(table.len(), 1);
        let s = &table[0];
        assert_eq!((s.games, s.wins, s.losses, s.draws), (3, 1, 1, 1));
        assert_eq!(s.score(), Some(0.5));
    }

    #[test]
    fn min_games_and_perspective() {
        let table = matchup_table(
            &[
                obs("a", "b", MatchResult::Win),
                obs("a", "b", MatchResult::Win),
                obs("a", "c", MatchResult::Loss),
            ],
            None,
            None,
            2,
        );
        assert_eq!(table.len(), 1);

        let b_view = matchups_for(&table, &id("b"));
        assert_eq!(b_view[0].archetype, id("b"));
        assert_eq!(b_view[0].losses, 2);
    }

    #[test]
    fn history_follows_one_list_from_both_seats() {
        let mut first = obs("a", "b", MatchResult::Win);
        first.round = Some(2);
        let mut second = obs("c", "a", MatchResult::Win);
        second.round = Some(1);
        let unrelated = obs("b", "c", MatchResult::Draw);

        let history = match_history(&[first, second, unrelated], &Signature::new(1, "a-list"));
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].round, Some(1));
        assert_eq!(history[0].player_id, "a-player");
        assert_eq!(history[0].opponent, id("c"));
        assert_eq!(history[0].result, MatchResult::Loss);
        assert_eq!(history[1].round, Some(2));
        assert_eq!(history[1].opponent_signature, Signature::new(1, "b-list"));
        assert_eq!(history[1].result, MatchResult::Win);
    }
}
