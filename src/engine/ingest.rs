//! Extraction of per-player deck lists and outcomes from tournament records.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::Value;

use crate::config::DECK_CATEGORIES;
use crate::error::{MetagameError, SkippedOccurrence};
use crate::models::{MatchResult, Outcome, RawCardRef, Standing, TournamentRecord};

/// A player's deck list and outcome before canonicalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOccurrence {
    pub tournament_id: String,
    pub player_id: String,
    pub date: NaiveDate,
    pub cards: Vec<RawCardRef>,
    pub outcome: Outcome,
}

/// One entry per standing: the raw occurrence, or why it was skipped.
/// Rejected standings rows come last, as `MalformedDeck` skips.
pub fn ingest(record: &TournamentRecord) -> Vec<Result<RawOccurrence, SkippedOccurrence>> {
    let results = pairing_results(record);

    let rejected = record.rejected.iter().map(|row| {
        Err::<RawOccurrence, _>(SkippedOccurrence {
            tournament_id: record.id.clone(),
            player_id: row.player_id(),
            date: record.date,
            error: MetagameError::MalformedDeck(format!(
                "unreadable standings row {}: {}",
                row.index + 1,
                row.reason
            )),
        })
    });

    record
        .standings
        .iter()
        .enumerate()
        .map(|(index, standing)| {
            let player_id = standing
                .player_id()
                .unwrap_or_else(|| format!("#{}", index + 1));
            let skip = |error: MetagameError| SkippedOccurrence {
                tournament_id: record.id.clone(),
                player_id: player_id.clone(),
                date: record.date,
                error,
            };
            let incomplete = |reason: &str| {
                skip(MetagameError::IncompleteRecord {
                    tournament: record.id.clone(),
                    player: player_id.clone(),
                    reason: reason.to_string(),
                })
            };

            let cards = match standing.decklist.as_ref() {
                Some(list) => flatten_decklist(list).map_err(skip)?,
                None => Vec::new(),
            };
            if cards.is_empty() {
                return Err(incomplete("no deck list"));
            }

            let outcome = outcome_for(standing, results.get(&player_id))
                .ok_or_else(|| incomplete("no round results"))?;

            Ok(RawOccurrence {
                tournament_id: record.id.clone(),
                player_id: player_id.clone(),
                date: record.date,
                cards,
                outcome,
            })
        })
        .chain(rejected)
        .collect()
}

/// Per-player win/loss/draw totals from the pairings. Byes are ignored.
fn pairing_results(record: &TournamentRecord) -> HashMap<String, Outcome> {
    let mut totals: HashMap<String, Outcome> = HashMap::new();
    for pairing in record.pairings.iter().filter(|p| !p.is_bye()) {
        let players = [pairing.player1_key(), pairing.player2_key()];
        for player in players.into_iter().flatten() {
            let Some(result) = pairing.result_for(&player) else {
                continue;
            };
            let entry = totals.entry(player).or_default();
            match result {
                MatchResult::Win => entry.wins += 1,
                MatchResult::Loss => entry.losses += 1,
                MatchResult::Draw => entry.draws += 1,
            }
        }
    }
    totals
}

/// Pairings first; the standings record when the player has no pairings.
fn outcome_for(standing: &Standing, from_pairings: Option<&Outcome>) -> Option<Outcome> {
    let mut outcome = match (from_pairings, &standing.record) {
        (Some(o), _) => *o,
        (None, Some(rec)) => Outcome {
            wins: rec.wins,
            losses: rec.losses,
            draws: rec.ties,
            placement: None,
        },
        (None, None) => return None,
    };
    if outcome.games() == 0 {
        return None;
    }
    outcome.placement = standing.placing;
    Some(outcome)
}

/// Flatten a standings deck list into raw card references.
///
/// Accepts the category object export (`{"pokemon": [...], "trainer": [...]}`)
/// and a plain array of entries. Bare strings name the deck's energy types
/// (`"energy": ["Fire"]`), not cards, and are skipped.
pub fn flatten_decklist(list: &Value) -> Result<Vec<RawCardRef>, MetagameError> {
    let mut cards = Vec::new();
    match list {
        Value::Object(categories) => {
            for category in DECK_CATEGORIES {
                if let Some(Value::Array(entries)) = categories.get(category) {
                    for entry in entries {
                        cards.extend(parse_entry(entry)?);
                    }
                }
            }
        }
        Value::Array(entries) => {
            for entry in entries {
                cards.extend(parse_entry(entry)?);
            }
        }
        Value::Null => {}
        other => {
            return Err(MetagameError::MalformedDeck(format!(
                "unexpected deck list value: {}",
                other
            )))
        }
    }
    Ok(cards)
}

fn parse_entry(entry: &Value) -> Result<Option<RawCardRef>, MetagameError> {
    match entry {
        Value::String(_) => Ok(None),
        Value::Object(_) => serde_json::from_value(entry.clone())
            .map(Some)
            .map_err(|e| MetagameError::MalformedDeck(format!("bad card entry {}: {}", entry, e))),
        other => Err(MetagameError::MalformedDeck(format!(
            "bad card entry: {}",
            other
        ))),
    }
}
