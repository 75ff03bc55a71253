use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Standing: one row of a tournament's standings export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub ties: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Standing {
    /// Display name.
    pub name: Option<String>,
    /// Account id; preferred over the display name for matching pairings.
    pub player: Option<String>,
    pub placing: Option<u32>,
    pub record: Option<MatchRecord>,
    /// Category name (`pokemon`, `trainer`, ...) to card entries. Kept as raw
    /// JSON so one malformed entry does not reject the whole tournament.
    pub decklist: Option<Value>,
}

impl Standing {
    /// Lowercased player key used to match pairings.
    pub fn player_id(&self) -> Option<String> {
        self.player
            .as_deref()
            .or(self.name.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

// ---------------------------------------------------------------------------
// Pairing: one match of one round
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pairing {
    pub round: Option<u32>,
    pub player1: Option<Value>,
    pub player2: Option<Value>,
    /// Winner's player id; `0`, `null` or an unknown id mean a tie, `-1` a
    /// double loss.
    pub winner: Option<Value>,
}

/// Normalize a participant reference (plain id, number, or `{name, id}` object).
pub fn participant_key(value: &Value) -> Option<String> {
    let key = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("id"))
            .and_then(participant_key)?,
        _ => return None,
    };
    let key = key.trim().to_lowercase();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Result of a pairing from one participant's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Win,
    Loss,
    Draw,
}

impl MatchResult {
    /// The same result from the other player's side.
    pub fn flipped(self) -> Self {
        match self {
            MatchResult::Win => MatchResult::Loss,
            MatchResult::Loss => MatchResult::Win,
            MatchResult::Draw => MatchResult::Draw,
        }
    }
}

impl Pairing {
    pub fn player1_key(&self) -> Option<String> {
        self.player1.as_ref().and_then(participant_key)
    }

    pub fn player2_key(&self) -> Option<String> {
        self.player2.as_ref().and_then(participant_key)
    }

    /// A pairing with only one participant.
    pub fn is_bye(&self) -> bool {
        self.player1_key().is_none() || self.player2_key().is_none()
    }

    /// The opponent of `player`, if `player` took part in this pairing.
    pub fn opponent_of(&self, player: &str) -> Option<String> {
        let (p1, p2) = (self.player1_key()?, self.player2_key()?);
        if p1 == player {
            Some(p2)
        } else if p2 == player {
            Some(p1)
        } else {
            None
        }
    }

    /// Result for `player`, or `None` if they did not play this pairing.
    pub fn result_for(&self, player: &str) -> Option<MatchResult> {
        let opponent = self.opponent_of(player)?;
        match &self.winner {
            Some(Value::Number(n)) if n.as_i64() == Some(-1) => Some(MatchResult::Loss),
            Some(w) => match participant_key(w) {
                Some(winner) if winner == player => Some(MatchResult::Win),
                Some(winner) if winner == opponent => Some(MatchResult::Loss),
                _ => Some(MatchResult::Draw),
            },
            None => Some(MatchResult::Draw),
        }
    }
}

// ---------------------------------------------------------------------------
// TournamentRecord: everything the engine needs from one tournament
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentRecord {
    pub id: String,
    pub name: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub standings: Vec<Standing>,
    #[serde(default)]
    pub pairings: Vec<Pairing>,
    /// Standings rows that could not be read.
    #[serde(default)]
    pub rejected: Vec<RejectedStanding>,
}

/// A standings row that did not deserialize as a [`Standing`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedStanding {
    /// Position in `standings.json`.
    pub index: usize,
    /// Player key, when the row still carried a readable one.
    pub player: Option<String>,
    pub reason: String,
}

impl RejectedStanding {
    pub fn from_row(index: usize, row: &Value, reason: impl ToString) -> Self {
        let player = row
            .get("player")
            .or_else(|| row.get("name"))
            .and_then(participant_key);
        Self {
            index,
            player,
            reason: reason.to_string(),
        }
    }

    /// Same fallback key as an unnamed standing at this position.
    pub fn player_id(&self) -> String {
        self.player
            .clone()
            .unwrap_or_else(|| format!("#{}", self.index + 1))
    }
}

/// The subset of `details.json` the source reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TournamentDetails {
    pub id: Option<String>,
    pub name: Option<String>,
    /// ISO-8601 timestamp, e.g. `2025-01-04T18:00:00.000Z`.
    pub date: Option<String>,
}

impl TournamentDetails {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?;
        NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairing(p1: Value, p2: Value, winner: Option<Value>) -> Pairing {
        Pairing {
            round: Some(1),
            player1: Some(p1),
            player2: Some(p2),
            winner,
        }
    }

    #[test]
    fn result_for_is_case_insensitive() {
        let p = pairing(json!("Ash"), json!("misty"), Some(json!("ASH")));
        assert_eq!(p.result_for("ash"), Some(MatchResult::Win));
        assert_eq!(p.result_for("misty"), Some(MatchResult::Loss));
        assert_eq!(p.result_for("brock"), None);
    }

    #[test]
    fn tie_and_double_loss() {
        let tie = pairing(json!("a"), json!("b"), Some(json!(0)));
        assert_eq!(tie.result_for("a"), Some(MatchResult::Draw));
        let none = pairing(json!("a"), json!("b"), None);
        assert_eq!(none.result_for("b"), Some(MatchResult::Draw));
        let double = pairing(json!("a"), json!("b"), Some(json!(-1)));
        assert_eq!(double.result_for("a"), Some(MatchResult::Loss));
        assert_eq!(double.result_for("b"), Some(MatchResult::Loss));
    }

    #[test]
    fn object_participants_and_byes() {
        let p = pairing(json!({"name": "Ash", "id": 1}), json!({"id": 2}), Some(json!({"id": 2})));
        assert_eq!(p.player1_key().as_deref(), Some("ash"));
        assert_eq!(p.result_for("2"), Some(MatchResult::Win));

        let bye = Pairing { round: Some(1), player1: Some(json!("a")), player2: None, winner: Some(json!("a")) };
        assert!(bye.is_bye());
        assert_eq!(bye.result_for("a"), None);
    }

    #[test]
    fn details_date_parses_iso_timestamp() {
        let details = TournamentDetails {
            id: Some("t1".into()),
            name: None,
            date: Some("2025-01-04T18:00:00.000Z".into()),
        };
        assert_eq!(details.parsed_date(), NaiveDate::from_ymd_opt(2025, 1, 4));
    }

    #[test]
    fn rejected_row_keeps_player_when_readable() {
        let named = RejectedStanding::from_row(2, &json!({"player": "Ash", "placing": "first"}), "bad placing");
        assert_eq!(named.player_id(), "ash");
        assert_eq!(named.reason, "bad placing");

        let anonymous = RejectedStanding::from_row(4, &json!("garbage"), "not an object");
        assert_eq!(anonymous.player, None);
        assert_eq!(anonymous.player_id(), "#5");
    }
}
