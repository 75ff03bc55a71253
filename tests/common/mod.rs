//! Shared test fixtures for the integration tests.
//!
//! `setup_catalog_db()` creates an in-memory DuckDB connection with a small
//! card catalog loaded as the `cards` table via an NDJSON temp file. The deck
//! and tournament helpers build records in the tournament export shape.

#![allow(dead_code)]

use archetype_trends::models::{MatchRecord, Pairing, Standing, TournamentRecord};
use archetype_trends::{CacheManager, Connection};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Create a `Connection` backed by a temporary offline cache with the sample
/// catalog loaded.
///
/// The caller must keep the returned `TempDir` alive for the duration of the
/// test.
pub fn setup_catalog_db() -> (Connection, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().unwrap();
    let cache = CacheManager::new(Some(tmp_dir.path().to_path_buf()), true, Duration::from_secs(30)).unwrap();
    let conn = Connection::new(cache).unwrap();

    register_cards(&conn);

    (conn, tmp_dir)
}

fn card(set: &str, number: &str, name: &str, card_type: &str, image: &str) -> Value {
    json!({
        "setCode": set,
        "number": number,
        "name": name,
        "type": card_type,
        "image": image,
    })
}

fn register_cards(conn: &Connection) {
    let cards = vec![
        card("A1", "1", "Fire-Starter", "Pokemon", "cPK_10_000010_00_FIRE_C"),
        card("A1", "2", "Blaze Beast", "Pokemon", "cPK_10_000020_00_BLAZE_R"),
        card("A1", "3", "Tide Caller", "Pokemon", "cPK_10_000030_00_TIDE_C"),
        card("A1", "50", "Water-Support", "Supporter", "cTR_20_000500_00_WATER_U"),
        card("A1", "51", "Grass-Support", "Supporter", "cTR_20_000510_00_GRASS_U"),
        card("A1", "60", "Poke Ball", "Item", "cTR_10_000600_00_BALL_C"),
        card("A1", "61", "Potion", "Item", "cTR_10_000610_00_POTION_C"),
        // Full-art print of A1 1.
        card("A1", "201", "Fire-Starter", "Pokemon", "cPK_90_002010_00_FIRE_AR"),
        // Reprint in a later set.
        card("A2", "7", "Fire-Starter", "Pokemon", "cPK_10_000070_00_FIRE_C"),
    ];

    write_ndjson_and_register(conn, "cards", &cards);
}

/// Write a slice of JSON values as NDJSON to a temp file and register it
/// as a DuckDB table via `Connection::register_table_from_ndjson`.
pub fn write_ndjson_and_register(conn: &Connection, table_name: &str, rows: &[Value]) {
    let mut file = NamedTempFile::new().unwrap();
    for row in rows {
        writeln!(file, "{}", serde_json::to_string(row).unwrap()).unwrap();
    }
    file.flush().unwrap();

    let path = file.path().to_str().unwrap();
    conn.register_table_from_ndjson(table_name, path).unwrap();
    // NamedTempFile is dropped here, but DuckDB has already read the data
    // into an in-memory table.
}

// ---------------------------------------------------------------------------
// Deck lists
// ---------------------------------------------------------------------------

/// Standings-style deck list: `(name, set, number, count)` entries sorted
/// into categories by set code, plus basic energy.
pub fn decklist(pokemon: &[(&str, &str, &str, u32)], trainer: &[(&str, &str, &str, u32)], energy: u32) -> Value {
    let entries = |cards: &[(&str, &str, &str, u32)]| -> Vec<Value> {
        cards
            .iter()
            .map(|(name, set, number, count)| json!({"name": name, "set": set, "number": number, "count": count}))
            .collect()
    };
    json!({
        "pokemon": entries(pokemon),
        "trainer": entries(trainer),
        "energy": [{"name": "Basic-Energy", "set": "Energy", "number": "000", "count": energy}],
    })
}

/// Fire-Starter x2, Water-Support x2, Basic-Energy x16.
pub fn deck_a() -> Value {
    decklist(&[("Fire-Starter", "A1", "1", 2)], &[("Water-Support", "A1", "50", 2)], 16)
}

/// Deck A with Water-Support swapped for Grass-Support.
pub fn deck_b() -> Value {
    decklist(&[("Fire-Starter", "A1", "1", 2)], &[("Grass-Support", "A1", "51", 2)], 16)
}

/// A different core: Tide Caller instead of Fire-Starter.
pub fn deck_c() -> Value {
    decklist(&[("Tide Caller", "A1", "3", 2)], &[("Water-Support", "A1", "50", 2)], 16)
}

/// 21 cards.
pub fn oversized_deck() -> Value {
    decklist(&[("Fire-Starter", "A1", "1", 2)], &[("Water-Support", "A1", "50", 2)], 17)
}

// ---------------------------------------------------------------------------
// Tournaments
// ---------------------------------------------------------------------------

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
}

pub fn standing(player: &str, deck: Value, record: (u32, u32, u32)) -> Standing {
    Standing {
        name: Some(player.to_string()),
        player: Some(player.to_string()),
        placing: None,
        record: Some(MatchRecord {
            wins: record.0,
            losses: record.1,
            ties: record.2,
        }),
        decklist: Some(deck),
    }
}

pub fn pairing(player1: &str, player2: &str, winner: Option<&str>) -> Pairing {
    Pairing {
        round: Some(1),
        player1: Some(json!(player1)),
        player2: Some(json!(player2)),
        winner: winner.map(|w| json!(w)),
    }
}

pub fn tournament(id: &str, day: u32, standings: Vec<Standing>, pairings: Vec<Pairing>) -> TournamentRecord {
    TournamentRecord {
        id: id.to_string(),
        name: None,
        date: date(day),
        standings,
        pairings,
        rejected: Vec::new(),
    }
}
