//! Connection integration tests: raw SQL execution, view registration, etc.

mod common;

use archetype_trends::models::CatalogCard;
use archetype_trends::{CacheManager, Connection, MetagameError};
use serde_json::json;
use std::time::Duration;

fn empty_connection() -> (Connection, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let cache = CacheManager::new(Some(tmp.path().to_path_buf()), true, Duration::from_secs(5)).unwrap();
    (Connection::new(cache).unwrap(), tmp)
}

// ---------------------------------------------------------------------------
// execute
// ---------------------------------------------------------------------------

#[test]
fn execute_returns_rows_as_maps() {
    let (conn, _tmp) = common::setup_catalog_db();

    let rows = conn
        .execute("SELECT * FROM cards WHERE setCode = ? ORDER BY name", &["A2".to_string()])
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Fire-Starter");
    assert_eq!(rows[0]["type"], "Pokemon");
}

#[test]
fn execute_returns_empty_for_no_matches() {
    let (conn, _tmp) = common::setup_catalog_db();

    let rows = conn
        .execute("SELECT * FROM cards WHERE name = ?", &["Missingno".to_string()])
        .unwrap();
    assert!(rows.is_empty());
}

#[test]
fn execute_scalar_counts_rows() {
    let (conn, _tmp) = common::setup_catalog_db();

    let count = conn
        .execute_scalar("SELECT COUNT(*) FROM cards", &[])
        .unwrap()
        .and_then(|v| v.as_i64());
    assert_eq!(count, Some(9));
}

#[test]
fn execute_scalar_returns_none_for_empty_result() {
    let (conn, _tmp) = common::setup_catalog_db();

    let result = conn
        .execute_scalar("SELECT name FROM cards WHERE setCode = ?", &["ZZ".to_string()])
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn execute_into_deserializes_catalog_rows() {
    let (conn, _tmp) = common::setup_catalog_db();

    let cards: Vec<CatalogCard> = conn
        .execute_into(
            "SELECT * FROM cards WHERE setCode = ? AND number = ?",
            &["A1".to_string(), "50".to_string()],
        )
        .unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].name.as_deref(), Some("Water-Support"));
    assert_eq!(cards[0].type_field.as_deref(), Some("Supporter"));
}

#[test]
fn null_and_numeric_values_convert_to_json() {
    let (conn, _tmp) = empty_connection();

    let rows = conn
        .execute("SELECT NULL AS a, 42 AS b, 2.5::DOUBLE AS c, TRUE AS d", &[])
        .unwrap();
    assert_eq!(rows[0]["a"], serde_json::Value::Null);
    assert_eq!(rows[0]["b"], json!(42));
    assert_eq!(rows[0]["c"], json!(2.5));
    assert_eq!(rows[0]["d"], json!(true));
}

// ---------------------------------------------------------------------------
// View registration
// ---------------------------------------------------------------------------

#[test]
fn register_table_from_ndjson_marks_view_as_registered() {
    let (conn, _tmp) = empty_connection();
    assert!(!conn.has_view("cards"));

    common::write_ndjson_and_register(
        &conn,
        "cards",
        &[json!({"setCode": "A1", "number": "1", "name": "Fire-Starter", "type": "Pokemon", "image": null})],
    );
    assert!(conn.has_view("cards"));
    assert_eq!(conn.views(), vec!["cards".to_string()]);
}

#[test]
fn register_table_replaces_existing_table() {
    let (conn, _tmp) = common::setup_catalog_db();

    common::write_ndjson_and_register(
        &conn,
        "cards",
        &[json!({"setCode": "B1", "number": "1", "name": "Only Card", "type": "Item", "image": null})],
    );
    let rows = conn.execute("SELECT name FROM cards", &[]).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Only Card");
}

#[test]
fn reset_views_clears_registered_views() {
    let (conn, _tmp) = common::setup_catalog_db();
    assert!(conn.has_view("cards"));

    conn.reset_views();
    assert!(!conn.has_view("cards"));
    assert!(conn.views().is_empty());
}

#[test]
fn ensure_views_offline_without_cache_is_not_found() {
    let (conn, _tmp) = empty_connection();

    let err = conn.ensure_views(&["cards"]).unwrap_err();
    assert!(matches!(err, MetagameError::NotFound(_)));
}

#[test]
fn ensure_views_rejects_unknown_view() {
    let (conn, _tmp) = empty_connection();

    let err = conn.ensure_views(&["prices"]).unwrap_err();
    assert!(matches!(err, MetagameError::NotFound(_)));
}

#[test]
fn ensure_views_uses_cached_card_database() {
    let (conn, tmp) = empty_connection();
    std::fs::write(
        tmp.path().join("cards.json"),
        r#"[{"set": "A1", "number": 1, "name": "Fire-Starter", "type": "Pokemon", "image": "cPK_10_000010_00_FIRE_C"}]"#,
    )
    .unwrap();

    conn.ensure_views(&["cards"]).unwrap();
    assert!(conn.has_view("cards"));
    let rows = conn.execute("SELECT setCode, number FROM cards", &[]).unwrap();
    assert_eq!(rows[0]["setCode"], "A1");
    assert_eq!(rows[0]["number"], "1");
}

#[test]
fn raw_provides_access_to_underlying_duckdb_connection() {
    let (conn, _tmp) = common::setup_catalog_db();

    let count: i64 = conn
        .raw()
        .query_row("SELECT COUNT(*) FROM cards WHERE \"type\" = 'Pokemon'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 5);
}
