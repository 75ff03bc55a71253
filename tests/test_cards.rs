//! Card database queries and catalog resolution against the sample catalog.

mod common;

use archetype_trends::models::{CardType, RawCardRef};
use archetype_trends::queries::CardQuery;
use archetype_trends::{CacheManager, CardCatalog, Connection, DeckRules, DuckDbCatalog, Metagame, MetagameError};
use std::time::Duration;

fn metagame_without_catalog() -> (Metagame, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let cache = CacheManager::new(Some(tmp.path().to_path_buf()), true, Duration::from_secs(5)).unwrap();
    let conn = Connection::new(cache).unwrap();
    (Metagame::from_connection(conn, DeckRules::default()), tmp)
}

// ---------------------------------------------------------------------------
// get_by_print
// ---------------------------------------------------------------------------

#[test]
fn get_by_print_finds_existing_card() {
    let (conn, _tmp) = common::setup_catalog_db();
    let q = CardQuery::new(&conn);

    let card = q.get_by_print("A1", "50").unwrap().unwrap();
    assert_eq!(card.name.as_deref(), Some("Water-Support"));
    assert_eq!(card.card_type(), CardType::Supporter);
}

#[test]
fn get_by_print_matches_zero_padded_numbers() {
    let (conn, _tmp) = common::setup_catalog_db();
    let q = CardQuery::new(&conn);

    let card = q.get_by_print("A1", "002").unwrap().unwrap();
    assert_eq!(card.name.as_deref(), Some("Blaze Beast"));
}

#[test]
fn get_by_print_returns_none_for_unknown() {
    let (conn, _tmp) = common::setup_catalog_db();
    let q = CardQuery::new(&conn);

    assert!(q.get_by_print("A1", "999").unwrap().is_none());
    assert!(q.get_by_print("ZZ", "1").unwrap().is_none());
}

// ---------------------------------------------------------------------------
// get_by_name / search / names / count
// ---------------------------------------------------------------------------

#[test]
fn get_by_name_is_case_insensitive_and_ordered() {
    let (conn, _tmp) = common::setup_catalog_db();
    let q = CardQuery::new(&conn);

    let prints = q.get_by_name("fire-starter", None).unwrap();
    let keys: Vec<(String, String)> = prints
        .iter()
        .map(|c| (c.set_code.clone(), c.number.clone()))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("A1".to_string(), "1".to_string()),
            ("A1".to_string(), "201".to_string()),
            ("A2".to_string(), "7".to_string()),
        ]
    );
}

#[test]
fn get_by_name_with_set_code_filters() {
    let (conn, _tmp) = common::setup_catalog_db();
    let q = CardQuery::new(&conn);

    let prints = q.get_by_name("Fire-Starter", Some("A2")).unwrap();
    assert_eq!(prints.len(), 1);
    assert_eq!(prints[0].number, "7");
}

#[test]
fn get_by_name_returns_empty_for_unknown() {
    let (conn, _tmp) = common::setup_catalog_db();
    let q = CardQuery::new(&conn);

    assert!(q.get_by_name("Missingno", None).unwrap().is_empty());
}

#[test]
fn canonical_print_picks_lowest_number_in_set() {
    let (conn, _tmp) = common::setup_catalog_db();
    let q = CardQuery::new(&conn);

    let alt_art = q.get_by_print("A1", "201").unwrap().unwrap();
    let canonical = q.canonical_print(&alt_art).unwrap();
    assert_eq!(canonical.number, "1");

    let reprint = q.get_by_print("A2", "7").unwrap().unwrap();
    assert_eq!(q.canonical_print(&reprint).unwrap().set_code, "A2");
}

#[test]
fn search_with_name_wildcard_and_limit() {
    let (conn, _tmp) = common::setup_catalog_db();
    let q = CardQuery::new(&conn);

    assert_eq!(q.search("fire%", None).unwrap().len(), 3);

    let limited = q.search("%support", Some(1)).unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].name.as_deref(), Some("Grass-Support"));
}

#[test]
fn names_are_distinct_and_sorted() {
    let (conn, _tmp) = common::setup_catalog_db();
    let q = CardQuery::new(&conn);

    assert_eq!(
        q.names().unwrap(),
        vec![
            "Blaze Beast",
            "Fire-Starter",
            "Grass-Support",
            "Poke Ball",
            "Potion",
            "Tide Caller",
            "Water-Support",
        ]
    );
}

#[test]
fn count_returns_total_prints() {
    let (conn, _tmp) = common::setup_catalog_db();
    let meta = Metagame::from_connection(conn, DeckRules::default());

    assert_eq!(meta.cards().count().unwrap(), 9);
}

// ---------------------------------------------------------------------------
// DuckDbCatalog
// ---------------------------------------------------------------------------

#[test]
fn catalog_merges_cosmetic_prints() {
    let (conn, _tmp) = common::setup_catalog_db();
    let catalog = DuckDbCatalog::new(&conn);

    let base = catalog.resolve(&RawCardRef::new("Fire-Starter", "A1", "1", 2)).unwrap();
    let alt = catalog.resolve(&RawCardRef::new("Fire-Starter", "A1", "201", 1)).unwrap();
    let padded = catalog.resolve(&RawCardRef::new("Fire-Starter", "A1", "001", 1)).unwrap();
    assert_eq!(base.key, "A1_1");
    assert_eq!(alt, base);
    assert_eq!(padded, base);
}

#[test]
fn catalog_keeps_reprints_in_other_sets_apart() {
    let (conn, _tmp) = common::setup_catalog_db();
    let catalog = DuckDbCatalog::new(&conn);

    let reprint = catalog.resolve(&RawCardRef::new("Fire-Starter", "A2", "7", 1)).unwrap();
    assert_eq!(reprint.key, "A2_7");
}

#[test]
fn catalog_falls_back_to_name_lookup() {
    let (conn, _tmp) = common::setup_catalog_db();
    let catalog = DuckDbCatalog::new(&conn);

    let by_name = catalog.resolve(&RawCardRef::new("Potion", "", "", 1)).unwrap();
    assert_eq!(by_name.key, "A1_61");

    let wrong_set = catalog.resolve(&RawCardRef::new("Fire-Starter", "ZZ", "9", 1)).unwrap();
    assert_eq!(wrong_set.key, "A1_1");
}

#[test]
fn catalog_reports_unknown_cards() {
    let (conn, _tmp) = common::setup_catalog_db();
    let catalog = DuckDbCatalog::new(&conn);

    let err = catalog.resolve(&RawCardRef::new("Missingno", "ZZ", "0", 1)).unwrap_err();
    assert!(matches!(err, MetagameError::UnknownCard { .. }));
    assert!(err.is_recoverable());
}

#[test]
fn catalog_card_types() {
    let (conn, _tmp) = common::setup_catalog_db();
    let catalog = DuckDbCatalog::new(&conn);

    let support = catalog.resolve(&RawCardRef::new("Water-Support", "A1", "50", 2)).unwrap();
    assert_eq!(catalog.card_type(&support).unwrap(), CardType::Supporter);

    // Not resolved through this catalog, so the type comes from a fresh lookup.
    let ball = archetype_trends::models::CardIdentity::new("A1_60", "Poke Ball");
    assert_eq!(catalog.card_type(&ball).unwrap(), CardType::Item);
}

// ---------------------------------------------------------------------------
// Card database file formats
// ---------------------------------------------------------------------------

#[test]
fn use_card_file_normalizes_label_struct_export() {
    let (meta, tmp) = metagame_without_catalog();

    let path = tmp.path().join("cards.json");
    std::fs::write(
        &path,
        r#"[
            {"set": "B1", "number": 4, "label": {"eng": "Spark Mouse"}, "imageName": "cPK_10_000040_00_SPARK_C"},
            {"set": "B1", "number": 90, "label": {"eng": "Rare Candy"}, "imageName": "cTR_10_000900_00_CANDY_U"}
        ]"#,
    )
    .unwrap();
    meta.use_card_file(&path).unwrap();

    let card = meta.cards().get_by_print("B1", "4").unwrap().unwrap();
    assert_eq!(card.name.as_deref(), Some("Spark Mouse"));
    assert_eq!(card.card_type(), CardType::Pokemon);
    assert_eq!(meta.cards().count().unwrap(), 2);
}

#[test]
fn use_card_file_rejects_missing_file() {
    let (meta, tmp) = metagame_without_catalog();

    let err = meta.use_card_file(tmp.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, MetagameError::NotFound(_)));
}
