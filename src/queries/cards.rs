//! Card lookups against the DuckDB-backed `cards` view.

use crate::connection::Connection;
use crate::error::Result;
use crate::models::CatalogCard;
use crate::sql_builder::SqlBuilder;

const NUMERIC_ORDER: &str = "TRY_CAST(number AS INTEGER) ASC NULLS LAST";

/// Query interface for the card reference database.
pub struct CardQuery<'a> {
    conn: &'a Connection,
}

impl<'a> CardQuery<'a> {
    /// Create a new `CardQuery` bound to the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Look up one print by set code and collector number.
    ///
    /// Numbers compare numerically when both sides are numeric, so `"033"`
    /// in an export matches `"33"` in the catalog.
    pub fn get_by_print(&self, set_code: &str, number: &str) -> Result<Option<CatalogCard>> {
        self.conn.ensure_views(&["cards"])?;

        let (sql, params) = SqlBuilder::new("cards")
            .where_eq("setCode", set_code)
            .where_clause(
                "(number = ? OR TRY_CAST(number AS INTEGER) = TRY_CAST(? AS INTEGER))",
                &[number, number],
            )
            .order_by(&["number ASC"])
            .limit(1)
            .build();

        Ok(self.conn.execute_into(&sql, &params)?.into_iter().next())
    }

    /// All prints with an exact (case-insensitive) name, optionally within one set.
    ///
    /// Ordered by set code, then numerically by collector number.
    pub fn get_by_name(&self, name: &str, set_code: Option<&str>) -> Result<Vec<CatalogCard>> {
        self.conn.ensure_views(&["cards"])?;

        let mut qb = SqlBuilder::new("cards");
        qb.where_eq_nocase("name", name);
        if let Some(sc) = set_code {
            qb.where_eq("setCode", sc);
        }
        qb.order_by(&["setCode ASC", NUMERIC_ORDER, "number ASC"]);

        let (sql, params) = qb.build();
        self.conn.execute_into(&sql, &params)
    }

    /// The canonical print of a card: among prints sharing name, set and type,
    /// the one with the lowest collector number. Other prints are cosmetic
    /// variants (alternate art, full art).
    pub fn canonical_print(&self, card: &CatalogCard) -> Result<CatalogCard> {
        self.conn.ensure_views(&["cards"])?;

        let (sql, params) = SqlBuilder::new("cards")
            .where_eq("setCode", &card.set_code)
            .where_same("name", card.name.as_deref())
            .where_same("\"type\"", card.type_field.as_deref())
            .order_by(&[NUMERIC_ORDER, "number ASC"])
            .limit(1)
            .build();

        let rows: Vec<CatalogCard> = self.conn.execute_into(&sql, &params)?;
        Ok(rows.into_iter().next().unwrap_or_else(|| card.clone()))
    }

    /// Cards whose name matches a LIKE pattern (e.g. `"Pikachu%"`).
    pub fn search(&self, pattern: &str, limit: Option<usize>) -> Result<Vec<CatalogCard>> {
        self.conn.ensure_views(&["cards"])?;

        let mut qb = SqlBuilder::new("cards");
        qb.where_like("name", pattern)
            .order_by(&["name ASC", "setCode ASC", NUMERIC_ORDER]);
        if let Some(n) = limit {
            qb.limit(n);
        }

        let (sql, params) = qb.build();
        self.conn.execute_into(&sql, &params)
    }

    /// Sorted unique card names in the catalog.
    pub fn names(&self) -> Result<Vec<String>> {
        self.conn.ensure_views(&["cards"])?;

        let rows = self.conn.execute(
            "SELECT DISTINCT name FROM cards WHERE name IS NOT NULL ORDER BY name",
            &[],
        )?;
        Ok(rows
            .into_iter()
            .filter_map(|r| r.get("name").and_then(|v| v.as_str()).map(str::to_string))
            .collect())
    }

    /// Number of prints in the catalog.
    pub fn count(&self) -> Result<i64> {
        self.conn.ensure_views(&["cards"])?;

        let cnt = self
            .conn
            .execute_scalar("SELECT COUNT(*) FROM cards", &[])?
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        Ok(cnt)
    }
}
