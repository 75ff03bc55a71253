//! SQL builder with parameterized query construction.
//!
//! Card references come straight from tournament exports, so every value is
//! bound through DuckDB's `?` placeholders and never interpolated.
//!
//! # Example
//!
//! ```rust
//! use archetype_trends::SqlBuilder;
//! let (sql, params) = SqlBuilder::new("cards")
//!     .where_eq("setCode", "A1")
//!     .where_eq("number", "33")
//!     .limit(1)
//!     .build();
//! assert_eq!(params, vec!["A1", "33"]);
//! ```

/// Builds parameterized SQL queries against the catalog views.
pub struct SqlBuilder {
    select_cols: Vec<String>,
    from_table: String,
    where_clauses: Vec<String>,
    params: Vec<String>,
    order_by_cols: Vec<String>,
    limit_val: Option<usize>,
}

impl SqlBuilder {
    /// Create a builder targeting the given table or view.
    pub fn new(table: &str) -> Self {
        Self {
            select_cols: vec!["*".to_string()],
            from_table: table.to_string(),
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_by_cols: Vec::new(),
            limit_val: None,
        }
    }

    /// Set the columns to select (replaces the default `*`).
    pub fn select(&mut self, cols: &[&str]) -> &mut Self {
        self.select_cols = cols.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Add a WHERE condition with a `?` placeholder for each param.
    pub fn where_clause(&mut self, condition: &str, params: &[&str]) -> &mut Self {
        self.where_clauses.push(condition.to_string());
        self.params.extend(params.iter().map(|p| p.to_string()));
        self
    }

    /// Add an equality condition: `{column} = ?`.
    pub fn where_eq(&mut self, column: &str, value: &str) -> &mut Self {
        self.where_clauses.push(format!("{} = ?", column));
        self.params.push(value.to_string());
        self
    }

    /// Add a case-insensitive equality condition: `LOWER({column}) = LOWER(?)`.
    pub fn where_eq_nocase(&mut self, column: &str, value: &str) -> &mut Self {
        self.where_clauses
            .push(format!("LOWER({}) = LOWER(?)", column));
        self.params.push(value.to_string());
        self
    }

    /// Add a case-insensitive LIKE condition.
    pub fn where_like(&mut self, column: &str, value: &str) -> &mut Self {
        self.where_clauses
            .push(format!("LOWER({}) LIKE LOWER(?)", column));
        self.params.push(value.to_string());
        self
    }

    /// Add a `{column} IS NOT DISTINCT FROM ?` condition, so NULL matches NULL
    /// when the parameter is absent.
    pub fn where_same(&mut self, column: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(v) => {
                self.where_clauses
                    .push(format!("{} IS NOT DISTINCT FROM ?", column));
                self.params.push(v.to_string());
            }
            None => self.where_clauses.push(format!("{} IS NULL", column)),
        }
        self
    }

    /// Add ORDER BY clauses (e.g. `"setCode ASC"`).
    pub fn order_by(&mut self, clauses: &[&str]) -> &mut Self {
        self.order_by_cols
            .extend(clauses.iter().map(|c| c.to_string()));
        self
    }

    /// Set the maximum number of rows to return.
    pub fn limit(&mut self, n: usize) -> &mut Self {
        self.limit_val = Some(n);
        self
    }

    /// Build the final SQL string and parameter list.
    pub fn build(&self) -> (String, Vec<String>) {
        let mut parts = vec![
            format!("SELECT {}", self.select_cols.join(", ")),
            format!("FROM {}", self.from_table),
        ];

        if !self.where_clauses.is_empty() {
            parts.push(format!("WHERE {}", self.where_clauses.join(" AND ")));
        }

        if !self.order_by_cols.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by_cols.join(", ")));
        }

        if let Some(n) = self.limit_val {
            parts.push(format!("LIMIT {}", n));
        }

        (parts.join("\n"), self.params.clone())
    }
}
