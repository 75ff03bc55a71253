use chrono::NaiveDate;

#[derive(Debug, thiserror::Error)]
pub enum MetagameError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Snapshot uses signature version {found}, expected {expected}")]
    SignatureVersionMismatch { expected: u32, found: u32 },

    // -- Per-occurrence errors (recoverable) ---------------------------------
    #[error("Unknown card: {name} ({set} {number})")]
    UnknownCard {
        name: String,
        set: String,
        number: String,
    },

    #[error("Empty deck list")]
    EmptyDeck,

    #[error("Malformed deck list: {0}")]
    MalformedDeck(String),

    #[error("Incomplete record for player '{player}' in tournament {tournament}: {reason}")]
    IncompleteRecord {
        tournament: String,
        player: String,
        reason: String,
    },
}

impl MetagameError {
    /// Whether the error only invalidates a single deck occurrence.
    ///
    /// Recoverable errors are collected into the run report; everything else
    /// aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MetagameError::UnknownCard { .. }
                | MetagameError::EmptyDeck
                | MetagameError::MalformedDeck(_)
                | MetagameError::IncompleteRecord { .. }
        )
    }
}

/// A deck occurrence that was dropped from aggregation.
#[derive(Debug)]
pub struct SkippedOccurrence {
    pub tournament_id: String,
    pub player_id: String,
    pub date: NaiveDate,
    pub error: MetagameError,
}

pub type Result<T> = std::result::Result<T, MetagameError>;
