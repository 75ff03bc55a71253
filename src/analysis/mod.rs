//! Presenter-facing tables derived from engine output.

pub mod matchups;
pub mod share;
pub mod summary;

pub use matchups::{match_history, matchup_table, matchups_for, MatchHistoryEntry, MatchupStat};
pub use share::{daily_share, ShareOptions, ShareRow, ShareTable};
pub use summary::{summarize, ArchetypeSummary};
