//! Tournament record sources.
//!
//! [`DirectorySource`] reads an export tree laid out as
//! `<root>/YYYY/MM/DD/<tournament-id>/{details,standings,pairings}.json`.
//! `standings.json` is required; `details.json` and `pairings.json` are
//! optional.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::read_json_file;
use crate::error::{MetagameError, Result};
use crate::models::{Pairing, RejectedStanding, Standing, TournamentDetails, TournamentRecord};

/// Supplies tournament records, ordered by date.
pub trait TournamentSource {
    fn tournaments(&mut self) -> Result<Vec<TournamentRecord>>;
}

/// Records already in memory.
impl TournamentSource for Vec<TournamentRecord> {
    fn tournaments(&mut self) -> Result<Vec<TournamentRecord>> {
        let mut records = std::mem::take(self);
        records.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }
}

pub struct DirectorySource {
    root: PathBuf,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            from: None,
            to: None,
        }
    }

    /// Only read tournaments dated within `[from, to]`.
    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn in_range(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |f| date >= f) && self.to.map_or(true, |t| date <= t)
    }

    /// `(date, tournament dir)` for every day directory in range.
    fn tournament_dirs(&self) -> Result<Vec<(NaiveDate, PathBuf)>> {
        if !self.root.is_dir() {
            return Err(MetagameError::NotFound(format!(
                "Tournament directory {} does not exist",
                self.root.display()
            )));
        }

        let mut dirs = Vec::new();
        for year in sorted_subdirs(&self.root)? {
            for month in sorted_subdirs(&year)? {
                for day in sorted_subdirs(&month)? {
                    let Some(date) = date_from_path(&year, &month, &day) else {
                        debug!(path = %day.display(), "not a date directory");
                        continue;
                    };
                    if !self.in_range(date) {
                        continue;
                    }
                    for tournament in sorted_subdirs(&day)? {
                        dirs.push((date, tournament));
                    }
                }
            }
        }
        Ok(dirs)
    }
}

impl TournamentSource for DirectorySource {
    fn tournaments(&mut self) -> Result<Vec<TournamentRecord>> {
        let mut records = Vec::new();
        for (date, dir) in self.tournament_dirs()? {
            match read_tournament(&dir, date) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => debug!(path = %dir.display(), "no standings, skipping"),
                Err(e) => warn!(path = %dir.display(), error = %e, "unreadable tournament, skipping"),
            }
        }
        records.retain(|r| self.in_range(r.date));
        records.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        info!(count = records.len(), root = %self.root.display(), "loaded tournaments");
        Ok(records)
    }
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    out.sort();
    Ok(out)
}

fn date_from_path(year: &Path, month: &Path, day: &Path) -> Option<NaiveDate> {
    let part = |p: &Path| p.file_name()?.to_str()?.parse::<u32>().ok();
    NaiveDate::from_ymd_opt(part(year)? as i32, part(month)?, part(day)?)
}

/// Read one tournament directory. `Ok(None)` when it has no standings.
pub fn read_tournament(dir: &Path, dir_date: NaiveDate) -> Result<Option<TournamentRecord>> {
    let standings_path = dir.join("standings.json");
    if !standings_path.exists() {
        return Ok(None);
    }

    let details: TournamentDetails = match optional_file(&dir.join("details.json"))? {
        Some(value) => serde_json::from_value(value)?,
        None => TournamentDetails::default(),
    };
    let dir_id = dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let id = details.id.clone().unwrap_or(dir_id);

    let (standings, bad_rows) = lenient_list::<Standing>(read_json_file(&standings_path)?);
    let rejected: Vec<RejectedStanding> = bad_rows
        .into_iter()
        .map(|(index, row, e)| {
            let rejected = RejectedStanding::from_row(index, &row, e);
            warn!(
                tournament = %id,
                player = %rejected.player_id(),
                error = %rejected.reason,
                "unreadable standings row"
            );
            rejected
        })
        .collect();

    let pairings: Vec<Pairing> = match optional_file(&dir.join("pairings.json"))? {
        Some(value) => {
            let (pairings, bad_rows) = lenient_list::<Pairing>(value);
            for (index, _, e) in bad_rows {
                warn!(tournament = %id, index, error = %e, "unreadable pairing");
            }
            pairings
        }
        None => Vec::new(),
    };

    Ok(Some(TournamentRecord {
        id,
        name: details.name.clone(),
        date: details.parsed_date().unwrap_or(dir_date),
        standings,
        pairings,
        rejected,
    }))
}

fn optional_file(path: &Path) -> Result<Option<Value>> {
    if path.exists() {
        Ok(Some(read_json_file(path)?))
    } else {
        Ok(None)
    }
}

/// Deserialize the elements of a JSON array one by one. Elements that do not
/// fit come back with their position and the error instead of failing the list.
fn lenient_list<T: DeserializeOwned>(value: Value) -> (Vec<T>, Vec<(usize, Value, serde_json::Error)>) {
    let Value::Array(items) = value else {
        return (Vec::new(), Vec::new());
    };
    let mut parsed = Vec::with_capacity(items.len());
    let mut bad = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<T>(item.clone()) {
            Ok(value) => parsed.push(value),
            Err(e) => bad.push((index, item, e)),
        }
    }
    (parsed, bad)
}
