//! JSON snapshots of a run's state, for incremental runs across restarts.

use std::fs;
use std::io::{BufReader, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{DeckRules, SIGNATURE_VERSION};
use crate::engine::{ArchetypeRegistry, DailyAggregator, DrilldownIndex, MatchupObservation, RunReport};
use crate::error::{MetagameError, Result};
use crate::models::{Archetype, TrendSeries};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub signature_version: u32,
    pub saved_at: DateTime<Utc>,
    pub rules: DeckRules,
    pub archetypes: Vec<Archetype>,
    pub trend: TrendSeries,
    #[serde(default)]
    pub drilldown: Option<DrilldownIndex>,
    /// Every matchup observed so far, oldest run first.
    #[serde(default)]
    pub matchups: Vec<MatchupObservation>,
}

impl Snapshot {
    pub fn new(
        rules: DeckRules,
        registry: &ArchetypeRegistry,
        trend: &TrendSeries,
        drilldown: Option<&DrilldownIndex>,
        matchups: &[MatchupObservation],
    ) -> Self {
        Self {
            signature_version: SIGNATURE_VERSION,
            saved_at: Utc::now(),
            rules,
            archetypes: registry.iter().cloned().collect(),
            trend: trend.clone(),
            drilldown: drilldown.cloned(),
            matchups: matchups.to_vec(),
        }
    }

    /// The state after a run resumed from this snapshot.
    ///
    /// The run started from this snapshot's registry and totals, so those are
    /// replaced outright. Drill-down and matchups only hold the run's own
    /// occurrences and are appended.
    pub fn advance(mut self, registry: &ArchetypeRegistry, report: &RunReport) -> Self {
        self.saved_at = Utc::now();
        self.archetypes = registry.iter().cloned().collect();
        self.trend = report.trend.clone();
        self.drilldown
            .get_or_insert_with(DrilldownIndex::new)
            .merge(report.drilldown.clone());
        self.matchups.extend(report.matchups.iter().cloned());
        self
    }

    /// Write atomically: a temp file in the target directory, then rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| MetagameError::Io(e.error))?;

        info!(path = %path.display(), archetypes = self.archetypes.len(), "saved snapshot");
        Ok(())
    }

    /// Load a snapshot written with the current signature version.
    pub fn load(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))?;
        if snapshot.signature_version != SIGNATURE_VERSION {
            return Err(MetagameError::SignatureVersionMismatch {
                expected: SIGNATURE_VERSION,
                found: snapshot.signature_version,
            });
        }
        Ok(snapshot)
    }

    pub fn registry(&self) -> ArchetypeRegistry {
        ArchetypeRegistry::from_archetypes(self.archetypes.iter().cloned())
    }

    /// An aggregator holding the snapshot's totals, to resume from.
    pub fn aggregator(&self) -> DailyAggregator {
        DailyAggregator::from_series(&self.trend)
    }
}
