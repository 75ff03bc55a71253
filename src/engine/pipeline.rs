//! Drives tournament records through the engine.
//!
//! Records are processed in date order so archetype first-seen dates reflect
//! true chronological order. Recoverable per-occurrence errors are collected
//! into the [`RunReport`]; anything else aborts the run.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::CardCatalog;
use crate::config::DeckRules;
use crate::engine::aggregate::DailyAggregator;
use crate::engine::canonical::Canonicalizer;
use crate::engine::classifier::{ArchetypeClassifier, ArchetypeRegistry, CorePolicy};
use crate::engine::drilldown::DrilldownIndex;
use crate::engine::ingest::{ingest, RawOccurrence};
use crate::engine::signature::SignatureBuilder;
use crate::error::{Result, SkippedOccurrence};
use crate::models::{
    ArchetypeId, CardType, DeckOccurrence, MatchResult, Signature, TournamentRecord, TrendSeries,
};

/// One pairing between two classified decks, from player 1's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchupObservation {
    pub date: NaiveDate,
    pub tournament_id: String,
    #[serde(default)]
    pub round: Option<u32>,
    pub player_id: String,
    pub opponent_id: String,
    pub archetype: ArchetypeId,
    pub opponent: ArchetypeId,
    /// Full deck signatures of both players.
    pub signature: Signature,
    pub opponent_signature: Signature,
    pub result: MatchResult,
}

/// Everything one run produced.
#[derive(Debug)]
pub struct RunReport {
    pub trend: TrendSeries,
    pub drilldown: DrilldownIndex,
    pub skipped: Vec<SkippedOccurrence>,
    /// Occurrences aggregated in this run.
    pub processed: usize,
    pub matchups: Vec<MatchupObservation>,
}

pub struct Pipeline<'c> {
    canonicalizer: Canonicalizer<'c>,
    signatures: SignatureBuilder,
    classifier: ArchetypeClassifier,
}

impl<'c> Pipeline<'c> {
    pub fn new(catalog: &'c dyn CardCatalog, rules: DeckRules, policy: Box<dyn CorePolicy>) -> Self {
        let signatures = SignatureBuilder::new(rules);
        Self {
            canonicalizer: Canonicalizer::new(catalog),
            signatures,
            classifier: ArchetypeClassifier::new(policy, signatures),
        }
    }

    pub fn canonicalizer(&self) -> &Canonicalizer<'c> {
        &self.canonicalizer
    }

    pub fn classifier(&self) -> &ArchetypeClassifier {
        &self.classifier
    }

    /// Canonicalize, sign and classify one raw occurrence.
    pub fn occurrence(
        &self,
        registry: &mut ArchetypeRegistry,
        raw: RawOccurrence,
    ) -> Result<DeckOccurrence> {
        let deck = self.canonicalizer.resolve_deck(&raw.cards)?;
        let types = self.canonicalizer.card_types(&deck)?;
        let signature = self
            .signatures
            .deck_signature_with(&deck, |card| types.get(card) == Some(&CardType::Energy))?;
        let archetype_id = self
            .classifier
            .classify(registry, &deck, &signature, raw.date, &types);

        Ok(DeckOccurrence {
            tournament_id: raw.tournament_id,
            player_id: raw.player_id,
            date: raw.date,
            outcome: raw.outcome,
            deck,
            signature,
            archetype_id,
        })
    }

    /// Process a batch from scratch.
    pub fn run(
        &self,
        registry: &mut ArchetypeRegistry,
        records: &[TournamentRecord],
    ) -> Result<RunReport> {
        self.resume(registry, DailyAggregator::new(), records)
    }

    /// Process a batch on top of previously aggregated totals.
    pub fn resume(
        &self,
        registry: &mut ArchetypeRegistry,
        mut aggregator: DailyAggregator,
        records: &[TournamentRecord],
    ) -> Result<RunReport> {
        let mut ordered: Vec<&TournamentRecord> = records.iter().collect();
        ordered.sort_by_key(|r| r.date);

        let mut drilldown = DrilldownIndex::new();
        let mut skipped = Vec::new();
        let mut matchups = Vec::new();
        let mut processed = 0;

        for record in ordered {
            let mut decks: HashMap<String, (ArchetypeId, Signature)> = HashMap::new();

            for raw in ingest(record) {
                let raw = match raw {
                    Ok(raw) => raw,
                    Err(skip) => {
                        warn!(tournament = %skip.tournament_id, player = %skip.player_id, error = %skip.error, "skipping occurrence");
                        skipped.push(skip);
                        continue;
                    }
                };

                let (tournament_id, player_id) = (raw.tournament_id.clone(), raw.player_id.clone());
                match self.occurrence(registry, raw) {
                    Ok(occ) => {
                        aggregator.record(&occ);
                        drilldown.record(&occ);
                        decks.insert(
                            occ.player_id.clone(),
                            (occ.archetype_id.clone(), occ.signature.clone()),
                        );
                        processed += 1;
                    }
                    Err(e) if e.is_recoverable() => {
                        warn!(tournament = %tournament_id, player = %player_id, error = %e, "skipping occurrence");
                        skipped.push(SkippedOccurrence {
                            tournament_id,
                            player_id,
                            date: record.date,
                            error: e,
                        });
                    }
                    Err(e) => return Err(e),
                }
            }

            matchups.extend(observe_matchups(record, &decks));
            debug!(tournament = %record.id, decks = decks.len(), "tournament processed");
        }

        info!(
            processed,
            skipped = skipped.len(),
            archetypes = registry.len(),
            "aggregation finished"
        );

        Ok(RunReport {
            trend: aggregator.series(),
            drilldown,
            skipped,
            processed,
            matchups,
        })
    }
}

fn observe_matchups(
    record: &TournamentRecord,
    decks: &HashMap<String, (ArchetypeId, Signature)>,
) -> Vec<MatchupObservation> {
    record
        .pairings
        .iter()
        .filter(|p| !p.is_bye())
        .filter_map(|pairing| {
            let p1 = pairing.player1_key()?;
            let p2 = pairing.player2_key()?;
            let (archetype, signature) = decks.get(&p1)?.clone();
            let (opponent, opponent_signature) = decks.get(&p2)?.clone();
            Some(MatchupObservation {
                date: record.date,
                tournament_id: record.id.clone(),
                round: pairing.round,
                result: pairing.result_for(&p1)?,
                player_id: p1,
                opponent_id: p2,
                archetype,
                opponent,
                signature,
                opponent_signature,
            })
        })
        .collect()
}
