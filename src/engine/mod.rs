//! The archetype signature and aggregation engine.
//!
//! Data flows leaf-first: [`ingest`] extracts raw occurrences,
//! [`canonical`] resolves card references, [`signature`] fingerprints deck
//! lists, [`classifier`] maps them to archetypes, and [`aggregate`] and
//! [`drilldown`] accumulate the results. [`pipeline`] wires the stages.

pub mod aggregate;
pub mod canonical;
pub mod classifier;
pub mod drilldown;
pub mod ingest;
pub mod pipeline;
pub mod signature;

pub use aggregate::DailyAggregator;
pub use canonical::{CardTypes, Canonicalizer};
pub use classifier::{ArchetypeClassifier, ArchetypeRegistry, CardTypePolicy, CorePolicy};
pub use drilldown::{DrilldownIndex, Variant, VariantDiff};
pub use ingest::{ingest, RawOccurrence};
pub use pipeline::{MatchupObservation, Pipeline, RunReport};
pub use signature::SignatureBuilder;
