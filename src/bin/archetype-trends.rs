//! Run the archetype engine over a tournament export tree and print JSON.
//!
//! ```text
//! archetype-trends <tournaments-dir> [--cards FILE] [--cache-dir DIR] [--offline]
//!                  [--from YYYY-MM-DD] [--to YYYY-MM-DD] [--snapshot FILE]
//!                  [--window N] [--min-players N] [--top N]
//! ```
//!
//! With `--snapshot`, a previous run's state is resumed from the file (only
//! tournaments after its last date are read unless `--from` is given) and the
//! updated state is written back. The matchup table covers every run the
//! snapshot has seen.

use std::env;
use std::path::PathBuf;

use archetype_trends::analysis::{daily_share, matchup_table, summarize, ShareOptions};
use archetype_trends::engine::{ArchetypeRegistry, DailyAggregator};
use archetype_trends::source::{DirectorySource, TournamentSource};
use archetype_trends::store::Snapshot;
use archetype_trends::Metagame;
use chrono::NaiveDate;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct Args {
    tournaments: PathBuf,
    cards: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    offline: bool,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    snapshot: Option<PathBuf>,
    share: ShareOptions,
    top: Option<usize>,
}

fn parse_date(flag: &str, raw: Option<String>) -> Result<NaiveDate, String> {
    let raw = raw.ok_or_else(|| format!("{} requires a date", flag))?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| format!("{} {}: {}", flag, raw, e))
}

fn parse_number<T: std::str::FromStr>(flag: &str, raw: Option<String>) -> Result<T, String> {
    let raw = raw.ok_or_else(|| format!("{} requires a number", flag))?;
    raw.parse()
        .map_err(|_| format!("{} expects a number, got {}", flag, raw))
}

fn parse_args() -> Result<Args, String> {
    let mut tournaments = None;
    let mut args = Args {
        tournaments: PathBuf::new(),
        cards: None,
        cache_dir: None,
        offline: false,
        from: None,
        to: None,
        snapshot: None,
        share: ShareOptions::default(),
        top: None,
    };

    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--cards" => {
                args.cards = Some(iter.next().ok_or("--cards requires a path")?.into());
            }
            "--cache-dir" => {
                args.cache_dir = Some(iter.next().ok_or("--cache-dir requires a path")?.into());
            }
            "--snapshot" => {
                args.snapshot = Some(iter.next().ok_or("--snapshot requires a path")?.into());
            }
            "--offline" => args.offline = true,
            "--from" => args.from = Some(parse_date("--from", iter.next())?),
            "--to" => args.to = Some(parse_date("--to", iter.next())?),
            "--window" => args.share.window = parse_number("--window", iter.next())?,
            "--min-players" => {
                args.share.min_total_players = parse_number("--min-players", iter.next())?
            }
            "--top" => args.top = Some(parse_number("--top", iter.next())?),
            "-h" | "--help" => {
                return Err("usage: archetype-trends <tournaments-dir> [--cards FILE] \
                     [--cache-dir DIR] [--offline] [--from DATE] [--to DATE] \
                     [--snapshot FILE] [--window N] [--min-players N] [--top N]"
                    .to_string())
            }
            other if other.starts_with("--") => return Err(format!("unknown flag {}", other)),
            other => tournaments = Some(PathBuf::from(other)),
        }
    }

    args.tournaments = tournaments.ok_or("missing tournaments directory")?;
    Ok(args)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let mut args = parse_args().map_err(std::io::Error::other)?;

    let mut builder = Metagame::builder().offline(args.offline);
    if let Some(dir) = &args.cache_dir {
        builder = builder.cache_dir(dir);
    }
    let meta = builder.build()?;
    if let Some(cards) = &args.cards {
        meta.use_card_file(cards)?;
    }

    let period = (args.from, args.to);
    let previous = match &args.snapshot {
        Some(path) if path.exists() => Some(Snapshot::load(path)?),
        _ => None,
    };
    let (mut registry, aggregator) = match &previous {
        Some(snap) => {
            if args.from.is_none() {
                args.from = snap.trend.dates().last().and_then(|d| d.succ_opt());
            }
            info!(archetypes = snap.archetypes.len(), "resuming from snapshot");
            (snap.registry(), snap.aggregator())
        }
        None => (ArchetypeRegistry::new(), DailyAggregator::new()),
    };

    let records = DirectorySource::new(&args.tournaments)
        .between(args.from, args.to)
        .tournaments()?;
    let report = meta.resume(&mut registry, aggregator, &records)?;

    let state = match previous {
        Some(snap) => snap.advance(&registry, &report),
        None => Snapshot::new(
            meta.rules(),
            &registry,
            &report.trend,
            Some(&report.drilldown),
            &report.matchups,
        ),
    };
    if let Some(path) = &args.snapshot {
        state.save(path)?;
    }

    let mut share = daily_share(&report.trend, &registry, &args.share);
    if let Some(n) = args.top {
        share = share.collapse_top(n);
    }
    let skipped: Vec<_> = report
        .skipped
        .iter()
        .map(|s| {
            json!({
                "tournament": s.tournament_id,
                "player": s.player_id,
                "date": s.date,
                "error": s.error.to_string(),
            })
        })
        .collect();

    let output = json!({
        "processed": report.processed,
        "archetypes": registry.len(),
        "summary": summarize(&report.trend, &registry, state.drilldown.as_ref(), period.0, period.1),
        "share": share,
        "matchups": matchup_table(&state.matchups, None, None, 1),
        "trend": report.trend,
        "skipped": skipped,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
