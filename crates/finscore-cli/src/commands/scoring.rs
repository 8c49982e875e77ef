use std::time::Instant;

use clap::Args;
use serde_json::{json, Value};

use finscore_core::config::ScoringConfigProvider;
use finscore_core::ledger::Sector;
use finscore_core::scoring::altman::AltmanScorer;
use finscore_core::scoring::fgpmi::FgpmiScorer;

use super::{envelope, load_config, read_snapshots};

/// Arguments for the Altman Z-Score
#[derive(Args)]
pub struct AltmanArgs {
    /// Path to a JSON snapshot, or a list of snapshots for a trend
    #[arg(long)]
    pub input: Option<String>,

    /// Sector code (1-6) or name, e.g. manufacturing, real_estate
    #[arg(long)]
    pub sector: Sector,
}

/// Arguments for the FGPMI rating
#[derive(Args)]
pub struct FgpmiArgs {
    /// Path to a JSON snapshot, or a list of snapshots
    #[arg(long)]
    pub input: Option<String>,

    /// Sector code (1-6) or name, e.g. manufacturing, real_estate
    #[arg(long)]
    pub sector: Sector,
}

pub fn run_altman(args: AltmanArgs, config_path: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let snapshots = read_snapshots(args.input.as_deref())?;
    let scorer = AltmanScorer::new(&config);
    let assumptions = json!({ "sector": args.sector, "sector_code": args.sector.code() });

    if let [snapshot] = snapshots.as_slice() {
        let score = scorer.score(snapshot, args.sector)?;
        let methodology = format!("Altman {}", score.model);
        envelope(&methodology, &assumptions, Some(config.version()), Vec::new(), start, score)
    } else {
        let trend = scorer.score_trend(&snapshots, args.sector)?;
        envelope(
            "Altman Z-Score trend",
            &assumptions,
            Some(config.version()),
            Vec::new(),
            start,
            trend,
        )
    }
}

pub fn run_fgpmi(args: FgpmiArgs, config_path: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let snapshots = read_snapshots(args.input.as_deref())?;
    let scorer = FgpmiScorer::new(&config);
    let assumptions = json!({
        "sector": args.sector,
        "family": config.fgpmi().family_for(args.sector)?,
    });
    let methodology = "FGPMI seven-indicator rating with revenue bonus";

    let mut scores = snapshots
        .iter()
        .map(|s| scorer.score(s, args.sector))
        .collect::<Result<Vec<_>, _>>()?;

    if scores.len() == 1 {
        envelope(methodology, &assumptions, Some(config.version()), Vec::new(), start, scores.remove(0))
    } else {
        scores.sort_by_key(|s| s.year);
        envelope(methodology, &assumptions, Some(config.version()), Vec::new(), start, scores)
    }
}
