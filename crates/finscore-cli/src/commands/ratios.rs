use std::time::Instant;

use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use finscore_core::ratios::{compute_ratios, RatioOptions, RatioReport};

use super::{envelope, fixed_cost_share, read_snapshots};

/// Arguments for the ratio report
#[derive(Args)]
pub struct RatiosArgs {
    /// Path to a JSON snapshot, or a list of snapshots
    #[arg(long)]
    pub input: Option<String>,

    /// Fraction of production cost treated as fixed for break-even
    #[arg(long)]
    pub fixed_cost_share: Option<Decimal>,
}

pub fn run_ratios(args: RatiosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let snapshots = read_snapshots(args.input.as_deref())?;

    let mut options = RatioOptions::default();
    if let Some(share) = args.fixed_cost_share {
        options.fixed_cost_share = fixed_cost_share(share)?;
    }

    let mut warnings = Vec::new();
    for s in snapshots.iter().filter(|s| !s.is_balanced()) {
        warnings.push(format!(
            "{} {}: assets and liabilities do not balance",
            s.company_id, s.year
        ));
    }

    let mut reports: Vec<RatioReport> = snapshots
        .iter()
        .map(|s| compute_ratios(s, &options))
        .collect();
    let methodology = "Reclassified liquidity, solvency, profitability, activity, cycle, coverage, efficiency and break-even ratios";

    if reports.len() == 1 {
        envelope(methodology, &options, None, warnings, start, reports.remove(0))
    } else {
        reports.sort_by_key(|r| r.year);
        envelope(methodology, &options, None, warnings, start, reports)
    }
}
