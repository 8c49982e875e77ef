use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use finscore_core::analysis::{analyze_company, AnalysisOptions};
use finscore_core::ledger::Sector;

use super::{fixed_cost_share, load_config, read_snapshots, SplitPolicy};

/// Arguments for the full company analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to a JSON list of one company's snapshots
    #[arg(long)]
    pub input: Option<String>,

    /// Sector code (1-6) or name, e.g. manufacturing, real_estate
    #[arg(long)]
    pub sector: Sector,

    /// Depreciation split used for the cash-flow statements
    #[arg(long, value_enum, default_value = "proportional")]
    pub split: SplitPolicy,

    /// Fraction of production cost treated as fixed for break-even
    #[arg(long)]
    pub fixed_cost_share: Option<Decimal>,
}

pub fn run_analyze(args: AnalyzeArgs, config_path: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let snapshots = read_snapshots(args.input.as_deref())?;

    let mut options = AnalysisOptions::default();
    options.cash_flow.depreciation_split = args.split.into();
    if let Some(share) = args.fixed_cost_share {
        options.ratios.fixed_cost_share = fixed_cost_share(share)?;
    }

    let output = analyze_company(&snapshots, args.sector, &config, &options)?;
    Ok(serde_json::to_value(output)?)
}
