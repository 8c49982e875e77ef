use std::time::Instant;

use clap::Args;
use serde::Deserialize;
use serde_json::{json, Value};

use finscore_core::assumptions::AssumptionSet;
use finscore_core::forecast::ForecastProjector;
use finscore_core::ledger::FinancialSnapshot;
use finscore_core::provider::DiscardSink;

use super::{envelope, SplitPolicy};
use crate::input;

/// Arguments for the multi-year forecast
#[derive(Args)]
pub struct ForecastArgs {
    /// Path to a JSON file with `base` (snapshot) and `assumptions` (list)
    #[arg(long)]
    pub input: Option<String>,

    /// Only use assumption sets of this scenario
    #[arg(long)]
    pub scenario: Option<String>,

    /// Depreciation split shared with the cash-flow statement
    #[arg(long, value_enum, default_value = "proportional")]
    pub split: SplitPolicy,
}

#[derive(Debug, Deserialize)]
struct ForecastRequest {
    base: Option<FinancialSnapshot>,
    #[serde(default)]
    assumptions: Vec<AssumptionSet>,
}

pub fn run_forecast(args: ForecastArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let request: ForecastRequest = input::read_input(args.input.as_deref())?;

    let assumptions: Vec<AssumptionSet> = match &args.scenario {
        Some(scenario) => request
            .assumptions
            .into_iter()
            .filter(|a| &a.scenario == scenario)
            .collect(),
        None => request.assumptions,
    };

    let projector = ForecastProjector::new(args.split.into());
    let chain = projector.run(request.base.as_ref(), &assumptions, &mut DiscardSink)?;

    let warnings: Vec<String> = chain
        .debt_funded_years()
        .into_iter()
        .map(|year| format!("{year}: cash shortfall funded with short-term bank debt"))
        .collect();

    envelope(
        "Year-by-year projection with cash or short-term debt balancing",
        &json!({
            "scenario": args.scenario,
            "depreciation_split": projector.depreciation_split(),
            "years": assumptions.len(),
        }),
        None,
        warnings,
        start,
        chain,
    )
}
