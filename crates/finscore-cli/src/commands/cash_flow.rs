use std::time::Instant;

use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use finscore_core::cash_flow::{self, CashFlowOptions, CashFlowStatement};
use finscore_core::ledger::FinancialSnapshot;

use super::{envelope, read_snapshots, SplitPolicy};

/// Arguments for the cash-flow statement
#[derive(Args)]
pub struct CashFlowArgs {
    /// Path to a JSON list of snapshots (consecutive years)
    #[arg(long)]
    pub input: Option<String>,

    /// Depreciation split shared with the forecast
    #[arg(long, value_enum, default_value = "proportional")]
    pub split: SplitPolicy,

    /// Largest accepted difference against the change in cash
    #[arg(long)]
    pub tolerance: Option<Decimal>,

    /// Section totals per year plus cumulative totals instead of line detail
    #[arg(long)]
    pub summary: bool,
}

pub fn run_cash_flow(args: CashFlowArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut snapshots = read_snapshots(args.input.as_deref())?;
    snapshots.sort_by_key(|s| s.year);

    let mut options = CashFlowOptions {
        depreciation_split: args.split.into(),
        ..Default::default()
    };
    if let Some(tolerance) = args.tolerance {
        options.tolerance = tolerance.abs();
    }

    if args.summary {
        let summary = cash_flow::summarize(&snapshots, &options);
        let warnings = mismatch_warnings(
            summary
                .years
                .iter()
                .filter(|y| !y.verification_ok)
                .map(|y| (y.year, y.difference)),
        );
        return envelope(
            "Indirect cash flow, section totals",
            &options,
            None,
            warnings,
            start,
            summary,
        );
    }

    let mut warnings = Vec::new();
    let mut statements: Vec<CashFlowStatement> = if let [only] = snapshots.as_slice() {
        warnings.push(format!(
            "{}: no previous year supplied; changes taken as zero",
            only.year
        ));
        vec![cash_flow::reconcile(only, None, &options)]
    } else {
        pairs(&snapshots)
            .map(|(prev, cur)| cash_flow::reconcile(cur, Some(prev), &options))
            .collect()
    };
    warnings.extend(mismatch_warnings(
        statements
            .iter()
            .filter(|cf| cf.previous_year.is_some() && !cf.verification_ok)
            .map(|cf| (cf.year, cf.difference)),
    ));

    let methodology = "Indirect cash flow with line-item reconciliation";
    if statements.len() == 1 {
        envelope(methodology, &options, None, warnings, start, statements.remove(0))
    } else {
        envelope(methodology, &options, None, warnings, start, statements)
    }
}

fn pairs(
    snapshots: &[FinancialSnapshot],
) -> impl Iterator<Item = (&FinancialSnapshot, &FinancialSnapshot)> {
    snapshots.windows(2).map(|w| (&w[0], &w[1]))
}

fn mismatch_warnings(mismatches: impl Iterator<Item = (i32, Decimal)>) -> Vec<String> {
    mismatches
        .map(|(year, difference)| {
            format!("{year}: cash flow differs from the change in cash by {difference}")
        })
        .collect()
}
