//! Everything the engine derives from a company's history in one call:
//! ratios and both scores per year, the Altman trend, and a cash-flow
//! statement for every consecutive pair of years.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::cash_flow::{self, CashFlowOptions, CashFlowStatement};
use crate::config::ScoringConfigProvider;
use crate::ledger::{BalanceCheck, FinancialSnapshot, Sector, DEFAULT_BALANCE_TOLERANCE};
use crate::ratios::{compute_ratios, RatioOptions, RatioReport};
use crate::scoring::altman::{AltmanScore, AltmanScorer, AltmanTrend};
use crate::scoring::fgpmi::{FgpmiScore, FgpmiScorer};
use crate::types::{with_metadata, ComputationOutput};
use crate::{FinScoreError, FinScoreResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub ratios: RatioOptions,
    pub cash_flow: CashFlowOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearAnalysis {
    pub year: i32,
    pub balance: BalanceCheck,
    pub ratios: RatioReport,
    pub altman: AltmanScore,
    pub fgpmi: FgpmiScore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyAnalysis {
    pub company_id: String,
    pub sector: Sector,
    pub years: Vec<YearAnalysis>,
    pub altman_trend: AltmanTrend,
    pub cash_flows: Vec<CashFlowStatement>,
}

pub fn analyze_company(
    snapshots: &[FinancialSnapshot],
    sector: Sector,
    config: &impl ScoringConfigProvider,
    options: &AnalysisOptions,
) -> FinScoreResult<ComputationOutput<CompanyAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut ordered: Vec<&FinancialSnapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|s| s.year);
    let first = ordered
        .first()
        .ok_or_else(|| FinScoreError::missing("unknown", "history", "no snapshots supplied"))?;
    let company_id = first.company_id.clone();

    if ordered.iter().any(|s| s.company_id != company_id) {
        warnings.push(format!(
            "Snapshots belong to more than one company; reporting as {company_id}"
        ));
    }

    let altman = AltmanScorer::new(config);
    let fgpmi = FgpmiScorer::new(config);

    let mut years = Vec::with_capacity(ordered.len());
    for snapshot in &ordered {
        let balance = snapshot.balance_check(DEFAULT_BALANCE_TOLERANCE);
        if !balance.balanced {
            tracing::warn!(
                company = %snapshot.company_id,
                year = snapshot.year,
                difference = %balance.difference,
                "snapshot does not balance"
            );
            warnings.push(format!(
                "{}: assets and liabilities differ by {}",
                snapshot.year, balance.difference
            ));
        }
        years.push(YearAnalysis {
            year: snapshot.year,
            balance,
            ratios: compute_ratios(snapshot, &options.ratios),
            altman: altman.score(snapshot, sector)?,
            fgpmi: fgpmi.score(snapshot, sector)?,
        });
    }

    let owned: Vec<FinancialSnapshot> = ordered.iter().map(|s| (*s).clone()).collect();
    let altman_trend = altman.score_trend(&owned, sector)?;

    let cash_flows: Vec<CashFlowStatement> = ordered
        .windows(2)
        .map(|pair| cash_flow::reconcile(pair[1], Some(pair[0]), &options.cash_flow))
        .collect();
    for cf in cash_flows.iter().filter(|cf| !cf.verification_ok) {
        warnings.push(format!(
            "{}: cash flow differs from the change in cash by {}",
            cf.year, cf.difference
        ));
    }

    let analysis = CompanyAnalysis {
        company_id,
        sector,
        years,
        altman_trend,
        cash_flows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Reclassified ratios, Altman Z-Score, FGPMI rating and indirect cash flow",
        options,
        config.version(),
        warnings,
        elapsed,
        analysis,
    ))
}
