use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{detailed, CashFlowOptions};
use crate::ledger::FinancialSnapshot;
use crate::types::Money;

/// The three section totals of a year's cash flow, without line detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleCashFlow {
    pub year: i32,
    pub operating: Money,
    pub investing: Money,
    pub financing: Money,
    pub net_cash_flow: Money,
    pub actual_cash_change: Money,
    pub difference: Money,
    pub verification_ok: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSummary {
    pub years: Vec<SimpleCashFlow>,
    pub cumulative_operating: Money,
    pub cumulative_investing: Money,
    pub cumulative_financing: Money,
    pub cumulative_net_cash_flow: Money,
    pub all_verified: bool,
}

pub fn reconcile(
    current: &FinancialSnapshot,
    previous: Option<&FinancialSnapshot>,
    options: &CashFlowOptions,
) -> SimpleCashFlow {
    SimpleCashFlow::from(&detailed::reconcile(current, previous, options))
}

impl From<&detailed::CashFlowStatement> for SimpleCashFlow {
    fn from(cf: &detailed::CashFlowStatement) -> Self {
        SimpleCashFlow {
            year: cf.year,
            operating: cf.operating.total,
            investing: cf.investing.total,
            financing: cf.financing.total,
            net_cash_flow: cf.total_cash_flow,
            actual_cash_change: cf.actual_cash_change,
            difference: cf.difference,
            verification_ok: cf.verification_ok,
        }
    }
}

/// One entry per consecutive pair of snapshots, ordered by year. A single
/// snapshot has no pair and yields an empty summary.
pub fn summarize(snapshots: &[FinancialSnapshot], options: &CashFlowOptions) -> CashFlowSummary {
    let mut ordered: Vec<&FinancialSnapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|s| s.year);

    let years: Vec<SimpleCashFlow> = ordered
        .windows(2)
        .map(|pair| reconcile(pair[1], Some(pair[0]), options))
        .collect();

    let sum = |f: fn(&SimpleCashFlow) -> Money| years.iter().map(f).sum::<Decimal>();
    CashFlowSummary {
        cumulative_operating: sum(|y| y.operating),
        cumulative_investing: sum(|y| y.investing),
        cumulative_financing: sum(|y| y.financing),
        cumulative_net_cash_flow: sum(|y| y.net_cash_flow),
        all_verified: years.iter().all(|y| y.verification_ok),
        years,
    }
}
