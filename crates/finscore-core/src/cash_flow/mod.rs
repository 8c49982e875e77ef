//! Indirect-method cash-flow statements derived from two consecutive
//! snapshots.

pub mod detailed;
pub mod simple;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::depreciation::DepreciationSplit;
use crate::ledger::BalanceSheet;
use crate::types::Money;

pub use detailed::{reconcile, CashFlowStatement};
pub use simple::{summarize, CashFlowSummary, SimpleCashFlow};

/// Largest |computed − actual| cash change still accepted as reconciled.
pub const RECONCILIATION_TOLERANCE: Money = dec!(1);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CashFlowOptions {
    pub depreciation_split: DepreciationSplit,
    pub tolerance: Money,
}

impl Default for CashFlowOptions {
    fn default() -> Self {
        CashFlowOptions {
            depreciation_split: DepreciationSplit::default(),
            tolerance: RECONCILIATION_TOLERANCE,
        }
    }
}

/// Year-on-year change of one balance-sheet item; zero without history.
pub(crate) fn change(
    current: &BalanceSheet,
    previous: Option<&BalanceSheet>,
    item: impl Fn(&BalanceSheet) -> Money,
) -> Money {
    previous
        .map(|prev| item(current) - item(prev))
        .unwrap_or(Decimal::ZERO)
}
