use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::BalanceSheet;
use crate::types::Money;

/// The item that closed the gap between the two sides of a projected
/// balance sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum Plug {
    /// Liabilities and equity exceed the other assets: the surplus is cash.
    Cash(Money),
    /// The other assets exceed liabilities and equity: the deficit is
    /// financed with short-term bank debt and cash is zero.
    ShortTermDebt(Money),
}

impl Plug {
    pub fn amount(&self) -> Money {
        match self {
            Plug::Cash(x) | Plug::ShortTermDebt(x) => *x,
        }
    }
}

pub fn balance(assets_excluding_cash: Money, liabilities_and_equity: Money) -> Plug {
    let gap = liabilities_and_equity - assets_excluding_cash;
    if gap >= Decimal::ZERO {
        Plug::Cash(gap)
    } else {
        Plug::ShortTermDebt(-gap)
    }
}

/// Set cash (or short-term bank debt) so that the sheet balances exactly.
pub fn apply_plug(bs: &mut BalanceSheet) -> Plug {
    let plug = balance(bs.assets_excluding_cash(), bs.total_liabilities());
    match plug {
        Plug::Cash(cash) => bs.cash = cash,
        Plug::ShortTermDebt(deficit) => {
            bs.cash = Decimal::ZERO;
            bs.debts.bank.short_term += deficit;
        }
    }
    plug
}
