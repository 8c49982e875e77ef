//! How a year's depreciation charge is attributed to fixed-asset categories.
//!
//! The forecast projector (which subtracts depreciation from projected
//! balances) and the cash-flow reconciler (which adds it back to derive
//! capital expenditure) share this one policy so that a projected year
//! reconciles line by line.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::ledger::BalanceSheet;
use crate::types::{Money, Rate};

/// Intangible share used when no prior balances are available.
pub const DEFAULT_INTANGIBLE_SHARE: Rate = dec!(0.20);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum DepreciationSplit {
    /// Pro rata to the prior year's intangible and tangible balances; 20/80
    /// intangible/tangible when there are none.
    #[default]
    Proportional,
    /// Fixed shares of the charge; the financial share is the remainder.
    Fixed { intangible: Rate, tangible: Rate },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepreciationAllocation {
    pub intangible: Money,
    pub tangible: Money,
    pub financial: Money,
}

impl DepreciationAllocation {
    pub fn total(&self) -> Money {
        self.intangible + self.tangible + self.financial
    }
}

impl DepreciationSplit {
    /// 30% intangible, 60% tangible, 10% financial.
    pub fn legacy_fixed() -> Self {
        DepreciationSplit::Fixed {
            intangible: dec!(0.30),
            tangible: dec!(0.60),
        }
    }

    /// Split `amount` across categories. The parts always sum to `amount`.
    pub fn allocate(&self, amount: Money, prior: Option<&BalanceSheet>) -> DepreciationAllocation {
        match self {
            DepreciationSplit::Proportional => {
                let (intangible_base, tangible_base) = prior
                    .map(|bs| {
                        (
                            bs.intangible_assets.max(Decimal::ZERO),
                            bs.tangible_assets.max(Decimal::ZERO),
                        )
                    })
                    .unwrap_or_default();
                let base = intangible_base + tangible_base;
                let intangible_share = if base.is_zero() {
                    DEFAULT_INTANGIBLE_SHARE
                } else {
                    intangible_base / base
                };
                let intangible = amount * intangible_share;
                DepreciationAllocation {
                    intangible,
                    tangible: amount - intangible,
                    financial: Decimal::ZERO,
                }
            }
            DepreciationSplit::Fixed {
                intangible,
                tangible,
            } => {
                let intangible = amount * *intangible;
                let tangible = amount * *tangible;
                DepreciationAllocation {
                    intangible,
                    tangible,
                    financial: amount - intangible - tangible,
                }
            }
        }
    }
}
