use serde::{Deserialize, Serialize};

use super::{ForecastState, Plug};
use crate::assumptions::AssumptionSet;
use crate::ledger::FinancialSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastYear {
    pub year: i32,
    pub assumptions: AssumptionSet,
    pub snapshot: FinancialSnapshot,
    pub plug: Plug,
}

/// Projected years in order; each one was computed from the year before it,
/// the first from the base year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastChain {
    pub company_id: String,
    pub scenario: String,
    pub base_year: i32,
    pub state: ForecastState,
    pub years: Vec<ForecastYear>,
}

impl ForecastChain {
    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn snapshots(&self) -> impl Iterator<Item = &FinancialSnapshot> {
        self.years.iter().map(|y| &y.snapshot)
    }

    pub fn year(&self, year: i32) -> Option<&ForecastYear> {
        self.years.iter().find(|y| y.year == year)
    }

    pub fn last(&self) -> Option<&FinancialSnapshot> {
        self.years.last().map(|y| &y.snapshot)
    }

    /// Years whose cash shortfall was covered with short-term bank debt.
    pub fn debt_funded_years(&self) -> Vec<i32> {
        self.years
            .iter()
            .filter(|y| matches!(y.plug, Plug::ShortTermDebt(_)))
            .map(|y| y.year)
            .collect()
    }
}
