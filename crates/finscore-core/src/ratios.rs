use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::ledger::FinancialSnapshot;
use crate::math::{div0, round_days, round_money, round_ratio, COMMERCIAL_YEAR_DAYS};
use crate::types::*;

/// Share of production cost treated as fixed when no split is supplied.
pub const DEFAULT_FIXED_COST_SHARE: Rate = dec!(0.40);

// ---------------------------------------------------------------------------
// Options / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatioOptions {
    /// Fraction of production cost classified as fixed for break-even.
    pub fixed_cost_share: Rate,
}

impl Default for RatioOptions {
    fn default() -> Self {
        RatioOptions {
            fixed_cost_share: DEFAULT_FIXED_COST_SHARE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityRatios {
    pub current_ratio: Multiple,
    pub quick_ratio: Multiple,
    pub cash_ratio: Multiple,
}

/// CCN, MS and MT, in currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralMargins {
    pub net_working_capital: Money,
    pub structural_margin: Money,
    pub treasury_margin: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolvencyRatios {
    pub autonomy: Rate,
    pub leverage: Multiple,
    pub debt_to_equity: Multiple,
    pub fixed_asset_coverage: Multiple,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityRatios {
    pub roe: Rate,
    pub roi: Rate,
    pub ros: Rate,
    pub roa: Rate,
    pub ebitda_margin: Rate,
    pub net_margin: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRatios {
    pub asset_turnover: Multiple,
    pub inventory_turnover: Multiple,
    pub receivables_turnover: Multiple,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRatios {
    pub inventory_days: Days,
    pub receivable_days: Days,
    pub payable_days: Days,
    pub cash_conversion_cycle: Days,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageRatios {
    pub interest_coverage: Multiple,
    pub ebitda_interest_coverage: Multiple,
    pub financial_debt_to_ebitda: Multiple,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyRatios {
    pub value_added: Money,
    pub value_added_ratio: Rate,
    pub personnel_cost_ratio: Rate,
    pub production_cost_ratio: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakEvenAnalysis {
    pub fixed_costs: Money,
    pub variable_costs: Money,
    pub contribution_margin_pct: Rate,
    pub break_even_revenue: Money,
    pub safety_margin: Rate,
}

/// Every ratio group for one fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioReport {
    pub company_id: String,
    pub year: i32,
    pub liquidity: LiquidityRatios,
    pub margins: StructuralMargins,
    pub solvency: SolvencyRatios,
    pub profitability: ProfitabilityRatios,
    pub activity: ActivityRatios,
    pub cycle: CycleRatios,
    pub coverage: CoverageRatios,
    pub efficiency: EfficiencyRatios,
    pub break_even: BreakEvenAnalysis,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the full ratio suite from one snapshot.
///
/// Zero denominators yield zero rather than an error, so every field is
/// always populated. Fractional ratios are rounded to 4 places, day counts to
/// whole days and currency amounts to cents.
pub fn compute_ratios(snapshot: &FinancialSnapshot, options: &RatioOptions) -> RatioReport {
    RatioReport {
        company_id: snapshot.company_id.clone(),
        year: snapshot.year,
        liquidity: liquidity(snapshot),
        margins: margins(snapshot),
        solvency: solvency(snapshot),
        profitability: profitability(snapshot),
        activity: activity(snapshot),
        cycle: cycle(snapshot),
        coverage: coverage(snapshot),
        efficiency: efficiency(snapshot),
        break_even: break_even(snapshot, options.fixed_cost_share),
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

fn liquidity(s: &FinancialSnapshot) -> LiquidityRatios {
    let bs = &s.balance_sheet;
    let cl = s.current_liabilities();
    LiquidityRatios {
        current_ratio: round_ratio(div0(s.current_assets(), cl)),
        quick_ratio: round_ratio(div0(s.current_assets() - bs.inventory, cl)),
        cash_ratio: round_ratio(div0(bs.cash + bs.current_financial_assets, cl)),
    }
}

fn margins(s: &FinancialSnapshot) -> StructuralMargins {
    let bs = &s.balance_sheet;
    StructuralMargins {
        net_working_capital: round_money(s.current_assets() - s.current_liabilities()),
        structural_margin: round_money(s.total_equity() - s.fixed_assets()),
        treasury_margin: round_money(
            bs.receivables.total() + bs.cash - s.current_liabilities(),
        ),
    }
}

fn solvency(s: &FinancialSnapshot) -> SolvencyRatios {
    let equity = s.total_equity();
    SolvencyRatios {
        autonomy: round_ratio(div0(equity, s.total_assets())),
        leverage: round_ratio(div0(s.total_assets(), equity)),
        debt_to_equity: round_ratio(div0(s.total_debt(), equity)),
        fixed_asset_coverage: round_ratio(div0(equity, s.fixed_assets())),
    }
}

fn profitability(s: &FinancialSnapshot) -> ProfitabilityRatios {
    let revenue = s.revenue();
    ProfitabilityRatios {
        roe: round_ratio(div0(s.net_profit(), s.total_equity())),
        roi: round_ratio(div0(s.ebit(), s.total_assets())),
        ros: round_ratio(div0(s.ebit(), revenue)),
        roa: round_ratio(div0(s.net_profit(), s.total_assets())),
        ebitda_margin: round_ratio(div0(s.ebitda(), revenue)),
        net_margin: round_ratio(div0(s.net_profit(), revenue)),
    }
}

fn activity(s: &FinancialSnapshot) -> ActivityRatios {
    let bs = &s.balance_sheet;
    let revenue = s.revenue();
    ActivityRatios {
        asset_turnover: round_ratio(div0(revenue, s.total_assets())),
        inventory_turnover: round_ratio(div0(revenue, bs.inventory)),
        receivables_turnover: round_ratio(div0(revenue, bs.receivables.total())),
    }
}

fn cycle(s: &FinancialSnapshot) -> CycleRatios {
    let bs = &s.balance_sheet;
    let revenue = s.revenue();
    let inventory_days = round_days(div0(COMMERCIAL_YEAR_DAYS * bs.inventory, revenue));
    let receivable_days = round_days(div0(COMMERCIAL_YEAR_DAYS * bs.receivables.total(), revenue));
    let payable_days = round_days(div0(COMMERCIAL_YEAR_DAYS * s.total_debt(), revenue));
    CycleRatios {
        inventory_days,
        receivable_days,
        payable_days,
        cash_conversion_cycle: inventory_days + receivable_days - payable_days,
    }
}

fn coverage(s: &FinancialSnapshot) -> CoverageRatios {
    let interest = s.income_statement.interest_expense;
    CoverageRatios {
        interest_coverage: round_ratio(div0(s.ebit(), interest)),
        ebitda_interest_coverage: round_ratio(div0(s.ebitda(), interest)),
        financial_debt_to_ebitda: round_ratio(div0(s.financial_debt(), s.ebitda())),
    }
}

fn efficiency(s: &FinancialSnapshot) -> EfficiencyRatios {
    let is = &s.income_statement;
    let production_value = s.production_value();
    let value_added = production_value - is.external_costs();
    EfficiencyRatios {
        value_added: round_money(value_added),
        value_added_ratio: round_ratio(div0(value_added, production_value)),
        personnel_cost_ratio: round_ratio(div0(is.personnel_costs, production_value)),
        production_cost_ratio: round_ratio(div0(s.production_cost(), production_value)),
    }
}

fn break_even(s: &FinancialSnapshot, fixed_share: Rate) -> BreakEvenAnalysis {
    let revenue = s.revenue();
    let total_costs = s.production_cost();
    let fixed_costs = total_costs * fixed_share;
    let variable_costs = total_costs - fixed_costs;

    let contribution_margin_pct = div0(revenue - variable_costs, revenue);
    let break_even_revenue = div0(fixed_costs, contribution_margin_pct);
    let safety_margin = if revenue.is_zero() {
        Decimal::ZERO
    } else {
        Decimal::ONE - div0(break_even_revenue, revenue)
    };

    BreakEvenAnalysis {
        fixed_costs: round_money(fixed_costs),
        variable_costs: round_money(variable_costs),
        contribution_margin_pct: round_ratio(contribution_margin_pct),
        break_even_revenue: round_money(break_even_revenue),
        safety_margin: round_ratio(safety_margin),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
