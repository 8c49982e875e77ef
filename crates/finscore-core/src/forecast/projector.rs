use rust_decimal::Decimal;

use super::balance::{apply_plug, Plug};
use super::chain::{ForecastChain, ForecastYear};
use super::ForecastState;
use crate::assumptions::AssumptionSet;
use crate::depreciation::DepreciationSplit;
use crate::ledger::{
    BalanceSheet, DebtBucket, FinancialSnapshot, IncomeStatement, Receivables,
    DEFAULT_BALANCE_TOLERANCE,
};
use crate::math::{grow, pct, round_money, safe_div};
use crate::provider::{load_snapshot, ProjectionSink, SnapshotProvider};
use crate::types::{Money, Percent};
use crate::{FinScoreError, FinScoreResult};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project the year after `prev` under `assumptions`. The result balances
/// exactly: cash absorbs any surplus and short-term bank debt any deficit.
pub fn project_year(
    prev: &FinancialSnapshot,
    assumptions: &AssumptionSet,
    split: &DepreciationSplit,
) -> FinancialSnapshot {
    project(prev, assumptions, split).0
}

#[derive(Debug, Clone, Default)]
pub struct ForecastProjector {
    split: DepreciationSplit,
}

impl ForecastProjector {
    pub fn new(split: DepreciationSplit) -> Self {
        Self { split }
    }

    pub fn depreciation_split(&self) -> &DepreciationSplit {
        &self.split
    }

    /// Roll `base` forward one year per assumption set, in year order,
    /// handing each projected year to `sink` before computing the next.
    pub fn run(
        &self,
        base: Option<&FinancialSnapshot>,
        assumptions: &[AssumptionSet],
        sink: &mut impl ProjectionSink,
    ) -> FinScoreResult<ForecastChain> {
        let mut state = ForecastState::AwaitingBaseYearValidation;

        let base = base.ok_or_else(|| missing_base(assumptions))?;
        let company = base.company_id.as_str();
        let check = base.balance_check(DEFAULT_BALANCE_TOLERANCE);
        if !check.balanced {
            tracing::warn!(
                company,
                year = base.year,
                difference = %check.difference,
                "base year does not balance; projecting anyway"
            );
        }
        transition(&mut state, ForecastState::AwaitingAssumptions, company);

        if assumptions.is_empty() {
            return Err(FinScoreError::missing(
                company,
                base.year + 1,
                "no forecast assumptions",
            ));
        }
        let ordered = single_scenario_in_year_order(assumptions)?;

        let mut years: Vec<ForecastYear> = Vec::with_capacity(ordered.len());
        for set in ordered {
            transition(&mut state, ForecastState::Projecting(set.year), company);
            let prev = years.last().map(|y| &y.snapshot).unwrap_or(base);
            let (snapshot, plug) = project(prev, set, &self.split);
            if let Plug::ShortTermDebt(deficit) = plug {
                tracing::debug!(company, year = set.year, %deficit, "cash deficit funded with short-term debt");
            }

            sink.accept(&snapshot)?;
            transition(&mut state, ForecastState::Persisted(set.year), company);

            years.push(ForecastYear {
                year: set.year,
                assumptions: set.clone(),
                snapshot,
                plug,
            });
        }
        transition(&mut state, ForecastState::Completed, company);

        Ok(ForecastChain {
            company_id: base.company_id.clone(),
            scenario: years
                .first()
                .map(|y| y.assumptions.scenario.clone())
                .unwrap_or_default(),
            base_year: base.year,
            state,
            years,
        })
    }

    /// Load the base year and a scenario's assumptions from `provider`, then
    /// run.
    pub fn run_scenario(
        &self,
        provider: &impl SnapshotProvider,
        company_id: &str,
        base_year: i32,
        scenario: &str,
        sink: &mut impl ProjectionSink,
    ) -> FinScoreResult<ForecastChain> {
        let base = load_snapshot(provider, company_id, base_year)?;
        let assumptions = provider.assumptions(scenario);
        self.run(Some(&base), &assumptions, sink)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn missing_base(assumptions: &[AssumptionSet]) -> FinScoreError {
    match assumptions.iter().min_by_key(|a| a.year) {
        Some(first) => FinScoreError::missing(
            "unknown",
            first.year - 1,
            &format!(
                "base-year snapshot not found for scenario '{}'",
                first.scenario
            ),
        ),
        None => FinScoreError::missing("unknown", "base year", "base-year snapshot not found"),
    }
}

/// One scenario, one set per year, sorted by year.
fn single_scenario_in_year_order(
    assumptions: &[AssumptionSet],
) -> FinScoreResult<Vec<&AssumptionSet>> {
    let mut ordered: Vec<&AssumptionSet> = assumptions.iter().collect();
    ordered.sort_by_key(|a| a.year);

    if let Some(first) = ordered.first() {
        if let Some(other) = ordered.iter().find(|a| a.scenario != first.scenario) {
            return Err(FinScoreError::InvalidInput {
                field: "assumptions.scenario".into(),
                reason: format!(
                    "scenarios '{}' and '{}' mixed in one run (year {})",
                    first.scenario, other.scenario, other.year
                ),
            });
        }
    }
    if let Some(pair) = ordered.windows(2).find(|w| w[0].year == w[1].year) {
        return Err(FinScoreError::InvalidInput {
            field: "assumptions.year".into(),
            reason: format!(
                "scenario '{}' has more than one set for {}",
                pair[1].scenario, pair[1].year
            ),
        });
    }
    Ok(ordered)
}

fn transition(state: &mut ForecastState, next: ForecastState, company: &str) {
    tracing::debug!(company, from = %state, to = %next, "forecast state");
    *state = next;
}

pub(crate) fn project(
    prev: &FinancialSnapshot,
    assumptions: &AssumptionSet,
    split: &DepreciationSplit,
) -> (FinancialSnapshot, Plug) {
    let income_statement = project_income(prev, assumptions);
    let mut balance_sheet = project_balance_sheet(prev, assumptions, &income_statement, split);
    let plug = apply_plug(&mut balance_sheet);
    let snapshot = FinancialSnapshot::new(
        prev.company_id.clone(),
        assumptions.year,
        balance_sheet,
        income_statement,
    );
    (snapshot, plug)
}

fn project_income(prev: &FinancialSnapshot, a: &AssumptionSet) -> IncomeStatement {
    let p = &prev.income_statement;
    let grown = |value: Money, growth: Percent| round_money(grow(value, growth));

    let revenue = round_money(
        a.revenue_override
            .unwrap_or_else(|| grow(p.revenue, a.revenue_growth_pct)),
    );
    // Variable costs follow revenue, the fixed remainder follows inflation.
    let revenue_factor = safe_div(
        revenue,
        p.revenue,
        Decimal::ONE + pct(a.revenue_growth_pct),
    );
    let inflation_factor = Decimal::ONE + pct(a.cost_inflation_pct);
    let semi_variable = |base: Money, variable_pct: Percent| {
        let variable = pct(variable_pct);
        round_money(
            base * (variable * revenue_factor + (Decimal::ONE - variable) * inflation_factor),
        )
    };

    let mut is = IncomeStatement {
        revenue,
        other_revenue: grown(p.other_revenue, a.other_revenue_growth_pct),
        raw_materials: semi_variable(p.raw_materials, a.materials_variable_pct),
        services: semi_variable(p.services, a.services_variable_pct),
        lease_costs: grown(p.lease_costs, a.lease_costs_growth_pct),
        personnel_costs: grown(p.personnel_costs, a.personnel_growth_pct),
        depreciation: round_money(p.depreciation + a.new_investment * pct(a.depreciation_rate_pct)),
        provisions: grown(p.provisions, a.provisions_growth_pct),
        other_operating_costs: grown(p.other_operating_costs, a.other_costs_growth_pct),
        equity_investment_income: grown(p.equity_investment_income, a.financial_income_growth_pct),
        other_financial_income: grown(p.other_financial_income, a.financial_income_growth_pct),
        interest_expense: round_money(prev.financial_debt() * pct(a.interest_rate_pct)),
        ..Default::default()
    };
    is.income_taxes =
        round_money((is.profit_before_tax() * pct(a.tax_rate_pct)).max(Decimal::ZERO));
    is
}

fn project_balance_sheet(
    prev: &FinancialSnapshot,
    a: &AssumptionSet,
    is: &IncomeStatement,
    split: &DepreciationSplit,
) -> BalanceSheet {
    let p = &prev.balance_sheet;
    let grown = |value: Money, growth: Percent| round_money(grow(value, growth));

    let (intangible_capex, tangible_capex, financial_capex) =
        apportion_investment(round_money(a.new_investment), p);
    let charge = split.allocate(is.depreciation, Some(p));
    let intangible_charge = round_money(charge.intangible);
    let tangible_charge = round_money(charge.tangible);
    let financial_charge = is.depreciation - intangible_charge - tangible_charge;

    let prior_profit = p.profit_for_year;
    let dividends = if prior_profit > Decimal::ZERO {
        round_money(prior_profit * pct(a.dividend_payout_pct))
    } else {
        Decimal::ZERO
    };

    let mut debts = p.debts.clone();
    debts.bank.long_term = (p.debts.bank.long_term + round_money(a.new_long_term_debt)
        - round_money(a.debt_repayment))
    .max(Decimal::ZERO);
    debts.suppliers = DebtBucket {
        short_term: grown(p.debts.suppliers.short_term, a.payables_growth_pct),
        long_term: grown(p.debts.suppliers.long_term, a.payables_growth_pct),
    };

    BalanceSheet {
        receivables_from_shareholders: p.receivables_from_shareholders,
        intangible_assets: (p.intangible_assets + intangible_capex - intangible_charge)
            .max(Decimal::ZERO),
        tangible_assets: (p.tangible_assets + tangible_capex - tangible_charge).max(Decimal::ZERO),
        financial_assets: (p.financial_assets + financial_capex - financial_charge)
            .max(Decimal::ZERO),
        inventory: grown(p.inventory, a.inventory_growth_pct),
        receivables: Receivables {
            short_term: grown(p.receivables.short_term, a.receivables_growth_pct),
            long_term: grown(p.receivables.long_term, a.receivables_growth_pct),
        },
        current_financial_assets: p.current_financial_assets,
        // Set by the plug.
        cash: Decimal::ZERO,
        accrued_income: p.accrued_income,
        share_capital: p.share_capital + round_money(a.capital_increase),
        reserves: p.reserves,
        retained_earnings: p.retained_earnings + prior_profit - dividends,
        profit_for_year: is.net_profit(),
        provisions_for_risks: p.provisions_for_risks + is.provisions,
        severance_indemnity: grown(p.severance_indemnity, a.severance_growth_pct),
        debts,
        accrued_expenses: p.accrued_expenses,
    }
}

/// New investment pro rata to the prior fixed-asset balances, returned as
/// (intangible, tangible, financial). All tangible when there are none.
fn apportion_investment(amount: Money, prior: &BalanceSheet) -> (Money, Money, Money) {
    let intangible = prior.intangible_assets.max(Decimal::ZERO);
    let tangible = prior.tangible_assets.max(Decimal::ZERO);
    let financial = prior.financial_assets.max(Decimal::ZERO);
    let base = intangible + tangible + financial;
    if base.is_zero() {
        return (Decimal::ZERO, amount, Decimal::ZERO);
    }
    let intangible_part = round_money(amount * intangible / base);
    let financial_part = round_money(amount * financial / base);
    (
        intangible_part,
        amount - intangible_part - financial_part,
        financial_part,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Debts;
    use crate::provider::DiscardSink;
    use rust_decimal_macros::dec;

    fn base() -> FinancialSnapshot {
        let bs = BalanceSheet {
            intangible_assets: dec!(50_000),
            tangible_assets: dec!(450_000),
            inventory: dec!(150_000),
            receivables: Receivables {
                short_term: dec!(300_000),
                long_term: Decimal::ZERO,
            },
            cash: dec!(50_000),
            share_capital: dec!(300_000),
            reserves: dec!(100_000),
            retained_earnings: dec!(50_000),
            profit_for_year: dec!(50_000),
            severance_indemnity: dec!(50_000),
            debts: Debts {
                bank: DebtBucket {
                    short_term: dec!(100_000),
                    long_term: dec!(150_000),
                },
                suppliers: DebtBucket {
                    short_term: dec!(200_000),
                    long_term: Decimal::ZERO,
                },
                ..Default::default()
            },
            ..Default::default()
        };
        let is = IncomeStatement {
            revenue: dec!(1_500_000),
            raw_materials: dec!(600_000),
            services: dec!(300_000),
            personnel_costs: dec!(400_000),
            depreciation: dec!(90_000),
            interest_expense: dec!(12_000),
            income_taxes: dec!(24_000),
            ..Default::default()
        };
        FinancialSnapshot::new("ACME", 2023, bs, is)
    }

    fn growth(year: i32, revenue_growth_pct: Decimal) -> AssumptionSet {
        AssumptionSet {
            revenue_growth_pct,
            materials_variable_pct: dec!(100),
            services_variable_pct: dec!(50),
            cost_inflation_pct: dec!(2),
            personnel_growth_pct: dec!(3),
            receivables_growth_pct: revenue_growth_pct,
            inventory_growth_pct: revenue_growth_pct,
            payables_growth_pct: revenue_growth_pct,
            interest_rate_pct: dec!(4),
            tax_rate_pct: dec!(24),
            dividend_payout_pct: dec!(40),
            ..AssumptionSet::new("base", year)
        }
    }

    fn three_years() -> Vec<AssumptionSet> {
        vec![
            growth(2024, dec!(10)),
            growth(2025, dec!(5)),
            growth(2026, dec!(-3)),
        ]
    }

    #[test]
    fn test_base_fixture_balances() {
        assert!(base().is_balanced());
    }

    #[test]
    fn test_revenue_growth() {
        let next = project_year(&base(), &growth(2024, dec!(10)), &DepreciationSplit::default());
        assert_eq!(next.year, 2024);
        assert_eq!(next.revenue(), dec!(1_650_000));
    }

    #[test]
    fn test_revenue_override_wins() {
        let mut a = growth(2024, dec!(10));
        a.revenue_override = Some(dec!(1_800_000));
        let next = project_year(&base(), &a, &DepreciationSplit::default());
        assert_eq!(next.revenue(), dec!(1_800_000));
        // Fully variable materials follow the realized growth of 20%.
        assert_eq!(next.income_statement.raw_materials, dec!(720_000));
    }

    #[test]
    fn test_depreciation_without_investment_is_unchanged() {
        let next = project_year(&base(), &growth(2024, dec!(10)), &DepreciationSplit::default());
        assert_eq!(next.income_statement.depreciation, dec!(90_000));
    }

    #[test]
    fn test_semi_variable_costs() {
        let next = project_year(&base(), &growth(2024, dec!(10)), &DepreciationSplit::default());
        // Half of 300,000 at +10%, half at +2%.
        assert_eq!(next.income_statement.services, dec!(318_000));
        assert_eq!(next.income_statement.raw_materials, dec!(660_000));
    }

    #[test]
    fn test_interest_on_prior_financial_debt() {
        let next = project_year(&base(), &growth(2024, dec!(10)), &DepreciationSplit::default());
        assert_eq!(next.income_statement.interest_expense, dec!(10_000));
    }

    #[test]
    fn test_no_tax_on_a_loss() {
        let mut prev = base();
        prev.income_statement = IncomeStatement {
            revenue: dec!(100_000),
            personnel_costs: dec!(150_000),
            ..Default::default()
        };
        prev.balance_sheet.debts.bank = DebtBucket::default();
        let a = AssumptionSet {
            tax_rate_pct: dec!(24),
            ..AssumptionSet::new("base", 2024)
        };
        let next = project_year(&prev, &a, &DepreciationSplit::default());
        assert_eq!(next.profit_before_tax(), dec!(-50_000));
        assert_eq!(next.income_statement.income_taxes, Decimal::ZERO);
    }

    #[test]
    fn test_investment_and_depreciation_split_pro_rata() {
        let a = AssumptionSet {
            new_investment: dec!(100_000),
            depreciation_rate_pct: dec!(10),
            ..AssumptionSet::new("base", 2024)
        };
        let next = project_year(&base(), &a, &DepreciationSplit::default());
        assert_eq!(next.income_statement.depreciation, dec!(100_000));
        // 10% of both the investment and the charge land on intangibles.
        assert_eq!(next.balance_sheet.intangible_assets, dec!(50_000));
        assert_eq!(next.balance_sheet.tangible_assets, dec!(450_000));
    }

    #[test]
    fn test_fixed_assets_floored_at_zero() {
        let mut prev = base();
        prev.income_statement.depreciation = dec!(900_000);
        let next = project_year(&prev, &AssumptionSet::new("base", 2024), &DepreciationSplit::default());
        assert_eq!(next.balance_sheet.intangible_assets, Decimal::ZERO);
        assert_eq!(next.balance_sheet.tangible_assets, Decimal::ZERO);
        assert!(next.is_balanced());
    }

    #[test]
    fn test_profit_allocation() {
        let next = project_year(&base(), &growth(2024, dec!(10)), &DepreciationSplit::default());
        // 40% of last year's 50,000 paid out, the rest retained.
        assert_eq!(next.balance_sheet.retained_earnings, dec!(80_000));
        assert_eq!(next.balance_sheet.profit_for_year, next.net_profit());
    }

    #[test]
    fn test_long_term_debt_floored_at_zero() {
        let a = AssumptionSet {
            new_long_term_debt: dec!(20_000),
            debt_repayment: dec!(500_000),
            ..AssumptionSet::new("base", 2024)
        };
        let next = project_year(&base(), &a, &DepreciationSplit::default());
        assert_eq!(next.balance_sheet.debts.bank.long_term, Decimal::ZERO);
    }

    #[test]
    fn test_deficit_plugged_with_short_term_debt() {
        let a = AssumptionSet {
            new_investment: dec!(5_000_000),
            ..AssumptionSet::new("base", 2024)
        };
        let (next, plug) = project(&base(), &a, &DepreciationSplit::default());
        assert!(matches!(plug, Plug::ShortTermDebt(_)));
        assert_eq!(next.balance_sheet.cash, Decimal::ZERO);
        assert_eq!(
            next.balance_sheet.debts.bank.short_term,
            dec!(100_000) + plug.amount()
        );
        assert_eq!(next.total_assets(), next.total_liabilities());
    }

    #[test]
    fn test_projected_years_balance_exactly() {
        let mut sink: Vec<FinancialSnapshot> = Vec::new();
        let chain = ForecastProjector::default()
            .run(Some(&base()), &three_years(), &mut sink)
            .unwrap();
        assert_eq!(chain.len(), 3);
        for s in chain.snapshots() {
            assert_eq!(s.total_assets(), s.total_liabilities(), "year {}", s.year);
        }
    }

    #[test]
    fn test_run_sorts_by_year_and_feeds_sink() {
        let mut assumptions = three_years();
        assumptions.reverse();
        let mut sink: Vec<FinancialSnapshot> = Vec::new();
        let chain = ForecastProjector::default()
            .run(Some(&base()), &assumptions, &mut sink)
            .unwrap();
        let years: Vec<i32> = sink.iter().map(|s| s.year).collect();
        assert_eq!(years, vec![2024, 2025, 2026]);
        assert_eq!(chain.state, ForecastState::Completed);
        assert_eq!(chain.base_year, 2023);
        assert_eq!(chain.scenario, "base");
    }

    #[test]
    fn test_run_is_deterministic() {
        let projector = ForecastProjector::default();
        let a = projector
            .run(Some(&base()), &three_years(), &mut DiscardSink)
            .unwrap();
        let b = projector
            .run(Some(&base()), &three_years(), &mut DiscardSink)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_year_three_from_fixed_year_two_matches_sequential() {
        let chain = ForecastProjector::default()
            .run(Some(&base()), &three_years(), &mut DiscardSink)
            .unwrap();
        let year_two = &chain.years[1].snapshot;
        let year_three = project_year(year_two, &three_years()[2], &DepreciationSplit::default());
        assert_eq!(&year_three, &chain.years[2].snapshot);
    }

    #[test]
    fn test_missing_base_year() {
        let err = ForecastProjector::default()
            .run(None, &three_years(), &mut DiscardSink)
            .unwrap_err();
        match err {
            FinScoreError::MissingData { period, reason, .. } => {
                assert_eq!(period, "2023");
                assert!(reason.contains("'base'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mixed_scenarios_rejected() {
        let mut upside = growth(2024, dec!(20));
        upside.scenario = "upside".into();
        let err = ForecastProjector::default()
            .run(Some(&base()), &[growth(2024, dec!(10)), upside], &mut DiscardSink)
            .unwrap_err();
        match err {
            FinScoreError::InvalidInput { field, reason } => {
                assert_eq!(field, "assumptions.scenario");
                assert!(reason.contains("upside"));
                assert!(reason.contains("2024"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_year_rejected() {
        let mut sink: Vec<FinancialSnapshot> = Vec::new();
        let err = ForecastProjector::default()
            .run(
                Some(&base()),
                &[growth(2024, dec!(10)), growth(2025, dec!(5)), growth(2024, dec!(20))],
                &mut sink,
            )
            .unwrap_err();
        match err {
            FinScoreError::InvalidInput { field, reason } => {
                assert_eq!(field, "assumptions.year");
                assert!(reason.contains("'base'"));
                assert!(reason.contains("2024"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn test_no_assumptions() {
        let err = ForecastProjector::default()
            .run(Some(&base()), &[], &mut DiscardSink)
            .unwrap_err();
        match err {
            FinScoreError::MissingData { company, period, .. } => {
                assert_eq!(company, "ACME");
                assert_eq!(period, "2024");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sink_failure_stops_the_run() {
        struct Refuse;
        impl ProjectionSink for Refuse {
            fn accept(&mut self, snapshot: &FinancialSnapshot) -> FinScoreResult<()> {
                Err(FinScoreError::Sink {
                    year: snapshot.year,
                    reason: "read-only".into(),
                })
            }
        }
        let err = ForecastProjector::default()
            .run(Some(&base()), &three_years(), &mut Refuse)
            .unwrap_err();
        assert!(matches!(err, FinScoreError::Sink { year: 2024, .. }));
    }
}
