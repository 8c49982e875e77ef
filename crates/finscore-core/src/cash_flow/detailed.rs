use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{change, CashFlowOptions};
use crate::ledger::{BalanceSheet, FinancialSnapshot};
use crate::math::round_money;
use crate::types::Money;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------
//
// Every line is a signed cash effect: sources positive, uses negative.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingActivities {
    pub net_profit: Money,
    pub income_taxes: Money,
    pub net_interest: Money,
    pub profit_before_tax_and_interest: Money,

    pub provisions: Money,
    pub depreciation: Money,
    pub writedowns: Money,
    pub value_adjustments: Money,
    pub cash_flow_before_working_capital: Money,

    pub inventory: Money,
    pub receivables: Money,
    pub payables: Money,
    pub accrued_income: Money,
    pub accrued_expenses: Money,
    pub other_operating_debts: Money,
    pub working_capital_change: Money,
    pub cash_flow_after_working_capital: Money,

    pub interest_paid: Money,
    pub taxes_paid: Money,
    pub use_of_funds: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestingActivities {
    pub intangible: Money,
    pub tangible: Money,
    pub financial: Money,
    /// Gross intangible and tangible purchases, as a positive amount.
    pub capex: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingActivities {
    /// Change in bank, bond and shareholder-loan debt.
    pub third_party_funds: Money,
    /// Equity movements other than the year's profit.
    pub own_funds: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowStatement {
    pub company_id: String,
    pub year: i32,
    pub previous_year: Option<i32>,
    pub operating: OperatingActivities,
    pub investing: InvestingActivities,
    pub financing: FinancingActivities,
    pub total_cash_flow: Money,
    pub opening_cash: Money,
    pub closing_cash: Money,
    pub actual_cash_change: Money,
    pub difference: Money,
    pub verification_ok: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the statement for `current` from the balance-sheet changes since
/// `previous`. Without a previous year every change is zero and capital
/// expenditure falls back to the year's depreciation.
///
/// Never fails: a statement that does not tie out to the cash change is
/// returned with `verification_ok = false`.
pub fn reconcile(
    current: &FinancialSnapshot,
    previous: Option<&FinancialSnapshot>,
    options: &CashFlowOptions,
) -> CashFlowStatement {
    let bs = &current.balance_sheet;
    let prev_bs = previous.map(|p| &p.balance_sheet);

    let operating = operating_activities(current, prev_bs);
    let investing = investing_activities(current, prev_bs, options);
    let financing = financing_activities(current, prev_bs);

    let total_cash_flow = operating.total + investing.total + financing.total;
    let opening_cash = prev_bs.map(|p| p.cash).unwrap_or(bs.cash);
    let actual_cash_change = change(bs, prev_bs, |b| b.cash);
    let difference = total_cash_flow - actual_cash_change;
    let verification_ok = difference.abs() <= options.tolerance;

    if previous.is_some() && !verification_ok {
        tracing::warn!(
            company = %current.company_id,
            year = current.year,
            %total_cash_flow,
            %actual_cash_change,
            %difference,
            "cash flow does not reconcile with the change in cash"
        );
    } else {
        tracing::debug!(
            company = %current.company_id,
            year = current.year,
            has_history = previous.is_some(),
            %difference,
            "cash flow reconciled"
        );
    }

    CashFlowStatement {
        company_id: current.company_id.clone(),
        year: current.year,
        previous_year: previous.map(|p| p.year),
        operating,
        investing,
        financing,
        total_cash_flow,
        opening_cash,
        closing_cash: bs.cash,
        actual_cash_change,
        difference,
        verification_ok,
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

fn operating_activities(
    current: &FinancialSnapshot,
    prev: Option<&BalanceSheet>,
) -> OperatingActivities {
    let is = &current.income_statement;
    let bs = &current.balance_sheet;

    let net_profit = round_money(is.net_profit());
    let income_taxes = round_money(is.income_taxes);
    let net_interest = round_money(is.net_interest());
    let profit_before_tax_and_interest = net_profit + income_taxes + net_interest;

    let provisions = round_money(is.provisions);
    let depreciation = round_money(is.depreciation);
    let writedowns = round_money(is.writedowns);
    let value_adjustments = -round_money(is.value_adjustments);
    let cash_flow_before_working_capital = profit_before_tax_and_interest
        + provisions
        + depreciation
        + writedowns
        + value_adjustments;

    let inventory = -change(bs, prev, |b| b.inventory);
    let receivables = -change(bs, prev, |b| b.receivables.total());
    let payables = change(bs, prev, |b| b.debts.suppliers.total());
    let accrued_income = -change(bs, prev, |b| b.accrued_income);
    let accrued_expenses = change(bs, prev, |b| b.accrued_expenses);
    let other_operating_debts = change(bs, prev, |b| b.debts.other_operating());
    let working_capital_change = inventory
        + receivables
        + payables
        + accrued_income
        + accrued_expenses
        + other_operating_debts;
    let cash_flow_after_working_capital = cash_flow_before_working_capital + working_capital_change;

    let interest_paid = -net_interest;
    let taxes_paid = -income_taxes;
    let use_of_funds = -(provisions - change(bs, prev, BalanceSheet::funds));
    let total = cash_flow_after_working_capital + interest_paid + taxes_paid + use_of_funds;

    OperatingActivities {
        net_profit,
        income_taxes,
        net_interest,
        profit_before_tax_and_interest,
        provisions,
        depreciation,
        writedowns,
        value_adjustments,
        cash_flow_before_working_capital,
        inventory,
        receivables,
        payables,
        accrued_income,
        accrued_expenses,
        other_operating_debts,
        working_capital_change,
        cash_flow_after_working_capital,
        interest_paid,
        taxes_paid,
        use_of_funds,
        total,
    }
}

fn investing_activities(
    current: &FinancialSnapshot,
    prev: Option<&BalanceSheet>,
    options: &CashFlowOptions,
) -> InvestingActivities {
    let is = &current.income_statement;
    let bs = &current.balance_sheet;
    let split = &options.depreciation_split;

    // Without history the only evidence of investment is the charge itself.
    let charged = if prev.is_some() {
        is.depreciation + is.writedowns
    } else {
        is.depreciation
    };
    let charged = round_money(charged);
    let allocation = split.allocate(charged, prev);
    let intangible_charge = round_money(allocation.intangible);
    // Without history the whole charge is capital expenditure, so nothing
    // is left for financial assets.
    let tangible_charge = match prev {
        Some(_) => round_money(allocation.tangible),
        None => charged - intangible_charge,
    };
    let financial_charge = charged - intangible_charge - tangible_charge;

    let intangible = -(change(bs, prev, |b| b.intangible_assets) + intangible_charge);
    let tangible = -(change(bs, prev, |b| b.tangible_assets) + tangible_charge);
    let financial = match prev {
        Some(_) => {
            -(change(bs, prev, |b| b.financial_assets) + financial_charge
                - round_money(is.value_adjustments))
                - change(bs, prev, |b| b.current_financial_assets)
        }
        None => -financial_charge,
    };

    InvestingActivities {
        intangible,
        tangible,
        financial,
        capex: -(intangible + tangible),
        total: intangible + tangible + financial,
    }
}

fn financing_activities(
    current: &FinancialSnapshot,
    prev: Option<&BalanceSheet>,
) -> FinancingActivities {
    let bs = &current.balance_sheet;

    let third_party_funds = change(bs, prev, BalanceSheet::financial_debt);
    let own_funds = match prev {
        Some(_) => {
            change(bs, prev, BalanceSheet::total_equity)
                - round_money(current.net_profit())
                - change(bs, prev, |b| b.receivables_from_shareholders)
        }
        None => Decimal::ZERO,
    };

    FinancingActivities {
        third_party_funds,
        own_funds,
        total: third_party_funds + own_funds,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depreciation::DepreciationSplit;
    use crate::ledger::{DebtBucket, Debts, IncomeStatement, Receivables};
    use rust_decimal_macros::dec;

    fn year_one() -> FinancialSnapshot {
        let bs = BalanceSheet {
            intangible_assets: dec!(100_000),
            tangible_assets: dec!(400_000),
            financial_assets: dec!(50_000),
            inventory: dec!(120_000),
            receivables: Receivables {
                short_term: dec!(200_000),
                long_term: Decimal::ZERO,
            },
            cash: dec!(80_000),
            accrued_income: dec!(10_000),
            share_capital: dec!(200_000),
            reserves: dec!(150_000),
            retained_earnings: dec!(50_000),
            profit_for_year: dec!(60_000),
            provisions_for_risks: dec!(20_000),
            severance_indemnity: dec!(60_000),
            debts: Debts {
                bank: DebtBucket {
                    short_term: dec!(100_000),
                    long_term: dec!(150_000),
                },
                suppliers: DebtBucket {
                    short_term: dec!(130_000),
                    long_term: Decimal::ZERO,
                },
                tax: DebtBucket {
                    short_term: dec!(20_000),
                    long_term: Decimal::ZERO,
                },
                ..Default::default()
            },
            accrued_expenses: dec!(20_000),
            ..Default::default()
        };
        let is = IncomeStatement {
            revenue: dec!(1_000_000),
            raw_materials: dec!(400_000),
            services: dec!(150_000),
            personnel_costs: dec!(250_000),
            depreciation: dec!(60_000),
            interest_expense: dec!(15_000),
            income_taxes: dec!(25_000),
            ..Default::default()
        };
        FinancialSnapshot::new("ACME", 2023, bs, is)
    }

    /// Year two: net profit 69,000; tangible purchases, a new bank loan and a
    /// dividend of 20,000 paid out of last year's profit.
    fn year_two() -> FinancialSnapshot {
        let mut s = year_one();
        s.year = 2024;
        let is = &mut s.income_statement;
        is.revenue = dec!(1_100_000);
        is.raw_materials = dec!(440_000);
        is.services = dec!(160_000);
        is.personnel_costs = dec!(260_000);
        is.depreciation = dec!(70_000);
        is.provisions = dec!(10_000);
        is.interest_expense = dec!(16_000);
        is.income_taxes = dec!(75_000);
        assert_eq!(s.net_profit(), dec!(69_000));

        let bs = &mut s.balance_sheet;
        bs.intangible_assets = dec!(90_000);
        bs.tangible_assets = dec!(450_000);
        bs.inventory = dec!(130_000);
        bs.receivables.short_term = dec!(220_000);
        bs.retained_earnings = dec!(90_000);
        bs.profit_for_year = dec!(69_000);
        bs.provisions_for_risks = dec!(25_000);
        bs.severance_indemnity = dec!(65_000);
        bs.debts.bank.long_term = dec!(200_000);
        bs.debts.suppliers.short_term = dec!(140_000);
        bs.debts.tax.short_term = dec!(25_000);
        bs.accrued_expenses = dec!(20_000);
        // Cash as the balancing item.
        bs.cash = Decimal::ZERO;
        bs.cash = bs.total_liabilities() - bs.total_assets();
        s
    }

    #[test]
    fn test_fixtures_balance() {
        assert!(year_one().is_balanced());
        assert!(year_two().is_balanced());
    }

    #[test]
    fn test_balanced_pair_reconciles_exactly() {
        let cf = reconcile(&year_two(), Some(&year_one()), &CashFlowOptions::default());
        assert_eq!(cf.difference, Decimal::ZERO);
        assert!(cf.verification_ok);
        assert_eq!(cf.previous_year, Some(2023));
        assert_eq!(cf.actual_cash_change, cf.closing_cash - cf.opening_cash);
    }

    #[test]
    fn test_subtotals_sum_to_total() {
        let cf = reconcile(&year_two(), Some(&year_one()), &CashFlowOptions::default());
        assert_eq!(
            cf.total_cash_flow,
            cf.operating.total + cf.investing.total + cf.financing.total
        );
        let op = &cf.operating;
        assert_eq!(
            op.total,
            op.cash_flow_after_working_capital + op.interest_paid + op.taxes_paid + op.use_of_funds
        );
    }

    #[test]
    fn test_operating_lines() {
        let cf = reconcile(&year_two(), Some(&year_one()), &CashFlowOptions::default());
        let op = &cf.operating;
        assert_eq!(op.profit_before_tax_and_interest, dec!(160_000));
        assert_eq!(op.inventory, dec!(-10_000));
        assert_eq!(op.receivables, dec!(-20_000));
        assert_eq!(op.payables, dec!(10_000));
        assert_eq!(op.other_operating_debts, dec!(5_000));
        // Funds grew 10,000 on a 10,000 charge: nothing used.
        assert_eq!(op.use_of_funds, Decimal::ZERO);
    }

    #[test]
    fn test_investing_splits_depreciation_pro_rata() {
        let cf = reconcile(&year_two(), Some(&year_one()), &CashFlowOptions::default());
        // Prior balances 100k / 400k put 14,000 of the 70,000 on intangibles.
        assert_eq!(cf.investing.intangible, dec!(-4_000));
        assert_eq!(cf.investing.tangible, dec!(-106_000));
        assert_eq!(cf.investing.capex, dec!(110_000));
    }

    #[test]
    fn test_financing_excludes_profit() {
        let cf = reconcile(&year_two(), Some(&year_one()), &CashFlowOptions::default());
        assert_eq!(cf.financing.third_party_funds, dec!(50_000));
        // Equity rose 49,000 on a 69,000 profit: 20,000 paid out.
        assert_eq!(cf.financing.own_funds, dec!(-20_000));
    }

    #[test]
    fn test_fixed_split_still_reconciles() {
        let options = CashFlowOptions {
            depreciation_split: DepreciationSplit::legacy_fixed(),
            ..Default::default()
        };
        let cf = reconcile(&year_two(), Some(&year_one()), &options);
        assert!(cf.verification_ok);
        assert_eq!(cf.difference, Decimal::ZERO);
    }

    #[test]
    fn test_idempotent() {
        let options = CashFlowOptions::default();
        let a = reconcile(&year_two(), Some(&year_one()), &options);
        let b = reconcile(&year_two(), Some(&year_one()), &options);
        assert_eq!(a, b);
    }

    #[test]
    fn test_without_history() {
        let cf = reconcile(&year_one(), None, &CashFlowOptions::default());
        assert_eq!(cf.previous_year, None);
        assert_eq!(cf.operating.working_capital_change, Decimal::ZERO);
        assert_eq!(cf.financing.own_funds, Decimal::ZERO);
        assert_eq!(cf.financing.third_party_funds, Decimal::ZERO);
        assert_eq!(cf.investing.capex, dec!(60_000));
        assert_eq!(cf.actual_cash_change, Decimal::ZERO);
    }

    #[test]
    fn test_without_history_fixed_split_keeps_full_capex() {
        let options = CashFlowOptions {
            depreciation_split: DepreciationSplit::legacy_fixed(),
            ..Default::default()
        };
        let cf = reconcile(&year_one(), None, &options);
        assert_eq!(cf.investing.capex, dec!(60_000));
        assert_eq!(cf.investing.intangible, dec!(-18_000));
        assert_eq!(cf.investing.tangible, dec!(-42_000));
        assert_eq!(cf.investing.financial, Decimal::ZERO);
        assert_eq!(cf.investing.total, dec!(-60_000));
    }

    #[test]
    fn test_unbalanced_pair_flags_mismatch() {
        let mut current = year_two();
        current.balance_sheet.cash += dec!(500);
        let cf = reconcile(&current, Some(&year_one()), &CashFlowOptions::default());
        assert!(!cf.verification_ok);
        assert_eq!(cf.difference, dec!(-500));
    }
}
