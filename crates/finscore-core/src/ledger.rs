//! Ledger data model: one fiscal year's balance sheet and income statement.
//!
//! Bucket layout follows the civil-code statutory schedules. Every aggregate
//! (totals, EBITDA, net profit, ...) is derived on demand and never stored.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Money;
use crate::{FinScoreError, FinScoreResult};

/// Default tolerance for the assets = liabilities + equity check on inputs.
pub const DEFAULT_BALANCE_TOLERANCE: Decimal = dec!(0.01);

// ---------------------------------------------------------------------------
// Sector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    Manufacturing,
    Construction,
    Services,
    Trade,
    RealEstate,
    Agriculture,
}

impl Sector {
    pub const ALL: [Sector; 6] = [
        Sector::Manufacturing,
        Sector::Construction,
        Sector::Services,
        Sector::Trade,
        Sector::RealEstate,
        Sector::Agriculture,
    ];

    /// Resolve the numeric sector code (1..6) used by upstream ledgers.
    pub fn from_code(code: u8) -> FinScoreResult<Self> {
        match code {
            1 => Ok(Sector::Manufacturing),
            2 => Ok(Sector::Construction),
            3 => Ok(Sector::Services),
            4 => Ok(Sector::Trade),
            5 => Ok(Sector::RealEstate),
            6 => Ok(Sector::Agriculture),
            other => Err(FinScoreError::InvalidInput {
                field: "sector".into(),
                reason: format!("Sector code must be between 1 and 6, got {other}"),
            }),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Sector::Manufacturing => 1,
            Sector::Construction => 2,
            Sector::Services => 3,
            Sector::Trade => 4,
            Sector::RealEstate => 5,
            Sector::Agriculture => 6,
        }
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Sector::Manufacturing => "Manufacturing",
            Sector::Construction => "Construction",
            Sector::Services => "Services",
            Sector::Trade => "Trade",
            Sector::RealEstate => "Real Estate",
            Sector::Agriculture => "Agriculture",
        };
        write!(f, "{s}")
    }
}

/// Accepts the numeric code ("3") or the snake_case name ("real_estate").
impl std::str::FromStr for Sector {
    type Err = FinScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return Sector::from_code(code);
        }
        match s.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "manufacturing" => Ok(Sector::Manufacturing),
            "construction" => Ok(Sector::Construction),
            "services" => Ok(Sector::Services),
            "trade" => Ok(Sector::Trade),
            "real_estate" => Ok(Sector::RealEstate),
            "agriculture" => Ok(Sector::Agriculture),
            _ => Err(FinScoreError::InvalidInput {
                field: "sector".into(),
                reason: format!("Unknown sector '{s}'"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Balance sheet
// ---------------------------------------------------------------------------

/// Receivables split by maturity (within / beyond twelve months).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Receivables {
    pub short_term: Money,
    pub long_term: Money,
}

impl Receivables {
    pub fn total(&self) -> Money {
        self.short_term + self.long_term
    }
}

/// A debt category split by maturity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebtBucket {
    pub short_term: Money,
    pub long_term: Money,
}

impl DebtBucket {
    pub fn total(&self) -> Money {
        self.short_term + self.long_term
    }
}

/// Debts by creditor. Bank, bonds and shareholder loans are financial debt;
/// the rest arise from operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Debts {
    pub bank: DebtBucket,
    pub bonds: DebtBucket,
    pub shareholder_loans: DebtBucket,
    pub suppliers: DebtBucket,
    pub tax: DebtBucket,
    pub social_security: DebtBucket,
    pub other: DebtBucket,
}

impl Debts {
    fn buckets(&self) -> [&DebtBucket; 7] {
        [
            &self.bank,
            &self.bonds,
            &self.shareholder_loans,
            &self.suppliers,
            &self.tax,
            &self.social_security,
            &self.other,
        ]
    }

    pub fn total(&self) -> Money {
        self.buckets().iter().map(|b| b.total()).sum()
    }

    pub fn short_term(&self) -> Money {
        self.buckets().iter().map(|b| b.short_term).sum()
    }

    pub fn long_term(&self) -> Money {
        self.buckets().iter().map(|b| b.long_term).sum()
    }

    pub fn financial(&self) -> Money {
        self.bank.total() + self.bonds.total() + self.shareholder_loans.total()
    }

    /// Tax, social-security and other non-financial, non-trade debts.
    pub fn other_operating(&self) -> Money {
        self.tax.total() + self.social_security.total() + self.other.total()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceSheet {
    // Assets
    pub receivables_from_shareholders: Money,
    pub intangible_assets: Money,
    pub tangible_assets: Money,
    pub financial_assets: Money,
    pub inventory: Money,
    pub receivables: Receivables,
    pub current_financial_assets: Money,
    pub cash: Money,
    pub accrued_income: Money,
    // Equity
    pub share_capital: Money,
    pub reserves: Money,
    pub retained_earnings: Money,
    pub profit_for_year: Money,
    // Liabilities
    pub provisions_for_risks: Money,
    pub severance_indemnity: Money,
    pub debts: Debts,
    pub accrued_expenses: Money,
}

impl BalanceSheet {
    pub fn fixed_assets(&self) -> Money {
        self.intangible_assets + self.tangible_assets + self.financial_assets
    }

    pub fn total_assets(&self) -> Money {
        self.assets_excluding_cash() + self.cash
    }

    pub fn assets_excluding_cash(&self) -> Money {
        self.receivables_from_shareholders
            + self.fixed_assets()
            + self.inventory
            + self.receivables.total()
            + self.current_financial_assets
            + self.accrued_income
    }

    pub fn current_assets(&self) -> Money {
        self.total_assets() - self.fixed_assets()
    }

    pub fn total_equity(&self) -> Money {
        self.share_capital + self.reserves + self.retained_earnings + self.profit_for_year
    }

    pub fn total_debt(&self) -> Money {
        self.debts.total()
    }

    pub fn financial_debt(&self) -> Money {
        self.debts.financial()
    }

    pub fn current_liabilities(&self) -> Money {
        self.debts.short_term() + self.accrued_expenses
    }

    /// Provisions plus the employee severance fund.
    pub fn funds(&self) -> Money {
        self.provisions_for_risks + self.severance_indemnity
    }

    /// Liabilities-and-equity side of the statement.
    pub fn total_liabilities(&self) -> Money {
        self.total_equity() + self.funds() + self.total_debt() + self.accrued_expenses
    }

    pub fn working_capital_net(&self) -> Money {
        self.current_assets() - self.current_liabilities()
    }
}

// ---------------------------------------------------------------------------
// Income statement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeStatement {
    // Production value
    pub revenue: Money,
    pub change_in_finished_goods: Money,
    pub change_in_work_in_progress: Money,
    pub capitalized_costs: Money,
    pub other_revenue: Money,
    // Production cost
    pub raw_materials: Money,
    pub services: Money,
    pub lease_costs: Money,
    pub personnel_costs: Money,
    pub depreciation: Money,
    pub writedowns: Money,
    pub change_in_raw_materials: Money,
    pub provisions: Money,
    pub other_operating_costs: Money,
    // Financial items
    pub equity_investment_income: Money,
    pub other_financial_income: Money,
    pub interest_expense: Money,
    pub fx_gains_losses: Money,
    /// Revaluations less write-downs of financial assets.
    pub value_adjustments: Money,
    pub income_taxes: Money,
}

impl IncomeStatement {
    pub fn production_value(&self) -> Money {
        self.revenue
            + self.change_in_finished_goods
            + self.change_in_work_in_progress
            + self.capitalized_costs
            + self.other_revenue
    }

    pub fn production_cost(&self) -> Money {
        self.raw_materials
            + self.services
            + self.lease_costs
            + self.personnel_costs
            + self.depreciation
            + self.writedowns
            + self.change_in_raw_materials
            + self.provisions
            + self.other_operating_costs
    }

    /// Costs bought from third parties (materials, services, leases and
    /// sundry charges), the deduction that leaves value added.
    pub fn external_costs(&self) -> Money {
        self.raw_materials
            + self.services
            + self.lease_costs
            + self.change_in_raw_materials
            + self.other_operating_costs
    }

    /// Production cost before depreciation, write-downs and provisions.
    pub fn cash_operating_costs(&self) -> Money {
        self.production_cost() - self.depreciation - self.writedowns - self.provisions
    }

    pub fn ebitda(&self) -> Money {
        self.production_value() - self.cash_operating_costs()
    }

    pub fn ebit(&self) -> Money {
        self.production_value() - self.production_cost()
    }

    pub fn financial_result(&self) -> Money {
        self.equity_investment_income + self.other_financial_income - self.interest_expense
            + self.fx_gains_losses
    }

    /// Interest expense net of interest income.
    pub fn net_interest(&self) -> Money {
        self.interest_expense - self.other_financial_income
    }

    pub fn profit_before_tax(&self) -> Money {
        self.ebit() + self.financial_result() + self.value_adjustments
    }

    pub fn net_profit(&self) -> Money {
        self.profit_before_tax() - self.income_taxes
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One company's fiscal year: both statement halves, immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub company_id: String,
    pub year: i32,
    pub balance_sheet: BalanceSheet,
    pub income_statement: IncomeStatement,
}

/// Outcome of the assets = liabilities + equity check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceCheck {
    pub total_assets: Money,
    pub total_liabilities: Money,
    pub difference: Money,
    pub tolerance: Money,
    pub balanced: bool,
}

impl FinancialSnapshot {
    pub fn new(
        company_id: impl Into<String>,
        year: i32,
        balance_sheet: BalanceSheet,
        income_statement: IncomeStatement,
    ) -> Self {
        FinancialSnapshot {
            company_id: company_id.into(),
            year,
            balance_sheet,
            income_statement,
        }
    }

    /// Assemble a snapshot from halves that a collaborator may not have.
    pub fn from_parts(
        company_id: &str,
        year: i32,
        balance_sheet: Option<BalanceSheet>,
        income_statement: Option<IncomeStatement>,
    ) -> FinScoreResult<Self> {
        let balance_sheet = balance_sheet
            .ok_or_else(|| FinScoreError::missing(company_id, year, "balance sheet not found"))?;
        let income_statement = income_statement.ok_or_else(|| {
            FinScoreError::missing(company_id, year, "income statement not found")
        })?;
        Ok(Self::new(company_id, year, balance_sheet, income_statement))
    }

    pub fn balance_check(&self, tolerance: Money) -> BalanceCheck {
        let total_assets = self.total_assets();
        let total_liabilities = self.total_liabilities();
        let difference = total_assets - total_liabilities;
        BalanceCheck {
            total_assets,
            total_liabilities,
            difference,
            tolerance,
            balanced: difference.abs() <= tolerance,
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.balance_check(DEFAULT_BALANCE_TOLERANCE).balanced
    }

    pub fn total_assets(&self) -> Money {
        self.balance_sheet.total_assets()
    }
    pub fn total_equity(&self) -> Money {
        self.balance_sheet.total_equity()
    }
    pub fn total_liabilities(&self) -> Money {
        self.balance_sheet.total_liabilities()
    }
    pub fn fixed_assets(&self) -> Money {
        self.balance_sheet.fixed_assets()
    }
    pub fn current_assets(&self) -> Money {
        self.balance_sheet.current_assets()
    }
    pub fn current_liabilities(&self) -> Money {
        self.balance_sheet.current_liabilities()
    }
    pub fn total_debt(&self) -> Money {
        self.balance_sheet.total_debt()
    }
    pub fn financial_debt(&self) -> Money {
        self.balance_sheet.financial_debt()
    }
    pub fn working_capital_net(&self) -> Money {
        self.balance_sheet.working_capital_net()
    }
    pub fn production_value(&self) -> Money {
        self.income_statement.production_value()
    }
    pub fn production_cost(&self) -> Money {
        self.income_statement.production_cost()
    }
    pub fn ebitda(&self) -> Money {
        self.income_statement.ebitda()
    }
    pub fn ebit(&self) -> Money {
        self.income_statement.ebit()
    }
    pub fn financial_result(&self) -> Money {
        self.income_statement.financial_result()
    }
    pub fn profit_before_tax(&self) -> Money {
        self.income_statement.profit_before_tax()
    }
    pub fn net_profit(&self) -> Money {
        self.income_statement.net_profit()
    }
    pub fn revenue(&self) -> Money {
        self.income_statement.revenue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FinancialSnapshot {
        let bs = BalanceSheet {
            intangible_assets: dec!(50_000),
            tangible_assets: dec!(400_000),
            financial_assets: dec!(50_000),
            inventory: dec!(150_000),
            receivables: Receivables {
                short_term: dec!(250_000),
                long_term: dec!(20_000),
            },
            cash: dec!(70_000),
            accrued_income: dec!(10_000),
            share_capital: dec!(100_000),
            reserves: dec!(200_000),
            retained_earnings: dec!(50_000),
            profit_for_year: dec!(40_000),
            provisions_for_risks: dec!(20_000),
            severance_indemnity: dec!(60_000),
            debts: Debts {
                bank: DebtBucket {
                    short_term: dec!(100_000),
                    long_term: dec!(200_000),
                },
                suppliers: DebtBucket {
                    short_term: dec!(160_000),
                    long_term: Decimal::ZERO,
                },
                tax: DebtBucket {
                    short_term: dec!(15_000),
                    long_term: Decimal::ZERO,
                },
                ..Default::default()
            },
            accrued_expenses: dec!(5_000),
            ..Default::default()
        };
        let is = IncomeStatement {
            revenue: dec!(1_000_000),
            other_revenue: dec!(10_000),
            raw_materials: dec!(400_000),
            services: dec!(200_000),
            personnel_costs: dec!(250_000),
            depreciation: dec!(60_000),
            other_operating_costs: dec!(10_000),
            interest_expense: dec!(20_000),
            income_taxes: dec!(30_000),
            ..Default::default()
        };
        FinancialSnapshot::new("ACME", 2023, bs, is)
    }

    #[test]
    fn test_balance_sheet_aggregates() {
        let s = sample();
        assert_eq!(s.fixed_assets(), dec!(500_000));
        assert_eq!(s.total_assets(), dec!(1_000_000));
        assert_eq!(s.current_assets(), dec!(500_000));
        assert_eq!(s.total_equity(), dec!(390_000));
        assert_eq!(s.total_debt(), dec!(475_000));
        assert_eq!(s.financial_debt(), dec!(300_000));
        assert_eq!(s.current_liabilities(), dec!(280_000));
        assert_eq!(s.total_liabilities(), dec!(950_000));
        assert_eq!(s.working_capital_net(), dec!(220_000));
    }

    #[test]
    fn test_income_statement_aggregates() {
        let s = sample();
        assert_eq!(s.production_value(), dec!(1_010_000));
        assert_eq!(s.production_cost(), dec!(920_000));
        assert_eq!(s.ebitda(), dec!(150_000));
        assert_eq!(s.ebit(), dec!(90_000));
        assert_eq!(s.financial_result(), dec!(-20_000));
        assert_eq!(s.profit_before_tax(), dec!(70_000));
        assert_eq!(s.net_profit(), dec!(40_000));
    }

    #[test]
    fn test_balance_check_reports_difference() {
        let s = sample();
        let check = s.balance_check(DEFAULT_BALANCE_TOLERANCE);
        assert!(!check.balanced);
        assert_eq!(check.difference, dec!(50_000));
        assert!(!s.is_balanced());
    }

    #[test]
    fn test_from_parts_missing_income_statement() {
        let err =
            FinancialSnapshot::from_parts("ACME", 2022, Some(BalanceSheet::default()), None)
                .unwrap_err();
        match err {
            FinScoreError::MissingData { company, period, .. } => {
                assert_eq!(company, "ACME");
                assert_eq!(period, "2022");
            }
            other => panic!("Expected MissingData, got {other:?}"),
        }
    }

    #[test]
    fn test_sector_codes_round_trip() {
        for sector in Sector::ALL {
            assert_eq!(Sector::from_code(sector.code()).unwrap(), sector);
        }
        assert!(Sector::from_code(0).is_err());
        assert!(Sector::from_code(7).is_err());
    }

    #[test]
    fn test_sector_parses_code_or_name() {
        assert_eq!("1".parse::<Sector>().unwrap(), Sector::Manufacturing);
        assert_eq!("real_estate".parse::<Sector>().unwrap(), Sector::RealEstate);
        assert_eq!("Real Estate".parse::<Sector>().unwrap(), Sector::RealEstate);
        assert!("mining".parse::<Sector>().is_err());
        assert!("9".parse::<Sector>().is_err());
    }
}
