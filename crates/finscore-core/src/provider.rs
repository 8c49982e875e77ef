//! Seams to the collaborators that own storage: where statements and
//! assumptions come from, and where projected years go.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::assumptions::{AssumptionBook, AssumptionSet};
use crate::ledger::{BalanceSheet, FinancialSnapshot, IncomeStatement};
use crate::FinScoreResult;

pub trait SnapshotProvider {
    fn balance_sheet(&self, company_id: &str, year: i32) -> Option<BalanceSheet>;
    fn income_statement(&self, company_id: &str, year: i32) -> Option<IncomeStatement>;
    /// A scenario's assumption sets in year order.
    fn assumptions(&self, scenario: &str) -> Vec<AssumptionSet>;
}

/// Receives each projected year as soon as it is computed.
pub trait ProjectionSink {
    fn accept(&mut self, snapshot: &FinancialSnapshot) -> FinScoreResult<()>;
}

impl ProjectionSink for Vec<FinancialSnapshot> {
    fn accept(&mut self, snapshot: &FinancialSnapshot) -> FinScoreResult<()> {
        self.push(snapshot.clone());
        Ok(())
    }
}

/// Sink for callers that only want the returned chain.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl ProjectionSink for DiscardSink {
    fn accept(&mut self, _snapshot: &FinancialSnapshot) -> FinScoreResult<()> {
        Ok(())
    }
}

/// Both halves of a company's year, or `MissingData` naming the absent one.
pub fn load_snapshot(
    provider: &impl SnapshotProvider,
    company_id: &str,
    year: i32,
) -> FinScoreResult<FinancialSnapshot> {
    FinancialSnapshot::from_parts(
        company_id,
        year,
        provider.balance_sheet(company_id, year),
        provider.income_statement(company_id, year),
    )
}

pub fn load_history(
    provider: &impl SnapshotProvider,
    company_id: &str,
    years: impl IntoIterator<Item = i32>,
) -> FinScoreResult<Vec<FinancialSnapshot>> {
    years
        .into_iter()
        .map(|year| load_snapshot(provider, company_id, year))
        .collect()
}

// ---------------------------------------------------------------------------
// In-memory provider
// ---------------------------------------------------------------------------

/// Statements keyed by company and year, plus an assumption book. Loads from
/// the same JSON the CLI accepts as a dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InMemoryProvider {
    balance_sheets: BTreeMap<String, BTreeMap<i32, BalanceSheet>>,
    income_statements: BTreeMap<String, BTreeMap<i32, IncomeStatement>>,
    assumptions: AssumptionBook,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> FinScoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert_snapshot(&mut self, snapshot: FinancialSnapshot) {
        let FinancialSnapshot {
            company_id,
            year,
            balance_sheet,
            income_statement,
        } = snapshot;
        self.insert_balance_sheet(&company_id, year, balance_sheet);
        self.insert_income_statement(&company_id, year, income_statement);
    }

    pub fn insert_balance_sheet(&mut self, company_id: &str, year: i32, bs: BalanceSheet) {
        self.balance_sheets
            .entry(company_id.to_string())
            .or_default()
            .insert(year, bs);
    }

    pub fn insert_income_statement(&mut self, company_id: &str, year: i32, is: IncomeStatement) {
        self.income_statements
            .entry(company_id.to_string())
            .or_default()
            .insert(year, is);
    }

    pub fn assumption_book_mut(&mut self) -> &mut AssumptionBook {
        &mut self.assumptions
    }

    /// Years for which both statements are on file.
    pub fn years(&self, company_id: &str) -> Vec<i32> {
        let Some(sheets) = self.balance_sheets.get(company_id) else {
            return Vec::new();
        };
        let statements = self.income_statements.get(company_id);
        sheets
            .keys()
            .copied()
            .filter(|year| statements.is_some_and(|s| s.contains_key(year)))
            .collect()
    }
}

impl SnapshotProvider for InMemoryProvider {
    fn balance_sheet(&self, company_id: &str, year: i32) -> Option<BalanceSheet> {
        self.balance_sheets.get(company_id)?.get(&year).cloned()
    }

    fn income_statement(&self, company_id: &str, year: i32) -> Option<IncomeStatement> {
        self.income_statements.get(company_id)?.get(&year).cloned()
    }

    fn assumptions(&self, scenario: &str) -> Vec<AssumptionSet> {
        self.assumptions.scenario(scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FinScoreError;
    use rust_decimal_macros::dec;

    fn provider() -> InMemoryProvider {
        let mut p = InMemoryProvider::new();
        p.insert_snapshot(FinancialSnapshot::new(
            "ACME",
            2023,
            BalanceSheet::default(),
            IncomeStatement {
                revenue: dec!(1_000),
                ..Default::default()
            },
        ));
        p.insert_balance_sheet("ACME", 2024, BalanceSheet::default());
        p
    }

    #[test]
    fn test_load_complete_year() {
        let s = load_snapshot(&provider(), "ACME", 2023).unwrap();
        assert_eq!(s.revenue(), dec!(1_000));
    }

    #[test]
    fn test_missing_income_statement_is_missing_data() {
        let err = load_snapshot(&provider(), "ACME", 2024).unwrap_err();
        match err {
            FinScoreError::MissingData { reason, period, .. } => {
                assert_eq!(period, "2024");
                assert!(reason.contains("income statement"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_company_is_missing_data() {
        assert!(load_snapshot(&provider(), "NOPE", 2023).is_err());
        assert!(provider().years("NOPE").is_empty());
    }

    #[test]
    fn test_years_require_both_statements() {
        assert_eq!(provider().years("ACME"), vec![2023]);
    }

    #[test]
    fn test_load_history_stops_at_first_gap() {
        let history = load_history(&provider(), "ACME", [2023]).unwrap();
        assert_eq!(history.len(), 1);
        assert!(load_history(&provider(), "ACME", 2023..=2024).is_err());
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{
            "balance_sheets": { "ACME": { "2023": { "cash": "100", "share_capital": "100" } } },
            "income_statements": { "ACME": { "2023": { "revenue": "500" } } }
        }"#;
        let p = InMemoryProvider::from_json_str(json).unwrap();
        let s = load_snapshot(&p, "ACME", 2023).unwrap();
        assert!(s.is_balanced());
        assert_eq!(s.revenue(), dec!(500));
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<FinancialSnapshot> = Vec::new();
        let s = load_snapshot(&provider(), "ACME", 2023).unwrap();
        sink.accept(&s).unwrap();
        assert_eq!(sink.len(), 1);
    }
}
