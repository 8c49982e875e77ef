use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Money, Percent};

/// Growth, cost, tax and financing parameters for one forecast year of one
/// scenario. Percent fields are percent numbers (10 = 10%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssumptionSet {
    pub scenario: String,
    pub year: i32,

    // Revenue
    pub revenue_growth_pct: Percent,
    /// Absolute revenue for the year; replaces growth when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_override: Option<Money>,
    pub other_revenue_growth_pct: Percent,

    // Operating costs
    /// Growth applied to the fixed share of materials and services.
    pub cost_inflation_pct: Percent,
    /// Share of raw materials that moves with revenue.
    pub materials_variable_pct: Percent,
    /// Share of services that moves with revenue.
    pub services_variable_pct: Percent,
    pub lease_costs_growth_pct: Percent,
    pub personnel_growth_pct: Percent,
    pub other_costs_growth_pct: Percent,
    pub provisions_growth_pct: Percent,

    // Financial items and tax
    pub financial_income_growth_pct: Percent,
    /// Rate charged on the previous year's closing financial debt.
    pub interest_rate_pct: Percent,
    pub tax_rate_pct: Percent,

    // Working capital
    pub receivables_growth_pct: Percent,
    pub inventory_growth_pct: Percent,
    pub payables_growth_pct: Percent,
    pub severance_growth_pct: Percent,

    // Investment
    pub new_investment: Money,
    pub depreciation_rate_pct: Percent,

    // Financing
    pub new_long_term_debt: Money,
    pub debt_repayment: Money,
    pub dividend_payout_pct: Percent,
    pub capital_increase: Money,
}

impl AssumptionSet {
    pub fn new(scenario: impl Into<String>, year: i32) -> Self {
        AssumptionSet {
            scenario: scenario.into(),
            year,
            ..Default::default()
        }
    }
}

/// Assumptions keyed by (scenario, year). Storing a record for a key that
/// already exists replaces it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssumptionBook {
    records: BTreeMap<String, BTreeMap<i32, AssumptionSet>>,
}

impl AssumptionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; returns the record that was replaced.
    pub fn upsert(&mut self, set: AssumptionSet) -> Option<AssumptionSet> {
        self.records
            .entry(set.scenario.clone())
            .or_default()
            .insert(set.year, set)
    }

    /// Replace every record of a scenario with `sets`.
    pub fn replace_scenario(&mut self, scenario: &str, sets: Vec<AssumptionSet>) {
        let mut by_year = BTreeMap::new();
        for mut set in sets {
            set.scenario = scenario.to_string();
            by_year.insert(set.year, set);
        }
        self.records.insert(scenario.to_string(), by_year);
    }

    /// A scenario's records in year order.
    pub fn scenario(&self, scenario: &str) -> Vec<AssumptionSet> {
        self.records
            .get(scenario)
            .map(|years| years.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn scenarios(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
}
