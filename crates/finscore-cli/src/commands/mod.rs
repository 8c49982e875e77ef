pub mod analyze;
pub mod cash_flow;
pub mod forecast;
pub mod ratios;
pub mod scoring;

use std::time::Instant;

use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use finscore_core::config::ScoringConfig;
use finscore_core::depreciation::DepreciationSplit;
use finscore_core::ledger::FinancialSnapshot;
use finscore_core::with_metadata;

use crate::input;

/// Commands that use no threshold tables report this as the config version.
const NO_CONFIG: &str = "none";

/// How depreciation is attributed to fixed-asset categories
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SplitPolicy {
    /// Pro rata to the prior year's intangible and tangible balances
    Proportional,
    /// 30% intangible, 60% tangible, 10% financial
    Legacy,
}

impl From<SplitPolicy> for DepreciationSplit {
    fn from(policy: SplitPolicy) -> Self {
        match policy {
            SplitPolicy::Proportional => DepreciationSplit::Proportional,
            SplitPolicy::Legacy => DepreciationSplit::legacy_fixed(),
        }
    }
}

/// A single snapshot or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SnapshotInput {
    One(Box<FinancialSnapshot>),
    Many(Vec<FinancialSnapshot>),
}

impl SnapshotInput {
    pub fn into_vec(self) -> Vec<FinancialSnapshot> {
        match self {
            SnapshotInput::One(s) => vec![*s],
            SnapshotInput::Many(v) => v,
        }
    }
}

pub fn read_snapshots(path: Option<&str>) -> Result<Vec<FinancialSnapshot>, Box<dyn std::error::Error>> {
    let snapshots = input::read_input::<SnapshotInput>(path)?.into_vec();
    if snapshots.is_empty() {
        return Err("input contains no snapshots".into());
    }
    Ok(snapshots)
}

/// Accept a fixed-cost share only within [0, 1].
pub fn fixed_cost_share(share: Decimal) -> Result<Decimal, Box<dyn std::error::Error>> {
    if share < Decimal::ZERO || share > Decimal::ONE {
        return Err("--fixed-cost-share must be between 0 and 1".into());
    }
    Ok(share)
}

pub fn load_config(path: Option<&str>) -> Result<ScoringConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => ScoringConfig::from_path(input::resolve_path(p)?)?,
        None => ScoringConfig::builtin()?,
    };
    tracing::debug!(version = %config.version, "scoring configuration loaded");
    Ok(config)
}

/// Wrap a result in the standard output envelope.
pub fn envelope<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    config_version: Option<&str>,
    warnings: Vec<String>,
    start: Instant,
    result: T,
) -> Result<Value, Box<dyn std::error::Error>> {
    let elapsed = start.elapsed().as_micros() as u64;
    let output = with_metadata(
        methodology,
        assumptions,
        config_version.unwrap_or(NO_CONFIG),
        warnings,
        elapsed,
        result,
    );
    Ok(serde_json::to_value(output)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_cost_share_bounds() {
        assert_eq!(fixed_cost_share(Decimal::ZERO).unwrap(), Decimal::ZERO);
        assert_eq!(fixed_cost_share(Decimal::ONE).unwrap(), Decimal::ONE);
        assert!(fixed_cost_share(Decimal::new(-1, 2)).is_err());
        assert!(fixed_cost_share(Decimal::new(101, 2)).is_err());
    }
}
