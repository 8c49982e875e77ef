//! Scoring configuration: Altman coefficients and cut points, FGPMI band
//! tables, sector-to-family mapping and rating classes.
//!
//! Thresholds are data, not code. A default calibration ships in
//! `config/scoring.yaml` and is embedded at build time; callers may load any
//! other versioned file with [`ScoringConfig::from_path`] and inject it into
//! the scorers through [`ScoringConfigProvider`].

use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::Sector;
use crate::{FinScoreError, FinScoreResult};

pub const BUILTIN_CONFIG: &str = include_str!("../config/scoring.yaml");

// ---------------------------------------------------------------------------
// Provider seam
// ---------------------------------------------------------------------------

/// Supplies threshold tables to the scorers.
pub trait ScoringConfigProvider {
    fn version(&self) -> &str;
    fn altman(&self) -> &AltmanConfig;
    fn fgpmi(&self) -> &FgpmiConfig;
}

// ---------------------------------------------------------------------------
// Altman
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AltmanCoefficients {
    pub a: Decimal,
    pub b: Decimal,
    pub c: Decimal,
    pub d: Decimal,
    /// Only the five-component model weights revenue / total assets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AltmanModelParams {
    #[serde(default)]
    pub constant: Decimal,
    pub coefficients: AltmanCoefficients,
}

/// Scores below `distress` are in distress; scores above `safe` are safe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneCutPoints {
    pub distress: Decimal,
    pub safe: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AltmanConfig {
    pub manufacturing: AltmanModelParams,
    pub services: AltmanModelParams,
    pub cut_points: BTreeMap<Sector, ZoneCutPoints>,
    /// Half-width of the "stable" band for multi-year trends.
    pub trend_neutral_band: Decimal,
}

// ---------------------------------------------------------------------------
// FGPMI
// ---------------------------------------------------------------------------

/// Model families sharing one set of FGPMI band tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FgpmiFamily {
    Industry,
    Trade,
    Services,
    RealEstateConstruction,
}

impl std::fmt::Display for FgpmiFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Industry => write!(f, "Industry"),
            Self::Trade => write!(f, "Trade"),
            Self::Services => write!(f, "Services"),
            Self::RealEstateConstruction => write!(f, "Real Estate & Construction"),
        }
    }
}

/// The seven FGPMI indicators, V1..V7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FgpmiIndicator {
    Autonomy,
    Leverage,
    DebtToProduction,
    CurrentRatio,
    Roe,
    WorkingCapitalToAssets,
    EbitdaMargin,
}

impl FgpmiIndicator {
    pub const ALL: [FgpmiIndicator; 7] = [
        FgpmiIndicator::Autonomy,
        FgpmiIndicator::Leverage,
        FgpmiIndicator::DebtToProduction,
        FgpmiIndicator::CurrentRatio,
        FgpmiIndicator::Roe,
        FgpmiIndicator::WorkingCapitalToAssets,
        FgpmiIndicator::EbitdaMargin,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Autonomy => "V1",
            Self::Leverage => "V2",
            Self::DebtToProduction => "V3",
            Self::CurrentRatio => "V4",
            Self::Roe => "V5",
            Self::WorkingCapitalToAssets => "V6",
            Self::EbitdaMargin => "V7",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Autonomy => "Equity / Total Assets",
            Self::Leverage => "Financial Debt / Equity",
            Self::DebtToProduction => "Total Debt / Production Value",
            Self::CurrentRatio => "Current Assets / Current Liabilities",
            Self::Roe => "Net Profit / Equity",
            Self::WorkingCapitalToAssets => "Net Working Capital / Total Assets",
            Self::EbitdaMargin => "EBITDA / Revenue",
        }
    }
}

/// `points` are awarded for values in `[min, max)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBand {
    pub min: Decimal,
    pub max: Decimal,
    pub points: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueBonus {
    pub threshold: Decimal,
    pub points: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingClass {
    /// 1 is the best class.
    pub class: u8,
    pub code: String,
    /// Lowest score / max-score fraction that still earns this class.
    pub min_pct: Decimal,
    pub description: String,
    pub risk: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FgpmiConfig {
    pub sector_families: BTreeMap<Sector, FgpmiFamily>,
    pub families: BTreeMap<FgpmiFamily, BTreeMap<FgpmiIndicator, Vec<ScoreBand>>>,
    pub revenue_bonus: RevenueBonus,
    /// Ordered best to worst.
    pub classes: Vec<RatingClass>,
}

impl FgpmiConfig {
    pub fn family_for(&self, sector: Sector) -> FinScoreResult<FgpmiFamily> {
        self.sector_families
            .get(&sector)
            .copied()
            .ok_or_else(|| FinScoreError::InvalidConfig {
                field: "fgpmi.sector_families".into(),
                reason: format!("No model family configured for sector {sector}"),
            })
    }

    pub fn bands(
        &self,
        family: FgpmiFamily,
    ) -> FinScoreResult<&BTreeMap<FgpmiIndicator, Vec<ScoreBand>>> {
        self.families
            .get(&family)
            .ok_or_else(|| FinScoreError::InvalidConfig {
                field: "fgpmi.families".into(),
                reason: format!("No band tables configured for family {family}"),
            })
    }
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub version: String,
    pub altman: AltmanConfig,
    pub fgpmi: FgpmiConfig,
}

impl ScoringConfigProvider for ScoringConfig {
    fn version(&self) -> &str {
        &self.version
    }

    fn altman(&self) -> &AltmanConfig {
        &self.altman
    }

    fn fgpmi(&self) -> &FgpmiConfig {
        &self.fgpmi
    }
}

impl ScoringConfig {
    /// The calibration shipped with the crate.
    pub fn builtin() -> FinScoreResult<Self> {
        Self::from_yaml_str(BUILTIN_CONFIG)
    }

    pub fn from_yaml_str(s: &str) -> FinScoreResult<Self> {
        let config: ScoringConfig = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> FinScoreResult<Self> {
        let config: ScoringConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a `.yaml`/`.yml` or `.json` file.
    pub fn from_path(path: impl AsRef<Path>) -> FinScoreResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            FinScoreError::Serialization(format!("Failed to read '{}': {e}", path.display()))
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_yaml_str(&contents),
        }
    }

    pub fn validate(&self) -> FinScoreResult<()> {
        validate_altman(&self.altman)?;
        validate_fgpmi(&self.fgpmi)?;
        tracing::debug!(version = %self.version, "scoring configuration validated");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> FinScoreError {
    FinScoreError::InvalidConfig {
        field: field.into(),
        reason: reason.into(),
    }
}

fn validate_altman(config: &AltmanConfig) -> FinScoreResult<()> {
    if config.manufacturing.coefficients.e.is_none() {
        return Err(invalid(
            "altman.manufacturing.coefficients.e",
            "The manufacturing model needs the revenue / total assets weight",
        ));
    }
    for sector in Sector::ALL {
        let cuts = config.cut_points.get(&sector).ok_or_else(|| {
            invalid("altman.cut_points", format!("Missing cut points for {sector}"))
        })?;
        if cuts.distress > cuts.safe {
            return Err(invalid(
                format!("altman.cut_points.{sector}"),
                "distress cut point must not exceed the safe cut point",
            ));
        }
    }
    if config.trend_neutral_band < Decimal::ZERO {
        return Err(invalid("altman.trend_neutral_band", "must be non-negative"));
    }
    Ok(())
}

fn validate_fgpmi(config: &FgpmiConfig) -> FinScoreResult<()> {
    for sector in Sector::ALL {
        let family = config.family_for(sector)?;
        config.bands(family)?;
    }

    for (family, tables) in &config.families {
        for indicator in FgpmiIndicator::ALL {
            let field = format!("fgpmi.families.{family}.{indicator:?}");
            let bands = tables
                .get(&indicator)
                .ok_or_else(|| invalid(&field, "indicator has no bands"))?;
            if bands.is_empty() {
                return Err(invalid(&field, "indicator has no bands"));
            }
            for band in bands {
                if band.min >= band.max {
                    return Err(invalid(&field, format!("band min {} >= max {}", band.min, band.max)));
                }
                if band.points < Decimal::ZERO {
                    return Err(invalid(&field, "band points must be non-negative"));
                }
            }
            if bands.windows(2).any(|w| w[1].min < w[0].max) {
                return Err(invalid(&field, "bands must be sorted and non-overlapping"));
            }
        }
    }

    if config.revenue_bonus.points < Decimal::ZERO {
        return Err(invalid("fgpmi.revenue_bonus.points", "must be non-negative"));
    }

    let classes = &config.classes;
    if classes.is_empty() {
        return Err(invalid("fgpmi.classes", "at least one rating class is required"));
    }
    for (idx, class) in classes.iter().enumerate() {
        if usize::from(class.class) != idx + 1 {
            return Err(invalid(
                "fgpmi.classes",
                format!("classes must be numbered 1..n in order, found {} at position {}", class.class, idx + 1),
            ));
        }
    }
    if classes.windows(2).any(|w| w[1].min_pct >= w[0].min_pct) {
        return Err(invalid("fgpmi.classes", "min_pct must strictly decrease from best to worst"));
    }
    if classes.last().map(|c| c.min_pct > Decimal::ZERO).unwrap_or(true) {
        return Err(invalid("fgpmi.classes", "the worst class must accept a 0% score"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_builtin_config_loads() {
        let config = ScoringConfig::builtin().unwrap();
        assert!(!config.version.is_empty());
        assert_eq!(config.fgpmi.classes.len(), 13);
        assert_eq!(config.altman.manufacturing.coefficients.a, dec!(0.717));
        assert_eq!(config.altman.services.constant, dec!(3.25));
        assert!(config.altman.services.coefficients.e.is_none());
    }

    #[test]
    fn test_builtin_family_mapping() {
        let config = ScoringConfig::builtin().unwrap();
        let fgpmi = &config.fgpmi;
        assert_eq!(fgpmi.family_for(Sector::Manufacturing).unwrap(), FgpmiFamily::Industry);
        assert_eq!(fgpmi.family_for(Sector::Agriculture).unwrap(), FgpmiFamily::Industry);
        assert_eq!(fgpmi.family_for(Sector::Trade).unwrap(), FgpmiFamily::Trade);
        assert_eq!(fgpmi.family_for(Sector::Services).unwrap(), FgpmiFamily::Services);
        assert_eq!(
            fgpmi.family_for(Sector::Construction).unwrap(),
            FgpmiFamily::RealEstateConstruction
        );
        assert_eq!(
            fgpmi.family_for(Sector::RealEstate).unwrap(),
            FgpmiFamily::RealEstateConstruction
        );
    }

    #[test]
    fn test_json_round_trip_preserves_tables() {
        let config = ScoringConfig::builtin().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let reloaded = ScoringConfig::from_json_str(&json).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_rejects_unsorted_classes() {
        let mut config = ScoringConfig::builtin().unwrap();
        config.fgpmi.classes.swap(0, 1);
        assert!(matches!(
            config.validate(),
            Err(FinScoreError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_rejects_overlapping_bands() {
        let mut config = ScoringConfig::builtin().unwrap();
        let bands = config
            .fgpmi
            .families
            .get_mut(&FgpmiFamily::Industry)
            .unwrap()
            .get_mut(&FgpmiIndicator::CurrentRatio)
            .unwrap();
        bands[1].min = bands[0].min;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_missing_sector_family() {
        let mut config = ScoringConfig::builtin().unwrap();
        config.fgpmi.sector_families.remove(&Sector::Trade);
        let err = config.validate().unwrap_err();
        match err {
            FinScoreError::InvalidConfig { field, .. } => {
                assert_eq!(field, "fgpmi.sector_families");
            }
            other => panic!("Expected InvalidConfig, got {other:?}"),
        }
    }
}
