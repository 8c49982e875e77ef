use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{AltmanConfig, AltmanModelParams, ScoringConfigProvider, ZoneCutPoints};
use crate::ledger::{FinancialSnapshot, Sector};
use crate::math::{div0, round_to};
use crate::{FinScoreError, FinScoreResult};

const COMPONENT_DP: u32 = 6;
const SCORE_DP: u32 = 2;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Z-Score variant, resolved once from the sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AltmanModel {
    /// Five components including revenue / total assets.
    Manufacturing,
    /// Four components plus an additive constant.
    Services,
}

impl AltmanModel {
    pub fn for_sector(sector: Sector) -> Self {
        match sector {
            Sector::Manufacturing => AltmanModel::Manufacturing,
            _ => AltmanModel::Services,
        }
    }

    fn params(self, config: &AltmanConfig) -> &AltmanModelParams {
        match self {
            AltmanModel::Manufacturing => &config.manufacturing,
            AltmanModel::Services => &config.services,
        }
    }
}

impl std::fmt::Display for AltmanModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manufacturing => write!(f, "Z'-Score (Manufacturing)"),
            Self::Services => write!(f, "Z''-Score (Non-Manufacturing)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AltmanZone {
    Safe,
    GrayZone,
    Distress,
}

impl std::fmt::Display for AltmanZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "Safe"),
            Self::GrayZone => write!(f, "Gray Zone"),
            Self::Distress => write!(f, "Distress"),
        }
    }
}

/// The five Altman ratios before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltmanRatios {
    /// Net working capital / total assets
    pub a: Decimal,
    /// Reserves / total assets
    pub b: Decimal,
    /// EBIT / total assets
    pub c: Decimal,
    /// Equity / total debt
    pub d: Decimal,
    /// Revenue / total assets
    pub e: Decimal,
}

impl AltmanRatios {
    pub fn from_snapshot(s: &FinancialSnapshot) -> Self {
        let total_assets = s.total_assets();
        AltmanRatios {
            a: div0(s.working_capital_net(), total_assets),
            b: div0(s.balance_sheet.reserves, total_assets),
            c: div0(s.ebit(), total_assets),
            d: div0(s.total_equity(), s.total_debt()),
            e: div0(s.revenue(), total_assets),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AltmanComponent {
    pub name: String,
    pub ratio: Decimal,
    pub coefficient: Decimal,
    pub weighted_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AltmanScore {
    pub year: i32,
    pub sector: Sector,
    pub model: AltmanModel,
    pub score: Decimal,
    pub zone: AltmanZone,
    pub constant: Decimal,
    pub components: Vec<AltmanComponent>,
    pub cut_points: ZoneCutPoints,
    pub interpretation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Improving,
    Stable,
    Deteriorating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AltmanTrend {
    pub sector: Sector,
    pub scores: Vec<AltmanScore>,
    /// Last score minus first score.
    pub delta: Decimal,
    pub direction: TrendDirection,
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

pub struct AltmanScorer<'a> {
    config: &'a AltmanConfig,
}

impl<'a> AltmanScorer<'a> {
    pub fn new(provider: &'a impl ScoringConfigProvider) -> Self {
        Self {
            config: provider.altman(),
        }
    }

    /// Score one fiscal year with the model the sector calls for.
    pub fn score(&self, snapshot: &FinancialSnapshot, sector: Sector) -> FinScoreResult<AltmanScore> {
        let ratios = AltmanRatios::from_snapshot(snapshot);
        let mut result = self.score_ratios(&ratios, sector)?;
        result.year = snapshot.year;
        Ok(result)
    }

    /// Score pre-computed ratios. `year` is left at zero.
    pub fn score_ratios(&self, ratios: &AltmanRatios, sector: Sector) -> FinScoreResult<AltmanScore> {
        let model = AltmanModel::for_sector(sector);
        let params = model.params(self.config);
        let cut_points = self.cut_points(sector)?;
        let coeff = &params.coefficients;

        let mut components = vec![
            build_component("A: Working Capital / Total Assets", ratios.a, coeff.a),
            build_component("B: Reserves / Total Assets", ratios.b, coeff.b),
            build_component("C: EBIT / Total Assets", ratios.c, coeff.c),
            build_component("D: Equity / Total Debt", ratios.d, coeff.d),
        ];
        if let (AltmanModel::Manufacturing, Some(e)) = (model, coeff.e) {
            components.push(build_component("E: Revenue / Total Assets", ratios.e, e));
        }

        let raw: Decimal = params.constant
            + components
                .iter()
                .map(|c| c.weighted_value)
                .sum::<Decimal>();
        let score = round_to(raw, SCORE_DP);
        let zone = classify_zone(score, cut_points);

        tracing::debug!(%sector, %model, %score, %zone, "altman score computed");

        Ok(AltmanScore {
            year: 0,
            sector,
            model,
            score,
            zone,
            constant: params.constant,
            components,
            cut_points,
            interpretation: interpret(model, zone, cut_points),
        })
    }

    /// Score each year and label the direction from first to last.
    pub fn score_trend(
        &self,
        snapshots: &[FinancialSnapshot],
        sector: Sector,
    ) -> FinScoreResult<AltmanTrend> {
        let mut ordered: Vec<&FinancialSnapshot> = snapshots.iter().collect();
        ordered.sort_by_key(|s| s.year);

        let scores = ordered
            .into_iter()
            .map(|s| self.score(s, sector))
            .collect::<FinScoreResult<Vec<_>>>()?;

        let delta = match (scores.first(), scores.last()) {
            (Some(first), Some(last)) => last.score - first.score,
            _ => Decimal::ZERO,
        };

        Ok(AltmanTrend {
            sector,
            direction: classify_trend(delta, self.config.trend_neutral_band),
            scores,
            delta,
        })
    }

    fn cut_points(&self, sector: Sector) -> FinScoreResult<ZoneCutPoints> {
        self.config
            .cut_points
            .get(&sector)
            .copied()
            .ok_or_else(|| FinScoreError::InvalidConfig {
                field: "altman.cut_points".into(),
                reason: format!("No cut points configured for sector {sector}"),
            })
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn build_component(name: &str, ratio: Decimal, coefficient: Decimal) -> AltmanComponent {
    let ratio = round_to(ratio, COMPONENT_DP);
    AltmanComponent {
        name: name.to_string(),
        ratio,
        coefficient,
        weighted_value: coefficient * ratio,
    }
}

fn classify_zone(score: Decimal, cuts: ZoneCutPoints) -> AltmanZone {
    if score > cuts.safe {
        AltmanZone::Safe
    } else if score < cuts.distress {
        AltmanZone::Distress
    } else {
        AltmanZone::GrayZone
    }
}

fn classify_trend(delta: Decimal, band: Decimal) -> TrendDirection {
    if delta > band {
        TrendDirection::Improving
    } else if delta < -band {
        TrendDirection::Deteriorating
    } else {
        TrendDirection::Stable
    }
}

fn interpret(model: AltmanModel, zone: AltmanZone, cuts: ZoneCutPoints) -> String {
    let body = match zone {
        AltmanZone::Safe => format!(
            "Score above {}: low probability of financial distress over the next two years.",
            cuts.safe
        ),
        AltmanZone::GrayZone => format!(
            "Score between {} and {}: mixed signals, monitor solvency and profitability.",
            cuts.distress, cuts.safe
        ),
        AltmanZone::Distress => format!(
            "Score below {}: high probability of financial distress within two years.",
            cuts.distress
        ),
    };
    format!("{model}: {body}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
