//! FGPMI creditworthiness rating.
//!
//! Seven balance-sheet and income indicators are scored against the band
//! tables of the sector's model family, a flat bonus is added for companies
//! above the revenue threshold, and the share of the maximum attainable score
//! is mapped onto ordered rating classes (1 best). All tables come from
//! [`FgpmiConfig`].

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::{
    FgpmiConfig, FgpmiFamily, FgpmiIndicator, RatingClass, ScoreBand, ScoringConfigProvider,
};
use crate::ledger::{FinancialSnapshot, Sector};
use crate::math::{div0, round_ratio, safe_div};
use crate::{FinScoreError, FinScoreResult};

/// Leverage reported when equity is not positive.
const LEVERAGE_CAP: Decimal = dec!(999);

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorScore {
    pub indicator: FgpmiIndicator,
    pub code: String,
    pub label: String,
    pub value: Decimal,
    pub points: Decimal,
    pub max_points: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FgpmiScore {
    pub year: i32,
    pub sector: Sector,
    pub family: FgpmiFamily,
    pub indicators: Vec<IndicatorScore>,
    pub revenue_bonus: Decimal,
    pub total_score: Decimal,
    pub max_score: Decimal,
    /// total_score / max_score, as a fraction.
    pub score_pct: Decimal,
    pub rating: RatingClass,
    pub interpretation: String,
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

pub struct FgpmiScorer<'a> {
    config: &'a FgpmiConfig,
}

impl<'a> FgpmiScorer<'a> {
    pub fn new(provider: &'a impl ScoringConfigProvider) -> Self {
        Self {
            config: provider.fgpmi(),
        }
    }

    pub fn score(&self, snapshot: &FinancialSnapshot, sector: Sector) -> FinScoreResult<FgpmiScore> {
        let family = self.config.family_for(sector)?;
        let tables = self.config.bands(family)?;

        let mut indicators = Vec::with_capacity(FgpmiIndicator::ALL.len());
        for indicator in FgpmiIndicator::ALL {
            let bands = tables
                .get(&indicator)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let value = round_ratio(indicator_value(snapshot, indicator));
            indicators.push(IndicatorScore {
                indicator,
                code: indicator.code().to_string(),
                label: indicator.label().to_string(),
                value,
                points: band_points(bands, value),
                max_points: max_points(bands),
            });
        }

        let bonus = &self.config.revenue_bonus;
        let revenue_bonus = if snapshot.revenue() >= bonus.threshold {
            bonus.points
        } else {
            Decimal::ZERO
        };

        let total_score =
            indicators.iter().map(|i| i.points).sum::<Decimal>() + revenue_bonus;
        let max_score =
            indicators.iter().map(|i| i.max_points).sum::<Decimal>() + bonus.points;
        let score_pct = round_ratio(div0(total_score, max_score));
        let rating = self.classify(score_pct)?.clone();

        tracing::debug!(
            year = snapshot.year,
            %sector,
            %family,
            %total_score,
            %max_score,
            class = rating.class,
            "fgpmi score computed"
        );

        let interpretation = format!(
            "{} ({}): {} of {} points ({}%). {} risk area.",
            rating.code,
            rating.description,
            total_score,
            max_score,
            (score_pct * dec!(100)).round_dp(2),
            rating.risk
        );

        Ok(FgpmiScore {
            year: snapshot.year,
            sector,
            family,
            indicators,
            revenue_bonus,
            total_score,
            max_score,
            score_pct,
            rating,
            interpretation,
        })
    }

    /// Rating class for a score fraction: the best class whose floor is met.
    pub fn classify(&self, score_pct: Decimal) -> FinScoreResult<&'a RatingClass> {
        let config: &'a FgpmiConfig = self.config;
        let classes = &config.classes;
        classes
            .iter()
            .find(|c| score_pct >= c.min_pct)
            .or_else(|| classes.last())
            .ok_or_else(|| FinScoreError::InvalidConfig {
                field: "fgpmi.classes".into(),
                reason: "No rating classes configured".into(),
            })
    }
}

// ---------------------------------------------------------------------------
// Indicators and bands
// ---------------------------------------------------------------------------

pub fn indicator_value(s: &FinancialSnapshot, indicator: FgpmiIndicator) -> Decimal {
    let equity = s.total_equity();
    match indicator {
        FgpmiIndicator::Autonomy => div0(equity, s.total_assets()),
        // No positive equity to lever: worst case.
        FgpmiIndicator::Leverage if equity <= Decimal::ZERO => LEVERAGE_CAP,
        FgpmiIndicator::Leverage => safe_div(s.financial_debt(), equity, LEVERAGE_CAP),
        FgpmiIndicator::DebtToProduction => div0(s.total_debt(), s.production_value()),
        FgpmiIndicator::CurrentRatio => div0(s.current_assets(), s.current_liabilities()),
        FgpmiIndicator::Roe => div0(s.net_profit(), equity),
        FgpmiIndicator::WorkingCapitalToAssets => div0(s.working_capital_net(), s.total_assets()),
        FgpmiIndicator::EbitdaMargin => div0(s.ebitda(), s.revenue()),
    }
}

/// Points of the band containing `value`. Values beyond either end of the
/// table take the nearest band; a value in a gap takes the band below it.
pub fn band_points(bands: &[ScoreBand], value: Decimal) -> Decimal {
    if let Some(band) = bands.iter().find(|b| value >= b.min && value < b.max) {
        return band.points;
    }
    match bands.first() {
        None => Decimal::ZERO,
        Some(first) if value < first.min => first.points,
        Some(first) => bands
            .iter()
            .rev()
            .find(|b| b.min <= value)
            .unwrap_or(first)
            .points,
    }
}

fn max_points(bands: &[ScoreBand]) -> Decimal {
    bands
        .iter()
        .map(|b| b.points)
        .max()
        .unwrap_or(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;

    fn band(min: Decimal, max: Decimal, points: Decimal) -> ScoreBand {
        ScoreBand { min, max, points }
    }

    fn table() -> Vec<ScoreBand> {
        vec![
            band(dec!(0), dec!(1), dec!(1)),
            band(dec!(1), dec!(2), dec!(3)),
            band(dec!(3), dec!(4), dec!(5)),
        ]
    }

    #[test]
    fn test_band_lookup_inside() {
        assert_eq!(band_points(&table(), dec!(0.5)), dec!(1));
        assert_eq!(band_points(&table(), dec!(1)), dec!(3));
        assert_eq!(band_points(&table(), dec!(3.99)), dec!(5));
    }

    #[test]
    fn test_band_lookup_clamps_extremes() {
        assert_eq!(band_points(&table(), dec!(-10)), dec!(1));
        assert_eq!(band_points(&table(), dec!(4)), dec!(5));
        assert_eq!(band_points(&table(), dec!(1000)), dec!(5));
    }

    #[test]
    fn test_band_lookup_gap_takes_lower_band() {
        assert_eq!(band_points(&table(), dec!(2.5)), dec!(3));
    }

    #[test]
    fn test_empty_bands_score_zero() {
        assert_eq!(band_points(&[], dec!(1)), Decimal::ZERO);
        assert_eq!(max_points(&[]), Decimal::ZERO);
    }

    fn with_equity(share_capital: Decimal, bank_debt: Decimal) -> FinancialSnapshot {
        let bs = crate::ledger::BalanceSheet {
            share_capital,
            retained_earnings: dec!(-200_000),
            debts: crate::ledger::Debts {
                bank: crate::ledger::DebtBucket {
                    short_term: bank_debt,
                    long_term: Decimal::ZERO,
                },
                ..Default::default()
            },
            ..Default::default()
        };
        FinancialSnapshot::new("X", 2024, bs, Default::default())
    }

    #[test]
    fn test_leverage_capped_without_positive_equity() {
        // Negative equity, no financial debt: still the worst case.
        let s = with_equity(dec!(100_000), Decimal::ZERO);
        assert_eq!(indicator_value(&s, FgpmiIndicator::Leverage), LEVERAGE_CAP);
        let s = with_equity(dec!(200_000), dec!(50_000));
        assert_eq!(indicator_value(&s, FgpmiIndicator::Leverage), LEVERAGE_CAP);
        let s = with_equity(dec!(300_000), dec!(50_000));
        assert_eq!(indicator_value(&s, FgpmiIndicator::Leverage), dec!(0.5));
    }

    #[test]
    fn test_classify_maps_extremes() {
        let config = ScoringConfig::builtin().unwrap();
        let scorer = FgpmiScorer::new(&config);
        assert_eq!(scorer.classify(dec!(1)).unwrap().class, 1);
        assert_eq!(scorer.classify(dec!(0.90)).unwrap().class, 1);
        assert_eq!(scorer.classify(dec!(0.8999)).unwrap().class, 2);
        assert_eq!(scorer.classify(Decimal::ZERO).unwrap().class, 13);
        assert_eq!(scorer.classify(dec!(-0.5)).unwrap().class, 13);
    }

    #[test]
    fn test_classify_monotonic() {
        let config = ScoringConfig::builtin().unwrap();
        let scorer = FgpmiScorer::new(&config);
        let mut previous = 13u8;
        let mut pct = Decimal::ZERO;
        while pct <= Decimal::ONE {
            let class = scorer.classify(pct).unwrap().class;
            assert!(class <= previous, "class rose from {previous} to {class} at {pct}");
            previous = class;
            pct += dec!(0.01);
        }
    }
}
