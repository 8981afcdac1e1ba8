use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::domain::{CategoryId, CategoryScores};
use super::scoring::round_to;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Market,
    Economic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSensitivity {
    /// Signed; only the magnitude feeds the impact score.
    pub weight: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskThreshold {
    pub max: f64,
    pub impact: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub low: RiskThreshold,
    pub moderate: RiskThreshold,
    pub high: RiskThreshold,
    pub severe: RiskThreshold,
}

impl RiskThresholds {
    fn band(&self, score: f64) -> &RiskThreshold {
        if score <= self.low.max {
            &self.low
        } else if score <= self.moderate.max {
            &self.moderate
        } else if score <= self.high.max {
            &self.high
        } else {
            &self.severe
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorReading {
    pub value: f64,
    pub as_of: NaiveDate,
    pub source: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub prior_year_value: Option<f64>,
    #[serde(default)]
    pub year_over_year_change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomicIndicator {
    pub id: String,
    pub name: String,
    pub category: IndicatorKind,
    pub unit: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub current_data: Option<IndicatorReading>,
    pub sensitivity: BTreeMap<CategoryId, IndicatorSensitivity>,
    pub risk_thresholds: RiskThresholds,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomicIndicatorSet {
    #[serde(default)]
    pub last_updated: Option<NaiveDate>,
    #[serde(default)]
    pub indicators: Vec<EconomicIndicator>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactDriver {
    pub category: CategoryId,
    pub contribution: f64,
}

/// How strongly current political risk bears on one indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorImpact {
    pub indicator_id: String,
    pub name: String,
    pub kind: IndicatorKind,
    pub score: f64,
    pub level: String,
    pub color: String,
    pub top_drivers: Vec<ImpactDriver>,
}

/// Weighted share of the maximum possible exposure, on a 0-10 scale rounded to 1 decimal.
/// Categories missing from `scores` contribute nothing.
pub fn indicator_impact(indicator: &EconomicIndicator, scores: &CategoryScores) -> IndicatorImpact {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    let mut drivers = Vec::with_capacity(indicator.sensitivity.len());

    for (category, sensitivity) in &indicator.sensitivity {
        let score = scores.get(*category).map(|score| score.value()).unwrap_or(0.0);
        let weight = sensitivity.weight.abs();
        let contribution = score * weight;
        weighted_sum += contribution;
        total_weight += weight * 10.0;
        drivers.push(ImpactDriver {
            category: *category,
            contribution,
        });
    }

    let raw = if total_weight > 0.0 {
        weighted_sum / total_weight * 10.0
    } else {
        0.0
    };
    let score = round_to(raw, 1);
    let band = indicator.risk_thresholds.band(score);

    drivers.sort_by(|left, right| right.contribution.total_cmp(&left.contribution));
    drivers.truncate(3);

    IndicatorImpact {
        indicator_id: indicator.id.clone(),
        name: indicator.name.clone(),
        kind: indicator.category,
        score,
        level: band.impact.clone(),
        color: band.color.clone(),
        top_drivers: drivers,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactOverview {
    pub market_impact_score: f64,
    pub economic_impact_score: f64,
    pub indicators: Vec<IndicatorImpact>,
}

pub fn impact_overview(set: &EconomicIndicatorSet, scores: &CategoryScores) -> ImpactOverview {
    let indicators: Vec<IndicatorImpact> = set
        .indicators
        .iter()
        .map(|indicator| indicator_impact(indicator, scores))
        .collect();

    ImpactOverview {
        market_impact_score: mean_for(&indicators, IndicatorKind::Market),
        economic_impact_score: mean_for(&indicators, IndicatorKind::Economic),
        indicators,
    }
}

fn mean_for(impacts: &[IndicatorImpact], kind: IndicatorKind) -> f64 {
    let scores: Vec<f64> = impacts
        .iter()
        .filter(|impact| impact.kind == kind)
        .map(|impact| impact.score)
        .collect();
    if scores.is_empty() {
        return 0.0;
    }
    round_to(scores.iter().sum::<f64>() / scores.len() as f64, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::domain::Score;

    fn threshold(max: f64, impact: &str) -> RiskThreshold {
        RiskThreshold {
            max,
            impact: impact.to_string(),
            color: impact.to_lowercase(),
        }
    }

    fn indicator(
        id: &str,
        kind: IndicatorKind,
        weights: &[(CategoryId, f64)],
    ) -> EconomicIndicator {
        EconomicIndicator {
            id: id.to_string(),
            name: id.to_uppercase(),
            category: kind,
            unit: "index".to_string(),
            description: String::new(),
            current_data: None,
            sensitivity: weights
                .iter()
                .map(|(category, weight)| {
                    (
                        *category,
                        IndicatorSensitivity {
                            weight: *weight,
                            description: String::new(),
                        },
                    )
                })
                .collect(),
            risk_thresholds: RiskThresholds {
                low: threshold(3.0, "Low"),
                moderate: threshold(5.0, "Moderate"),
                high: threshold(7.0, "High"),
                severe: threshold(10.0, "Severe"),
            },
        }
    }

    fn scores() -> CategoryScores {
        [
            (CategoryId::TradePolicy, 8.0),
            (CategoryId::FiscalPolicy, 6.0),
            (CategoryId::Elections, 4.0),
        ]
        .into_iter()
        .map(|(category, value)| (category, Score::new(value).unwrap()))
        .collect()
    }

    #[test]
    fn weighted_impact_uses_weight_magnitudes() {
        let vix = indicator(
            "vix",
            IndicatorKind::Market,
            &[(CategoryId::TradePolicy, 0.8), (CategoryId::FiscalPolicy, -0.2)],
        );
        let impact = indicator_impact(&vix, &scores());
        // (8*0.8 + 6*0.2) / (10*0.8 + 10*0.2) * 10 = 7.6
        assert_eq!(impact.score, 7.6);
        assert_eq!(impact.level, "Severe");
        assert_eq!(impact.top_drivers[0].category, CategoryId::TradePolicy);
    }

    #[test]
    fn indicators_without_weights_score_zero() {
        let empty = indicator("empty", IndicatorKind::Economic, &[]);
        let impact = indicator_impact(&empty, &scores());
        assert_eq!(impact.score, 0.0);
        assert_eq!(impact.level, "Low");
    }

    #[test]
    fn drivers_are_capped_at_three() {
        let broad = indicator(
            "broad",
            IndicatorKind::Economic,
            &[
                (CategoryId::TradePolicy, 0.5),
                (CategoryId::FiscalPolicy, 0.5),
                (CategoryId::Elections, 0.5),
                (CategoryId::MediaFreedom, 0.5),
            ],
        );
        let impact = indicator_impact(&broad, &scores());
        assert_eq!(impact.top_drivers.len(), 3);
        // media-freedom has no score and contributes nothing: 18*0.5 / 20 * 10 = 4.5
        assert_eq!(impact.score, 4.5);
    }

    #[test]
    fn overview_averages_each_kind_separately() {
        let set = EconomicIndicatorSet {
            last_updated: None,
            indicators: vec![
                indicator("a", IndicatorKind::Market, &[(CategoryId::TradePolicy, 1.0)]),
                indicator("b", IndicatorKind::Market, &[(CategoryId::Elections, 1.0)]),
                indicator("c", IndicatorKind::Economic, &[(CategoryId::FiscalPolicy, 1.0)]),
            ],
        };
        let overview = impact_overview(&set, &scores());
        assert_eq!(overview.market_impact_score, 6.0);
        assert_eq!(overview.economic_impact_score, 6.0);
        assert_eq!(overview.indicators.len(), 3);
    }
}
