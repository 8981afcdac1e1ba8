use serde::{Deserialize, Serialize};

use super::domain::{CategoryScores, DomainId, Score};
use super::error::ScoringError;

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Domain averages keyed the way the dashboard serializes them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DomainScores {
    pub rule_of_law: Score,
    pub operating_economic: Score,
    pub societal_institutional: Score,
}

impl DomainScores {
    pub fn get(&self, domain: DomainId) -> Score {
        match domain {
            DomainId::RuleOfLaw => self.rule_of_law,
            DomainId::OperatingEconomic => self.operating_economic,
            DomainId::SocietalInstitutional => self.societal_institutional,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (DomainId, Score)> + '_ {
        DomainId::ALL
            .into_iter()
            .map(move |domain| (domain, self.get(domain)))
    }
}

/// Mean of the domain's owned categories, rounded to 2 decimals.
pub fn domain_score(scores: &CategoryScores, domain: DomainId) -> Result<Score, ScoringError> {
    let owned = domain.categories();
    let mut total = 0.0;
    for category in owned {
        let score = scores
            .get(*category)
            .ok_or(ScoringError::MissingCategory(*category))?;
        total += score.value();
    }

    Score::new(round_to(total / owned.len() as f64, 2))
}

/// Resolve a domain given as an untyped identifier.
pub fn domain_score_by_id(scores: &CategoryScores, domain_id: &str) -> Result<Score, ScoringError> {
    let domain: DomainId = domain_id.parse()?;
    domain_score(scores, domain)
}

pub fn all_domain_scores(scores: &CategoryScores) -> Result<DomainScores, ScoringError> {
    Ok(DomainScores {
        rule_of_law: domain_score(scores, DomainId::RuleOfLaw)?,
        operating_economic: domain_score(scores, DomainId::OperatingEconomic)?,
        societal_institutional: domain_score(scores, DomainId::SocietalInstitutional)?,
    })
}

/// Unweighted mean of every category, rounded to 1 decimal.
///
/// The map must cover the whole vocabulary. Note the precision differs from [`domain_score`].
pub fn overall_score(scores: &CategoryScores) -> Result<Score, ScoringError> {
    if let Some(missing) = scores.first_missing() {
        return Err(ScoringError::MissingCategory(missing));
    }

    let total: f64 = scores.iter().map(|(_, score)| score.value()).sum();
    Score::new(round_to(total / scores.len() as f64, 1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeDirection {
    Up,
    Down,
    Same,
}

/// Magnitude and direction of movement between two assessments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreChange {
    pub change: f64,
    pub direction: ChangeDirection,
}

pub fn score_change(current: f64, previous: f64) -> ScoreChange {
    let change = round_to(current - previous, 2);
    let direction = if change > 0.0 {
        ChangeDirection::Up
    } else if change < 0.0 {
        ChangeDirection::Down
    } else {
        ChangeDirection::Same
    };

    ScoreChange {
        change: change.abs(),
        direction,
    }
}
