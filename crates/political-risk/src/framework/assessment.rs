use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::classifier::{classify, RiskLevel};
use super::domain::{CategoryId, CategoryScores, DomainId, RubricTier, Score, Trend};
use super::error::ScoringError;
use super::scoring::{all_domain_scores, overall_score};

/// Published score and context for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAssessment {
    pub score: Score,
    pub trend: Trend,
    #[serde(default)]
    pub key_findings: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    pub last_updated: NaiveDate,
}

/// The currently published (baseline) assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentAssessment {
    pub assessment_date: NaiveDate,
    pub assessment_period: String,
    pub scores: BTreeMap<CategoryId, CategoryAssessment>,
}

impl CurrentAssessment {
    pub fn baseline(&self) -> CategoryScores {
        self.scores
            .iter()
            .map(|(category, assessment)| (*category, assessment.score))
            .collect()
    }

    pub fn view(&self) -> Result<AssessmentView, ScoringError> {
        AssessmentView::build(self)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    pub category: CategoryId,
    pub label: &'static str,
    pub score: Score,
    pub risk_level: RiskLevel,
    pub trend: Trend,
    pub rubric_tier: RubricTier,
    pub key_findings: Vec<String>,
    pub last_updated: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainView {
    pub domain: DomainId,
    pub label: &'static str,
    pub description: &'static str,
    pub score: Score,
    pub risk_level: RiskLevel,
    pub categories: Vec<CategoryView>,
}

/// Dashboard-ready rollup of the current assessment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentView {
    pub assessment_date: NaiveDate,
    pub assessment_period: String,
    pub overall_score: Score,
    pub risk_level: RiskLevel,
    pub domains: Vec<DomainView>,
}

impl AssessmentView {
    fn build(assessment: &CurrentAssessment) -> Result<Self, ScoringError> {
        let baseline = assessment.baseline();
        let domain_scores = all_domain_scores(&baseline)?;
        let overall = overall_score(&baseline)?;

        let mut domains = Vec::with_capacity(DomainId::ALL.len());
        for (domain, score) in domain_scores.iter() {
            let mut categories = Vec::with_capacity(domain.categories().len());
            for category in domain.categories() {
                let entry = assessment
                    .scores
                    .get(category)
                    .ok_or(ScoringError::MissingCategory(*category))?;
                categories.push(CategoryView {
                    category: *category,
                    label: category.label(),
                    score: entry.score,
                    risk_level: classify(entry.score.value())?,
                    trend: entry.trend,
                    rubric_tier: RubricTier::for_score(entry.score.value()),
                    key_findings: entry.key_findings.clone(),
                    last_updated: entry.last_updated,
                });
            }

            domains.push(DomainView {
                domain,
                label: domain.label(),
                description: domain.description(),
                score,
                risk_level: classify(score.value())?,
                categories,
            });
        }

        Ok(Self {
            assessment_date: assessment.assessment_date,
            assessment_period: assessment.assessment_period.clone(),
            overall_score: overall,
            risk_level: classify(overall.value())?,
            domains,
        })
    }

    /// Categories sorted from highest to lowest score.
    pub fn ranked_categories(&self) -> Vec<&CategoryView> {
        let mut ranked: Vec<&CategoryView> = self
            .domains
            .iter()
            .flat_map(|domain| domain.categories.iter())
            .collect();
        ranked.sort_by(|left, right| right.score.value().total_cmp(&left.score.value()));
        ranked
    }
}
