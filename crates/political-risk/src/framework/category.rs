//! Drill-down for a single risk category: its history, the executive actions and pushback in the
//! policy areas it covers, the scenarios that move it, and the indicators sensitive to it.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::actions::{Action, ActionCategory, ActionStatus, Pushback};
use super::classifier::{classify, RiskLevel};
use super::dataset::FrameworkDataset;
use super::domain::{CategoryId, DomainId, RubricTier, Score, Trend};
use super::error::ScoringError;
use super::scenario::Likelihood;
use super::scoring::{domain_score, score_change, ScoreChange};

/// Policy areas of executive actions that bear on a risk category.
pub const fn action_categories_for(category: CategoryId) -> &'static [ActionCategory] {
    match category {
        CategoryId::Elections => &[ActionCategory::CivilRights, ActionCategory::GovernmentReform],
        CategoryId::RuleOfLaw => &[ActionCategory::Judiciary, ActionCategory::Immigration],
        CategoryId::NationalSecurity => {
            &[ActionCategory::ForeignPolicy, ActionCategory::Immigration]
        }
        CategoryId::RegulatoryStability => &[
            ActionCategory::Environment,
            ActionCategory::Healthcare,
            ActionCategory::Education,
        ],
        CategoryId::TradePolicy => &[ActionCategory::EconomicPolicy, ActionCategory::ForeignPolicy],
        CategoryId::GovernmentContracts => &[
            ActionCategory::GovernmentReform,
            ActionCategory::EconomicPolicy,
        ],
        CategoryId::FiscalPolicy => &[ActionCategory::EconomicPolicy],
        CategoryId::MediaFreedom => &[ActionCategory::MediaPress],
        CategoryId::CivilDiscourse => &[ActionCategory::CivilRights],
        CategoryId::InstitutionalIntegrity => &[
            ActionCategory::GovernmentReform,
            ActionCategory::Judiciary,
        ],
    }
}

/// Category score at one historical snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorePoint {
    pub date: NaiveDate,
    pub score: f64,
    /// Prior score when the category moved in this period.
    pub from: Option<f64>,
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedScenario {
    pub id: String,
    pub label: String,
    pub likelihood: Option<Likelihood>,
    /// Summed deltas the event applies to this category; zero when only its theme matches.
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitiveIndicator {
    pub indicator_id: String,
    pub name: String,
    pub weight: f64,
    pub description: String,
    pub unit: String,
    pub value: Option<f64>,
    pub year_over_year_change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerCategory {
    pub category: CategoryId,
    pub label: &'static str,
    pub score: Score,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryContext {
    pub category: CategoryId,
    pub label: &'static str,
    pub description: &'static str,
    pub domain: DomainId,
    pub domain_label: &'static str,
    pub domain_score: Score,
    pub score: Score,
    pub risk_level: RiskLevel,
    pub trend: Trend,
    pub rubric_tier: RubricTier,
    pub key_findings: Vec<String>,
    pub sources: Vec<String>,
    pub last_updated: NaiveDate,
    pub previous_score: Option<f64>,
    pub change: Option<ScoreChange>,
    pub evolution: Vec<ScorePoint>,
    pub action_categories: &'static [ActionCategory],
    pub related_actions: Vec<Action>,
    pub action_status_counts: BTreeMap<ActionStatus, usize>,
    pub related_pushback: Vec<Pushback>,
    pub related_scenarios: Vec<RelatedScenario>,
    pub sensitive_indicators: Vec<SensitiveIndicator>,
    pub peers: Vec<PeerCategory>,
}

impl CategoryContext {
    pub fn build(dataset: &FrameworkDataset, category: CategoryId) -> Result<Self, ScoringError> {
        let entry = dataset
            .assessment
            .scores
            .get(&category)
            .ok_or(ScoringError::MissingCategory(category))?;
        let domain = category.domain();
        let current = entry.score.value();

        // Latest snapshot taken before the published assessment.
        let previous_score = dataset
            .history
            .snapshots()
            .iter()
            .rev()
            .find(|snapshot| snapshot.date < dataset.assessment.assessment_date)
            .and_then(|snapshot| snapshot.scores.get(category))
            .map(Score::value);

        let action_categories = action_categories_for(category);
        let tracker = dataset.actions.filter_by_category(action_categories);

        Ok(Self {
            category,
            label: category.label(),
            description: category.description(),
            domain,
            domain_label: domain.label(),
            domain_score: domain_score(&dataset.baseline, domain)?,
            score: entry.score,
            risk_level: classify(current)?,
            trend: entry.trend,
            rubric_tier: RubricTier::for_score(current),
            key_findings: entry.key_findings.clone(),
            sources: entry.sources.clone(),
            last_updated: entry.last_updated,
            previous_score,
            change: previous_score.map(|previous| score_change(current, previous)),
            evolution: evolution(dataset, category),
            action_categories,
            action_status_counts: tracker.status_counts(),
            related_actions: tracker.actions,
            related_pushback: tracker.pushback,
            related_scenarios: related_scenarios(dataset, category),
            sensitive_indicators: sensitive_indicators(dataset, category),
            peers: domain
                .categories()
                .iter()
                .filter(|peer| **peer != category)
                .filter_map(|peer| {
                    Some(PeerCategory {
                        category: *peer,
                        label: peer.label(),
                        score: dataset.baseline.get(*peer)?,
                    })
                })
                .collect(),
        })
    }
}

fn evolution(dataset: &FrameworkDataset, category: CategoryId) -> Vec<ScorePoint> {
    let history = &dataset.history;
    history
        .snapshots()
        .iter()
        .zip(history.period_changes())
        .filter_map(|(snapshot, period)| {
            let score = snapshot.scores.get(category)?.value();
            let from = period
                .category_changes
                .iter()
                .find(|movement| movement.category == category)
                .map(|movement| movement.from);
            Some(ScorePoint {
                date: snapshot.date,
                score,
                from,
                changed: from.is_some(),
            })
        })
        .collect()
}

fn related_scenarios(dataset: &FrameworkDataset, category: CategoryId) -> Vec<RelatedScenario> {
    dataset
        .scenarios
        .events
        .iter()
        .filter(|event| {
            event.topic.as_deref().is_some_and(|topic| {
                topic.eq_ignore_ascii_case(category.as_str())
                    || topic.eq_ignore_ascii_case(category.label())
            }) || event
                .impacts.iter().any(|impact| impact.category == category)
        })
        .map(|event| RelatedScenario {
            id: event.id.clone(),
            label: event.label.clone(),
            likelihood: event.likelihood,
            delta: event
                .impacts
                .iter()
                .filter(|impact| impact.category == category)
                .map(|impact| impact.delta)
                .sum(),
        })
        .collect()
}

fn sensitive_indicators(
    dataset: &FrameworkDataset,
    category: CategoryId,
) -> Vec<SensitiveIndicator> {
    let mut indicators: Vec<SensitiveIndicator> = dataset
        .economic
        .indicators
        .iter()
        .filter_map(|indicator| {
            let sensitivity = indicator.sensitivity.get(&category)?;
            let reading = indicator.current_data.as_ref();
            Some(SensitiveIndicator {
                indicator_id: indicator.id.clone(),
                name: indicator.name.clone(),
                weight: sensitivity.weight.abs(),
                description: sensitivity.description.clone(),
                unit: indicator.unit.clone(),
                value: reading.map(|reading| reading.value),
                year_over_year_change: reading.and_then(|reading| reading.year_over_year_change),
            })
        })
        .collect();
    indicators.sort_by(|left, right| right.weight.total_cmp(&left.weight));
    indicators
}
