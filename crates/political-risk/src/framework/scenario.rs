use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::classifier::{classify, RiskLevel};
use super::domain::{CategoryId, CategoryScores, DomainId, Score};
use super::error::ScoringError;
use super::scoring::{all_domain_scores, overall_score, round_to, DomainScores};

/// Signed score movement for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    pub category: CategoryId,
    pub delta: f64,
    pub reason: String,
}

impl Impact {
    pub fn new(category: CategoryId, delta: f64, reason: impl Into<String>) -> Self {
        Self {
            category,
            delta,
            reason: reason.into(),
        }
    }

    pub fn from_raw(
        category: &str,
        delta: f64,
        reason: impl Into<String>,
    ) -> Result<Self, ScoringError> {
        Ok(Self::new(category.parse()?, delta, reason))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Likelihood {
    Low,
    Moderate,
    High,
}

/// A hypothetical occurrence expressed as deltas against one or more categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactEvent {
    pub id: String,
    pub label: String,
    /// Free-form theme shown next to the event in listings.
    #[serde(default, rename = "category", skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<DomainId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likelihood: Option<Likelihood>,
    pub impacts: Vec<Impact>,
}

static CUSTOM_EVENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_custom_event_id() -> String {
    let id = CUSTOM_EVENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("custom-{id:06}")
}

impl ImpactEvent {
    pub fn new(id: impl Into<String>, label: impl Into<String>, impacts: Vec<Impact>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            topic: None,
            domain: None,
            likelihood: None,
            impacts,
        }
    }

    /// User-authored event (typically built from an evaluated free-text description).
    pub fn custom(label: impl Into<String>, impacts: Vec<Impact>) -> Self {
        Self::new(next_custom_event_id(), label, impacts)
    }

    pub fn net_delta(&self) -> f64 {
        self.impacts.iter().map(|impact| impact.delta).sum()
    }

    pub fn is_custom(&self) -> bool {
        self.id.starts_with("custom-")
    }
}

/// Ordered, id-unique set of events currently applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioSelection {
    events: Vec<ImpactEvent>,
}

impl ScenarioSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when an event with the same id is already selected.
    pub fn select(&mut self, event: ImpactEvent) -> bool {
        if self.is_selected(&event.id) {
            return false;
        }
        self.events.push(event);
        true
    }

    pub fn deselect(&mut self, event_id: &str) -> Option<ImpactEvent> {
        let position = self.events.iter().position(|event| event.id == event_id)?;
        Some(self.events.remove(position))
    }

    /// Flip membership; returns whether the event is selected afterwards.
    pub fn toggle(&mut self, event: ImpactEvent) -> bool {
        if self.deselect(&event.id).is_some() {
            false
        } else {
            self.events.push(event);
            true
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn is_selected(&self, event_id: &str) -> bool {
        self.events.iter().any(|event| event.id == event_id)
    }

    pub fn events(&self) -> &[ImpactEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Projected scores next to the baseline they were derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub category_scores: CategoryScores,
    pub domain_scores: DomainScores,
    pub overall: Score,
    pub delta_overall: f64,
    pub baseline_domain_scores: DomainScores,
    pub baseline_overall: Score,
}

/// One line of the current-vs-projected table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub key: &'static str,
    pub label: &'static str,
    pub current: f64,
    pub projected: f64,
    pub change: f64,
    pub projected_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShift {
    pub category: CategoryId,
    pub from: f64,
    pub to: f64,
}

impl ProjectionResult {
    pub fn overall_level(&self) -> Result<RiskLevel, ScoringError> {
        classify(self.overall.value())
    }

    pub fn comparison(&self) -> Result<Vec<ComparisonRow>, ScoringError> {
        let mut rows = Vec::with_capacity(DomainId::ALL.len() + 1);
        for domain in DomainId::ALL {
            let current = self.baseline_domain_scores.get(domain).value();
            let projected = self.domain_scores.get(domain).value();
            rows.push(ComparisonRow {
                key: domain.as_str(),
                label: domain.short_label(),
                current,
                projected,
                change: round_to(projected - current, 2),
                projected_level: classify(projected)?,
            });
        }

        rows.push(ComparisonRow {
            key: "overall",
            label: "Overall",
            current: self.baseline_overall.value(),
            projected: self.overall.value(),
            change: self.delta_overall,
            projected_level: self.overall_level()?,
        });

        Ok(rows)
    }

    /// Categories whose projected score differs from `baseline`.
    pub fn shifts(&self, baseline: &CategoryScores) -> Vec<CategoryShift> {
        self.category_scores
            .iter()
            .filter_map(|(category, projected)| {
                let from = baseline.get(category)?.value();
                (from != projected.value()).then_some(CategoryShift {
                    category,
                    from,
                    to: projected.value(),
                })
            })
            .collect()
    }
}

/// Apply every impact of every event to a copy of `baseline`, clamp once per category after
/// all deltas are summed, and re-aggregate.
pub fn project(
    baseline: &CategoryScores,
    events: &[ImpactEvent],
) -> Result<ProjectionResult, ScoringError> {
    let baseline_domain_scores = all_domain_scores(baseline)?;
    let baseline_overall = overall_score(baseline)?;

    let mut running: BTreeMap<CategoryId, f64> = baseline
        .iter()
        .map(|(category, score)| (category, score.value()))
        .collect();

    for event in events {
        for impact in &event.impacts {
            if !impact.delta.is_finite() {
                return Err(ScoringError::OutOfRange(impact.delta));
            }
            let slot = running
                .get_mut(&impact.category)
                .ok_or(ScoringError::MissingCategory(impact.category))?;
            *slot += impact.delta;
        }
    }

    let category_scores: CategoryScores = running
        .into_iter()
        .map(|(category, value)| (category, Score::clamped(value)))
        .collect();

    let domain_scores = all_domain_scores(&category_scores)?;
    let overall = overall_score(&category_scores)?;
    let delta_overall = round_to(overall.value() - baseline_overall.value(), 1);

    debug!(
        events = events.len(),
        baseline = baseline_overall.value(),
        projected = overall.value(),
        "scenario projected"
    );

    Ok(ProjectionResult {
        category_scores,
        domain_scores,
        overall,
        delta_overall,
        baseline_domain_scores,
        baseline_overall,
    })
}

pub fn project_selection(
    baseline: &CategoryScores,
    selection: &ScenarioSelection,
) -> Result<ProjectionResult, ScoringError> {
    project(baseline, selection.events())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> CategoryScores {
        CategoryId::ALL
            .into_iter()
            .zip([7.0, 8.0, 6.0, 7.0, 6.0, 7.0, 6.0, 7.0, 6.0, 5.0])
            .map(|(category, value)| (category, Score::new(value).unwrap()))
            .collect()
    }

    fn event(id: &str, impacts: Vec<Impact>) -> ImpactEvent {
        ImpactEvent::new(id, id, impacts)
    }

    #[test]
    fn selection_keeps_order_and_rejects_duplicates() {
        let mut selection = ScenarioSelection::new();
        assert!(selection.select(event("a", Vec::new())));
        assert!(selection.select(event("b", Vec::new())));
        assert!(!selection.select(event("a", Vec::new())));
        assert_eq!(
            selection
                .events()
                .iter()
                .map(|event| event.id.as_str())
                .collect::<Vec<_>>(),
            vec!["a", "b"]
        );

        assert!(!selection.toggle(event("a", Vec::new())));
        assert!(selection.toggle(event("c", Vec::new())));
        assert_eq!(selection.len(), 2);
        assert!(selection.deselect("missing").is_none());
        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn custom_events_get_sequential_ids() {
        let first = ImpactEvent::custom("one", Vec::new());
        let second = ImpactEvent::custom("two", Vec::new());
        assert!(first.is_custom());
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn clamping_happens_after_summation() {
        // 7 + 5 - 4 = 8 when summed first; per-impact clamping would give 6.
        let projection = project(
            &baseline(),
            &[
                event("up", vec![Impact::new(CategoryId::Elections, 5.0, "")]),
                event("down", vec![Impact::new(CategoryId::Elections, -4.0, "")]),
            ],
        )
        .expect("projection");

        assert_eq!(
            projection
                .category_scores
                .get(CategoryId::Elections)
                .unwrap()
                .value(),
            8.0
        );
    }

    #[test]
    fn duplicate_impacts_within_an_event_are_additive() {
        let projection = project(
            &baseline(),
            &[event(
                "dup",
                vec![
                    Impact::new(CategoryId::TradePolicy, 1.0, ""),
                    Impact::new(CategoryId::TradePolicy, 1.5, ""),
                ],
            )],
        )
        .expect("projection");

        assert_eq!(
            projection
                .category_scores
                .get(CategoryId::TradePolicy)
                .unwrap()
                .value(),
            8.5
        );
    }

    #[test]
    fn impacts_on_categories_missing_from_baseline_fail() {
        let partial: CategoryScores = baseline()
            .iter()
            .filter(|(category, _)| *category != CategoryId::FiscalPolicy)
            .collect();
        let result = project(
            &partial,
            &[event("x", vec![Impact::new(CategoryId::FiscalPolicy, 1.0, "")])],
        );
        assert!(matches!(result, Err(ScoringError::MissingCategory(_))));
    }

    #[test]
    fn untyped_impacts_reject_unknown_categories() {
        assert_eq!(
            Impact::from_raw("weather", 1.0, "x"),
            Err(ScoringError::UnknownCategory("weather".to_string()))
        );
    }

    #[test]
    fn comparison_lists_domains_then_overall() {
        let projection = project(
            &baseline(),
            &[event(
                "media",
                vec![Impact::new(CategoryId::MediaFreedom, 2.0, "")],
            )],
        )
        .expect("projection");
        let rows = projection.comparison().expect("rows");

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2].key, "societal-institutional");
        assert_eq!(rows[2].current, 6.0);
        assert_eq!(rows[2].projected, 6.67);
        assert_eq!(rows[2].change, 0.67);
        assert_eq!(rows[3].key, "overall");
        assert_eq!(rows[3].change, projection.delta_overall);

        let shifts = projection.shifts(&baseline());
        assert_eq!(
            shifts,
            vec![CategoryShift {
                category: CategoryId::MediaFreedom,
                from: 7.0,
                to: 9.0
            }]
        );
    }

    #[test]
    fn non_finite_deltas_are_rejected() {
        let result = project(
            &baseline(),
            &[event("nan", vec![Impact::new(CategoryId::Elections, f64::NAN, "")])],
        );
        assert!(matches!(result, Err(ScoringError::OutOfRange(_))));
    }
}
