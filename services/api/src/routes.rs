use crate::infra::AppState;
use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::NaiveDate;
use political_risk::error::AppError;
use political_risk::framework::actions::{
    Action, ActionCategory, ActionSortKey, CaseDetail, Pushback, PushbackSortKey, SortDirection,
    TrackerSummary,
};
use political_risk::framework::assessment::AssessmentView;
use political_risk::framework::economic::{impact_overview, ImpactOverview};
use political_risk::framework::evaluation::{evaluation_router, EventEvaluator};
use political_risk::framework::history::{HistoricalSnapshot, PeriodChange};
use political_risk::framework::scenario::{CategoryShift, ComparisonRow, Likelihood};
use political_risk::framework::{
    project, CategoryContext, CategoryId, DomainId, Impact, ImpactEvent, ProjectionResult,
    RiskLevel,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ScenarioEventsQuery {
    #[serde(default)]
    pub(crate) domain: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScenarioEventsResponse {
    pub(crate) events: Vec<ImpactEvent>,
    pub(crate) likelihood_descriptions: BTreeMap<Likelihood, String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawImpact {
    pub(crate) category: String,
    pub(crate) delta: f64,
    #[serde(default)]
    pub(crate) reason: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CustomEventRequest {
    pub(crate) label: String,
    pub(crate) impacts: Vec<RawImpact>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectionRequest {
    #[serde(default)]
    pub(crate) event_ids: Vec<String>,
    #[serde(default)]
    pub(crate) custom_events: Vec<CustomEventRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectionResponse {
    pub(crate) events: Vec<ImpactEvent>,
    pub(crate) projection: ProjectionResult,
    pub(crate) overall_level: RiskLevel,
    pub(crate) comparison: Vec<ComparisonRow>,
    pub(crate) shifts: Vec<CategoryShift>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryResponse {
    pub(crate) snapshots: Vec<HistoricalSnapshot>,
    pub(crate) period_changes: Vec<PeriodChange>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ActionsQuery {
    #[serde(default)]
    pub(crate) q: Option<String>,
    #[serde(default)]
    pub(crate) category: Option<ActionCategory>,
    #[serde(default)]
    pub(crate) sort: Option<ActionSortKey>,
    #[serde(default)]
    pub(crate) direction: Option<SortDirection>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ActionsResponse {
    pub(crate) last_updated: Option<NaiveDate>,
    pub(crate) actions: Vec<Action>,
    pub(crate) pushback: Vec<Pushback>,
    pub(crate) summary: TrackerSummary,
}

pub(crate) fn with_framework_routes<E>(evaluator: Arc<E>) -> Router
where
    E: EventEvaluator + 'static,
{
    evaluation_router(evaluator)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/assessment", get(assessment_endpoint))
        .route("/api/v1/scenarios/events", get(scenario_events_endpoint))
        .route("/api/v1/scenarios/project", post(project_endpoint))
        .route("/api/v1/economic-impact", get(economic_impact_endpoint))
        .route("/api/v1/history", get(history_endpoint))
        .route("/api/v1/categories/:id", get(category_endpoint))
        .route("/api/v1/actions", get(actions_endpoint))
        .route("/api/v1/actions/cases/:id", get(case_detail_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn assessment_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<AssessmentView>, AppError> {
    Ok(Json(state.dataset.assessment.view()?))
}

pub(crate) async fn scenario_events_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<ScenarioEventsQuery>,
) -> Result<Json<ScenarioEventsResponse>, AppError> {
    let library = &state.dataset.scenarios;
    let events = match query.domain.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            let domain: DomainId = raw.parse()?;
            library.by_domain(domain).cloned().collect()
        }
        _ => library.events.clone(),
    };

    Ok(Json(ScenarioEventsResponse {
        events,
        likelihood_descriptions: library.likelihood_descriptions.clone(),
    }))
}

pub(crate) async fn project_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ProjectionRequest>,
) -> Result<Json<ProjectionResponse>, AppError> {
    let dataset = &state.dataset;
    let mut events = dataset
        .resolve_events(&payload.event_ids)
        .map_err(|id| AppError::BadRequest(format!("unknown scenario event '{id}'")))?;

    for custom in payload.custom_events {
        let impacts = custom
            .impacts
            .into_iter()
            .map(|raw| Impact::from_raw(&raw.category, raw.delta, raw.reason))
            .collect::<Result<Vec<_>, _>>()?;
        events.push(ImpactEvent::custom(custom.label, impacts));
    }

    let projection = project(&dataset.baseline, &events)?;
    let overall_level = projection.overall_level()?;
    let comparison = projection.comparison()?;
    let shifts = projection.shifts(&dataset.baseline);

    Ok(Json(ProjectionResponse {
        events,
        projection,
        overall_level,
        comparison,
        shifts,
    }))
}

pub(crate) async fn economic_impact_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<ImpactOverview> {
    Json(impact_overview(&state.dataset.economic, &state.dataset.baseline))
}

pub(crate) async fn history_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<HistoryResponse> {
    let history = &state.dataset.history;
    Json(HistoryResponse {
        snapshots: history.snapshots().to_vec(),
        period_changes: history.period_changes(),
    })
}

pub(crate) async fn category_endpoint(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CategoryContext>, AppError> {
    let category: CategoryId = id.parse()?;
    Ok(Json(CategoryContext::build(&state.dataset, category)?))
}

pub(crate) async fn actions_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<ActionsQuery>,
) -> Json<ActionsResponse> {
    let mut tracker = state.dataset.actions.search(query.q.as_deref().unwrap_or_default());
    if let Some(category) = query.category {
        tracker = tracker.filter_by_category(&[category]);
    }

    let direction = query.direction.unwrap_or_default();
    tracker.sort_actions(query.sort.unwrap_or_default(), direction);
    tracker.sort_pushback(PushbackSortKey::Date, direction);
    let summary = tracker.summary();

    Json(ActionsResponse {
        last_updated: tracker.last_updated,
        actions: tracker.actions,
        pushback: tracker.pushback,
        summary,
    })
}

pub(crate) async fn case_detail_endpoint(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CaseDetail>, AppError> {
    state
        .dataset
        .actions
        .case_detail(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("unknown case '{id}'")))
}
