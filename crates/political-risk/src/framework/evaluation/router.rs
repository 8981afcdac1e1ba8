use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::warn;

use super::EventEvaluator;

/// Router exposing the free-text event evaluation endpoint.
pub fn evaluation_router<E>(evaluator: Arc<E>) -> Router
where
    E: EventEvaluator + 'static,
{
    Router::new()
        .route("/evaluate-event", post(evaluate_event_handler::<E>))
        .route("/api/evaluate-event", post(evaluate_event_handler::<E>))
        .with_state(evaluator)
}

pub(crate) async fn evaluate_event_handler<E>(
    State(evaluator): State<Arc<E>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response
where
    E: EventEvaluator + 'static,
{
    let description = payload.ok().and_then(|Json(body)| {
        body.get("eventDescription")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_owned)
    });

    let Some(description) = description else {
        let payload = json!({ "error": "Event description is required" });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    };

    match evaluator.evaluate(&description).await {
        Ok(evaluation) => (StatusCode::OK, Json(evaluation)).into_response(),
        Err(err) => {
            warn!(error = %err, "event evaluation failed");
            let payload = json!({ "error": err.user_message() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::evaluation::{
        parse_impact_response, EvaluationError, ImpactEvaluation, ImpactParseError,
    };
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    struct CannedEvaluator {
        reply: Result<&'static str, u16>,
    }

    #[async_trait]
    impl EventEvaluator for CannedEvaluator {
        async fn evaluate(
            &self,
            _event_description: &str,
        ) -> Result<ImpactEvaluation, EvaluationError> {
            match self.reply {
                Ok(text) => Ok(parse_impact_response(text)?),
                Err(status) => Err(EvaluationError::UpstreamRejected { status }),
            }
        }
    }

    fn router(reply: Result<&'static str, u16>) -> Router {
        evaluation_router(Arc::new(CannedEvaluator { reply }))
    }

    async fn post_json(router: Router, path: &str, body: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::post(path)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .expect("route executes");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&bytes).expect("json payload"))
    }

    #[tokio::test]
    async fn returns_validated_impacts() {
        let (status, body) = post_json(
            router(Ok(
                r#"Sure! {"impacts":[{"category":"media-freedom","delta": +2,"reason":"raids"}],"summary":"Worse."}"#,
            )),
            "/evaluate-event",
            r#"{"eventDescription": "Newsroom raids"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["impacts"][0]["category"], "media-freedom");
        assert_eq!(body["impacts"][0]["delta"], 2.0);
        assert_eq!(body["summary"], "Worse.");
    }

    #[tokio::test]
    async fn missing_or_non_string_description_is_a_bad_request() {
        for body in [
            r#"{}"#,
            r#"{"eventDescription": 42}"#,
            r#"{"eventDescription": "   "}"#,
            "not json",
        ] {
            let (status, payload) = post_json(router(Ok("{}")), "/evaluate-event", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
            assert_eq!(payload["error"], "Event description is required");
        }
    }

    #[tokio::test]
    async fn upstream_and_parse_failures_are_server_errors() {
        let (status, payload) = post_json(
            router(Ok("I cannot help with that.")),
            "/api/evaluate-event",
            r#"{"eventDescription": "x"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(payload["error"], "Invalid response format");

        let (status, payload) = post_json(
            router(Ok(r#"{"summary": "no impacts"}"#)),
            "/evaluate-event",
            r#"{"eventDescription": "x"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(payload["error"], "Invalid evaluation structure");

        let (status, _) = post_json(
            router(Err(401)),
            "/evaluate-event",
            r#"{"eventDescription": "x"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn parse_errors_convert_into_evaluation_errors() {
        let err: EvaluationError = ImpactParseError::EmptyResult.into();
        assert!(matches!(
            err,
            EvaluationError::Parse(ImpactParseError::EmptyResult)
        ));
    }
}
