use crate::config::ConfigError;
use crate::framework::evaluation::EvaluationError;
use crate::framework::{DatasetError, ScoringError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Dataset(DatasetError),
    Scoring(ScoringError),
    Evaluation(EvaluationError),
    BadRequest(String),
    NotFound(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_)
            | AppError::Scoring(ScoringError::UnknownCategory(_))
            | AppError::Scoring(ScoringError::UnknownDomain(_)) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Dataset(_)
            | AppError::Scoring(_)
            | AppError::Evaluation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Dataset(err) => write!(f, "dataset error: {}", err),
            AppError::Scoring(err) => write!(f, "{}", err),
            AppError::Evaluation(err) => write!(f, "{}", err.user_message()),
            AppError::BadRequest(message) | AppError::NotFound(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Dataset(err) => Some(err),
            AppError::Scoring(err) => Some(err),
            AppError::Evaluation(err) => Some(err),
            AppError::BadRequest(_) | AppError::NotFound(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<DatasetError> for AppError {
    fn from(value: DatasetError) -> Self {
        Self::Dataset(value)
    }
}

impl From<ScoringError> for AppError {
    fn from(value: ScoringError) -> Self {
        Self::Scoring(value)
    }
}

impl From<EvaluationError> for AppError {
    fn from(value: EvaluationError) -> Self {
        Self::Evaluation(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::CategoryId;

    #[test]
    fn unknown_identifiers_are_client_errors() {
        let unknown = AppError::from(ScoringError::UnknownCategory("weather".to_string()));
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

        let missing = AppError::from(ScoringError::MissingCategory(CategoryId::Elections));
        assert_eq!(missing.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let absent = AppError::NotFound("no case `pb-x`".to_string());
        assert_eq!(absent.status(), StatusCode::NOT_FOUND);
        assert_eq!(absent.to_string(), "no case `pb-x`");
    }

    #[tokio::test]
    async fn responses_carry_error_message() {
        let response = AppError::BadRequest("unknown event id `x`".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(value["error"], "unknown event id `x`");
    }
}
