//! Free-text event evaluation: an upstream text-generation service estimates category deltas,
//! and the parser validates its reply before anything reaches the scenario projector.

mod client;
mod parser;
pub mod router;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::scenario::Impact;

pub use client::{system_prompt, user_prompt, AnthropicEvaluator};
pub use parser::{parse_impact_response, ImpactParseError};
pub use router::evaluation_router;

/// Validated impacts estimated for one event description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactEvaluation {
    pub impacts: Vec<Impact>,
    pub summary: String,
    /// Entries discarded during validation.
    #[serde(skip)]
    pub dropped: usize,
}

/// Source of impact estimates for free-text events.
#[async_trait]
pub trait EventEvaluator: Send + Sync {
    async fn evaluate(&self, event_description: &str) -> Result<ImpactEvaluation, EvaluationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("impact evaluator unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("impact evaluator rejected the request with status {status}")]
    UpstreamRejected { status: u16 },
    #[error("impact evaluator returned an empty reply")]
    EmptyReply,
    #[error(transparent)]
    Parse(#[from] ImpactParseError),
}

impl EvaluationError {
    /// Short message safe to show to end users.
    pub fn user_message(&self) -> &'static str {
        match self {
            EvaluationError::UpstreamUnavailable(_) | EvaluationError::UpstreamRejected { .. } => {
                "Failed to evaluate event"
            }
            EvaluationError::EmptyReply => "No response from evaluator",
            EvaluationError::Parse(ImpactParseError::NoJsonFound)
            | EvaluationError::Parse(ImpactParseError::InvalidJson(_)) => {
                "Invalid response format"
            }
            EvaluationError::Parse(ImpactParseError::MalformedShape(_)) => {
                "Invalid evaluation structure"
            }
            EvaluationError::Parse(ImpactParseError::EmptyResult) => {
                "Evaluation did not identify any affected categories"
            }
        }
    }
}
