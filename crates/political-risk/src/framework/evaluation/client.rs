use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::{debug, warn};

use super::{parse_impact_response, EvaluationError, EventEvaluator, ImpactEvaluation};
use crate::config::EvaluatorConfig;
use crate::framework::domain::CategoryId;

const API_VERSION: &str = "2023-06-01";

/// Instruction describing the category vocabulary and the required reply shape.
pub fn system_prompt() -> String {
    let mut prompt = String::from(
        "You are an expert political risk analyst. Evaluate how a hypothetical political event \
         would change risk scores across the 10 categories of a US political risk framework.\n\n\
         Categories:\n",
    );

    for (index, category) in CategoryId::ALL.into_iter().enumerate() {
        let _ = writeln!(
            prompt,
            "{}. {} - {}",
            index + 1,
            category.as_str(),
            category.description()
        );
    }

    prompt.push_str(
        "\nScores run from 1 (low risk) to 10 (severe risk); current US scores sit mostly in the \
         6-9 range.\n\n\
         Estimate the score CHANGE (delta) per affected category, not absolute scores:\n\
         - a positive delta means risk increases, a negative delta means risk decreases\n\
         - most events affect 1-4 categories\n\
         - deltas are usually between -2 and +2; reserve larger values for transformative events\n\n\
         Respond ONLY with valid JSON in exactly this format:\n\
         {\n  \"impacts\": [\n    {\"category\": \"category-id\", \"delta\": <number>, \"reason\": \"brief explanation\"}\n  ],\n  \
         \"summary\": \"One sentence summary of the event's overall effect on political risk\"\n}",
    );

    prompt
}

pub fn user_prompt(event_description: &str) -> String {
    format!(
        "Evaluate this hypothetical political event and its impact on US political risk scores:\n\n\"{event_description}\""
    )
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

enum AttemptError {
    Transient(String),
    Fatal(EvaluationError),
}

/// Evaluator backed by the Anthropic Messages API.
pub struct AnthropicEvaluator {
    client: Client,
    config: EvaluatorConfig,
}

impl AnthropicEvaluator {
    pub fn new(config: EvaluatorConfig) -> Result<Self, EvaluationError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| EvaluationError::UpstreamUnavailable(err.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    async fn request_text(
        &self,
        api_key: &str,
        event_description: &str,
    ) -> Result<String, EvaluationError> {
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system: system_prompt(),
            messages: vec![Message {
                role: "user",
                content: user_prompt(event_description),
            }],
        };

        let attempts = if self.config.retry_transient { 2 } else { 1 };
        let mut attempt = 1;
        loop {
            match self.send_once(api_key, &body).await {
                Ok(text) => return Ok(text),
                Err(AttemptError::Transient(reason)) if attempt < attempts => {
                    warn!(attempt, %reason, "impact evaluator call failed, retrying once");
                    attempt += 1;
                }
                Err(AttemptError::Transient(reason)) => {
                    return Err(EvaluationError::UpstreamUnavailable(reason))
                }
                Err(AttemptError::Fatal(err)) => return Err(err),
            }
        }
    }

    async fn send_once(
        &self,
        api_key: &str,
        body: &MessagesRequest<'_>,
    ) -> Result<String, AttemptError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() || err.is_connect() {
                    AttemptError::Transient(err.to_string())
                } else {
                    AttemptError::Fatal(EvaluationError::UpstreamUnavailable(err.to_string()))
                }
            })?;

        let status = response.status();
        if status.is_server_error() {
            return Err(AttemptError::Transient(format!("upstream answered {status}")));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %detail, "impact evaluator rejected request");
            return Err(AttemptError::Fatal(rejection(status)));
        }

        let payload: MessagesResponse = response.json().await.map_err(|err| {
            AttemptError::Fatal(EvaluationError::UpstreamUnavailable(format!(
                "malformed upstream body: {err}"
            )))
        })?;

        payload
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(AttemptError::Fatal(EvaluationError::EmptyReply))
    }
}

fn rejection(status: StatusCode) -> EvaluationError {
    EvaluationError::UpstreamRejected {
        status: status.as_u16(),
    }
}

#[async_trait]
impl EventEvaluator for AnthropicEvaluator {
    async fn evaluate(&self, event_description: &str) -> Result<ImpactEvaluation, EvaluationError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            EvaluationError::UpstreamUnavailable("ANTHROPIC_API_KEY not configured".to_string())
        })?;

        let text = self.request_text(api_key, event_description).await?;
        let evaluation = parse_impact_response(&text)?;
        debug!(
            impacts = evaluation.impacts.len(),
            dropped = evaluation.dropped,
            "event evaluated"
        );
        Ok(evaluation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_lists_every_category() {
        let prompt = system_prompt();
        for category in CategoryId::ALL {
            assert!(prompt.contains(category.as_str()), "{category} missing");
        }
        assert!(prompt.contains("\"impacts\""));
    }

    #[test]
    fn user_prompt_quotes_the_description() {
        assert!(user_prompt("Court packing").ends_with("\"Court packing\""));
    }

    #[tokio::test]
    async fn missing_api_key_is_reported_without_a_network_call() {
        let evaluator = AnthropicEvaluator::new(EvaluatorConfig {
            api_url: "http://127.0.0.1:9/unreachable".to_string(),
            ..EvaluatorConfig::default()
        })
        .expect("client builds");

        let err = evaluator
            .evaluate("anything")
            .await
            .expect_err("no key configured");
        assert!(matches!(
            err,
            EvaluationError::UpstreamUnavailable(ref msg) if msg.contains("not configured")
        ));
    }
}
