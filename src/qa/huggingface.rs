//! Hugging Face inference API backend.
//!
//! Posts `{"inputs": {"question", "context"}}` to a hosted
//! question-answering pipeline and returns the best answer span.

use super::{http_client, request_error, QuestionAnswerer};
use crate::error::{DashboardError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct QaRequest<'a> {
    inputs: QaInputs<'a>,
}

#[derive(Debug, Serialize)]
struct QaInputs<'a> {
    question: &'a str,
    context: &'a str,
}

/// One candidate answer span.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QaSpan {
    pub answer: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
}

/// The pipeline returns a single span, or a list when `top_k > 1`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QaPayload {
    One(QaSpan),
    Many(Vec<QaSpan>),
}

/// Pick the highest-scoring span from a response body.
pub fn best_span(body: &str) -> Result<QaSpan> {
    let payload: QaPayload = serde_json::from_str(body).map_err(|e| {
        DashboardError::ModelUnavailable(format!("Failed to parse model response: {}", e))
    })?;

    match payload {
        QaPayload::One(span) => Ok(span),
        QaPayload::Many(spans) => spans
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or_else(|| DashboardError::ModelUnavailable("Model returned no answer".to_string())),
    }
}

pub struct HuggingFaceAnswerer {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_token: Option<String>,
    timeout_seconds: u64,
}

impl HuggingFaceAnswerer {
    pub fn new(
        base_url: &str,
        model: &str,
        api_token: Option<String>,
        timeout_seconds: u64,
    ) -> Result<Self> {
        Ok(Self {
            http_client: http_client(timeout_seconds)?,
            endpoint: format!("{}/models/{}", base_url.trim_end_matches('/'), model),
            model: model.to_string(),
            api_token,
            timeout_seconds,
        })
    }

    #[cfg(test)]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl QuestionAnswerer for HuggingFaceAnswerer {
    fn name(&self) -> &str {
        &self.model
    }

    async fn answer(&self, question: &str, context: &str) -> Result<String> {
        let request = QaRequest {
            inputs: QaInputs { question, context },
        };

        let mut builder = self.http_client.post(&self.endpoint).json(&request);
        if let Some(ref token) = self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| request_error(e, &self.endpoint, self.timeout_seconds))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(DashboardError::ModelUnavailable(format!(
                "Inference API error {}: {}",
                status, body
            )));
        }

        let span = best_span(&body)?;
        debug!("Answer span {:?}..{:?} score {:.3}", span.start, span.end, span.score);
        Ok(span.answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = QaRequest {
            inputs: QaInputs {
                question: "Who?",
                context: "Alice",
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["inputs"]["question"], "Who?");
        assert_eq!(json["inputs"]["context"], "Alice");
    }

    #[test]
    fn test_best_span_single() {
        let span =
            best_span(r#"{"score": 0.91, "start": 10, "end": 16, "answer": "Widget"}"#).unwrap();
        assert_eq!(span.answer, "Widget");
        assert_eq!(span.start, Some(10));
    }

    #[test]
    fn test_best_span_list_picks_highest_score() {
        let body = r#"[
            {"score": 0.2, "start": 0, "end": 4, "answer": "East"},
            {"score": 0.7, "start": 5, "end": 10, "answer": "North"}
        ]"#;
        assert_eq!(best_span(body).unwrap().answer, "North");
        assert!(matches!(
            best_span("[]"),
            Err(DashboardError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_best_span_rejects_error_body() {
        let result = best_span(r#"{"error": "Model is currently loading"}"#);
        assert!(matches!(result, Err(DashboardError::ModelUnavailable(_))));
    }

    #[test]
    fn test_endpoint() {
        let answerer = HuggingFaceAnswerer::new(
            "https://api-inference.huggingface.co/",
            "distilbert-base-cased-distilled-squad",
            None,
            30,
        )
        .unwrap();
        assert_eq!(
            answerer.endpoint(),
            "https://api-inference.huggingface.co/models/distilbert-base-cased-distilled-squad"
        );
    }
}
