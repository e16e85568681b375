//! Ollama chat backend.
//!
//! Sends the table and the question in one non-streaming chat request and
//! asks the model to reply with a span copied from the table.

use super::{http_client, request_error, QuestionAnswerer};
use crate::error::{DashboardError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Message in the chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

pub struct OllamaAnswerer {
    http_client: reqwest::Client,
    ollama_url: String,
    model_name: String,
    timeout_seconds: u64,
}

impl OllamaAnswerer {
    pub fn new(ollama_url: &str, model_name: &str, timeout_seconds: u64) -> Result<Self> {
        Ok(Self {
            http_client: http_client(timeout_seconds)?,
            ollama_url: ollama_url.trim_end_matches('/').to_string(),
            model_name: model_name.to_string(),
            timeout_seconds,
        })
    }

    fn build_request(&self, question: &str, context: &str) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.model_name.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: EXTRACTIVE_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!(
                        "=== TABLE ===\n{}\n=== END OF TABLE ===\n\nQuestion: {}",
                        context, question
                    ),
                },
            ],
            stream: false,
            options: OllamaOptions { temperature: 0.0 },
        }
    }
}

#[async_trait]
impl QuestionAnswerer for OllamaAnswerer {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn answer(&self, question: &str, context: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.ollama_url);
        let request = self.build_request(question, context);

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(e, &self.ollama_url, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DashboardError::ModelUnavailable(format!(
                "Ollama API error {}: {}",
                status, body
            )));
        }

        let chat_response: OllamaChatResponse = response.json().await.map_err(|e| {
            DashboardError::ModelUnavailable(format!("Failed to parse Ollama response: {}", e))
        })?;

        debug!("Ollama replied with {} chars", chat_response.message.content.len());
        Ok(chat_response.message.content.trim().to_string())
    }
}

const EXTRACTIVE_SYSTEM_PROMPT: &str = r#"You answer questions about a sales table.
Reply with the shortest span of text copied verbatim from the table that answers the question.
Do not explain, do not add words that are not in the table."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request() {
        let answerer = OllamaAnswerer::new("http://localhost:11434/", "llama3.2:latest", 60).unwrap();
        let request = answerer.build_request("Top region?", "0  North");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "llama3.2:latest");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        let user = json["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("0  North"));
        assert!(user.ends_with("Question: Top region?"));
        assert_eq!(answerer.ollama_url, "http://localhost:11434");
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{"model":"llama3.2","message":{"role":"assistant","content":" North\n"},"done":true}"#;
        let response: OllamaChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.message.content.trim(), "North");
    }
}
