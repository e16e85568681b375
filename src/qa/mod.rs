//! Question answering over the sales table.
//!
//! The whole table is serialized to text and handed, together with the
//! question, to an external extractive question-answering model. The model
//! sits behind the [`QuestionAnswerer`] capability so sessions can run with
//! a stub. There is no chunking and no caching: every question sends the
//! full table.

pub mod huggingface;
pub mod ollama;

pub use huggingface::HuggingFaceAnswerer;
pub use ollama::OllamaAnswerer;

use crate::config::ModelConfig;
use crate::dataset::Dataset;
use crate::error::{DashboardError, Result};
use async_trait::async_trait;
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// An external model that extracts an answer to `question` from `context`.
#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    /// Model identifier for logs.
    fn name(&self) -> &str;

    async fn answer(&self, question: &str, context: &str) -> Result<String>;
}

/// Which hosted model API to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    /// Hugging Face inference API (extractive QA pipeline)
    #[default]
    Huggingface,
    /// Local Ollama chat model
    Ollama,
}

/// Limits applied to every question.
#[derive(Debug, Clone)]
pub struct AskOptions {
    /// Hard deadline for the model call.
    pub timeout: Duration,
    /// Largest context, in characters, the model accepts.
    pub max_context_chars: usize,
    /// Show a spinner while waiting for the model.
    pub show_progress: bool,
}

impl From<&ModelConfig> for AskOptions {
    fn from(config: &ModelConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_seconds),
            max_context_chars: config.max_context_chars,
            show_progress: false,
        }
    }
}

/// Build the configured answerer.
pub fn build_answerer(config: &ModelConfig) -> Result<Arc<dyn QuestionAnswerer>> {
    let mut config = config.clone();
    config.apply_backend_defaults();

    let answerer: Arc<dyn QuestionAnswerer> = match config.backend {
        ModelBackend::Huggingface => Arc::new(HuggingFaceAnswerer::new(
            &config.url,
            &config.name,
            config.api_token(),
            config.timeout_seconds,
        )?),
        ModelBackend::Ollama => Arc::new(OllamaAnswerer::new(
            &config.url,
            &config.name,
            config.timeout_seconds,
        )?),
    };

    info!(
        "Question answering via {:?} model {}",
        config.backend,
        answerer.name()
    );
    Ok(answerer)
}

/// Answer a question about the dataset, returning the model's answer verbatim.
pub async fn ask(
    answerer: &dyn QuestionAnswerer,
    dataset: &Dataset,
    question: &str,
    options: &AskOptions,
) -> Result<String> {
    let question = question.trim();
    if question.is_empty() {
        return Err(DashboardError::validation("Please enter a question."));
    }

    let context = dataset.to_context_text();
    let chars = context.chars().count();
    if chars > options.max_context_chars {
        warn!(
            "Context of {} chars exceeds limit of {}",
            chars, options.max_context_chars
        );
        return Err(DashboardError::ContextTooLarge {
            chars,
            limit: options.max_context_chars,
        });
    }

    debug!("Asking {} with {} chars of context", answerer.name(), chars);

    let spinner = options.show_progress.then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Asking {}...", answerer.name()));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let result =
        match tokio::time::timeout(options.timeout, answerer.answer(question, &context)).await {
            Ok(result) => result,
            Err(_) => Err(DashboardError::ModelUnavailable(format!(
                "No answer within {}s",
                options.timeout.as_secs()
            ))),
        };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    result
}

/// Map a transport error to a model error.
pub(crate) fn request_error(err: reqwest::Error, url: &str, timeout_seconds: u64) -> DashboardError {
    if err.is_timeout() {
        DashboardError::ModelUnavailable(format!("Request timed out after {}s", timeout_seconds))
    } else if err.is_connect() {
        DashboardError::ModelUnavailable(format!("Cannot connect to {}", url))
    } else {
        DashboardError::ModelUnavailable(format!("Failed to send request: {}", err))
    }
}

pub(crate) fn http_client(timeout_seconds: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|e| DashboardError::ModelUnavailable(format!("Failed to create HTTP client: {}", e)))
}
