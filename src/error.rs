//! Error taxonomy for the dashboard core.
//!
//! Validation errors are recoverable and shown to the user; data load
//! errors are fatal at startup; model errors surface as failed answers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    /// Bad user input: empty selection, empty period name, unknown analysis...
    #[error("{0}")]
    Validation(String),

    /// The dataset could not be fetched or parsed.
    #[error("Failed to load dataset: {0}")]
    DataLoad(String),

    /// The question-answering model could not be reached or failed.
    #[error("Question answering model unavailable: {0}")]
    ModelUnavailable(String),

    /// The serialized table does not fit the model's context window.
    #[error("Dataset context is {chars} characters, model limit is {limit}")]
    ContextTooLarge { chars: usize, limit: usize },
}

impl DashboardError {
    pub fn validation(message: impl Into<String>) -> Self {
        DashboardError::Validation(message.into())
    }

    /// Whether the session can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DashboardError::DataLoad(_))
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
