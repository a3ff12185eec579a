//! Error types for dealboard-core
//!
//! Collaborator failures (`SourceError`, `NarrationError`) are typed at the
//! seam and folded into `PipelineError`, which carries the stable external
//! code the HTTP layer exposes. Data-quality problems are never errors: the
//! cleaning layer turns them into warnings.

use crate::models::{DataQualityWarning, MetricResult};
use thiserror::Error;

/// Failure reported by the board data source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Data source unreachable: {message}")]
    Unreachable { message: String },

    #[error("Data source timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Malformed response from data source: {message}")]
    MalformedResponse { message: String },
}

impl SourceError {
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }
}

/// Failure reported by the LLM collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NarrationError {
    #[error("LLM unreachable: {message}")]
    Unreachable { message: String },

    #[error("LLM timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Malformed LLM output: {message}")]
    MalformedOutput { message: String },
}

impl NarrationError {
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedOutput {
            message: message.into(),
        }
    }
}

/// Configuration problems detected at startup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting: {name}")]
    Missing { name: &'static str },

    #[error("Invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Terminal failure of one question through the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    // ===================
    // Upstream failures
    // ===================
    #[error("Board data is temporarily unavailable")]
    SourceUnavailable {
        #[source]
        source: SourceError,
    },

    /// Metrics were computed but the narration step failed; the numbers
    /// travel with the error so the caller still gets them.
    #[error("Narration is temporarily unavailable")]
    NarrationUnavailable {
        #[source]
        source: NarrationError,
        metrics: Vec<MetricResult>,
        warnings: Vec<DataQualityWarning>,
    },

    // ===================
    // Intent
    // ===================
    #[error("Question is ambiguous (confidence {confidence:.2})")]
    AmbiguousIntent {
        confidence: f64,
        clarification_prompt: String,
        suggested_questions: Vec<String>,
        warnings: Vec<DataQualityWarning>,
    },

    // ===================
    // Request validation
    // ===================
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    // ===================
    // Everything else
    // ===================
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PipelineError {
    /// Stable code exposed to API clients
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::SourceUnavailable { .. } => "SOURCE_UNAVAILABLE",
            PipelineError::NarrationUnavailable { .. } => "NARRATION_UNAVAILABLE",
            PipelineError::AmbiguousIntent { .. } => "AMBIGUOUS_INTENT",
            PipelineError::InvalidRequest { .. } => "INVALID_REQUEST",
            PipelineError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller may retry the same question unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::SourceUnavailable { .. } | PipelineError::NarrationUnavailable { .. }
        )
    }

    /// Message safe to show an end user; never includes upstream bodies
    pub fn public_message(&self) -> String {
        match self {
            PipelineError::SourceUnavailable { .. } => {
                "Could not reach the board data source. Please try again shortly.".to_string()
            }
            PipelineError::NarrationUnavailable { .. } => {
                "The numbers are ready but the written summary could not be generated."
                    .to_string()
            }
            PipelineError::AmbiguousIntent {
                clarification_prompt,
                ..
            } => clarification_prompt.clone(),
            PipelineError::InvalidRequest { reason } => reason.clone(),
            PipelineError::Internal { .. } => "An unexpected error occurred".to_string(),
        }
    }

    /// Detail string for debug mode only
    pub fn debug_detail(&self) -> String {
        match self {
            PipelineError::SourceUnavailable { source } => source.to_string(),
            PipelineError::NarrationUnavailable { source, .. } => source.to_string(),
            PipelineError::Internal { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(error: anyhow::Error) -> Self {
        PipelineError::Internal {
            message: format!("{:#}", error),
        }
    }
}

impl From<SourceError> for PipelineError {
    fn from(source: SourceError) -> Self {
        PipelineError::SourceUnavailable { source }
    }
}
