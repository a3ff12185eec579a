//! Mapping from pipeline failures to HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dealboard_core::PipelineError;
use serde_json::{json, Value};
use tracing::{error, warn};

/// A pipeline failure on its way out of a handler
#[derive(Debug)]
pub struct ApiError {
    pub error: PipelineError,
    /// Expose internal detail instead of the user-safe message
    pub debug: bool,
}

impl ApiError {
    pub fn new(error: PipelineError, debug: bool) -> Self {
        Self { error, debug }
    }

    pub fn status(&self) -> StatusCode {
        match self.error {
            PipelineError::SourceUnavailable { .. } | PipelineError::NarrationUnavailable { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            PipelineError::AmbiguousIntent { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            PipelineError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn title(&self) -> &'static str {
        match self.error {
            PipelineError::SourceUnavailable { .. } => "Failed to fetch board data",
            PipelineError::NarrationUnavailable { .. } => "Failed to generate insights",
            PipelineError::AmbiguousIntent { .. } => "Clarification needed",
            PipelineError::InvalidRequest { .. } => "Invalid request",
            PipelineError::Internal { .. } => "Internal server error",
        }
    }

    /// `{error, detail, code}` plus whatever partial results the error carries
    pub fn body(&self) -> Value {
        let detail = if self.debug {
            self.error.debug_detail()
        } else {
            self.error.public_message()
        };
        let mut body = json!({
            "error": self.title(),
            "detail": detail,
            "code": self.error.code(),
        });

        match &self.error {
            PipelineError::NarrationUnavailable {
                metrics, warnings, ..
            } => {
                body["key_metrics"] = json!(metrics);
                body["data_quality_warnings"] = json!(warnings);
            }
            PipelineError::AmbiguousIntent {
                confidence,
                clarification_prompt,
                suggested_questions,
                warnings,
            } => {
                body["confidence"] = json!(confidence);
                body["clarification_prompt"] = json!(clarification_prompt);
                body["suggested_questions"] = json!(suggested_questions);
                body["data_quality_warnings"] = json!(warnings);
            }
            _ => {}
        }
        body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.error.code(), error = %self.error.debug_detail(), "Request failed");
        } else {
            warn!(code = self.error.code(), "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealboard_core::{NarrationError, SourceError};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                PipelineError::from(SourceError::unreachable("refused")),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                PipelineError::InvalidRequest {
                    reason: "empty".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                PipelineError::Internal {
                    message: "boom".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::new(error, false).status(), status);
        }
    }

    #[test]
    fn test_internal_detail_only_in_debug() {
        let error = || PipelineError::Internal {
            message: "index out of bounds at cleaner".to_string(),
        };
        let quiet = ApiError::new(error(), false).body();
        assert_eq!(quiet["detail"], "An unexpected error occurred");
        assert_eq!(quiet["code"], "INTERNAL_ERROR");

        let loud = ApiError::new(error(), true).body();
        assert_eq!(loud["detail"], "index out of bounds at cleaner");
    }

    #[test]
    fn test_narration_body_carries_metrics() {
        let error = PipelineError::NarrationUnavailable {
            source: NarrationError::Timeout { timeout_secs: 60 },
            metrics: Vec::new(),
            warnings: Vec::new(),
        };
        let body = ApiError::new(error, false).body();
        assert_eq!(body["code"], "NARRATION_UNAVAILABLE");
        assert!(body["key_metrics"].is_array());
        assert!(body["data_quality_warnings"].is_array());
    }
}
