//! Question/answer types and board summaries

use super::{DataQualityWarning, Intent, MetricResult};
use crate::error::PipelineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest question accepted, in characters
pub const MAX_QUESTION_CHARS: usize = 2000;

/// Incoming question
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub include_raw_data: bool,
}

impl AskRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            include_raw_data: false,
        }
    }

    pub fn with_raw_data(mut self, include: bool) -> Self {
        self.include_raw_data = include;
        self
    }

    /// Reject blank and overlong questions
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.question.trim().is_empty() {
            return Err(PipelineError::InvalidRequest {
                reason: "Question must not be empty".to_string(),
            });
        }
        let chars = self.question.chars().count();
        if chars > MAX_QUESTION_CHARS {
            return Err(PipelineError::InvalidRequest {
                reason: format!(
                    "Question is {} characters; the limit is {}",
                    chars, MAX_QUESTION_CHARS
                ),
            });
        }
        Ok(())
    }
}

/// Whether a result was computed by this call or replayed from cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Cache,
    #[default]
    Live,
}

/// Counts describing how complete the board data is
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryStats {
    pub total_deals: usize,
    pub total_work_orders: usize,
    pub deals_with_value: usize,
    pub deals_with_sector: usize,
    pub work_orders_with_invoiced: usize,
    pub work_orders_with_collected: usize,
    /// Sorted ascending
    pub unique_sectors: Vec<String>,
    pub data_quality_warnings: usize,
}

/// Optional payload describing the data behind an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawDataSummary {
    pub deals_count: usize,
    pub work_orders_count: usize,
    pub summary_stats: SummaryStats,
    pub fetched_at: DateTime<Utc>,
}

/// Answer to one question
///
/// Only answered questions produce one; a question that needs clarification
/// fails with `PipelineError::AmbiguousIntent` instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AskResponse {
    pub insights: String,
    pub key_metrics: Vec<MetricResult>,
    pub data_quality_warnings: Vec<DataQualityWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    pub confidence: f64,
    pub suggested_questions: Vec<String>,
    pub source: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<RawDataSummary>,
    pub processing_time_ms: u64,
}

/// Snapshot of both boards for the summary endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSummary {
    pub deals_board_id: String,
    pub work_orders_board_id: String,
    /// `cache` only when both boards came from the board cache
    pub source: Provenance,
    pub fetched_at: DateTime<Utc>,
    pub summary_stats: SummaryStats,
    pub warnings: Vec<DataQualityWarning>,
}
