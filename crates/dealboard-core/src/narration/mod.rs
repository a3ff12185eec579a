//! LLM narration
//!
//! The orchestrator talks to a [`Narrator`]: classify the question, then
//! turn computed metrics into prose. Every number in the prose comes from
//! the metrics engine; the model only writes around them.

pub mod groq;
pub mod prompts;

pub use groq::GroqNarrator;

use crate::cleaning::parse::parse_date_text;
use crate::error::NarrationError;
use crate::models::{
    DataQualityWarning, Intent, MetricKind, MetricResult, Period, SummaryStats, TimeScope,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// Most follow-up suggestions returned for one answer
pub const MAX_SUGGESTIONS: usize = 3;

/// Shown when the model asks for clarification without saying what to ask
pub const DEFAULT_CLARIFICATION: &str =
    "I couldn't fully understand your question. Could you rephrase it?";

/// LLM collaborator used by the orchestrator
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Structured intent for `question`, given the sectors present in the data
    async fn classify_intent(
        &self,
        question: &str,
        sectors: &[String],
    ) -> Result<Intent, NarrationError>;

    /// Short executive answer to a specific question
    async fn narrate_summary(
        &self,
        question: &str,
        metrics: &[MetricResult],
        warnings: &[DataQualityWarning],
        stats: &SummaryStats,
    ) -> Result<String, NarrationError>;

    /// Sectioned leadership briefing over all seven metrics
    async fn narrate_leadership(
        &self,
        metrics: &[MetricResult],
        warnings: &[DataQualityWarning],
        stats: &SummaryStats,
    ) -> Result<String, NarrationError>;

    /// Up to three follow-up questions; empty on any failure
    async fn suggest_follow_ups(
        &self,
        question: &str,
        kind: MetricKind,
        sectors: &[String],
    ) -> Vec<String>;
}

// ============================================================================
// Output parsing
// ============================================================================

/// Remove a surrounding markdown code fence, with or without a language tag
fn strip_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        // Drop the language tag line, if any
        body = match rest.split_once('\n') {
            Some((tag, after)) if !tag.trim().starts_with(['{', '[']) => after,
            _ => rest,
        };
    }
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse JSON from model output, tolerating fences and surrounding prose
///
/// Falls back to the outermost `open..close` substring when the whole body
/// is not valid JSON.
fn extract_json<T: serde::de::DeserializeOwned>(
    text: &str,
    open: char,
    close: char,
) -> Option<T> {
    let body = strip_fences(text);
    if let Ok(parsed) = serde_json::from_str(body) {
        return Some(parsed);
    }
    let start = body.find(open)?;
    let end = body.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&body[start..=end]).ok()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TimeRangePayload {
    start_date: Option<String>,
    end_date: Option<String>,
    period: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IntentPayload {
    sector: Option<String>,
    time_range: Option<TimeRangePayload>,
    metric_type: Option<String>,
    entities: Vec<Value>,
    confidence: Option<f64>,
    requires_clarification: Option<bool>,
    clarification_prompt: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
}

fn time_scope(payload: TimeRangePayload) -> Option<TimeScope> {
    let scope = match payload.period.as_deref().and_then(Period::parse) {
        Some(period) => TimeScope::period(period),
        None => TimeScope::between(
            payload.start_date.as_deref().and_then(parse_date_text),
            payload.end_date.as_deref().and_then(parse_date_text),
        ),
    };
    (!scope.is_unbounded()).then_some(scope)
}

/// Build an [`Intent`] from the classifier's reply
///
/// Unknown metric names become `General`; confidence is clamped to 0..=1
/// and defaults to the fallback confidence when absent or not finite.
pub fn parse_intent_json(text: &str, question: &str) -> Result<Intent, NarrationError> {
    let payload: IntentPayload = extract_json(text, '{', '}').ok_or_else(|| {
        NarrationError::malformed(format!(
            "intent reply is not JSON: {}",
            text.chars().take(200).collect::<String>()
        ))
    })?;

    let confidence = payload
        .confidence
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(Intent::FALLBACK_CONFIDENCE);
    let requires_clarification = payload.requires_clarification.unwrap_or(false);
    let mut clarification_prompt = non_blank(payload.clarification_prompt);
    if requires_clarification && clarification_prompt.is_none() {
        clarification_prompt = Some(DEFAULT_CLARIFICATION.to_string());
    }

    Ok(Intent {
        metric_kind: payload
            .metric_type
            .as_deref()
            .and_then(MetricKind::parse)
            .unwrap_or_default(),
        sector: non_blank(payload.sector),
        time_scope: payload.time_range.and_then(time_scope),
        entities: payload
            .entities
            .into_iter()
            .filter_map(|e| e.as_str().map(str::to_string))
            .collect(),
        confidence,
        requires_clarification,
        clarification_prompt,
        raw_query: question.to_string(),
    })
}

/// Follow-up questions from a JSON array reply, at most [`MAX_SUGGESTIONS`]
pub fn parse_suggestions(text: &str) -> Option<Vec<String>> {
    let mut suggestions: Vec<String> = extract_json(text, '[', ']')?;
    suggestions.retain(|s| !s.trim().is_empty());
    suggestions.truncate(MAX_SUGGESTIONS);
    Some(suggestions)
}
