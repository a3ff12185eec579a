//! Structured intent extracted from a question

use super::MetricKind;
use chrono::NaiveDate;
use serde::Serialize;

/// Named relative period a question can refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Ytd,
    LastWeek,
    LastMonth,
    LastQuarter,
    LastYear,
}

impl Period {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "ytd" | "year_to_date" | "this_year" => Some(Period::Ytd),
            "last_week" => Some(Period::LastWeek),
            "last_month" => Some(Period::LastMonth),
            "last_quarter" => Some(Period::LastQuarter),
            "last_year" => Some(Period::LastYear),
            _ => None,
        }
    }
}

/// Optional time window; a named period wins over explicit dates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimeScope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

impl TimeScope {
    pub fn period(period: Period) -> Self {
        Self {
            period: Some(period),
            ..Self::default()
        }
    }

    pub fn between(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            period: None,
            start,
            end,
        }
    }

    /// True when the scope does not restrict anything
    pub fn is_unbounded(&self) -> bool {
        self.period.is_none() && self.start.is_none() && self.end.is_none()
    }
}

/// What the question is asking for, with the classifier's confidence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Intent {
    pub metric_kind: MetricKind,
    pub sector: Option<String>,
    pub time_scope: Option<TimeScope>,
    pub entities: Vec<String>,
    /// Clamped to 0.0..=1.0
    pub confidence: f64,
    pub requires_clarification: bool,
    pub clarification_prompt: Option<String>,
    pub raw_query: String,
}

impl Intent {
    /// Confidence used when classification could not run
    pub const FALLBACK_CONFIDENCE: f64 = 0.5;

    /// `General` intent at fallback confidence
    pub fn fallback(query: &str) -> Self {
        Self {
            metric_kind: MetricKind::General,
            sector: None,
            time_scope: None,
            entities: Vec::new(),
            confidence: Self::FALLBACK_CONFIDENCE,
            requires_clarification: false,
            clarification_prompt: None,
            raw_query: query.to_string(),
        }
    }

    /// Whether the pipeline should ask the user to rephrase
    pub fn is_ambiguous(&self, threshold: f64) -> bool {
        self.requires_clarification || self.confidence < threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_parse() {
        assert_eq!(Period::parse("last quarter"), Some(Period::LastQuarter));
        assert_eq!(Period::parse("YTD"), Some(Period::Ytd));
        assert_eq!(Period::parse("next decade"), None);
    }

    #[test]
    fn test_fallback_is_not_ambiguous_at_default_threshold() {
        let intent = Intent::fallback("how are we doing");
        assert_eq!(intent.metric_kind, MetricKind::General);
        assert!(!intent.is_ambiguous(0.5));
        assert!(intent.is_ambiguous(0.6));
    }

    #[test]
    fn test_explicit_clarification_is_ambiguous() {
        let mut intent = Intent::fallback("q");
        intent.confidence = 0.9;
        intent.requires_clarification = true;
        assert!(intent.is_ambiguous(0.5));
    }
}
