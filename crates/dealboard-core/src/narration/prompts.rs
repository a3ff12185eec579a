//! Prompt builders for the chat-completion calls

use crate::models::{DataQualityWarning, MetricKind, MetricResult, SummaryStats};
use serde_json::json;

pub const INTENT_SYSTEM: &str =
    "You are a business intelligence intent extraction system. Respond only with valid JSON.";

pub const SUMMARY_SYSTEM: &str = "You are a senior business analyst briefing the founder. \
     Be concise and opinionated, and state all amounts in Indian Rupees.";

pub const LEADERSHIP_SYSTEM: &str = "You are the Chief of Staff preparing a leadership briefing. \
     Be direct and specific. Use ₹ Cr / ₹ L for money.";

pub const SUGGESTIONS_SYSTEM: &str = "Respond with only a JSON array of 3 strings.";

/// Metrics as a pretty JSON list of `{name, value, formatted, description}`
pub fn metrics_json(metrics: &[MetricResult]) -> String {
    let rows: Vec<_> = metrics
        .iter()
        .map(|m| {
            json!({
                "name": m.kind.as_str(),
                "value": m.value,
                "formatted": m.formatted,
                "description": m.description,
            })
        })
        .collect();
    serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
}

/// One `- issue` line per warning
pub fn data_quality_notes(warnings: &[DataQualityWarning]) -> String {
    if warnings.is_empty() {
        return "No significant data quality issues.".to_string();
    }
    warnings
        .iter()
        .map(|w| format!("- {}", w.issue))
        .collect::<Vec<_>>()
        .join("\n")
}

fn stats_json(stats: &SummaryStats) -> String {
    serde_json::to_string_pretty(stats).unwrap_or_else(|_| "{}".to_string())
}

fn sector_list(sectors: &[String], empty: &str) -> String {
    if sectors.is_empty() {
        empty.to_string()
    } else {
        sectors.join(", ")
    }
}

pub fn intent_prompt(question: &str, sectors: &[String]) -> String {
    format!(
        r#"Classify a business question about a sales pipeline (deals) and delivery (work orders).

Pick "metric_type" from:
- "total_pipeline_value": total deal value, pipeline worth
- "pipeline_by_sector": pipeline broken down or compared across sectors
- "win_loss_ratio": won vs lost deals, win rate, conversion
- "revenue_by_sector": closed-won revenue by sector
- "invoiced_vs_collected": billed vs paid, outstanding receivables
- "collection_efficiency": collection rate, payment efficiency
- "pipeline_vs_revenue": pipeline compared with realised revenue
- "leadership_update": broad questions such as "How are we doing?" or "Give me an update"
- "general": only when nothing above fits

Rules:
- A sector not in the available list: set requires_clarification to true and suggest the closest sectors.
- Two equally likely metric types: pick one with confidence below 0.7.
- Typos and informal wording should still be parsed.
- Time: "this year"/"YTD" -> "ytd", "last quarter" -> "last_quarter", "last month" -> "last_month",
  "last week" -> "last_week", "last year" -> "last_year"; explicit dates as YYYY-MM-DD;
  no time mentioned -> time_range null.

Available sectors: {sectors}

Question: "{question}"

Respond with JSON only:
{{
  "sector": null or "sector name",
  "time_range": {{"start_date": null or "YYYY-MM-DD", "end_date": null or "YYYY-MM-DD", "period": null or "ytd" | "last_quarter" | "last_month" | "last_week" | "last_year"}},
  "metric_type": "one of the types above",
  "entities": [],
  "confidence": 0.0 to 1.0,
  "requires_clarification": false,
  "clarification_prompt": null or "question to ask"
}}"#,
        sectors = sector_list(sectors, "unknown"),
        question = question,
    )
}

pub fn summary_prompt(
    question: &str,
    metrics: &[MetricResult],
    warnings: &[DataQualityWarning],
    stats: &SummaryStats,
) -> String {
    format!(
        r#"Answer the founder's question directly, then add context.

- Use Indian Rupees (₹ Cr / ₹ L), formatted for reading (₹12.5 Cr, not 125000000).
- Flag collection efficiency below 70% as a concern.
- Note concentration risk if one sector holds more than half the pipeline.
- Three to five sentences unless a breakdown is needed; bullet the top sectors.
- Mention data quality in one closing sentence only if it affects reliability.

Question: "{question}"

Computed metrics:
{metrics}

Data quality notes:
{notes}

Summary statistics:
{stats}

No preamble; answer as if speaking in a boardroom."#,
        question = question,
        metrics = metrics_json(metrics),
        notes = data_quality_notes(warnings),
        stats = stats_json(stats),
    )
}

pub fn leadership_prompt(
    metrics: &[MetricResult],
    warnings: &[DataQualityWarning],
    stats: &SummaryStats,
) -> String {
    format!(
        r#"Write a leadership update with exactly these markdown sections:

## Pipeline Health
## Revenue Snapshot
## Sector Highlights
## Risks & Attention Items
## Recommended Actions

Two to four bullets per section. Use ₹ Cr / ₹ L. Flag collection efficiency
below 70%, sector concentration, and outstanding receivables. Describe data
quality problems in plain English, not field names. Say plainly when a
metric is missing or unreliable.

Computed metrics:
{metrics}

Summary statistics:
{stats}

Data quality notes:
{notes}"#,
        metrics = metrics_json(metrics),
        stats = stats_json(stats),
        notes = data_quality_notes(warnings),
    )
}

pub fn suggestions_prompt(question: &str, kind: MetricKind, sectors: &[String]) -> String {
    format!(
        r#"Suggest 3 natural follow-up questions the user might ask next.

Question: "{question}"
Metric answered: {kind}
Sectors in data: {sectors}

Return only a JSON array of 3 strings: ["question 1", "question 2", "question 3"]"#,
        question = question,
        kind = kind.as_str(),
        sectors = sector_list(sectors, "none"),
    )
}
