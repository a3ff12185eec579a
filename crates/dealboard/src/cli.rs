//! Terminal rendering for the `ask` and `summary` commands

use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use dealboard_core::models::{
    AskResponse, BoardSummary, DataQualityWarning, MetricResult, Provenance, Trend,
};
use dealboard_core::PipelineError;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// ============================================================================
// Progress
// ============================================================================

/// Steady spinner on stderr while upstream calls are in flight
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());
    spinner
}

// ============================================================================
// Tables
// ============================================================================

fn header(table: &mut Table, columns: &[&str], no_color: bool) {
    if no_color {
        table.set_header(columns.to_vec());
    } else {
        table.set_header(
            columns
                .iter()
                .map(|c| Cell::new(c).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }
}

fn trend_label(trend: Option<Trend>) -> &'static str {
    match trend {
        Some(Trend::Up) => "up",
        Some(Trend::Down) => "down",
        Some(Trend::Stable) => "stable",
        None => "-",
    }
}

pub fn format_metrics_table(metrics: &[MetricResult], no_color: bool) -> String {
    if metrics.is_empty() {
        return "No metrics computed.".to_string();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    header(&mut table, &["Metric", "Value", "Trend", "Description"], no_color);

    for metric in metrics {
        table.add_row(Row::from(vec![
            metric.kind.as_str(),
            metric.formatted.as_str(),
            trend_label(metric.trend),
            metric.description.as_str(),
        ]));
    }

    table.to_string()
}

pub fn format_warnings_table(warnings: &[DataQualityWarning], no_color: bool) -> String {
    if warnings.is_empty() {
        return "No data quality issues.".to_string();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    header(
        &mut table,
        &["Board", "Field", "Issue", "Records", "Severity"],
        no_color,
    );

    for warning in warnings {
        let records = warning.affected_records.to_string();
        let severity = format!("{:?}", warning.severity).to_lowercase();
        table.add_row(Row::from(vec![
            warning.board.label(),
            warning.field.as_str(),
            warning.issue.as_str(),
            records.as_str(),
            severity.as_str(),
        ]));
    }

    table.to_string()
}

fn provenance_label(source: Provenance) -> &'static str {
    match source {
        Provenance::Cache => "cache",
        Provenance::Live => "live",
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Answer as pretty JSON or as insights followed by tables
pub fn format_answer(response: &AskResponse, json: bool, no_color: bool) -> String {
    if json {
        return serde_json::to_string_pretty(response).unwrap_or_else(|_| "{}".to_string());
    }

    let mut lines = vec![response.insights.clone(), String::new()];
    lines.push(format_metrics_table(&response.key_metrics, no_color));

    if !response.data_quality_warnings.is_empty() {
        lines.push(String::new());
        lines.push("Data quality:".to_string());
        lines.push(format_warnings_table(
            &response.data_quality_warnings,
            no_color,
        ));
    }

    if !response.suggested_questions.is_empty() {
        lines.push(String::new());
        lines.push("You could also ask:".to_string());
        for question in &response.suggested_questions {
            lines.push(format!("  - {}", question));
        }
    }

    if let Some(raw) = &response.raw_data {
        lines.push(String::new());
        lines.push(format!(
            "Data: {} deals, {} work orders (fetched {})",
            raw.deals_count,
            raw.work_orders_count,
            raw.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "confidence {:.2} | {} | {} ms",
        response.confidence,
        provenance_label(response.source),
        response.processing_time_ms
    ));
    lines.join("\n")
}

pub fn format_summary(summary: &BoardSummary, json: bool, no_color: bool) -> String {
    if json {
        return serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string());
    }

    let stats = &summary.summary_stats;
    let sectors = if stats.unique_sectors.is_empty() {
        "-".to_string()
    } else {
        stats.unique_sectors.join(", ")
    };

    let mut lines = vec![];
    lines.push(format!("Deals board:       {}", summary.deals_board_id));
    lines.push(format!("Work orders board: {}", summary.work_orders_board_id));
    lines.push(format!(
        "Fetched:           {} ({})",
        summary.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
        provenance_label(summary.source)
    ));
    lines.push(format!(
        "Deals:             {} ({} with value, {} with sector)",
        stats.total_deals, stats.deals_with_value, stats.deals_with_sector
    ));
    lines.push(format!(
        "Work orders:       {} ({} invoiced, {} collected)",
        stats.total_work_orders,
        stats.work_orders_with_invoiced,
        stats.work_orders_with_collected
    ));
    lines.push(format!("Sectors:           {}", sectors));
    lines.push(String::new());
    lines.push(format_warnings_table(&summary.warnings, no_color));
    lines.join("\n")
}

/// Partial results a failed question still has to show
pub fn format_pipeline_error(error: &PipelineError, no_color: bool) -> String {
    match error {
        PipelineError::NarrationUnavailable {
            metrics, warnings, ..
        } => {
            let mut lines = vec![
                "Insights are unavailable right now; computed metrics:".to_string(),
                format_metrics_table(metrics, no_color),
            ];
            if !warnings.is_empty() {
                lines.push(format_warnings_table(warnings, no_color));
            }
            lines.join("\n")
        }
        PipelineError::AmbiguousIntent {
            clarification_prompt,
            suggested_questions,
            ..
        } => {
            let mut lines = vec![clarification_prompt.clone(), String::new()];
            lines.push("Try one of:".to_string());
            for question in suggested_questions {
                lines.push(format!("  - {}", question));
            }
            lines.join("\n")
        }
        other => other.public_message(),
    }
}
