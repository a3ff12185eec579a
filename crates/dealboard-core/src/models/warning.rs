//! Data-quality warnings produced by cleaning
//!
//! Cleaning never fails; every value it had to default becomes one tally in
//! a [`QualityReport`]. The report is folded into one warning per
//! (board, field, issue) once the board has been fully cleaned, so severity
//! can be derived from the fraction of records affected.

use serde::Serialize;
use std::collections::BTreeMap;

/// Which board a record (or a warning) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardKind {
    Deals,
    WorkOrders,
}

impl BoardKind {
    pub fn label(self) -> &'static str {
        match self {
            BoardKind::Deals => "deals",
            BoardKind::WorkOrders => "work orders",
        }
    }
}

/// How much a warning should worry the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// <20% low, <50% medium, otherwise high
    pub fn from_fraction(affected: usize, total: usize) -> Self {
        if total == 0 {
            return Severity::Low;
        }
        let pct = affected as f64 / total as f64 * 100.0;
        if pct < 20.0 {
            Severity::Low
        } else if pct < 50.0 {
            Severity::Medium
        } else {
            Severity::High
        }
    }
}

/// One detected defect class in the source data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataQualityWarning {
    pub board: BoardKind,
    pub field: String,
    pub issue: String,
    pub affected_records: usize,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Issue kinds recorded while cleaning one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldIssue {
    /// No value under any candidate column
    Missing,
    /// Present but not parseable as the expected type
    Unparseable,
    /// Parsed but negative or non-finite; defaulted to zero
    OutOfRange,
}

impl FieldIssue {
    fn describe(self, field: &str) -> String {
        match self {
            FieldIssue::Missing => format!("Missing {}", field.replace('_', " ")),
            FieldIssue::Unparseable => format!("Unparseable {}", field.replace('_', " ")),
            FieldIssue::OutOfRange => {
                format!("Negative or invalid {} defaulted to 0", field.replace('_', " "))
            }
        }
    }
}

/// Running tally of field issues for one board
#[derive(Debug, Clone)]
pub struct QualityReport {
    board: BoardKind,
    records: usize,
    counts: BTreeMap<(&'static str, FieldIssue), usize>,
}

impl QualityReport {
    pub fn new(board: BoardKind) -> Self {
        Self {
            board,
            records: 0,
            counts: BTreeMap::new(),
        }
    }

    /// Count one more cleaned record
    pub fn record_seen(&mut self) {
        self.records += 1;
    }

    /// Count one defaulted field value
    pub fn add(&mut self, field: &'static str, issue: FieldIssue) {
        *self.counts.entry((field, issue)).or_insert(0) += 1;
    }

    pub fn records(&self) -> usize {
        self.records
    }

    /// Affected-record count for one (field, issue), 0 if never seen
    pub fn count(&self, field: &str, issue: FieldIssue) -> usize {
        self.counts
            .iter()
            .find(|((f, i), _)| *f == field && *i == issue)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    /// Fold the tallies into warnings, ordered by field then issue
    pub fn into_warnings(self) -> Vec<DataQualityWarning> {
        let records = self.records;
        let board = self.board;
        self.counts
            .into_iter()
            .map(|((field, issue), affected)| DataQualityWarning {
                board,
                field: field.to_string(),
                issue: issue.describe(field),
                affected_records: affected,
                severity: Severity::from_fraction(affected, records),
                details: Some(format!("{} of {} {}", affected, records, board.label())),
            })
            .collect()
    }
}

/// Share of a board below which a warning is not worth an executive's time
const EXECUTIVE_MIN_PCT: u64 = 5;

fn executive_text(board: BoardKind, field: &str, pct: u64, count: usize) -> String {
    match (board, field) {
        (BoardKind::Deals, "deal_value") => format!(
            "About {pct}% of deals ({count} records) don't have a deal value attached, so pipeline totals may be understated."
        ),
        (_, "sector") => format!(
            "Roughly {pct}% of records ({count}) are missing sector tags, so sector breakdowns are approximate."
        ),
        (BoardKind::Deals, "status") => format!(
            "{count} deals have no status set and are counted as open."
        ),
        (BoardKind::WorkOrders, "invoiced_amount") => format!(
            "{count} work orders are missing invoice amounts, which affects revenue and collection figures."
        ),
        (BoardKind::WorkOrders, "collected_amount") => format!(
            "{count} work orders have no collection data recorded, so collection efficiency may look lower than reality."
        ),
        (BoardKind::Deals, "close_date") => format!(
            "{count} deals don't have a close date, limiting time-based filtering."
        ),
        (BoardKind::Deals, "probability") => format!(
            "{count} deals are missing a closure probability."
        ),
        (board, other) => format!(
            "{pct}% of {} ({count}) have incomplete {} data.",
            board.label(),
            other.replace('_', " ")
        ),
    }
}

/// Rewrite warnings in plain language for the narration prompt
///
/// Warnings touching fewer than 5% of their board are dropped. Severity is
/// recomputed against the board size passed in.
pub fn format_warnings_for_executive(
    warnings: &[DataQualityWarning],
    total_deals: usize,
    total_work_orders: usize,
) -> Vec<DataQualityWarning> {
    warnings
        .iter()
        .filter_map(|warning| {
            let total = match warning.board {
                BoardKind::Deals => total_deals,
                BoardKind::WorkOrders => total_work_orders,
            };
            if total == 0 {
                return None;
            }
            let pct = (warning.affected_records as f64 / total as f64 * 100.0).round() as u64;
            if pct < EXECUTIVE_MIN_PCT {
                return None;
            }

            Some(DataQualityWarning {
                board: warning.board,
                field: warning.field.clone(),
                issue: executive_text(
                    warning.board,
                    &warning.field,
                    pct,
                    warning.affected_records,
                ),
                affected_records: warning.affected_records,
                severity: Severity::from_fraction(warning.affected_records, total),
                details: warning.details.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(Severity::from_fraction(1, 10), Severity::Low);
        assert_eq!(Severity::from_fraction(2, 10), Severity::Medium);
        assert_eq!(Severity::from_fraction(4, 10), Severity::Medium);
        assert_eq!(Severity::from_fraction(5, 10), Severity::High);
        assert_eq!(Severity::from_fraction(3, 0), Severity::Low);
    }

    #[test]
    fn test_report_folds_per_field_and_issue() {
        let mut report = QualityReport::new(BoardKind::Deals);
        for _ in 0..4 {
            report.record_seen();
        }
        report.add("deal_value", FieldIssue::Missing);
        report.add("deal_value", FieldIssue::Missing);
        report.add("deal_value", FieldIssue::Unparseable);
        report.add("sector", FieldIssue::Missing);

        assert_eq!(report.count("deal_value", FieldIssue::Missing), 2);

        let warnings = report.into_warnings();
        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings[0].field, "deal_value");
        assert_eq!(warnings[0].affected_records, 2);
        assert_eq!(warnings[0].severity, Severity::High);
        assert_eq!(warnings[2].field, "sector");
        assert_eq!(warnings[2].severity, Severity::Medium);
    }

    #[test]
    fn test_executive_format_suppresses_small_issues() {
        let warning = DataQualityWarning {
            board: BoardKind::Deals,
            field: "deal_value".to_string(),
            issue: "Missing deal value".to_string(),
            affected_records: 2,
            severity: Severity::Low,
            details: None,
        };
        assert!(format_warnings_for_executive(&[warning.clone()], 100, 0).is_empty());

        let formatted = format_warnings_for_executive(&[warning], 20, 0);
        assert_eq!(formatted.len(), 1);
        assert!(formatted[0].issue.starts_with("About 10% of deals"));
    }

    #[test]
    fn test_executive_format_uses_matching_board_total() {
        let warning = DataQualityWarning {
            board: BoardKind::WorkOrders,
            field: "sector".to_string(),
            issue: "Missing sector".to_string(),
            affected_records: 5,
            severity: Severity::Low,
            details: None,
        };
        // 5 of 1000 deals would be suppressed; 5 of 10 work orders is not
        let formatted = format_warnings_for_executive(&[warning], 1000, 10);
        assert_eq!(formatted.len(), 1);
        assert_eq!(formatted[0].severity, Severity::High);
    }
}
