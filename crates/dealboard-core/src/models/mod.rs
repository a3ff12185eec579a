//! Data models for dealboard

pub mod ask;
pub mod intent;
pub mod metric;
pub mod money;
pub mod records;
pub mod warning;

pub use ask::{
    AskRequest, AskResponse, BoardSummary, Provenance, RawDataSummary, SummaryStats,
    MAX_QUESTION_CHARS,
};
pub use intent::{Intent, Period, TimeScope};
pub use metric::{MetricKind, MetricResult, MetricValue, Ratio, SectorAmount, Trend};
pub use money::Money;
pub use records::{
    normalize_sector, Deal, DealStatus, Snapshot, WorkOrder, UNKNOWN_SECTOR,
    UNKNOWN_STATUS,
};
pub use warning::{
    format_warnings_for_executive, BoardKind, DataQualityWarning, FieldIssue, QualityReport,
    Severity,
};
