//! Cleaned deal and work-order records
//!
//! These are what the metrics engine consumes. Every record has a non-empty
//! sector (`unknown` when the board had none) and non-negative amounts in
//! paise; anything the cleaner could not trust was defaulted and reported
//! as a warning instead.

use super::Money;
use chrono::NaiveDate;
use serde::Serialize;

/// Sector bucket used when a record has no sector
pub const UNKNOWN_SECTOR: &str = "unknown";

/// Work-order status used when the board has none
pub const UNKNOWN_STATUS: &str = "unknown";

/// Case-fold, trim and collapse internal whitespace
///
/// `"Tech"`, `"tech "` and `" TECH"` all become `"tech"`. Empty or missing
/// input maps to [`UNKNOWN_SECTOR`].
pub fn normalize_sector(raw: Option<&str>) -> String {
    let normalized = raw
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if normalized.is_empty() {
        UNKNOWN_SECTOR.to_string()
    } else {
        normalized
    }
}

/// Where a deal sits in the sales funnel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    /// Still in the pipeline (also used when the board has no status)
    #[default]
    Open,
    /// Closed won
    Won,
    /// Closed lost
    Lost,
    /// Closed with no recorded outcome
    Closed,
}

impl DealStatus {
    /// Map a free-form board label onto the funnel
    ///
    /// Won/completed labels win over a bare "closed"; lost/rejected labels
    /// likewise. Anything without a closing keyword is open.
    pub fn from_label(label: Option<&str>) -> Self {
        let Some(label) = label else {
            return DealStatus::Open;
        };
        let label = label.trim().to_lowercase();

        if label.contains("won") || label.contains("completed") {
            DealStatus::Won
        } else if label.contains("lost") || label.contains("rejected") {
            DealStatus::Lost
        } else if label.contains("closed") {
            DealStatus::Closed
        } else {
            DealStatus::Open
        }
    }

    pub fn is_open(self) -> bool {
        matches!(self, DealStatus::Open)
    }
}

/// One cleaned row from the Deals board
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deal {
    pub id: String,
    pub name: String,
    pub sector: String,
    pub value: Money,
    pub status: DealStatus,
    pub close_date: Option<NaiveDate>,
    pub created_at: Option<NaiveDate>,
    pub owner: Option<String>,
    /// Closure probability in 0.0..=1.0
    pub probability: Option<f64>,
}

impl Deal {
    /// Minimal deal for fixtures and tests
    pub fn new(id: impl Into<String>, sector: &str, value: Money, status: DealStatus) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            sector: normalize_sector(Some(sector)),
            value,
            status,
            close_date: None,
            created_at: None,
            owner: None,
            probability: None,
        }
    }
}

/// One cleaned row from the Work Orders board
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkOrder {
    pub id: String,
    pub name: String,
    pub sector: String,
    pub invoiced: Money,
    pub collected: Money,
    /// Lowercased execution status (`unknown` when missing)
    pub status: String,
    pub invoice_date: Option<NaiveDate>,
    pub collection_date: Option<NaiveDate>,
    pub deal_id: Option<String>,
}

impl WorkOrder {
    /// Minimal work order for fixtures and tests
    pub fn new(id: impl Into<String>, sector: &str, invoiced: Money, collected: Money) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            sector: normalize_sector(Some(sector)),
            invoiced,
            collected,
            status: UNKNOWN_STATUS.to_string(),
            invoice_date: None,
            collection_date: None,
            deal_id: None,
        }
    }
}

/// Immutable view of both boards that one request computes against
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub deals: Vec<Deal>,
    pub work_orders: Vec<WorkOrder>,
}

impl Snapshot {
    pub fn new(deals: Vec<Deal>, work_orders: Vec<WorkOrder>) -> Self {
        Self { deals, work_orders }
    }

    pub fn is_empty(&self) -> bool {
        self.deals.is_empty() && self.work_orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_sector_variants_collapse() {
        for raw in ["Tech", "tech ", " TECH", "  tEcH\t"] {
            assert_eq!(normalize_sector(Some(raw)), "tech");
        }
    }

    #[test]
    fn test_normalize_sector_inner_whitespace() {
        assert_eq!(normalize_sector(Some("Oil   and  Gas")), "oil and gas");
    }

    #[test]
    fn test_normalize_sector_missing_is_unknown() {
        assert_eq!(normalize_sector(None), UNKNOWN_SECTOR);
        assert_eq!(normalize_sector(Some("   ")), UNKNOWN_SECTOR);
    }

    #[test]
    fn test_deal_status_labels() {
        assert_eq!(DealStatus::from_label(Some("Closed Won")), DealStatus::Won);
        assert_eq!(DealStatus::from_label(Some("Completed")), DealStatus::Won);
        assert_eq!(DealStatus::from_label(Some("closed lost")), DealStatus::Lost);
        assert_eq!(DealStatus::from_label(Some("Rejected")), DealStatus::Lost);
        assert_eq!(DealStatus::from_label(Some("Closed")), DealStatus::Closed);
        assert_eq!(DealStatus::from_label(Some("Negotiation")), DealStatus::Open);
        assert_eq!(DealStatus::from_label(None), DealStatus::Open);
    }
}
