//! Board cleaning: raw board items → trusted records + warnings
//!
//! Every field goes through a total function that returns a
//! [`FieldOutcome`]: the value to use, and the issue that forced a default
//! if there was one. Issues are tallied per board in a [`QualityReport`];
//! nothing in here can fail.

pub mod parse;

use crate::models::{
    normalize_sector, BoardKind, DataQualityWarning, Deal, DealStatus, FieldIssue, Money,
    QualityReport, Snapshot, WorkOrder, UNKNOWN_SECTOR, UNKNOWN_STATUS,
};
use crate::source::RawRecord;
use chrono::NaiveDate;
use parse::{is_blank, label_text, parse_date, parse_numeric};
use serde_json::Value;
use tracing::info;

// Candidate column names, most specific first
const DEAL_SECTOR: &[&str] = &[
    "sector_service",
    "Sector/service",
    "sector",
    "industry",
    "vertical",
    "segment",
    "category",
];
const DEAL_VALUE: &[&str] = &[
    "masked_deal_value",
    "Masked Deal value",
    "deal_value",
    "value",
    "amount",
    "pipeline_value",
    "contract_value",
];
const DEAL_STATUS: &[&str] = &["deal_status", "Deal Status", "status", "stage"];
const DEAL_CLOSE_DATE: &[&str] = &[
    "tentative_close_date",
    "Tentative Close Date",
    "close_date_a",
    "Close Date (A)",
    "close_date",
    "expected_close_date",
];
const DEAL_OWNER: &[&str] = &["owner_code", "Owner code", "owner", "assigned_to"];
const DEAL_PROBABILITY: &[&str] = &["closure_probability", "Closure Probability", "probability"];

const WO_SECTOR: &[&str] = &["sector", "Sector", "sector_service", "industry", "vertical"];
const WO_INVOICED: &[&str] = &[
    "amount_in_rupees_excl_of_gst_masked",
    "Amount in Rupees (Excl of GST) (Masked)",
    "invoiced_amount",
    "invoiced",
    "invoice_amount",
];
const WO_COLLECTED: &[&str] = &[
    "billed_value_in_rupees_incl_of_gst_masked",
    "Billed Value in Rupees (Incl of GST.) (Masked)",
    "collected_amount",
    "collected",
    "paid_amount",
];
const WO_STATUS: &[&str] = &["execution_status", "Execution Status", "status", "order_status"];
const WO_INVOICE_DATE: &[&str] = &[
    "last_invoice_date",
    "Last invoice date",
    "invoice_date",
    "invoiced_date",
];
const WO_COLLECTION_DATE: &[&str] = &[
    "data_delivery_date",
    "Data Delivery Date",
    "collection_date",
    "payment_date",
];
const WO_DEAL_ID: &[&str] = &["serial", "Serial #", "deal_id", "linked_deal"];

/// A cleaned field value, tagged with the issue that forced a default
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome<T> {
    Clean(T),
    Defaulted(T, FieldIssue),
}

impl<T> FieldOutcome<T> {
    pub fn issue(&self) -> Option<FieldIssue> {
        match self {
            FieldOutcome::Clean(_) => None,
            FieldOutcome::Defaulted(_, issue) => Some(*issue),
        }
    }

    /// Record the issue (if any) under `field` and return the value
    pub fn settle(self, field: &'static str, report: &mut QualityReport) -> T {
        match self {
            FieldOutcome::Clean(value) => value,
            FieldOutcome::Defaulted(value, issue) => {
                report.add(field, issue);
                value
            }
        }
    }
}

/// Both boards after cleaning
#[derive(Debug, Clone, Default)]
pub struct CleanedBoards {
    pub snapshot: Snapshot,
    /// Deal warnings first, then work-order warnings
    pub warnings: Vec<DataQualityWarning>,
}

/// First non-blank value under any of `keys`; numeric zero counts as present
fn first_present<'a>(raw: &'a RawRecord, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find(|value| !is_blank(value))
}

fn clean_amount(raw: Option<&Value>) -> FieldOutcome<Money> {
    let Some(value) = raw else {
        return FieldOutcome::Defaulted(Money::ZERO, FieldIssue::Missing);
    };
    let Some(number) = parse_numeric(value) else {
        return FieldOutcome::Defaulted(Money::ZERO, FieldIssue::Unparseable);
    };
    match Money::from_rupees(number) {
        Some(money) => FieldOutcome::Clean(money),
        None => FieldOutcome::Defaulted(Money::ZERO, FieldIssue::OutOfRange),
    }
}

fn clean_sector(raw: Option<&Value>) -> FieldOutcome<String> {
    match raw.and_then(label_text) {
        Some(label) => FieldOutcome::Clean(normalize_sector(Some(&label))),
        None => FieldOutcome::Defaulted(UNKNOWN_SECTOR.to_string(), FieldIssue::Missing),
    }
}

/// `required` dates report a missing value; optional ones only report junk
fn clean_date(raw: Option<&Value>, required: bool) -> FieldOutcome<Option<NaiveDate>> {
    match raw {
        None if required => FieldOutcome::Defaulted(None, FieldIssue::Missing),
        None => FieldOutcome::Clean(None),
        Some(value) => match parse_date(value) {
            Some(date) => FieldOutcome::Clean(Some(date)),
            None => FieldOutcome::Defaulted(None, FieldIssue::Unparseable),
        },
    }
}

fn clean_deal_status(raw: Option<&Value>) -> FieldOutcome<DealStatus> {
    match raw.and_then(label_text) {
        Some(label) => FieldOutcome::Clean(DealStatus::from_label(Some(&label))),
        None => FieldOutcome::Defaulted(DealStatus::Open, FieldIssue::Missing),
    }
}

/// Closure probability in 0.0..=1.0
///
/// High/Medium/Low status labels map to 0.8/0.5/0.2; numbers above 1 are
/// read as percentages.
fn clean_probability(raw: Option<&Value>) -> FieldOutcome<Option<f64>> {
    let Some(value) = raw else {
        return FieldOutcome::Clean(None);
    };

    if let Some(label) = label_text(value) {
        match label.to_lowercase().as_str() {
            "high" => return FieldOutcome::Clean(Some(0.8)),
            "medium" => return FieldOutcome::Clean(Some(0.5)),
            "low" => return FieldOutcome::Clean(Some(0.2)),
            _ => {}
        }
    }

    match parse_numeric(value) {
        Some(p) if p.is_finite() && p >= 0.0 => {
            let p = if p > 1.0 { p / 100.0 } else { p };
            if p <= 1.0 {
                FieldOutcome::Clean(Some(p))
            } else {
                FieldOutcome::Defaulted(None, FieldIssue::OutOfRange)
            }
        }
        Some(_) => FieldOutcome::Defaulted(None, FieldIssue::OutOfRange),
        None => FieldOutcome::Defaulted(None, FieldIssue::Unparseable),
    }
}

fn record_id(raw: &RawRecord) -> String {
    raw.get("id").and_then(label_text).unwrap_or_default()
}

fn record_name(raw: &RawRecord) -> String {
    raw.get("name").and_then(label_text).unwrap_or_default()
}

/// Clean one Deals board item
pub fn clean_deal(raw: &RawRecord, report: &mut QualityReport) -> Deal {
    report.record_seen();

    Deal {
        id: record_id(raw),
        name: record_name(raw),
        sector: clean_sector(first_present(raw, DEAL_SECTOR)).settle("sector", report),
        value: clean_amount(first_present(raw, DEAL_VALUE)).settle("deal_value", report),
        status: clean_deal_status(first_present(raw, DEAL_STATUS)).settle("status", report),
        close_date: clean_date(first_present(raw, DEAL_CLOSE_DATE), true)
            .settle("close_date", report),
        created_at: clean_date(first_present(raw, &["created_at"]), false)
            .settle("created_at", report),
        owner: first_present(raw, DEAL_OWNER).and_then(label_text),
        probability: clean_probability(first_present(raw, DEAL_PROBABILITY))
            .settle("probability", report),
    }
}

/// Clean one Work Orders board item
pub fn clean_work_order(raw: &RawRecord, report: &mut QualityReport) -> WorkOrder {
    report.record_seen();

    let deal_id = first_present(raw, WO_DEAL_ID).and_then(|value| match value {
        Value::Object(map) => map.get("id").and_then(label_text),
        other => label_text(other),
    });

    WorkOrder {
        id: record_id(raw),
        name: record_name(raw),
        sector: clean_sector(first_present(raw, WO_SECTOR)).settle("sector", report),
        invoiced: clean_amount(first_present(raw, WO_INVOICED)).settle("invoiced_amount", report),
        collected: clean_amount(first_present(raw, WO_COLLECTED))
            .settle("collected_amount", report),
        status: first_present(raw, WO_STATUS)
            .and_then(label_text)
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
        invoice_date: clean_date(first_present(raw, WO_INVOICE_DATE), false)
            .settle("invoice_date", report),
        collection_date: clean_date(first_present(raw, WO_COLLECTION_DATE), false)
            .settle("collection_date", report),
        deal_id,
    }
}

/// Clean both boards into one snapshot plus folded warnings
pub fn clean_board_data(deals_raw: &[RawRecord], work_orders_raw: &[RawRecord]) -> CleanedBoards {
    let mut deal_report = QualityReport::new(BoardKind::Deals);
    let deals: Vec<Deal> = deals_raw
        .iter()
        .map(|raw| clean_deal(raw, &mut deal_report))
        .collect();

    let mut wo_report = QualityReport::new(BoardKind::WorkOrders);
    let work_orders: Vec<WorkOrder> = work_orders_raw
        .iter()
        .map(|raw| clean_work_order(raw, &mut wo_report))
        .collect();

    let mut warnings = deal_report.into_warnings();
    warnings.extend(wo_report.into_warnings());

    info!(
        deals = deals.len(),
        work_orders = work_orders.len(),
        warnings = warnings.len(),
        "Cleaned board data"
    );

    CleanedBoards {
        snapshot: Snapshot::new(deals, work_orders),
        warnings,
    }
}
