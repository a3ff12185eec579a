//! Single-pass aggregation over a snapshot
//!
//! Every metric is derived from one `Aggregates` value, so a metric computed
//! on its own and the same metric inside a leadership update cannot
//! disagree.

use crate::models::{normalize_sector, DealStatus, Money, SectorAmount, Snapshot};
use std::collections::BTreeMap;

/// Sums and counts over one snapshot; all money in paise
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregates {
    /// Sum of open deal values
    pub pipeline: Money,
    /// Open deal values per normalised sector
    pub pipeline_by_sector: BTreeMap<String, Money>,
    pub won_count: u64,
    pub lost_count: u64,
    /// Sum of closed-won deal values
    pub revenue: Money,
    /// Closed-won deal values per normalised sector
    pub revenue_by_sector: BTreeMap<String, Money>,
    pub invoiced: Money,
    pub collected: Money,
}

impl Aggregates {
    /// Walk deals and work orders once
    ///
    /// Sectors are re-normalised here as well as in cleaning; the operation
    /// is idempotent, and it keeps hand-built snapshots consistent.
    pub fn compute(snapshot: &Snapshot) -> Self {
        let mut agg = Aggregates::default();

        for deal in &snapshot.deals {
            match deal.status {
                DealStatus::Open => {
                    agg.pipeline += deal.value;
                    *agg.pipeline_by_sector
                        .entry(normalize_sector(Some(&deal.sector)))
                        .or_default() += deal.value;
                }
                DealStatus::Won => {
                    agg.won_count += 1;
                    agg.revenue += deal.value;
                    *agg.revenue_by_sector
                        .entry(normalize_sector(Some(&deal.sector)))
                        .or_default() += deal.value;
                }
                DealStatus::Lost => agg.lost_count += 1,
                DealStatus::Closed => {}
            }
        }

        for wo in &snapshot.work_orders {
            agg.invoiced += wo.invoiced;
            agg.collected += wo.collected;
        }

        agg
    }
}

/// Amount descending, then sector name ascending
pub fn sorted_breakdown(by_sector: &BTreeMap<String, Money>) -> Vec<SectorAmount> {
    let mut rows: Vec<SectorAmount> = by_sector
        .iter()
        .map(|(sector, amount)| SectorAmount {
            sector: sector.clone(),
            amount: *amount,
        })
        .collect();
    rows.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.sector.cmp(&b.sector)));
    rows
}
