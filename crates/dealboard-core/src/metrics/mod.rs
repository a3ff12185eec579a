//! Metrics engine
//!
//! Pure functions from a cleaned [`Snapshot`] to [`MetricResult`]s. No I/O,
//! no clock, no randomness: the same snapshot always yields the same
//! results, byte for byte once serialised.
//!
//! Money is summed in paise. Sector breakdowns include the `unknown` bucket
//! so they always reconcile exactly with the matching total.

use chrono::NaiveDate;

use crate::models::{
    Intent, MetricKind, MetricResult, MetricValue, Ratio, SectorAmount, Snapshot, SummaryStats,
    Trend, UNKNOWN_SECTOR,
};

pub mod aggregate;
pub mod scope;


pub use aggregate::Aggregates;
pub use scope::{period_window, DateWindow, MetricScope};

/// Collection efficiency at or above this is reported as stable
const EFFICIENCY_STABLE: f64 = 0.9;

/// Metrics used when the question has no specific focus
pub const GENERAL_METRICS: [MetricKind; 4] = [
    MetricKind::TotalPipelineValue,
    MetricKind::CollectionEfficiency,
    MetricKind::InvoicedVsCollected,
    MetricKind::WinLossRatio,
];

fn format_breakdown(rows: &[SectorAmount]) -> String {
    if rows.is_empty() {
        return "No data".to_string();
    }
    rows.iter()
        .map(|row| format!("{}: {}", row.sector, row.amount.format_inr()))
        .collect::<Vec<_>>()
        .join(" | ")
}

impl Aggregates {
    fn total_pipeline_value(&self) -> MetricResult {
        MetricResult {
            kind: MetricKind::TotalPipelineValue,
            value: MetricValue::Amount {
                amount: self.pipeline,
            },
            formatted: self.pipeline.format_inr(),
            description: "Total value of open deals".to_string(),
            trend: None,
        }
    }

    fn pipeline_by_sector(&self) -> MetricResult {
        let sectors = aggregate::sorted_breakdown(&self.pipeline_by_sector);
        MetricResult {
            kind: MetricKind::PipelineBySector,
            formatted: format_breakdown(&sectors),
            value: MetricValue::Breakdown {
                sectors,
                total: self.pipeline,
            },
            description: "Open pipeline value by sector".to_string(),
            trend: None,
        }
    }

    fn win_loss_ratio(&self) -> MetricResult {
        let ratio = Ratio::of(self.won_count, self.lost_count);
        MetricResult {
            kind: MetricKind::WinLossRatio,
            value: MetricValue::WinLoss {
                won: self.won_count,
                lost: self.lost_count,
                ratio,
            },
            formatted: format!(
                "{} won : {} lost ({})",
                self.won_count,
                self.lost_count,
                ratio.format_ratio()
            ),
            description: "Closed-won deals per closed-lost deal".to_string(),
            trend: None,
        }
    }

    fn revenue_by_sector(&self) -> MetricResult {
        let sectors = aggregate::sorted_breakdown(&self.revenue_by_sector);
        MetricResult {
            kind: MetricKind::RevenueBySector,
            formatted: format_breakdown(&sectors),
            value: MetricValue::Breakdown {
                sectors,
                total: self.revenue,
            },
            description: "Closed-won revenue by sector".to_string(),
            trend: None,
        }
    }

    fn invoiced_vs_collected(&self) -> MetricResult {
        let difference = self.invoiced.abs_diff(self.collected);
        MetricResult {
            kind: MetricKind::InvoicedVsCollected,
            value: MetricValue::InvoicedCollected {
                invoiced: self.invoiced,
                collected: self.collected,
                difference,
            },
            formatted: format!(
                "Invoiced: {} | Collected: {} | Difference: {}",
                self.invoiced.format_inr(),
                self.collected.format_inr(),
                difference.format_inr()
            ),
            description: "Work-order amounts invoiced against amounts collected".to_string(),
            trend: None,
        }
    }

    fn collection_efficiency(&self) -> MetricResult {
        let efficiency = Ratio::of(self.collected.paise(), self.invoiced.paise());
        let trend = efficiency.value().map(|e| {
            if e >= EFFICIENCY_STABLE {
                Trend::Stable
            } else {
                Trend::Down
            }
        });
        MetricResult {
            kind: MetricKind::CollectionEfficiency,
            value: MetricValue::Efficiency {
                invoiced: self.invoiced,
                collected: self.collected,
                efficiency,
            },
            formatted: efficiency.format_percent(),
            description: "Share of invoiced value already collected".to_string(),
            trend,
        }
    }

    fn pipeline_vs_revenue(&self) -> MetricResult {
        let ratio = Ratio::of(self.pipeline.paise(), self.revenue.paise());
        MetricResult {
            kind: MetricKind::PipelineVsRevenue,
            value: MetricValue::PipelineRevenue {
                pipeline: self.pipeline,
                revenue: self.revenue,
                ratio,
            },
            formatted: format!(
                "Pipeline: {} | Revenue: {} | Ratio: {}",
                self.pipeline.format_inr(),
                self.revenue.format_inr(),
                ratio.format_ratio()
            ),
            description: "Open pipeline relative to closed-won revenue".to_string(),
            trend: None,
        }
    }

    /// One canonical metric from these aggregates
    fn metric(&self, kind: MetricKind) -> Option<MetricResult> {
        let result = match kind {
            MetricKind::TotalPipelineValue => self.total_pipeline_value(),
            MetricKind::PipelineBySector => self.pipeline_by_sector(),
            MetricKind::WinLossRatio => self.win_loss_ratio(),
            MetricKind::RevenueBySector => self.revenue_by_sector(),
            MetricKind::InvoicedVsCollected => self.invoiced_vs_collected(),
            MetricKind::CollectionEfficiency => self.collection_efficiency(),
            MetricKind::PipelineVsRevenue => self.pipeline_vs_revenue(),
            MetricKind::LeadershipUpdate | MetricKind::General => return None,
        };
        Some(result)
    }
}

// ============================================================================
// Individual metrics
// ============================================================================

/// 1. Sum of open deal values
pub fn total_pipeline_value(snapshot: &Snapshot) -> MetricResult {
    Aggregates::compute(snapshot).total_pipeline_value()
}

/// 2. Open deal values grouped by sector, largest first
pub fn pipeline_by_sector(snapshot: &Snapshot) -> MetricResult {
    Aggregates::compute(snapshot).pipeline_by_sector()
}

/// 3. Closed-won count over closed-lost count
pub fn win_loss_ratio(snapshot: &Snapshot) -> MetricResult {
    Aggregates::compute(snapshot).win_loss_ratio()
}

/// 4. Closed-won deal values grouped by sector, largest first
pub fn revenue_by_sector(snapshot: &Snapshot) -> MetricResult {
    Aggregates::compute(snapshot).revenue_by_sector()
}

/// 5. Work-order invoiced and collected totals with their difference
pub fn invoiced_vs_collected(snapshot: &Snapshot) -> MetricResult {
    Aggregates::compute(snapshot).invoiced_vs_collected()
}

/// 6. Collected over invoiced, as a percentage
pub fn collection_efficiency(snapshot: &Snapshot) -> MetricResult {
    Aggregates::compute(snapshot).collection_efficiency()
}

/// 7. Open pipeline over closed-won revenue
pub fn pipeline_vs_revenue(snapshot: &Snapshot) -> MetricResult {
    Aggregates::compute(snapshot).pipeline_vs_revenue()
}

// ============================================================================
// Composite
// ============================================================================

/// All seven canonical metrics computed from one pass over one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct LeadershipUpdate {
    pub total_pipeline_value: MetricResult,
    pub pipeline_by_sector: MetricResult,
    pub win_loss_ratio: MetricResult,
    pub revenue_by_sector: MetricResult,
    pub invoiced_vs_collected: MetricResult,
    pub collection_efficiency: MetricResult,
    pub pipeline_vs_revenue: MetricResult,
}

impl LeadershipUpdate {
    /// The seven results in [`MetricKind::CANONICAL`] order
    pub fn into_results(self) -> Vec<MetricResult> {
        vec![
            self.total_pipeline_value,
            self.pipeline_by_sector,
            self.win_loss_ratio,
            self.revenue_by_sector,
            self.invoiced_vs_collected,
            self.collection_efficiency,
            self.pipeline_vs_revenue,
        ]
    }
}

pub fn leadership_update(snapshot: &Snapshot) -> LeadershipUpdate {
    let agg = Aggregates::compute(snapshot);
    LeadershipUpdate {
        total_pipeline_value: agg.total_pipeline_value(),
        pipeline_by_sector: agg.pipeline_by_sector(),
        win_loss_ratio: agg.win_loss_ratio(),
        revenue_by_sector: agg.revenue_by_sector(),
        invoiced_vs_collected: agg.invoiced_vs_collected(),
        collection_efficiency: agg.collection_efficiency(),
        pipeline_vs_revenue: agg.pipeline_vs_revenue(),
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Metrics to show for a kind of question
///
/// A canonical kind yields that metric alone, the leadership update yields
/// all seven, and `General` yields [`GENERAL_METRICS`].
pub fn metrics_for_intent(kind: MetricKind, snapshot: &Snapshot) -> Vec<MetricResult> {
    match kind {
        MetricKind::LeadershipUpdate => leadership_update(snapshot).into_results(),
        MetricKind::General => {
            let agg = Aggregates::compute(snapshot);
            GENERAL_METRICS
                .iter()
                .filter_map(|kind| agg.metric(*kind))
                .collect()
        }
        single => Aggregates::compute(snapshot)
            .metric(single)
            .into_iter()
            .collect(),
    }
}

/// Scope the snapshot to the intent's sector and period, then select
///
/// When a scope applies, its label is appended to each description.
pub fn compute_for_intent(
    intent: &Intent,
    snapshot: &Snapshot,
    today: NaiveDate,
) -> Vec<MetricResult> {
    let scope = MetricScope::from_intent(intent);
    let scoped = scope.apply(snapshot, today);
    let mut results = metrics_for_intent(intent.metric_kind, &scoped);

    if let Some(label) = scope.label() {
        for result in &mut results {
            result.description = format!("{} ({})", result.description, label);
        }
    }
    results
}

/// Completeness counts over a snapshot
pub fn summary_stats(snapshot: &Snapshot, warning_count: usize) -> SummaryStats {
    let mut sectors: Vec<String> = snapshot
        .deals
        .iter()
        .map(|d| d.sector.as_str())
        .chain(snapshot.work_orders.iter().map(|w| w.sector.as_str()))
        .filter(|s| *s != UNKNOWN_SECTOR)
        .map(str::to_string)
        .collect();
    sectors.sort();
    sectors.dedup();

    SummaryStats {
        total_deals: snapshot.deals.len(),
        total_work_orders: snapshot.work_orders.len(),
        deals_with_value: snapshot.deals.iter().filter(|d| !d.value.is_zero()).count(),
        deals_with_sector: snapshot
            .deals
            .iter()
            .filter(|d| d.sector != UNKNOWN_SECTOR)
            .count(),
        work_orders_with_invoiced: snapshot
            .work_orders
            .iter()
            .filter(|w| !w.invoiced.is_zero())
            .count(),
        work_orders_with_collected: snapshot
            .work_orders
            .iter()
            .filter(|w| !w.collected.is_zero())
            .count(),
        unique_sectors: sectors,
        data_quality_warnings: warning_count,
    }
}
