//! Metric result types
//!
//! A `MetricResult` is immutable once the engine has produced it. Ratios
//! with a zero denominator are `Ratio::Undefined` and serialise as the
//! string `"undefined"`; NaN and infinity never leave the engine.

use super::Money;
use serde::{Serialize, Serializer};

/// The seven canonical metrics, plus the composite and the default mix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    TotalPipelineValue,
    PipelineBySector,
    WinLossRatio,
    RevenueBySector,
    InvoicedVsCollected,
    CollectionEfficiency,
    PipelineVsRevenue,
    LeadershipUpdate,
    #[default]
    General,
}

impl MetricKind {
    /// The seven canonical kinds in presentation order
    pub const CANONICAL: [MetricKind; 7] = [
        MetricKind::TotalPipelineValue,
        MetricKind::PipelineBySector,
        MetricKind::WinLossRatio,
        MetricKind::RevenueBySector,
        MetricKind::InvoicedVsCollected,
        MetricKind::CollectionEfficiency,
        MetricKind::PipelineVsRevenue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::TotalPipelineValue => "total_pipeline_value",
            MetricKind::PipelineBySector => "pipeline_by_sector",
            MetricKind::WinLossRatio => "win_loss_ratio",
            MetricKind::RevenueBySector => "revenue_by_sector",
            MetricKind::InvoicedVsCollected => "invoiced_vs_collected",
            MetricKind::CollectionEfficiency => "collection_efficiency",
            MetricKind::PipelineVsRevenue => "pipeline_vs_revenue",
            MetricKind::LeadershipUpdate => "leadership_update",
            MetricKind::General => "general",
        }
    }

    /// Lenient parse of a kind name as an LLM might spell it
    ///
    /// Unknown names return `None`; callers fall back to `General`.
    pub fn parse(name: &str) -> Option<Self> {
        let key = name.trim().to_lowercase().replace([' ', '-'], "_");
        let kind = match key.as_str() {
            "total_pipeline_value" | "pipeline_value" | "pipeline" => {
                MetricKind::TotalPipelineValue
            }
            "pipeline_by_sector" => MetricKind::PipelineBySector,
            "win_loss_ratio" | "win_loss" | "deal_ratio" => MetricKind::WinLossRatio,
            "revenue_by_sector" | "revenue" => MetricKind::RevenueBySector,
            "invoiced_vs_collected" => MetricKind::InvoicedVsCollected,
            "collection_efficiency" => MetricKind::CollectionEfficiency,
            "pipeline_vs_revenue" => MetricKind::PipelineVsRevenue,
            "leadership_update" | "leadership" => MetricKind::LeadershipUpdate,
            "general" => MetricKind::General,
            _ => return None,
        };
        Some(kind)
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A quotient that may have no value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Defined(f64),
    Undefined,
}

impl Ratio {
    /// `numerator / denominator`, or `Undefined` when the denominator is 0
    pub fn of(numerator: u64, denominator: u64) -> Self {
        if denominator == 0 {
            Ratio::Undefined
        } else {
            Ratio::Defined(numerator as f64 / denominator as f64)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Ratio::Defined(v) => Some(v),
            Ratio::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Ratio::Defined(_))
    }

    /// `2.50:1` style, or `undefined`
    pub fn format_ratio(self) -> String {
        match self {
            Ratio::Defined(v) => format!("{:.2}:1", v),
            Ratio::Undefined => "undefined".to_string(),
        }
    }

    /// `87.5%` style, or `undefined`
    pub fn format_percent(self) -> String {
        match self {
            Ratio::Defined(v) => format!("{:.1}%", v * 100.0),
            Ratio::Undefined => "undefined".to_string(),
        }
    }
}

impl Serialize for Ratio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Ratio::Defined(v) => serializer.serialize_f64(*v),
            Ratio::Undefined => serializer.serialize_str("undefined"),
        }
    }
}

/// Direction indicator attached to some metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// One bucket of a sector breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectorAmount {
    pub sector: String,
    pub amount: Money,
}

/// Structured value of a metric; amounts are in paise
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricValue {
    Amount {
        amount: Money,
    },
    /// Sorted by amount descending, then sector ascending
    Breakdown {
        sectors: Vec<SectorAmount>,
        total: Money,
    },
    WinLoss {
        won: u64,
        lost: u64,
        ratio: Ratio,
    },
    InvoicedCollected {
        invoiced: Money,
        collected: Money,
        difference: Money,
    },
    Efficiency {
        invoiced: Money,
        collected: Money,
        /// Collected over invoiced as a fraction (0.875 is 87.5%); the
        /// percentage itself is in [`MetricResult::formatted`]
        efficiency: Ratio,
    },
    PipelineRevenue {
        pipeline: Money,
        revenue: Money,
        ratio: Ratio,
    },
}

/// One computed metric, ready for narration and display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricResult {
    pub kind: MetricKind,
    pub value: MetricValue,
    pub formatted: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}
