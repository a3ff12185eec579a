//! Sector and time filters applied before metrics are computed
//!
//! The reference date is always passed in, never read from the clock, so
//! scoped computation stays deterministic.

use crate::models::{normalize_sector, Intent, Period, Snapshot, TimeScope};
use chrono::{Datelike, Duration, NaiveDate};

/// Inclusive date window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    /// Records without a date never match a bounded window
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        let Some(date) = date else {
            return false;
        };
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Concrete window for a named period relative to `today`
pub fn period_window(period: Period, today: NaiveDate) -> DateWindow {
    let (start, end) = match period {
        Period::Ytd => (first_of_month(today.year(), 1), Some(today)),
        Period::LastYear => (
            first_of_month(today.year() - 1, 1),
            NaiveDate::from_ymd_opt(today.year() - 1, 12, 31),
        ),
        Period::LastMonth => {
            let this_month = first_of_month(today.year(), today.month());
            let end = this_month.and_then(|d| d.pred_opt());
            (end.and_then(|e| first_of_month(e.year(), e.month())), end)
        }
        Period::LastQuarter => {
            let quarter_start_month = (today.month0() / 3) * 3 + 1;
            let this_quarter = first_of_month(today.year(), quarter_start_month);
            let end = this_quarter.and_then(|d| d.pred_opt());
            let start = end.and_then(|e| first_of_month(e.year(), e.month0() / 3 * 3 + 1));
            (start, end)
        }
        Period::LastWeek => {
            // Monday..Sunday of the previous ISO week
            let days_since_monday = i64::from(today.weekday().num_days_from_monday());
            let start = today - Duration::days(days_since_monday + 7);
            (Some(start), Some(start + Duration::days(6)))
        }
    };
    DateWindow { start, end }
}

/// Optional sector substring and time window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricScope {
    /// Normalised sector fragment
    pub sector: Option<String>,
    pub time: Option<TimeScope>,
}

impl MetricScope {
    pub fn new(sector: Option<&str>, time: Option<TimeScope>) -> Self {
        let sector = sector
            .filter(|s| !s.trim().is_empty())
            .map(|s| normalize_sector(Some(s)));
        Self {
            sector,
            time: time.filter(|t| !t.is_unbounded()),
        }
    }

    pub fn from_intent(intent: &Intent) -> Self {
        Self::new(intent.sector.as_deref(), intent.time_scope)
    }

    pub fn is_unbounded(&self) -> bool {
        self.sector.is_none() && self.time.is_none()
    }

    /// The window to filter on, if any
    pub fn window(&self, today: NaiveDate) -> Option<DateWindow> {
        let time = self.time?;
        Some(match time.period {
            Some(period) => period_window(period, today),
            None => DateWindow {
                start: time.start,
                end: time.end,
            },
        })
    }

    /// Copy of `snapshot` restricted to this scope
    ///
    /// Deals are dated by `created_at`, work orders by `invoice_date`.
    pub fn apply(&self, snapshot: &Snapshot, today: NaiveDate) -> Snapshot {
        if self.is_unbounded() {
            return snapshot.clone();
        }

        let window = self.window(today);
        let sector_ok = |sector: &str| {
            self.sector
                .as_deref()
                .map_or(true, |needle| sector.contains(needle))
        };
        let date_ok = |date: Option<NaiveDate>| window.map_or(true, |w| w.contains(date));

        Snapshot {
            deals: snapshot
                .deals
                .iter()
                .filter(|d| sector_ok(&d.sector) && date_ok(d.created_at))
                .cloned()
                .collect(),
            work_orders: snapshot
                .work_orders
                .iter()
                .filter(|w| sector_ok(&w.sector) && date_ok(w.invoice_date))
                .cloned()
                .collect(),
        }
    }

    /// Human-readable suffix such as `mining sector, last quarter`
    pub fn label(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(sector) = &self.sector {
            parts.push(format!("{} sector", sector));
        }
        if let Some(time) = &self.time {
            match time.period {
                Some(period) => parts.push(
                    match period {
                        Period::Ytd => "year to date",
                        Period::LastWeek => "last week",
                        Period::LastMonth => "last month",
                        Period::LastQuarter => "last quarter",
                        Period::LastYear => "last year",
                    }
                    .to_string(),
                ),
                None => {
                    let start = time.start.map(|d| d.to_string());
                    let end = time.end.map(|d| d.to_string());
                    match (start, end) {
                        (Some(s), Some(e)) => parts.push(format!("{} to {}", s, e)),
                        (Some(s), None) => parts.push(format!("since {}", s)),
                        (None, Some(e)) => parts.push(format!("until {}", e)),
                        (None, None) => {}
                    }
                }
            }
        }
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}
