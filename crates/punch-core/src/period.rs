//! Report periods and their half-open time windows.

use chrono::{Datelike, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// The fixed report periods.
///
/// Each resolves against an injected reference `now` rather than a global
/// clock, so aggregation stays deterministic and testable. Weeks start on
/// Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    Today,
    ThisWeek,
    ThisMonth,
    Last7Days,
    Last30Days,
}

impl ReportPeriod {
    /// Human-readable label, used in report headers and CSV exports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::ThisWeek => "This week",
            Self::ThisMonth => "This month",
            Self::Last7Days => "Last 7 days",
            Self::Last30Days => "Last 30 days",
        }
    }

    /// Resolves the period to a concrete window ending at `now`.
    #[must_use]
    pub fn window(self, now: NaiveDateTime) -> Window {
        let midnight = now.date().and_hms_opt(0, 0, 0).unwrap();
        let start = match self {
            Self::Today => midnight,
            Self::ThisWeek => {
                let days = i64::from(now.date().weekday().num_days_from_monday());
                midnight - Duration::days(days)
            }
            Self::ThisMonth => now.date().with_day(1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            Self::Last7Days => now - Duration::days(7),
            Self::Last30Days => now - Duration::days(30),
        };
        Window { start, end: now }
    }
}

/// A half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    #[must_use]
    pub const fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Whether an instant falls inside the window.
    #[must_use]
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Seconds of overlap between the interval `[interval_start,
    /// interval_end)` and this window. Intervals fully outside contribute 0.
    #[must_use]
    pub fn clip_seconds(&self, interval_start: NaiveDateTime, interval_end: NaiveDateTime) -> i64 {
        let start = interval_start.max(self.start);
        let end = interval_end.min(self.end);
        (end - start).num_seconds().max(0)
    }
}
