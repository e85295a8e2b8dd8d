//! Period aggregation: replaying the log into per-project totals.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;

use crate::adjustment::Adjustment;
use crate::event::TimeEvent;
use crate::period::Window;
use crate::types::ProjectId;

/// Per-project totals for one period.
///
/// Totals are signed seconds: a negative adjustment may drive a project
/// below zero, and that is preserved rather than clamped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeriodTotals {
    per_project: BTreeMap<ProjectId, i64>,
    total_seconds: i64,
}

impl PeriodTotals {
    /// Seconds accrued by a project in the period. Projects with no events
    /// and no adjustments report zero.
    #[must_use]
    pub fn seconds_for(&self, project_id: &ProjectId) -> i64 {
        self.per_project.get(project_id).copied().unwrap_or(0)
    }

    /// All projects that accrued time (or adjustments) in the period, in
    /// stable id order. Includes orphaned ids whose project was deleted.
    pub fn iter(&self) -> impl Iterator<Item = (&ProjectId, i64)> {
        self.per_project.iter().map(|(id, secs)| (id, *secs))
    }

    /// The TOTAL row: the sum over every project, adjustments included.
    #[must_use]
    pub const fn total_seconds(&self) -> i64 {
        self.total_seconds
    }
}

/// Replays the event log and adjustments into per-project totals for a
/// window.
///
/// A trailing open interval (the currently active project) is closed
/// virtually at `now` for this computation only; nothing is appended to
/// the log. The call is read-only and repeatable: the same log and window
/// always produce the same totals.
///
/// Events must be in append order (timestamp order, by the log invariant).
#[must_use]
pub fn aggregate(
    events: &[TimeEvent],
    adjustments: &[Adjustment],
    window: &Window,
    now: NaiveDateTime,
) -> PeriodTotals {
    let mut open_since: HashMap<&ProjectId, NaiveDateTime> = HashMap::new();
    let mut per_project: BTreeMap<ProjectId, i64> = BTreeMap::new();

    for event in events {
        if event.kind.opens_interval() {
            open_since.entry(&event.project_id).or_insert(event.timestamp);
        } else if let Some(since) = open_since.remove(&event.project_id) {
            let secs = window.clip_seconds(since, event.timestamp);
            if secs > 0 {
                *per_project.entry(event.project_id.clone()).or_insert(0) += secs;
            }
        }
    }

    // The active project's interval has no closing event yet.
    for (project_id, since) in open_since {
        let secs = window.clip_seconds(since, now);
        if secs > 0 {
            *per_project.entry(project_id.clone()).or_insert(0) += secs;
        }
    }

    for adjustment in adjustments {
        if window.contains(adjustment.timestamp) {
            *per_project
                .entry(adjustment.project_id.clone())
                .or_insert(0) += adjustment.delta_seconds();
        }
    }

    let total_seconds = per_project.values().sum();
    PeriodTotals {
        per_project,
        total_seconds,
    }
}
