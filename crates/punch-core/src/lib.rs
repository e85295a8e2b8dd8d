//! Core domain logic for the punch clock.
//!
//! This crate contains the time-tracking engine:
//! - the event log model and its structural invariants
//! - the single-active-project state machine ([`Tracker`])
//! - period-bucketed aggregation ([`aggregate`])
//!
//! It performs no I/O. Persistence sits behind the [`EventSink`] trait and
//! is provided by `punch-db`.

pub mod adjustment;
pub mod aggregate;
pub mod event;
pub mod period;
pub mod project;
pub mod tracker;
pub mod types;

#[cfg(test)]
mod testutil;

pub use adjustment::Adjustment;
pub use aggregate::{PeriodTotals, aggregate};
pub use event::{EventKind, LogViolation, TimeEvent, UnknownEventKind, verify_log};
pub use period::{ReportPeriod, Window};
pub use project::{Color, Project};
pub use tracker::{EventSink, ToggleOutcome, Tracker, TrackerState};
pub use types::{ProjectId, ValidationError};
