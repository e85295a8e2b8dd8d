//! Time events: the append-only source of truth for all durations.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ProjectId;

/// A single lifecycle event in the tracking log.
///
/// Events are immutable once appended. The log is never edited or
/// reordered; timestamps must be non-decreasing in append order.
/// Timestamps are timezone-naive local time, matching the on-disk record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEvent {
    /// The project this event belongs to. A weak reference: deleting the
    /// project leaves its events in place as orphaned history.
    pub project_id: ProjectId,
    #[serde(rename = "event")]
    pub kind: EventKind,
    pub timestamp: NaiveDateTime,
}

impl TimeEvent {
    pub fn new(project_id: ProjectId, kind: EventKind, timestamp: NaiveDateTime) -> Self {
        Self {
            project_id,
            kind,
            timestamp,
        }
    }
}

/// The kind of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// User started tracking the project.
    Start,
    /// User stopped tracking (manual, or implicit via a toggle to another
    /// project).
    Stop,
    /// The idle monitor paused tracking.
    AutoPause,
    /// The idle monitor resumed tracking after an auto-pause.
    AutoResume,
}

impl EventKind {
    /// Whether this kind opens an interval.
    #[must_use]
    pub const fn opens_interval(self) -> bool {
        matches!(self, Self::Start | Self::AutoResume)
    }

    /// Whether this kind closes an interval.
    #[must_use]
    pub const fn closes_interval(self) -> bool {
        matches!(self, Self::Stop | Self::AutoPause)
    }

    /// Whether this kind was emitted by the idle monitor rather than the
    /// user. Mirrors the redundant `auto_pause` flag in the stored record.
    #[must_use]
    pub const fn is_auto(self) -> bool {
        matches!(self, Self::AutoPause | Self::AutoResume)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::AutoPause => "auto_pause",
            Self::AutoResume => "auto_resume",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "auto_pause" => Ok(Self::AutoPause),
            "auto_resume" => Ok(Self::AutoResume),
            _ => Err(UnknownEventKind(s.to_string())),
        }
    }
}

impl Serialize for EventKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown event kind strings.
#[derive(Debug, Clone, Error)]
#[error("unknown event kind: {0}")]
pub struct UnknownEventKind(String);

/// A structural violation of the event-log invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogViolation {
    /// Timestamps must be non-decreasing in append order.
    #[error("event {index} ({kind} {project_id}) moves backwards in time")]
    OutOfOrder {
        index: usize,
        project_id: ProjectId,
        kind: EventKind,
    },

    /// An interval was opened while another one was still open.
    #[error("event {index} opens an interval for {project_id} while {open} is still open")]
    DoubleOpen {
        index: usize,
        project_id: ProjectId,
        open: ProjectId,
    },

    /// An interval was closed with no matching open interval.
    #[error("event {index} ({kind}) closes an interval for {project_id} that is not open")]
    DanglingClose {
        index: usize,
        project_id: ProjectId,
        kind: EventKind,
    },
}

/// Checks the structural invariants of an event log.
///
/// At every prefix at most one project may have an open interval, every
/// close must match a still-open interval for the same project, and
/// timestamps must be non-decreasing. A log that fails this check must be
/// refused, not repaired: silently dropping events would corrupt every
/// future report.
pub fn verify_log(events: &[TimeEvent]) -> Result<(), LogViolation> {
    let mut open: Option<&ProjectId> = None;
    let mut previous: Option<NaiveDateTime> = None;

    for (index, event) in events.iter().enumerate() {
        if previous.is_some_and(|prev| event.timestamp < prev) {
            return Err(LogViolation::OutOfOrder {
                index,
                project_id: event.project_id.clone(),
                kind: event.kind,
            });
        }
        previous = Some(event.timestamp);

        if event.kind.opens_interval() {
            if let Some(already_open) = open {
                return Err(LogViolation::DoubleOpen {
                    index,
                    project_id: event.project_id.clone(),
                    open: already_open.clone(),
                });
            }
            open = Some(&event.project_id);
        } else if open != Some(&event.project_id) {
            return Err(LogViolation::DanglingClose {
                index,
                project_id: event.project_id.clone(),
                kind: event.kind,
            });
        } else {
            open = None;
        }
    }

    Ok(())
}
