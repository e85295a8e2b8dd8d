//! Shared fixtures for unit tests.

use chrono::NaiveDateTime;

use crate::event::{EventKind, TimeEvent};
use crate::types::ProjectId;

pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("valid test timestamp")
}

pub fn pid(id: &str) -> ProjectId {
    ProjectId::new(id).expect("valid test project id")
}

pub fn event(project: &str, kind: EventKind, timestamp: NaiveDateTime) -> TimeEvent {
    TimeEvent::new(pid(project), kind, timestamp)
}
