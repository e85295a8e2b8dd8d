//! The single-active-project state machine.
//!
//! The tracker owns the "at most one open interval" invariant: it is the
//! only component that constructs events, and it hands them to an
//! [`EventSink`] before applying any in-memory change. A failed append
//! means the transition did not happen, so memory and disk can never
//! disagree.

use chrono::{Duration, NaiveDateTime};

use crate::event::{EventKind, TimeEvent};
use crate::types::ProjectId;

/// Durable destination for appended events.
///
/// `append` must be atomic: either every event in the batch is durably
/// visible to subsequent reads (including after a process restart) or none
/// is. Compound transitions such as an implicit stop-then-start rely on
/// this. The sink never rejects events on logical grounds; validity is the
/// tracker's job.
pub trait EventSink {
    type Error;

    fn append(&mut self, events: &[TimeEvent]) -> Result<(), Self::Error>;
}

/// Appending to an in-memory log cannot fail. Used by tests and replays.
impl EventSink for Vec<TimeEvent> {
    type Error = std::convert::Infallible;

    fn append(&mut self, events: &[TimeEvent]) -> Result<(), Self::Error> {
        self.extend_from_slice(events);
        Ok(())
    }
}

/// The tracker's cached state.
///
/// Fully derivable from the log's trailing open interval, but cached so
/// that decisions and `current_elapsed` are O(1). `AutoPaused` is an
/// in-memory sub-state only: it distinguishes "idle because the monitor
/// paused us" from "idle because the user stopped", which decides whether
/// a later activity signal resumes anything. It is not persisted; after a
/// restart an auto-paused session is plain idle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TrackerState {
    #[default]
    Idle,
    Active {
        project_id: ProjectId,
        since: NaiveDateTime,
    },
    AutoPaused {
        project_id: ProjectId,
    },
}

/// Outcome of a toggle request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The project was idle and is now tracking.
    Started,
    /// The project was already tracking and has been stopped.
    Stopped,
    /// Another project was tracking; it was stopped first.
    Switched { from: ProjectId },
}

/// The single-active-project state machine.
#[derive(Debug, Clone, Default)]
pub struct Tracker {
    state: TrackerState,
}

impl Tracker {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: TrackerState::Idle,
        }
    }

    /// Rebuilds the tracker from a replayed log.
    ///
    /// A trailing open interval makes that project active again; anything
    /// else is idle. Events must be in append order.
    #[must_use]
    pub fn replay(events: &[TimeEvent]) -> Self {
        let mut open: Option<(&ProjectId, NaiveDateTime)> = None;
        for event in events {
            if event.kind.opens_interval() {
                open = Some((&event.project_id, event.timestamp));
            } else {
                open = None;
            }
        }
        let state = match open {
            Some((project_id, since)) => TrackerState::Active {
                project_id: project_id.clone(),
                since,
            },
            None => TrackerState::Idle,
        };
        Self { state }
    }

    #[must_use]
    pub const fn state(&self) -> &TrackerState {
        &self.state
    }

    /// The project currently accruing time, if any.
    #[must_use]
    pub const fn active_project(&self) -> Option<&ProjectId> {
        match &self.state {
            TrackerState::Active { project_id, .. } => Some(project_id),
            TrackerState::Idle | TrackerState::AutoPaused { .. } => None,
        }
    }

    /// Elapsed time of the open interval, or zero when idle.
    ///
    /// Pure read on cached state, cheap enough for a sub-second UI tick;
    /// never replays the log.
    #[must_use]
    pub fn current_elapsed(&self, now: NaiveDateTime) -> Duration {
        match &self.state {
            TrackerState::Active { since, .. } => (now - *since).max(Duration::zero()),
            TrackerState::Idle | TrackerState::AutoPaused { .. } => Duration::zero(),
        }
    }

    /// Toggles tracking for a project.
    ///
    /// Toggling the active project stops it. Toggling while another
    /// project is active stops that one first and starts the requested
    /// one, as a single atomic append of two events. Toggling while idle
    /// (or auto-paused, which a manual action clears) starts the project.
    pub fn toggle<S: EventSink>(
        &mut self,
        sink: &mut S,
        project_id: ProjectId,
        now: NaiveDateTime,
    ) -> Result<ToggleOutcome, S::Error> {
        match self.state.clone() {
            TrackerState::Active {
                project_id: active, ..
            } if active == project_id => {
                sink.append(&[TimeEvent::new(project_id.clone(), EventKind::Stop, now)])?;
                tracing::debug!(project = %project_id, "stopped tracking");
                self.state = TrackerState::Idle;
                Ok(ToggleOutcome::Stopped)
            }
            TrackerState::Active {
                project_id: active, ..
            } => {
                sink.append(&[
                    TimeEvent::new(active.clone(), EventKind::Stop, now),
                    TimeEvent::new(project_id.clone(), EventKind::Start, now),
                ])?;
                tracing::debug!(from = %active, to = %project_id, "switched tracking");
                self.state = TrackerState::Active {
                    project_id,
                    since: now,
                };
                Ok(ToggleOutcome::Switched { from: active })
            }
            TrackerState::Idle | TrackerState::AutoPaused { .. } => {
                sink.append(&[TimeEvent::new(project_id.clone(), EventKind::Start, now)])?;
                tracing::debug!(project = %project_id, "started tracking");
                self.state = TrackerState::Active {
                    project_id,
                    since: now,
                };
                Ok(ToggleOutcome::Started)
            }
        }
    }

    /// Stops the active project, if any.
    ///
    /// Idle is a no-op, not an error. Being a manual action, this also
    /// clears an auto-pause, so a later activity signal resumes nothing.
    /// Returns whether a stop was recorded.
    pub fn pause_current<S: EventSink>(
        &mut self,
        sink: &mut S,
        now: NaiveDateTime,
    ) -> Result<bool, S::Error> {
        match self.state.clone() {
            TrackerState::Active { project_id, .. } => {
                sink.append(&[TimeEvent::new(project_id.clone(), EventKind::Stop, now)])?;
                tracing::debug!(project = %project_id, "stopped tracking");
                self.state = TrackerState::Idle;
                Ok(true)
            }
            TrackerState::AutoPaused { .. } => {
                // Nothing is open, so there is nothing to stop; the manual
                // action still cancels the pending resume.
                self.state = TrackerState::Idle;
                Ok(false)
            }
            TrackerState::Idle => Ok(false),
        }
    }

    /// Idle signal from the monitor.
    ///
    /// Pauses the active project. Already idle (including a duplicate
    /// fire) is a no-op. Returns whether a pause was recorded.
    pub fn idle_detected<S: EventSink>(
        &mut self,
        sink: &mut S,
        now: NaiveDateTime,
    ) -> Result<bool, S::Error> {
        match self.state.clone() {
            TrackerState::Active { project_id, .. } => {
                sink.append(&[TimeEvent::new(
                    project_id.clone(),
                    EventKind::AutoPause,
                    now,
                )])?;
                tracing::debug!(project = %project_id, "auto-paused on idle");
                self.state = TrackerState::AutoPaused { project_id };
                Ok(true)
            }
            TrackerState::Idle | TrackerState::AutoPaused { .. } => Ok(false),
        }
    }

    /// Activity signal from the monitor.
    ///
    /// Only meaningful after an auto-pause: resumes the paused project.
    /// In any other state (including after the user stopped manually in
    /// the interim) this is a no-op. Returns whether a resume was
    /// recorded.
    pub fn activity_resumed<S: EventSink>(
        &mut self,
        sink: &mut S,
        now: NaiveDateTime,
    ) -> Result<bool, S::Error> {
        match self.state.clone() {
            TrackerState::AutoPaused { project_id } => {
                sink.append(&[TimeEvent::new(
                    project_id.clone(),
                    EventKind::AutoResume,
                    now,
                )])?;
                tracing::debug!(project = %project_id, "auto-resumed on activity");
                self.state = TrackerState::Active {
                    project_id,
                    since: now,
                };
                Ok(true)
            }
            TrackerState::Idle | TrackerState::Active { .. } => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::verify_log;
    use crate::testutil::{pid, ts};
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("sink unavailable")]
    struct SinkDown;

    /// A sink that always fails, for rollback tests.
    struct BrokenSink;

    impl EventSink for BrokenSink {
        type Error = SinkDown;

        fn append(&mut self, _events: &[TimeEvent]) -> Result<(), Self::Error> {
            Err(SinkDown)
        }
    }

    fn kinds(log: &[TimeEvent]) -> Vec<(String, EventKind)> {
        log.iter()
            .map(|e| (e.project_id.to_string(), e.kind))
            .collect()
    }

    #[test]
    fn toggle_walks_through_start_switch_stop() {
        let mut log = Vec::new();
        let mut tracker = Tracker::new();

        let outcome = tracker.toggle(&mut log, pid("a"), ts("2025-03-10 10:00:00")).unwrap();
        assert_eq!(outcome, ToggleOutcome::Started);

        let outcome = tracker.toggle(&mut log, pid("b"), ts("2025-03-10 10:30:00")).unwrap();
        assert_eq!(outcome, ToggleOutcome::Switched { from: pid("a") });

        let outcome = tracker.toggle(&mut log, pid("b"), ts("2025-03-10 11:00:00")).unwrap();
        assert_eq!(outcome, ToggleOutcome::Stopped);

        assert_eq!(
            kinds(&log),
            vec![
                ("a".to_string(), EventKind::Start),
                ("a".to_string(), EventKind::Stop),
                ("b".to_string(), EventKind::Start),
                ("b".to_string(), EventKind::Stop),
            ]
        );
        assert_eq!(verify_log(&log), Ok(()));
        assert_eq!(tracker.state(), &TrackerState::Idle);
    }

    #[test]
    fn switch_appends_stop_before_start_at_the_same_instant() {
        let mut log = Vec::new();
        let mut tracker = Tracker::new();
        let now = ts("2025-03-10 10:00:00");

        tracker.toggle(&mut log, pid("a"), now).unwrap();
        tracker.toggle(&mut log, pid("b"), now).unwrap();

        assert_eq!(log[1].kind, EventKind::Stop);
        assert_eq!(log[2].kind, EventKind::Start);
        assert_eq!(log[1].timestamp, log[2].timestamp);
        assert_eq!(verify_log(&log), Ok(()));
    }

    #[test]
    fn idle_round_trip_excludes_the_gap() {
        let mut log = Vec::new();
        let mut tracker = Tracker::new();

        tracker.toggle(&mut log, pid("a"), ts("2025-03-10 10:00:00")).unwrap();
        assert!(tracker.idle_detected(&mut log, ts("2025-03-10 10:30:00")).unwrap());
        assert!(tracker.activity_resumed(&mut log, ts("2025-03-10 10:50:00")).unwrap());

        assert_eq!(
            kinds(&log),
            vec![
                ("a".to_string(), EventKind::Start),
                ("a".to_string(), EventKind::AutoPause),
                ("a".to_string(), EventKind::AutoResume),
            ]
        );
        // Elapsed restarts at the resume; the paused gap is gone.
        assert_eq!(
            tracker.current_elapsed(ts("2025-03-10 10:55:00")),
            Duration::minutes(5)
        );
    }

    #[test]
    fn duplicate_idle_signal_is_a_no_op() {
        let mut log = Vec::new();
        let mut tracker = Tracker::new();

        tracker.toggle(&mut log, pid("a"), ts("2025-03-10 10:00:00")).unwrap();
        assert!(tracker.idle_detected(&mut log, ts("2025-03-10 10:30:00")).unwrap());
        assert!(!tracker.idle_detected(&mut log, ts("2025-03-10 10:31:00")).unwrap());
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn idle_signal_while_nothing_tracks_is_a_no_op() {
        let mut log = Vec::new();
        let mut tracker = Tracker::new();
        assert!(!tracker.idle_detected(&mut log, ts("2025-03-10 10:00:00")).unwrap());
        assert!(log.is_empty());
    }

    #[test]
    fn resume_without_auto_pause_is_a_no_op() {
        let mut log = Vec::new();
        let mut tracker = Tracker::new();
        assert!(!tracker.activity_resumed(&mut log, ts("2025-03-10 10:00:00")).unwrap());

        tracker.toggle(&mut log, pid("a"), ts("2025-03-10 10:05:00")).unwrap();
        // Active, not auto-paused: activity means nothing.
        assert!(!tracker.activity_resumed(&mut log, ts("2025-03-10 10:06:00")).unwrap());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn manual_stop_cancels_a_pending_resume() {
        let mut log = Vec::new();
        let mut tracker = Tracker::new();

        tracker.toggle(&mut log, pid("a"), ts("2025-03-10 10:00:00")).unwrap();
        tracker.idle_detected(&mut log, ts("2025-03-10 10:30:00")).unwrap();
        // User stops while auto-paused: no event (nothing is open), but the
        // sub-state clears.
        assert!(!tracker.pause_current(&mut log, ts("2025-03-10 10:40:00")).unwrap());
        assert!(!tracker.activity_resumed(&mut log, ts("2025-03-10 10:45:00")).unwrap());

        assert_eq!(log.len(), 2);
        assert_eq!(tracker.state(), &TrackerState::Idle);
    }

    #[test]
    fn toggle_while_auto_paused_starts_fresh_and_cancels_resume() {
        let mut log = Vec::new();
        let mut tracker = Tracker::new();

        tracker.toggle(&mut log, pid("a"), ts("2025-03-10 10:00:00")).unwrap();
        tracker.idle_detected(&mut log, ts("2025-03-10 10:30:00")).unwrap();
        let outcome = tracker.toggle(&mut log, pid("b"), ts("2025-03-10 10:40:00")).unwrap();

        assert_eq!(outcome, ToggleOutcome::Started);
        assert_eq!(log.last().unwrap().kind, EventKind::Start);
        assert_eq!(verify_log(&log), Ok(()));
    }

    #[test]
    fn pause_current_while_idle_is_a_no_op() {
        let mut log = Vec::new();
        let mut tracker = Tracker::new();
        assert!(!tracker.pause_current(&mut log, ts("2025-03-10 10:00:00")).unwrap());
        assert!(log.is_empty());
    }

    #[test]
    fn failed_append_leaves_state_untouched() {
        let mut tracker = Tracker::new();
        let mut log = Vec::new();
        tracker.toggle(&mut log, pid("a"), ts("2025-03-10 10:00:00")).unwrap();

        let mut broken = BrokenSink;
        assert!(tracker.toggle(&mut broken, pid("b"), ts("2025-03-10 10:30:00")).is_err());
        assert!(tracker.pause_current(&mut broken, ts("2025-03-10 10:30:00")).is_err());
        assert!(tracker.idle_detected(&mut broken, ts("2025-03-10 10:30:00")).is_err());

        // Still tracking "a" from the original start.
        assert_eq!(tracker.active_project(), Some(&pid("a")));
        assert_eq!(
            tracker.current_elapsed(ts("2025-03-10 10:30:00")),
            Duration::minutes(30)
        );
    }

    #[test]
    fn replay_restores_the_trailing_open_interval() {
        let mut log = Vec::new();
        let mut tracker = Tracker::new();
        tracker.toggle(&mut log, pid("a"), ts("2025-03-10 10:00:00")).unwrap();
        tracker.toggle(&mut log, pid("b"), ts("2025-03-10 10:30:00")).unwrap();

        let restored = Tracker::replay(&log);
        assert_eq!(
            restored.state(),
            &TrackerState::Active {
                project_id: pid("b"),
                since: ts("2025-03-10 10:30:00"),
            }
        );
    }

    #[test]
    fn replay_of_a_closed_log_is_idle() {
        let mut log = Vec::new();
        let mut tracker = Tracker::new();
        tracker.toggle(&mut log, pid("a"), ts("2025-03-10 10:00:00")).unwrap();
        tracker.idle_detected(&mut log, ts("2025-03-10 10:30:00")).unwrap();

        // The auto-pause sub-state is in-memory only; a restart is idle.
        let restored = Tracker::replay(&log);
        assert_eq!(restored.state(), &TrackerState::Idle);
        assert_eq!(restored.current_elapsed(ts("2025-03-10 11:00:00")), Duration::zero());
    }
}
