//! The serialized tracking session.
//!
//! Two paths mutate tracking state: the interactive input path and the
//! idle monitor's background signals. Both go through [`Session`], which
//! puts a single mutual-exclusion boundary around the state machine and
//! its durable sink. A compound transition (implicit stop-then-start)
//! therefore can never interleave with an idle signal; whichever arrives
//! second observes the completed transition.
//!
//! Event timestamps are taken from the wall clock *inside* the lock, so
//! append order always equals timestamp order no matter how the two paths
//! race to the boundary.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Local, NaiveDateTime};

use punch_core::{ProjectId, ToggleOutcome, Tracker, TrackerState};
use punch_db::{Database, DbError};

struct Inner {
    db: Database,
    tracker: Tracker,
}

/// A tracking session: the state machine plus its database, behind one
/// lock.
pub struct Session {
    inner: Mutex<Inner>,
}

impl Session {
    /// Opens a session, rebuilding the tracker from the persisted log.
    ///
    /// Fails if the log does not load cleanly; a corrupt log refuses to
    /// track rather than risk compounding the damage.
    pub fn open(db: Database) -> Result<Self, DbError> {
        let log = db.load_log()?;
        let tracker = Tracker::replay(&log);
        tracing::debug!(events = log.len(), state = ?tracker.state(), "session opened");
        Ok(Self {
            inner: Mutex::new(Inner { db, tracker }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Tracker state is only mutated after a successful append, so the
        // inner state stays coherent even if a holder panicked.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Toggles tracking for a project. See [`Tracker::toggle`].
    pub fn toggle(&self, project_id: ProjectId) -> Result<ToggleOutcome, DbError> {
        let mut inner = self.lock();
        let Inner { db, tracker } = &mut *inner;
        tracker.toggle(db, project_id, local_now())
    }

    /// Stops the active project. Returns whether a stop was recorded.
    pub fn stop(&self) -> Result<bool, DbError> {
        let mut inner = self.lock();
        let Inner { db, tracker } = &mut *inner;
        tracker.pause_current(db, local_now())
    }

    /// Idle signal entry point for the monitor.
    pub fn idle_detected(&self) -> Result<bool, DbError> {
        let mut inner = self.lock();
        let Inner { db, tracker } = &mut *inner;
        tracker.idle_detected(db, local_now())
    }

    /// Activity signal entry point for the monitor.
    pub fn activity_resumed(&self) -> Result<bool, DbError> {
        let mut inner = self.lock();
        let Inner { db, tracker } = &mut *inner;
        tracker.activity_resumed(db, local_now())
    }

    /// The current tracker state. A momentarily stale answer is fine for
    /// display purposes.
    pub fn state(&self) -> TrackerState {
        self.lock().tracker.state().clone()
    }

    /// Elapsed time of the open interval, for the refresh tick.
    pub fn current_elapsed(&self, now: NaiveDateTime) -> Duration {
        self.lock().tracker.current_elapsed(now)
    }

    /// Read-only access to the database, for reports inside a running
    /// session.
    pub fn with_db<T>(&self, f: impl FnOnce(&Database) -> T) -> T {
        f(&self.lock().db)
    }
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
