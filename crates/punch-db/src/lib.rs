//! Storage layer for the punch clock.
//!
//! Provides persistence for projects, the event log, and adjustments using
//! `rusqlite`.
//!
//! # Thread Safety
//!
//! [`Database`] wraps a `rusqlite::Connection`, which is `Send` but not
//! `Sync`. For concurrent access wrap it in a `Mutex` (the CLI's session
//! does exactly that) or use one connection per thread.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in ISO 8601 local time with no offset
//! (e.g., `2025-03-10T10:30:00`), matching `chrono::NaiveDateTime`. Events
//! are read back in `seq` order — append order, which the tracking
//! invariant makes equal to timestamp order.
//!
//! The `events.project_id` column deliberately has no foreign key:
//! deleting a project must leave its history behind as orphaned records.
//!
//! The `auto_pause` column is redundant with `event` and is kept
//! consistent on write; a row where the two disagree is treated as corrupt
//! on load.

use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use punch_core::{
    Adjustment, Color, EventKind, EventSink, LogViolation, Project, ProjectId, TimeEvent,
};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A persisted event row failed to parse or is internally
    /// inconsistent. The load path refuses the whole log rather than drop
    /// the row: silent loss would corrupt every future report.
    #[error("corrupt log entry {seq}: {message}")]
    CorruptEvent { seq: i64, message: String },

    /// Failed to parse a persisted event timestamp.
    #[error("invalid timestamp for log entry {seq}: {timestamp}")]
    TimestampParse {
        seq: i64,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The persisted log violates the tracking invariants.
    #[error("event log violates tracking invariants: {0}")]
    InvalidLog(#[from] LogViolation),

    /// A persisted project row failed to parse.
    #[error("corrupt project record {id}: {message}")]
    CorruptProject { id: String, message: String },

    /// A persisted adjustment row failed to parse.
    #[error("corrupt adjustment record {id}: {message}")]
    CorruptAdjustment { id: i64, message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety and schema
/// notes.
pub struct Database {
    conn: Connection,
}

fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

fn parse_timestamp(seq: i64, raw: &str) -> Result<NaiveDateTime, DbError> {
    NaiveDateTime::from_str(raw).map_err(|source| DbError::TimestampParse {
        seq,
        timestamp: raw.to_string(),
        source,
    })
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The schema is initialized on first open, and a fresh database is
    /// seeded with three starter projects.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let fresh = !path.exists();
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        if fresh {
            db.seed_default_projects()?;
        }
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. No starter projects are seeded.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// Idempotent, safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                color TEXT NOT NULL DEFAULT 'white',
                active INTEGER NOT NULL DEFAULT 1
            );

            -- Append-only event log. No foreign key to projects: events
            -- survive project deletion as orphaned history.
            CREATE TABLE IF NOT EXISTS events (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id TEXT NOT NULL,
                event TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                auto_pause INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_events_project ON events(project_id);

            CREATE TABLE IF NOT EXISTS adjustments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id TEXT NOT NULL,
                delta_minutes INTEGER NOT NULL,
                description TEXT,
                timestamp TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    fn seed_default_projects(&self) -> Result<(), DbError> {
        let defaults = [
            ("p1", "Project 1", Color::Green),
            ("p2", "Project 2", Color::Blue),
            ("p3", "Project 3", Color::Yellow),
        ];
        for (id, name, color) in defaults {
            self.conn.execute(
                "INSERT INTO projects (id, name, color, active) VALUES (?, ?, ?, 1)",
                params![id, name, color.as_str()],
            )?;
        }
        tracing::debug!("seeded starter projects");
        Ok(())
    }

    // ========== Projects ==========

    /// Inserts a new project. Fails if the ID already exists.
    pub fn insert_project(&self, project: &Project) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO projects (id, name, color, active) VALUES (?, ?, ?, ?)",
            params![
                project.id.as_str(),
                project.name,
                project.color.as_str(),
                project.active,
            ],
        )?;
        Ok(())
    }

    /// Lists all projects ordered by ID.
    pub fn list_projects(&self) -> Result<Vec<Project>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color, active FROM projects ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
            ))
        })?;
        let mut projects = Vec::new();
        for row in rows {
            let (id, name, color, active) = row?;
            projects.push(parse_project(&id, name, &color, active)?);
        }
        Ok(projects)
    }

    /// Lists projects visible on the tracking surface.
    pub fn list_active_projects(&self) -> Result<Vec<Project>, DbError> {
        Ok(self
            .list_projects()?
            .into_iter()
            .filter(|p| p.active)
            .collect())
    }

    /// Fetches a single project.
    pub fn get_project(&self, id: &ProjectId) -> Result<Option<Project>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, color, active FROM projects WHERE id = ?",
                params![id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, bool>(3)?,
                    ))
                },
            )
            .optional()?;
        row.map(|(id, name, color, active)| parse_project(&id, name, &color, active))
            .transpose()
    }

    /// Updates a project's mutable fields. Returns false if the ID is
    /// unknown.
    pub fn update_project(&self, project: &Project) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE projects SET name = ?, color = ?, active = ? WHERE id = ?",
            params![
                project.name,
                project.color.as_str(),
                project.active,
                project.id.as_str(),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Deletes a project row. Historical events and adjustments referring
    /// to it are kept. Returns false if the ID is unknown.
    pub fn delete_project(&self, id: &ProjectId) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?", params![id.as_str()])?;
        Ok(changed > 0)
    }

    /// Generates the next free `p<n>` project ID, following the numbering
    /// of any existing ids with that shape.
    pub fn next_project_id(&self) -> Result<ProjectId, DbError> {
        let max = self
            .list_projects()?
            .iter()
            .filter_map(|p| p.id.as_str().strip_prefix('p'))
            .filter_map(|suffix| suffix.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Ok(ProjectId::new(format!("p{}", max + 1)).expect("generated id is non-empty"))
    }

    // ========== Event log ==========

    /// Appends events to the log in order, atomically.
    ///
    /// All rows are written in one transaction: a compound transition
    /// (stop-then-start) becomes durable as a whole or not at all. Once
    /// this returns `Ok`, the events are visible to every subsequent load,
    /// including after a restart.
    pub fn append_events(&mut self, events: &[TimeEvent]) -> Result<(), DbError> {
        if events.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO events (project_id, event, timestamp, auto_pause) VALUES (?, ?, ?, ?)",
            )?;
            for event in events {
                stmt.execute(params![
                    event.project_id.as_str(),
                    event.kind.as_str(),
                    format_timestamp(event.timestamp),
                    event.kind.is_auto(),
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(count = events.len(), "appended events");
        Ok(())
    }

    /// Loads the full event log in append order, failing closed.
    ///
    /// Every row is parsed and cross-checked (known kind, parseable
    /// timestamp, `auto_pause` flag consistent with the kind), and the
    /// assembled log is checked against the tracking invariants. Any
    /// violation is an error; no row is ever silently dropped.
    pub fn load_log(&self) -> Result<Vec<TimeEvent>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT seq, project_id, event, timestamp, auto_pause FROM events ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, bool>(4)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (seq, project_id, kind, timestamp, auto_pause) = row?;
            let project_id = ProjectId::new(project_id).map_err(|e| DbError::CorruptEvent {
                seq,
                message: e.to_string(),
            })?;
            let kind = EventKind::from_str(&kind).map_err(|e| DbError::CorruptEvent {
                seq,
                message: e.to_string(),
            })?;
            if kind.is_auto() != auto_pause {
                return Err(DbError::CorruptEvent {
                    seq,
                    message: format!(
                        "auto_pause flag {auto_pause} disagrees with event kind {kind}"
                    ),
                });
            }
            let timestamp = parse_timestamp(seq, &timestamp)?;
            events.push(TimeEvent::new(project_id, kind, timestamp));
        }

        punch_core::verify_log(&events)?;
        Ok(events)
    }

    // ========== Adjustments ==========

    /// Records a manual adjustment.
    pub fn insert_adjustment(&self, adjustment: &Adjustment) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO adjustments (project_id, delta_minutes, description, timestamp)
             VALUES (?, ?, ?, ?)",
            params![
                adjustment.project_id.as_str(),
                adjustment.delta_minutes,
                adjustment.description,
                format_timestamp(adjustment.timestamp),
            ],
        )?;
        Ok(())
    }

    /// Lists all adjustments in creation order.
    pub fn list_adjustments(&self) -> Result<Vec<Adjustment>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, delta_minutes, description, timestamp
             FROM adjustments ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;
        let mut adjustments = Vec::new();
        for row in rows {
            let (id, project_id, delta_minutes, description, timestamp) = row?;
            let project_id = ProjectId::new(project_id).map_err(|e| DbError::CorruptAdjustment {
                id,
                message: e.to_string(),
            })?;
            let timestamp =
                NaiveDateTime::from_str(&timestamp).map_err(|e| DbError::CorruptAdjustment {
                    id,
                    message: format!("invalid timestamp: {e}"),
                })?;
            adjustments.push(Adjustment {
                project_id,
                delta_minutes,
                description,
                timestamp,
            });
        }
        Ok(adjustments)
    }
}

fn parse_project(id: &str, name: String, color: &str, active: bool) -> Result<Project, DbError> {
    let project_id = ProjectId::new(id).map_err(|e| DbError::CorruptProject {
        id: id.to_string(),
        message: e.to_string(),
    })?;
    let color = Color::from_str(color).map_err(|e| DbError::CorruptProject {
        id: id.to_string(),
        message: e.to_string(),
    })?;
    Ok(Project {
        id: project_id,
        name,
        color,
        active,
    })
}

/// The database is the durable sink behind the state machine: a transition
/// is complete only once its events are committed here.
impl EventSink for Database {
    type Error = DbError;

    fn append(&mut self, events: &[TimeEvent]) -> Result<(), Self::Error> {
        self.append_events(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn pid(id: &str) -> ProjectId {
        ProjectId::new(id).unwrap()
    }

    fn event(project: &str, kind: EventKind, timestamp: &str) -> TimeEvent {
        TimeEvent::new(pid(project), kind, ts(timestamp))
    }

    #[test]
    fn append_and_load_roundtrip() {
        let mut db = Database::open_in_memory().unwrap();
        let events = [
            event("p1", EventKind::Start, "2025-03-10 10:00:00"),
            event("p1", EventKind::AutoPause, "2025-03-10 10:30:00"),
            event("p1", EventKind::AutoResume, "2025-03-10 10:50:00"),
            event("p1", EventKind::Stop, "2025-03-10 11:00:00"),
        ];
        db.append_events(&events).unwrap();

        let loaded = db.load_log().unwrap();
        assert_eq!(loaded, events);
    }

    #[test]
    fn appended_events_survive_reopen() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("punch.db");

        {
            let mut db = Database::open(&path).unwrap();
            db.append_events(&[event("p1", EventKind::Start, "2025-03-10 10:00:00")])
                .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let loaded = db.load_log().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].kind, EventKind::Start);
        assert_eq!(loaded[0].timestamp, ts("2025-03-10 10:00:00"));
    }

    #[test]
    fn fresh_file_database_seeds_starter_projects() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("punch.db");

        let db = Database::open(&path).unwrap();
        let projects = db.list_projects().unwrap();
        assert_eq!(projects.len(), 3);
        assert_eq!(projects[0].id, pid("p1"));

        // Reopening must not reseed.
        db.delete_project(&pid("p2")).unwrap();
        drop(db);
        let db = Database::open(&path).unwrap();
        assert_eq!(db.list_projects().unwrap().len(), 2);
    }

    #[test]
    fn load_rejects_unknown_event_kind() {
        let db = Database::open_in_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO events (project_id, event, timestamp, auto_pause)
                 VALUES ('p1', 'resumed', '2025-03-10T10:00:00', 0)",
                [],
            )
            .unwrap();

        let err = db.load_log().unwrap_err();
        assert!(matches!(err, DbError::CorruptEvent { seq: 1, .. }), "{err}");
    }

    #[test]
    fn load_rejects_inconsistent_auto_pause_flag() {
        let db = Database::open_in_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO events (project_id, event, timestamp, auto_pause)
                 VALUES ('p1', 'start', '2025-03-10T10:00:00', 1)",
                [],
            )
            .unwrap();

        let err = db.load_log().unwrap_err();
        assert!(matches!(err, DbError::CorruptEvent { .. }), "{err}");
    }

    #[test]
    fn load_rejects_unparseable_timestamp() {
        let db = Database::open_in_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO events (project_id, event, timestamp, auto_pause)
                 VALUES ('p1', 'start', 'yesterday', 0)",
                [],
            )
            .unwrap();

        let err = db.load_log().unwrap_err();
        assert!(matches!(err, DbError::TimestampParse { seq: 1, .. }), "{err}");
    }

    #[test]
    fn load_rejects_invariant_violating_log() {
        let mut db = Database::open_in_memory().unwrap();
        // Two opens with no close in between. append_events does not
        // validate (the tracker guarantees validity); load must.
        db.append_events(&[
            event("p1", EventKind::Start, "2025-03-10 10:00:00"),
            event("p2", EventKind::Start, "2025-03-10 10:05:00"),
        ])
        .unwrap();

        let err = db.load_log().unwrap_err();
        assert!(matches!(err, DbError::InvalidLog(_)), "{err}");
    }

    #[test]
    fn fractional_timestamps_roundtrip() {
        let mut db = Database::open_in_memory().unwrap();
        let stamp = NaiveDateTime::parse_from_str("2025-03-10 10:00:00.250", "%Y-%m-%d %H:%M:%S%.f")
            .unwrap();
        db.append_events(&[TimeEvent::new(pid("p1"), EventKind::Start, stamp)])
            .unwrap();

        let loaded = db.load_log().unwrap();
        assert_eq!(loaded[0].timestamp, stamp);
    }

    #[test]
    fn project_crud_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        let mut project = Project::new(pid("p1"), "Writing", Color::Green);
        db.insert_project(&project).unwrap();

        assert_eq!(db.get_project(&pid("p1")).unwrap(), Some(project.clone()));

        project.name = "Editing".to_string();
        project.color = Color::Red;
        project.active = false;
        assert!(db.update_project(&project).unwrap());
        assert_eq!(db.get_project(&pid("p1")).unwrap(), Some(project.clone()));
        assert!(db.list_active_projects().unwrap().is_empty());

        assert!(db.delete_project(&pid("p1")).unwrap());
        assert_eq!(db.get_project(&pid("p1")).unwrap(), None);
        assert!(!db.delete_project(&pid("p1")).unwrap());
    }

    #[test]
    fn deleting_a_project_keeps_its_events() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_project(&Project::new(pid("p1"), "Writing", Color::Green))
            .unwrap();
        db.append_events(&[
            event("p1", EventKind::Start, "2025-03-10 10:00:00"),
            event("p1", EventKind::Stop, "2025-03-10 11:00:00"),
        ])
        .unwrap();

        db.delete_project(&pid("p1")).unwrap();
        assert_eq!(db.load_log().unwrap().len(), 2);
    }

    #[test]
    fn next_project_id_follows_numeric_suffixes() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.next_project_id().unwrap(), pid("p1"));

        db.insert_project(&Project::new(pid("p2"), "Two", Color::Blue))
            .unwrap();
        db.insert_project(&Project::new(pid("side-quest"), "Side", Color::Cyan))
            .unwrap();
        assert_eq!(db.next_project_id().unwrap(), pid("p3"));
    }

    #[test]
    fn adjustments_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        let with_note = Adjustment {
            project_id: pid("p1"),
            delta_minutes: -15,
            description: Some("meeting ran over".to_string()),
            timestamp: ts("2025-03-10 12:00:00"),
        };
        let bare = Adjustment {
            project_id: pid("p2"),
            delta_minutes: 30,
            description: None,
            timestamp: ts("2025-03-10 13:00:00"),
        };
        db.insert_adjustment(&with_note).unwrap();
        db.insert_adjustment(&bare).unwrap();

        assert_eq!(db.list_adjustments().unwrap(), vec![with_note, bare]);
    }
}
