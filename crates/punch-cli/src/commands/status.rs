//! `punch status`: current state plus today's totals.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDateTime;

use punch_core::{ProjectId, ReportPeriod, Tracker, TrackerState, aggregate};
use punch_db::Database;

use super::util::{format_hhmm, format_hms};

pub fn run<W: Write>(writer: &mut W, db: &Database, now: NaiveDateTime) -> Result<()> {
    let log = db.load_log()?;
    let adjustments = db.list_adjustments()?;
    let tracker = Tracker::replay(&log);

    match tracker.state() {
        TrackerState::Active { project_id, since } => {
            writeln!(
                writer,
                "Tracking {} since {}, elapsed {}",
                display_name(db, project_id)?,
                since.format("%H:%M:%S"),
                format_hms(tracker.current_elapsed(now).num_seconds()),
            )?;
        }
        TrackerState::AutoPaused { project_id } => {
            writeln!(writer, "Auto-paused {}", display_name(db, project_id)?)?;
        }
        TrackerState::Idle => writeln!(writer, "Idle")?,
    }

    let window = ReportPeriod::Today.window(now);
    let totals = aggregate(&log, &adjustments, &window, now);

    writeln!(writer)?;
    writeln!(writer, "Today:")?;
    if totals.total_seconds() == 0 && totals.iter().next().is_none() {
        writeln!(writer, "  no tracked time")?;
        return Ok(());
    }
    for (project_id, seconds) in totals.iter() {
        writeln!(
            writer,
            "  {:<24} {:>7}",
            display_name(db, project_id)?,
            format_hhmm(seconds),
        )?;
    }
    writeln!(writer, "  {:<24} {:>7}", "TOTAL", format_hhmm(totals.total_seconds()))?;
    Ok(())
}

/// Name for display; deleted projects fall back to their bare id.
fn display_name(db: &Database, project_id: &ProjectId) -> Result<String> {
    Ok(db
        .get_project(project_id)?
        .map_or_else(|| project_id.to_string(), |p| format!("{} ({})", p.name, p.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use punch_core::{Color, EventKind, Project, TimeEvent};

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn event(id: &str, kind: EventKind, timestamp: NaiveDateTime) -> TimeEvent {
        TimeEvent {
            project_id: ProjectId::new(id).unwrap(),
            kind,
            timestamp,
        }
    }

    #[test]
    fn idle_with_no_history() {
        let db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();
        run(&mut out, &db, ts(13, 0)).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("Idle\n"));
        assert!(out.contains("no tracked time"));
    }

    #[test]
    fn active_project_shows_elapsed_and_counts_toward_today() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_project(&Project::new(
            ProjectId::new("p1").unwrap(),
            "Writing",
            Color::Green,
        ))
        .unwrap();
        db.append_events(&[
            event("p1", EventKind::Start, ts(9, 0)),
            event("p1", EventKind::Stop, ts(10, 0)),
            event("p1", EventKind::Start, ts(12, 30)),
        ])
        .unwrap();

        let mut out = Vec::new();
        run(&mut out, &db, ts(13, 0)).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("Tracking Writing (p1) since 12:30:00, elapsed 00:30:00"));
        // One closed hour plus the open half hour.
        assert!(out.contains("01:30"));
    }

    #[test]
    fn deleted_projects_report_under_their_id() {
        let mut db = Database::open_in_memory().unwrap();
        db.append_events(&[
            event("p9", EventKind::Start, ts(9, 0)),
            event("p9", EventKind::Stop, ts(9, 45)),
        ])
        .unwrap();

        let mut out = Vec::new();
        run(&mut out, &db, ts(13, 0)).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("p9"));
        assert!(out.contains("00:45"));
    }
}
