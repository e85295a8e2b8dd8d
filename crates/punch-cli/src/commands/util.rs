//! Shared utilities for CLI commands.

use anyhow::{Result, bail};

use punch_core::{Project, ProjectId};
use punch_db::Database;

/// Resolves a user-supplied project reference: exact id first, then exact
/// name.
pub fn resolve_project(db: &Database, needle: &str) -> Result<Project> {
    if let Ok(id) = ProjectId::new(needle) {
        if let Some(project) = db.get_project(&id)? {
            return Ok(project);
        }
    }

    let matches: Vec<Project> = db
        .list_projects()?
        .into_iter()
        .filter(|p| p.name == needle)
        .collect();
    match matches.len() {
        0 => bail!("no project with id or name '{needle}' (see `punch projects list`)"),
        1 => Ok(matches.into_iter().next().unwrap()),
        _ => bail!("'{needle}' names more than one project; use its id"),
    }
}

/// Formats signed seconds as `HH:MM`. Negative totals keep their sign.
pub fn format_hhmm(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let seconds = seconds.abs();
    format!("{sign}{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60)
}

/// Formats non-negative seconds as `HH:MM:SS`, for the live elapsed
/// readout.
pub fn format_hms(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Seconds as decimal hours.
#[allow(clippy::cast_precision_loss, reason = "totals are far below 2^52")]
pub fn decimal_hours(seconds: i64) -> f64 {
    seconds as f64 / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use punch_core::Color;

    #[test]
    fn hhmm_formats_and_keeps_sign() {
        assert_eq!(format_hhmm(0), "00:00");
        assert_eq!(format_hhmm(90 * 60), "01:30");
        assert_eq!(format_hhmm(-45 * 60), "-00:45");
        assert_eq!(format_hhmm(26 * 3600), "26:00");
    }

    #[test]
    fn hms_formats_elapsed() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(3725), "01:02:05");
        assert_eq!(format_hms(-5), "00:00:00");
    }

    #[test]
    fn resolve_prefers_id_over_name() {
        let db = Database::open_in_memory().unwrap();
        db.insert_project(&Project::new(
            ProjectId::new("p1").unwrap(),
            "p2",
            Color::Green,
        ))
        .unwrap();
        db.insert_project(&Project::new(
            ProjectId::new("p2").unwrap(),
            "Writing",
            Color::Blue,
        ))
        .unwrap();

        // "p2" is both a name and an id; the id wins.
        let found = resolve_project(&db, "p2").unwrap();
        assert_eq!(found.id, ProjectId::new("p2").unwrap());

        let found = resolve_project(&db, "Writing").unwrap();
        assert_eq!(found.id, ProjectId::new("p2").unwrap());

        assert!(resolve_project(&db, "nope").is_err());
    }

    #[test]
    fn resolve_rejects_ambiguous_names() {
        let db = Database::open_in_memory().unwrap();
        for id in ["p1", "p2"] {
            db.insert_project(&Project::new(
                ProjectId::new(id).unwrap(),
                "Writing",
                Color::Green,
            ))
            .unwrap();
        }
        assert!(resolve_project(&db, "Writing").is_err());
    }
}
