//! `punch adjust`.

use anyhow::{Result, bail};
use chrono::NaiveDateTime;

use punch_core::Adjustment;
use punch_db::Database;

use super::util::resolve_project;

pub fn run(
    db: &Database,
    project: &str,
    minutes: i64,
    description: Option<String>,
    now: NaiveDateTime,
) -> Result<()> {
    if minutes == 0 {
        bail!("adjustment must be a non-zero number of minutes");
    }
    let target = resolve_project(db, project)?;

    db.insert_adjustment(&Adjustment {
        project_id: target.id.clone(),
        delta_minutes: minutes,
        description,
        timestamp: now,
    })?;

    let sign = if minutes > 0 { "+" } else { "" };
    println!("Recorded {sign}{minutes} min for {} ({})", target.name, target.id);
    Ok(())
}
