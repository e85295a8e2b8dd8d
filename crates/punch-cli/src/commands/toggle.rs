//! `punch toggle` and `punch stop`.

use anyhow::{Context, Result};

use punch_core::ToggleOutcome;
use punch_db::Database;

use crate::session::Session;

use super::util::resolve_project;

pub fn run(db: Database, project: &str) -> Result<()> {
    let target = resolve_project(&db, project)?;
    let session = Session::open(db).context("failed to open tracking session")?;

    match session
        .toggle(target.id.clone())
        .context("failed to record the transition")?
    {
        ToggleOutcome::Started => println!("Started {} ({})", target.name, target.id),
        ToggleOutcome::Stopped => println!("Stopped {} ({})", target.name, target.id),
        ToggleOutcome::Switched { from } => {
            println!("Stopped {from}, started {} ({})", target.name, target.id);
        }
    }
    Ok(())
}

pub fn stop(db: Database) -> Result<()> {
    let session = Session::open(db).context("failed to open tracking session")?;
    if session.stop().context("failed to record the stop")? {
        println!("Stopped.");
    } else {
        println!("Nothing is being tracked.");
    }
    Ok(())
}
