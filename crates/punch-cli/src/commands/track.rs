//! `punch track`: interactive tracking with idle detection.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Local;

use punch_core::{Project, ToggleOutcome, TrackerState};
use punch_db::Database;

use crate::idle::IdleMonitor;
use crate::session::Session;

use super::util::format_hms;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

pub fn run(db: Database, idle_timeout: Duration) -> Result<()> {
    let projects = db.list_active_projects()?;
    if projects.is_empty() {
        bail!("no active projects; add one with `punch projects add`");
    }
    let session = Arc::new(Session::open(db).context("failed to open tracking session")?);

    let mut monitor = IdleMonitor::spawn(
        idle_timeout,
        POLL_INTERVAL,
        {
            let session = Arc::clone(&session);
            move || match session.idle_detected() {
                Ok(true) => println!("auto-paused after inactivity"),
                Ok(false) => {}
                Err(error) => tracing::error!(%error, "failed to record auto-pause"),
            }
        },
        {
            let session = Arc::clone(&session);
            move || match session.activity_resumed() {
                Ok(true) => println!("resumed"),
                Ok(false) => {}
                Err(error) => tracing::error!(%error, "failed to record auto-resume"),
            }
        },
    );

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    run_loop(
        stdin.lock(),
        &mut stdout,
        &session,
        &monitor,
        &projects,
        idle_timeout,
    )?;
    monitor.stop();

    // An interval left open would keep accruing after the terminal closes.
    if session.stop().context("failed to record the stop")? {
        println!("Stopped on exit.");
    }
    Ok(())
}

fn run_loop<R: BufRead, W: Write>(
    input: R,
    out: &mut W,
    session: &Session,
    monitor: &IdleMonitor,
    projects: &[Project],
    idle_timeout: Duration,
) -> Result<()> {
    writeln!(
        out,
        "Tracking session (auto-pause after {} min idle)",
        idle_timeout.as_secs() / 60
    )?;
    for (i, project) in projects.iter().enumerate() {
        writeln!(out, "  {}. {} ({})", i + 1, project.name, project.id)?;
    }
    writeln!(out, "Number toggles a project, 'p' pauses, 'q' quits.")?;

    for line in input.lines() {
        let line = line.context("failed to read input")?;
        monitor.touch();

        match line.trim() {
            "" => {}
            "q" => return Ok(()),
            "p" => {
                if !session.stop().context("failed to record the stop")? {
                    writeln!(out, "Nothing is being tracked.")?;
                }
            }
            token => match token.parse::<usize>() {
                Ok(n) if (1..=projects.len()).contains(&n) => {
                    let project = &projects[n - 1];
                    let outcome = session
                        .toggle(project.id.clone())
                        .context("failed to record the transition")?;
                    if let ToggleOutcome::Switched { from } = outcome {
                        writeln!(out, "Stopped {from}.")?;
                    }
                }
                _ => writeln!(out, "Unrecognized input '{token}'.")?,
            },
        }
        write_state(out, session, projects)?;
    }
    Ok(())
}

fn write_state<W: Write>(out: &mut W, session: &Session, projects: &[Project]) -> Result<()> {
    let name = |id: &punch_core::ProjectId| {
        projects
            .iter()
            .find(|p| &p.id == id)
            .map_or_else(|| id.to_string(), |p| p.name.clone())
    };
    match session.state() {
        TrackerState::Active { project_id, .. } => {
            let elapsed = session.current_elapsed(Local::now().naive_local());
            writeln!(
                out,
                "tracking {} [{}]",
                name(&project_id),
                format_hms(elapsed.num_seconds()),
            )?;
        }
        TrackerState::AutoPaused { project_id } => {
            writeln!(out, "auto-paused {}", name(&project_id))?;
        }
        TrackerState::Idle => writeln!(out, "idle")?,
    }
    Ok(())
}
