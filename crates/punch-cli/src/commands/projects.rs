//! `punch projects`: list, add, edit, and remove projects.

use std::io::Write;

use anyhow::{Context, Result};

use punch_core::{Color, Project};
use punch_db::Database;

use crate::cli::ProjectsAction;

use super::util::resolve_project;

pub fn run(db: &Database, action: ProjectsAction) -> Result<()> {
    match action {
        ProjectsAction::List { json } => list(&mut std::io::stdout(), db, json),
        ProjectsAction::Add { name, color } => add(db, &name, &color),
        ProjectsAction::Edit {
            project,
            name,
            color,
            active,
        } => edit(db, &project, name, color, active),
        ProjectsAction::Rm { project } => remove(db, &project),
    }
}

pub fn list<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let projects = db.list_projects()?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&projects)?)?;
        return Ok(());
    }

    if projects.is_empty() {
        writeln!(writer, "No projects. Add one with `punch projects add`.")?;
        return Ok(());
    }
    writeln!(writer, "{:<6} {:<24} {:<8} {}", "ID", "NAME", "COLOR", "ACTIVE")?;
    for project in &projects {
        writeln!(
            writer,
            "{:<6} {:<24} {:<8} {}",
            project.id,
            project.name,
            project.color,
            if project.active { "yes" } else { "no" },
        )?;
    }
    Ok(())
}

fn add(db: &Database, name: &str, color: &str) -> Result<()> {
    let color: Color = color
        .parse()
        .context("valid colors: green, blue, yellow, red, magenta, cyan, white")?;
    let id = db.next_project_id()?;
    let project = Project::new(id, name, color);
    db.insert_project(&project)?;
    println!("Added {} ({})", project.name, project.id);
    Ok(())
}

fn edit(
    db: &Database,
    needle: &str,
    name: Option<String>,
    color: Option<String>,
    active: Option<bool>,
) -> Result<()> {
    let mut project = resolve_project(db, needle)?;
    if let Some(name) = name {
        project.name = name;
    }
    if let Some(color) = color {
        project.color = color
            .parse()
            .context("valid colors: green, blue, yellow, red, magenta, cyan, white")?;
    }
    if let Some(active) = active {
        project.active = active;
    }
    db.update_project(&project)?;
    println!("Updated {} ({})", project.name, project.id);
    Ok(())
}

fn remove(db: &Database, needle: &str) -> Result<()> {
    let project = resolve_project(db, needle)?;
    db.delete_project(&project.id)?;
    println!(
        "Removed {} ({}); its tracked history is kept",
        project.name, project.id
    );
    Ok(())
}
