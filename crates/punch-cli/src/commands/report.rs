//! `punch report`: per-project totals for a period.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Serialize;

use punch_core::{PeriodTotals, ProjectId, ReportPeriod, aggregate};
use punch_db::Database;

use crate::config::Config;

use super::export;
use super::util::{decimal_hours, format_hhmm};

const BAR_WIDTH: usize = 10;

/// One report row. Deleted projects keep reporting under their bare id.
#[derive(Debug, Serialize)]
pub struct ReportRow {
    pub project_id: ProjectId,
    pub name: String,
    pub seconds: i64,
    pub hours: String,
    pub decimal_hours: f64,
}

#[derive(Debug, Serialize)]
pub struct ReportData {
    pub period: ReportPeriod,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub rows: Vec<ReportRow>,
    pub total_seconds: i64,
    pub total_hours: String,
}

pub fn run(
    db: &Database,
    config: &Config,
    period: ReportPeriod,
    json: bool,
    csv: Option<Option<PathBuf>>,
    now: NaiveDateTime,
) -> Result<()> {
    let data = generate(db, period, now)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        render(&mut std::io::stdout(), &data)?;
    }

    if let Some(path) = csv {
        let path = path.unwrap_or_else(|| export::default_export_path(&config.export_dir, now));
        export::write_summary_csv(&path, &data)?;
        println!("Exported {}", path.display());
    }
    Ok(())
}

/// Builds the report: every known project plus any orphaned ids that
/// accrued time, sorted by descending total.
pub fn generate(db: &Database, period: ReportPeriod, now: NaiveDateTime) -> Result<ReportData> {
    let log = db.load_log()?;
    let adjustments = db.list_adjustments()?;
    let window = period.window(now);
    let totals = aggregate(&log, &adjustments, &window, now);

    let projects = db.list_projects()?;
    let mut rows: Vec<ReportRow> = projects
        .iter()
        .map(|p| row(p.id.clone(), p.name.clone(), &totals))
        .collect();
    for (project_id, _) in totals.iter() {
        if !projects.iter().any(|p| &p.id == project_id) {
            rows.push(row(project_id.clone(), project_id.to_string(), &totals));
        }
    }
    rows.sort_by(|a, b| b.seconds.cmp(&a.seconds).then_with(|| a.project_id.cmp(&b.project_id)));

    Ok(ReportData {
        period,
        start: window.start,
        end: window.end,
        rows,
        total_seconds: totals.total_seconds(),
        total_hours: format_hhmm(totals.total_seconds()),
    })
}

fn row(project_id: ProjectId, name: String, totals: &PeriodTotals) -> ReportRow {
    let seconds = totals.seconds_for(&project_id);
    ReportRow {
        project_id,
        name,
        seconds,
        hours: format_hhmm(seconds),
        decimal_hours: decimal_hours(seconds),
    }
}

pub fn render<W: Write>(writer: &mut W, data: &ReportData) -> Result<()> {
    writeln!(writer, "HOURS REPORT: {}", data.period.label())?;
    writeln!(
        writer,
        "{} to {}",
        data.start.format("%Y-%m-%d %H:%M"),
        data.end.format("%Y-%m-%d %H:%M"),
    )?;
    writeln!(writer)?;

    writeln!(writer, "{:<24} {:>7} {:>9}", "Project", "Hours", "Decimal")?;
    writeln!(writer, "{}", "-".repeat(42))?;
    for row in &data.rows {
        writeln!(
            writer,
            "{:<24} {:>7} {:>9.2}",
            truncate(&row.name, 24),
            row.hours,
            row.decimal_hours,
        )?;
    }
    writeln!(writer, "{}", "-".repeat(42))?;
    writeln!(
        writer,
        "{:<24} {:>7} {:>9.2}",
        "TOTAL",
        data.total_hours,
        decimal_hours(data.total_seconds),
    )?;

    let max = data.rows.iter().map(|r| r.seconds).max().unwrap_or(0);
    if max > 0 {
        writeln!(writer)?;
        for row in data.rows.iter().filter(|r| r.seconds > 0) {
            writeln!(
                writer,
                "{:<24} {} {:>7}",
                truncate(&row.name, 24),
                progress_bar(row.seconds, max),
                row.hours,
            )?;
        }
    }
    Ok(())
}

fn truncate(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        name.to_string()
    } else {
        name.chars().take(max_chars - 1).chain(std::iter::once('…')).collect()
    }
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn progress_bar(seconds: i64, max: i64) -> String {
    if max <= 0 || seconds <= 0 {
        return "░".repeat(BAR_WIDTH);
    }
    let filled = ((seconds as f64 / max as f64) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.clamp(1, BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}
