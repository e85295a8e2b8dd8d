//! CSV export of report summaries.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use super::report::ReportData;
use super::util::decimal_hours;

/// Timestamped file name under the configured export directory.
pub fn default_export_path(export_dir: &Path, now: NaiveDateTime) -> PathBuf {
    export_dir.join(format!("punch_report_{}.csv", now.format("%Y%m%d_%H%M%S")))
}

pub fn write_summary_csv(path: &Path, data: &ReportData) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, summary_csv(data))
        .with_context(|| format!("failed to write {}", path.display()))
}

fn summary_csv(data: &ReportData) -> String {
    let mut out = String::new();
    out.push_str("Punch - Hours Report\n");
    out.push_str(&format!(
        "Period: {} ({} to {})\n\n",
        data.period.label(),
        data.start.format("%Y-%m-%d %H:%M"),
        data.end.format("%Y-%m-%d %H:%M"),
    ));
    out.push_str("Project,Hours,Decimal Hours\n");
    for row in &data.rows {
        out.push_str(&format!(
            "{},{},{:.2}\n",
            csv_field(&row.name),
            row.hours,
            row.decimal_hours,
        ));
    }
    out.push_str(&format!(
        "TOTAL,{},{:.2}\n",
        data.total_hours,
        decimal_hours(data.total_seconds),
    ));
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
