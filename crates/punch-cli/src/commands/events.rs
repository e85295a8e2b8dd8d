//! `punch events`: dump the log as JSON lines.

use std::io::Write;

use anyhow::Result;

use punch_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, limit: Option<usize>) -> Result<()> {
    let log = db.load_log()?;
    let skip = limit.map_or(0, |n| log.len().saturating_sub(n));
    for event in &log[skip..] {
        writeln!(writer, "{}", serde_json::to_string(event)?)?;
    }
    Ok(())
}
