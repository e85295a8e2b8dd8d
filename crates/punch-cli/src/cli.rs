//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Terminal punch clock.
///
/// Tracks time across named projects, one active at a time, with automatic
/// idle pauses and per-period reports.
#[derive(Debug, Parser)]
#[command(name = "punch", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the current tracking state and today's totals.
    Status,

    /// Start tracking a project, or stop it if it is already active.
    ///
    /// Starting while another project is active stops that one first.
    Toggle {
        /// Project id or name.
        project: String,
    },

    /// Stop the active project, if any.
    Stop,

    /// Manage projects.
    Projects {
        #[command(subcommand)]
        action: ProjectsAction,
    },

    /// Record a manual time adjustment for a project.
    Adjust {
        /// Project id or name.
        project: String,

        /// Signed minutes to add (negative subtracts).
        #[arg(long, allow_hyphen_values = true)]
        minutes: i64,

        /// Optional note explaining the adjustment.
        #[arg(long)]
        description: Option<String>,
    },

    /// Dump the event log as JSONL for debugging.
    Events {
        /// Only show the most recent N events.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Report tracked time per project for a period.
    Report {
        /// Today (the default).
        #[arg(long, conflicts_with_all = ["week", "month", "last7", "last30"])]
        today: bool,

        /// This week, starting Monday.
        #[arg(long, conflicts_with_all = ["today", "month", "last7", "last30"])]
        week: bool,

        /// This month.
        #[arg(long, conflicts_with_all = ["today", "last7", "last30"])]
        month: bool,

        /// The last 7 days.
        #[arg(long, conflicts_with = "last30")]
        last7: bool,

        /// The last 30 days.
        #[arg(long)]
        last30: bool,

        /// Output as JSON instead of a table.
        #[arg(long)]
        json: bool,

        /// Also export the summary as CSV, to this path or to the
        /// configured export directory when no path is given.
        #[arg(long, num_args = 0..=1)]
        csv: Option<Option<PathBuf>>,
    },

    /// Run an interactive tracking session with idle detection.
    Track {
        /// Minutes of inactivity before auto-pausing (overrides config).
        #[arg(long)]
        idle_timeout: Option<u64>,
    },
}

/// Project management actions.
#[derive(Debug, Subcommand)]
pub enum ProjectsAction {
    /// List projects.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Add a project.
    Add {
        /// Display name.
        name: String,

        /// Palette color: green, blue, yellow, red, magenta, cyan, white.
        #[arg(long, default_value = "white")]
        color: String,
    },

    /// Edit a project's name, color, or visibility.
    Edit {
        /// Project id or name.
        project: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        color: Option<String>,

        /// Show or hide the project on the tracking surface.
        #[arg(long)]
        active: Option<bool>,
    },

    /// Delete a project. Its tracked history is kept.
    Rm {
        /// Project id or name.
        project: String,
    },
}
