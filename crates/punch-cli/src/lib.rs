//! Punch clock CLI library.
//!
//! This crate provides the `punch` binary: configuration, the serialized
//! tracking session, the idle monitor, and the subcommands.

mod cli;
pub mod commands;
mod config;
mod idle;
mod session;

pub use cli::{Cli, Commands, ProjectsAction};
pub use config::Config;
pub use idle::IdleMonitor;
pub use session::Session;
