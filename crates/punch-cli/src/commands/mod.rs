//! CLI subcommand implementations.

pub mod adjust;
pub mod events;
pub mod export;
pub mod projects;
pub mod report;
pub mod status;
pub mod toggle;
pub mod track;

pub(crate) mod util;
