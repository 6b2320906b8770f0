//! CLI subcommand implementations.

pub mod import;
pub mod presence;
pub mod report;
pub mod travelers;
