//! Residency tracker CLI library.
//!
//! This crate provides the CLI interface for the residency tracker.

mod cli;
pub mod commands;
mod config;
pub mod rules;

pub use cli::{Cli, Commands};
pub use config::Config;
