//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (defaults, catalog sizes, walkthrough parameters)
//! - Library configuration types
//! - CLI option types and parsing

mod cli;
mod constants;
mod types;

// Re-export all constants
pub use cli::{Cli, Command, CommonArgs, ExportArgs, ImportArgs, RunArgs, SeedArgs};
pub use constants::*;
pub use types::{Config, LogFormat, LogLevel, RenameStrategy};
