//! Configuration types.
//!
//! This module defines enums and structs used for configuration. `Config` has
//! no CLI dependencies and can be built programmatically; the CLI in
//! [`super::cli`] converts its arguments into one.

use std::path::PathBuf;

use clap::ValueEnum;

use crate::config::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_COLLECTION, DEFAULT_CONNECTION_STRING, DEFAULT_DATABASE,
    DEFAULT_EMAIL_DOMAIN, DEFAULT_EXPORT_PATH, DEFAULT_SPOTLIGHT_NAME,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// How the walkthrough renames a department value across the collection.
///
/// Both paths end with every matching document carrying the new name:
/// - `Direct`: one multi-document `$set` on documents holding the old name
/// - `UnsetThenSet`: `$unset` the field on documents holding the old name, then
///   `$set` the new name on every document where the field no longer exists
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RenameStrategy {
    Direct,
    UnsetThenSet,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use student_records::Config;
///
/// let config = Config {
///     connection_string: "sqlite://scratch.db".to_string(),
///     seed: true,
///     batch_size: 250,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Document store connection string (SQLite URL)
    pub connection_string: String,

    /// Database name inside the store
    pub database: String,

    /// Collection holding the student records
    pub collection: String,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Always add a fresh batch before running (an empty collection is seeded regardless)
    pub seed: bool,

    /// Number of records generated when seeding
    pub batch_size: usize,

    /// Seed for the record generator; random when `None`
    pub rng_seed: Option<u64>,

    /// JSON file used by the export/import round-trip
    pub export_path: PathBuf,

    /// Domain of recomputed email addresses
    pub email_domain: String,

    /// First name whose department is reassigned during the walkthrough
    pub spotlight_name: String,

    /// Department rename path
    pub rename_strategy: RenameStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection_string: DEFAULT_CONNECTION_STRING.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            seed: false,
            batch_size: DEFAULT_BATCH_SIZE,
            rng_seed: None,
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
            email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
            spotlight_name: DEFAULT_SPOTLIGHT_NAME.to_string(),
            rename_strategy: RenameStrategy::Direct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_log_level_ordering() {
        let error = log::LevelFilter::from(LogLevel::Error);
        let warn = log::LevelFilter::from(LogLevel::Warn);
        let info = log::LevelFilter::from(LogLevel::Info);
        let debug = log::LevelFilter::from(LogLevel::Debug);
        let trace = log::LevelFilter::from(LogLevel::Trace);

        assert!(error < warn);
        assert!(warn < info);
        assert!(info < debug);
        assert!(debug < trace);
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.connection_string, "sqlite://school.db");
        assert_eq!(config.database, "school");
        assert_eq!(config.collection, "students");
        assert_eq!(config.batch_size, 1000);
        assert!(!config.seed);
        assert!(config.rng_seed.is_none());
        assert_eq!(config.export_path, PathBuf::from("students.json"));
        assert_eq!(config.email_domain, "uniofstn.edu");
        assert_eq!(config.rename_strategy, RenameStrategy::Direct);
    }

    #[test]
    fn test_rename_strategy_value_names() {
        // clap derives kebab-case names for the CLI
        let names: Vec<String> = RenameStrategy::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(names, vec!["direct", "unset-then-set"]);
    }
}
