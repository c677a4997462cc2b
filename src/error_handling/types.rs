//! Error type definitions.
//!
//! This module defines the error types used throughout the application.

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Error types for document store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    /// A stored document body is not valid JSON.
    #[error("Stored document {id} is corrupt: {source}")]
    CorruptDocument {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// Insert of a document whose `_id` already exists in the collection.
    #[error("Duplicate key: _id {0} already exists")]
    DuplicateKey(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    #[error("Invalid projection: {0}")]
    InvalidProjection(String),

    #[error("Invalid sort: {0}")]
    InvalidSort(String),

    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    /// Update attempted to change `_id`.
    #[error("Performing an update on the path '_id' would modify the immutable field '_id'")]
    ImmutableId,

    /// Dotted path runs through a value that is not a document.
    #[error("Cannot create field along path '{0}': an intermediate value is not a document")]
    PathConflict(String),

    #[error("Invalid ObjectId: {0}")]
    InvalidObjectId(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Error types for synthetic record generation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GeneratorError {
    /// Every identifier in the configured digit range has already been issued.
    #[error(
        "Unique student_id space exhausted: {requested} more ids requested, {issued} of {capacity} already issued"
    )]
    IdSpaceExhausted {
        requested: usize,
        issued: usize,
        capacity: u64,
    },

    /// Generated record could not be represented as a document.
    #[error("Failed to serialize student record: {0}")]
    SerializationError(String),
}

/// Error types for seeding a collection with generated records.
#[derive(Error, Debug)]
pub enum SeedError {
    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Error types for JSON export and import.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("I/O error on {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File content is valid JSON but not an array of documents.
    #[error("Invalid export file: {0}")]
    FormatError(String),

    #[error(transparent)]
    StoreError(#[from] StoreError),
}
