//! student_records library: synthetic student records over an embedded
//! document store
//!
//! This library generates realistic student records, stores them in a
//! schemaless document collection backed by SQLite, and provides the query,
//! update, aggregation and JSON export/import operations of the
//! walkthrough.
//!
//! # Example
//!
//! ```no_run
//! use student_records::{add_documents, build_generator, store::Client};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::connect("sqlite://school.db").await?;
//! let students = client.database("school").collection("students");
//!
//! let mut generator = build_generator(Some(42));
//! add_documents(&students, &mut generator, 1000).await?;
//!
//! let honors = students.count_documents(&json!({"gpa": {"$gte": 3.5}})).await?;
//! println!("{honors} students on the honor roll");
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod config;
pub mod driver;
mod error_handling;
pub mod export;
pub mod generator;
pub mod initialization;
pub mod models;
pub mod store;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel, RenameStrategy};
pub use driver::{build_generator, run_walkthrough, WalkthroughReport};
pub use error_handling::{
    GeneratorError, InitializationError, SeedError, StoreError, TransferError,
};
pub use export::{export_json, import_json, ExportOptions};
pub use generator::{add_documents, GeneratorConfig, StudentGenerator};
pub use models::{Address, Department, GradeLevel, Student, COURSES};
pub use store::run_migrations;
