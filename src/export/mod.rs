//! JSON export and import of a collection.
//!
//! The file format is a single UTF-8 JSON array of documents, pretty-printed
//! with 4-space indentation. ObjectIds are written as their 24-character hex
//! string and turned back into native identifiers on import.

mod json;
mod types;

pub use json::{export_json, import_json};
pub use types::ExportOptions;
