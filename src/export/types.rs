//! Export types and options.

use std::path::PathBuf;

/// Options for exporting a collection.
#[derive(Clone, Debug)]
pub struct ExportOptions {
    /// Output file path
    pub output: PathBuf,
    /// Empty the collection once the file has been written
    pub truncate: bool,
}
