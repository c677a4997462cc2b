//! Error handling.
//!
//! Error types are split by concern:
//! - **Initialization**: logger setup
//! - **Store**: SQL, migrations, and malformed filter/update/projection/pipeline documents
//! - **Generator**: identifier space exhaustion
//! - **Seed**: generation or insertion failure while seeding
//! - **Transfer**: JSON export/import file handling

mod types;

// Re-export public API
pub use types::{GeneratorError, InitializationError, SeedError, StoreError, TransferError};
