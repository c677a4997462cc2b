//! Application initialization.
//!
//! Sets up process-wide state before any store work happens. Currently this is
//! only the logger; store connections are opened per command through
//! [`crate::store::Client::connect`].

mod logger;

// Re-export public API
pub use logger::init_logger_with;
