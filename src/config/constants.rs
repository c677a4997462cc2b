//! Configuration constants.
//!
//! This module defines the defaults used throughout the application: where the
//! document store lives, which database and collection the walkthrough uses,
//! and the fixed catalogs the record generator draws from.

// Backing store
/// Default connection string for the embedded document store (SQLite file).
pub const DEFAULT_CONNECTION_STRING: &str = "sqlite://school.db";
/// Environment variable that overrides the connection string.
pub const CONNECTION_STRING_ENV: &str = "STUDENT_RECORDS_DB_URL";
pub const DEFAULT_DATABASE: &str = "school";
pub const DEFAULT_COLLECTION: &str = "students";

// Seeding
/// Number of records generated when the collection is seeded.
pub const DEFAULT_BATCH_SIZE: usize = 1000;
/// Number of decimal digits in a generated `student_id` (ids are `0..10^digits`).
pub const STUDENT_ID_DIGITS: u32 = 8;
pub const MIN_STUDENT_AGE: u32 = 18;
pub const MAX_STUDENT_AGE: u32 = 25;
/// How far back enrollment dates may go, in years.
pub const ENROLLMENT_WINDOW_YEARS: u32 = 4;
pub const MIN_GPA: f64 = 2.0;
pub const MAX_GPA: f64 = 4.0;
pub const MIN_COURSES: usize = 3;
pub const MAX_COURSES: usize = 6;

// Walkthrough
pub const DEFAULT_EXPORT_PATH: &str = "students.json";
/// Domain used when email addresses are recomputed from names.
pub const DEFAULT_EMAIL_DOMAIN: &str = "uniofstn.edu";
/// First name looked up and reassigned during the walkthrough.
pub const DEFAULT_SPOTLIGHT_NAME: &str = "Jennifer";
/// Inclusive date-of-birth window used by the range queries (ISO dates).
pub const BIRTH_WINDOW_START: &str = "2003-01-01";
pub const BIRTH_WINDOW_END: &str = "2007-12-31";
pub const REASSIGNED_DEPARTMENT: &str = "Finance";
pub const RENAMED_DEPARTMENT: &str = "Financial Services";
/// Number of documents shown by the preview steps.
pub const PREVIEW_LIMIT: usize = 5;
