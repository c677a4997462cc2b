// Shared test helpers for store setup and test data creation.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use serde_json::Value;
use sqlx::SqlitePool;
use std::path::Path;

use student_records::store::{init_pool, Client, Collection, Document};
use student_records::{add_documents, run_migrations, StudentGenerator};

/// Creates a test collection in a fresh in-memory store.
#[allow(dead_code)] // Used by other test files
pub async fn create_test_collection() -> Collection {
    Client::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory store")
        .database("school")
        .collection("students")
}

/// Creates a test collection backed by a database file, reusing it if it exists.
#[allow(dead_code)]
pub async fn create_test_collection_with_path(db_path: &Path) -> Collection {
    let url = format!("sqlite://{}", db_path.to_string_lossy());
    Client::connect(&url)
        .await
        .expect("Failed to open file-backed store")
        .database("school")
        .collection("students")
}

/// Creates a pool with migrations applied, for tests that inspect the raw table.
#[allow(dead_code)]
pub async fn create_test_pool() -> SqlitePool {
    let pool = init_pool("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Seeds `collection` with `n` reproducible students.
#[allow(dead_code)]
pub async fn seed_students(collection: &Collection, n: usize, seed: u64) {
    let mut generator = StudentGenerator::seeded(seed, Default::default());
    let inserted = add_documents(collection, &mut generator, n)
        .await
        .expect("Failed to seed students");
    assert_eq!(inserted, n);
}

/// Builds a document from a JSON object literal.
#[allow(dead_code)]
pub fn doc(value: Value) -> Document {
    value
        .as_object()
        .cloned()
        .expect("Test document must be a JSON object")
}
