// Shared helpers for store unit tests.

use crate::store::{Client, Collection};

/// An empty collection in a fresh in-memory store.
pub(crate) async fn create_test_collection(name: &str) -> Collection {
    Client::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory store")
        .database("test")
        .collection(name)
}
