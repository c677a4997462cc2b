//! Tests for the file-backed document store.

use serde_json::json;
use tempfile::TempDir;

use student_records::store::{Client, FindOptions};
use student_records::StoreError;

#[path = "helpers.rs"]
mod helpers;

use helpers::{create_test_collection_with_path, create_test_pool, doc};

#[tokio::test]
async fn test_documents_survive_reopen() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("school.db");

    let collection = create_test_collection_with_path(&db_path).await;
    collection
        .insert_many(vec![
            doc(json!({"first_name": "Ada", "gpa": 3.9})),
            doc(json!({"first_name": "Bo", "gpa": 2.8})),
        ])
        .await
        .unwrap();
    drop(collection);

    let reopened = create_test_collection_with_path(&db_path).await;
    let names: Vec<String> = reopened
        .find(
            &json!({}),
            FindOptions {
                sort: Some(json!({"gpa": 1})),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .into_iter()
        .filter_map(|d| d["first_name"].as_str().map(str::to_string))
        .collect();
    assert_eq!(names, vec!["Bo", "Ada"]);
}

#[tokio::test]
async fn test_namespaces_are_listed() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let url = format!("sqlite://{}", dir.path().join("school.db").display());
    let client = Client::connect(&url).await.unwrap();

    client
        .database("school")
        .collection("students")
        .insert_one(doc(json!({"first_name": "Ada"})))
        .await
        .unwrap();
    client
        .database("school")
        .collection("alumni")
        .insert_one(doc(json!({"first_name": "Bo"})))
        .await
        .unwrap();
    client
        .database("archive")
        .collection("students")
        .insert_one(doc(json!({"first_name": "Cy"})))
        .await
        .unwrap();

    assert_eq!(
        client.list_database_names().await.unwrap(),
        vec!["archive", "school"]
    );
    assert_eq!(
        client.database("school").list_collection_names().await.unwrap(),
        vec!["alumni", "students"]
    );
}

#[tokio::test]
async fn test_corrupt_body_is_reported() {
    let pool = create_test_pool().await;
    sqlx::query(
        "INSERT INTO documents (database_name, collection_name, doc_key, body)
         VALUES ('school', 'students', '1', '{not json')",
    )
    .execute(&pool)
    .await
    .expect("Failed to insert corrupt row");

    let collection = Client::from_pool(pool).database("school").collection("students");
    let err = collection.count_documents(&json!({})).await.unwrap_err();
    assert!(matches!(err, StoreError::CorruptDocument { ref id, .. } if id == "1"));
}

#[tokio::test]
async fn test_connect_fails_for_missing_directory() {
    let result = Client::connect("sqlite:///nonexistent/dir/school.db").await;
    assert!(result.is_err());
}
