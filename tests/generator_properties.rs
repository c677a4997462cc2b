//! Property tests for generated batches.

use std::collections::HashSet;

use serde_json::{json, Value};

use student_records::driver::{count_born_between, counts_by_department, DateRange};
use student_records::store::FindOptions;
use student_records::{Student, COURSES};

#[path = "helpers.rs"]
mod helpers;

use helpers::{create_test_collection, seed_students};

#[tokio::test]
async fn test_batch_of_1000_has_unique_ids_and_valid_fields() {
    let collection = create_test_collection().await;
    seed_students(&collection, 1000, 17).await;

    let docs = collection
        .find(&json!({}), FindOptions::default())
        .await
        .unwrap();
    assert_eq!(docs.len(), 1000);

    let mut student_ids = HashSet::new();
    for doc in &docs {
        let student = Student::from_document(doc).expect("Document should be a student");
        assert!(student_ids.insert(student.student_id), "duplicate student_id");
        assert!((2.0..=4.0).contains(&student.gpa));
        assert!((3..=6).contains(&student.courses.len()));
        let distinct: HashSet<&str> = student.courses.iter().map(String::as_str).collect();
        assert_eq!(distinct.len(), student.courses.len());
        assert!(distinct.iter().all(|c| COURSES.contains(c)));
    }

    let object_ids: HashSet<String> = docs
        .iter()
        .map(|d| serde_json::to_string(&d["_id"]).unwrap())
        .collect();
    assert_eq!(object_ids.len(), 1000);
}

#[tokio::test]
async fn test_birth_window_count_matches_grouped_sum() {
    let collection = create_test_collection().await;
    seed_students(&collection, 1000, 23).await;
    let window = DateRange::parse("2003-01-01", "2007-12-31").unwrap();

    let count = count_born_between(&collection, &window).await.unwrap();
    let grouped: u64 = counts_by_department(&collection, Some(&window))
        .await
        .unwrap()
        .iter()
        .map(|c| c.count)
        .sum();
    assert_eq!(count, grouped);
}

#[tokio::test]
async fn test_dates_are_iso_strings() {
    let collection = create_test_collection().await;
    seed_students(&collection, 10, 31).await;

    let docs = collection
        .find(&json!({}), FindOptions::default())
        .await
        .unwrap();
    for doc in docs {
        for field in ["date_of_birth", "enrolled_date"] {
            let Value::String(date) = &doc[field] else {
                panic!("{field} should be a string");
            };
            assert!(chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok());
        }
    }
}
