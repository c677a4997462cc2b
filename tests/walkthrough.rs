//! End-to-end tests for the walkthrough.

use serde_json::json;
use tempfile::TempDir;

use student_records::store::Client;
use student_records::{run_walkthrough, Config, RenameStrategy};

fn config_in(dir: &TempDir, strategy: RenameStrategy) -> Config {
    Config {
        connection_string: format!("sqlite://{}", dir.path().join("school.db").display()),
        batch_size: 300,
        rng_seed: Some(2024),
        export_path: dir.path().join("students.json"),
        rename_strategy: strategy,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_walkthrough_seeds_empty_collection() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = config_in(&dir, RenameStrategy::Direct);
    let report = run_walkthrough(config.clone())
        .await
        .expect("Walkthrough should succeed");

    assert_eq!(report.inserted, 300);
    assert_eq!(report.exported, 300);
    assert_eq!(report.imported, 300);
    assert_eq!(report.emails_recomputed, 300);
    assert_eq!(report.preview.len(), 5);
    assert_eq!(report.schema.first().map(|f| f.name.as_str()), Some("_id"));
    assert_eq!(report.schema.len(), 14);
    assert!(report.departments.contains(&"Finance".to_string()) == report.reassigned);

    let total: u64 = report.department_counts.iter().map(|c| c.count).sum();
    assert_eq!(total, 300);
    assert!(report
        .department_counts
        .windows(2)
        .all(|pair| pair[0].count <= pair[1].count));

    let collection = Client::connect(&config.connection_string)
        .await
        .unwrap()
        .database(&config.database)
        .collection(&config.collection);
    assert_eq!(
        collection.count_documents(&json!({"department": "Finance"})).await.unwrap(),
        0
    );
    assert!(dir.path().join("students.json").exists());
}

#[tokio::test]
async fn test_second_run_reuses_existing_documents() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let first = run_walkthrough(config_in(&dir, RenameStrategy::Direct))
        .await
        .unwrap();
    assert_eq!(first.inserted, 300);

    let second = run_walkthrough(config_in(&dir, RenameStrategy::UnsetThenSet))
        .await
        .unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.exported, 300);
}

#[tokio::test]
async fn test_forced_seed_adds_a_batch() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    run_walkthrough(config_in(&dir, RenameStrategy::Direct))
        .await
        .unwrap();

    let config = Config {
        seed: true,
        rng_seed: Some(99),
        ..config_in(&dir, RenameStrategy::Direct)
    };
    let report = run_walkthrough(config).await.unwrap();
    assert_eq!(report.inserted, 300);
    assert_eq!(report.exported, 600);
}

#[tokio::test]
async fn test_walkthrough_reports_unwritable_export_path() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = Config {
        export_path: dir.path().join("missing").join("students.json"),
        ..config_in(&dir, RenameStrategy::Direct)
    };
    let err = run_walkthrough(config).await.unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to export collection"));
}
