//! Synthetic student record generation and bulk seeding.

mod student;

use log::info;
use rand::Rng;

use crate::error_handling::{GeneratorError, SeedError};
use crate::store::Collection;

pub use student::{GeneratorConfig, StudentGenerator};

/// Generates `n` students and bulk-inserts them into `collection`.
///
/// Returns the number of documents inserted. The insert is atomic: on
/// failure nothing is added.
pub async fn add_documents<R: Rng>(
    collection: &Collection,
    generator: &mut StudentGenerator<R>,
    n: usize,
) -> Result<usize, SeedError> {
    let docs = generator
        .generate(n)?
        .iter()
        .map(|student| {
            student
                .to_document()
                .map_err(|e| GeneratorError::SerializationError(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let inserted = collection.insert_many(docs).await?.inserted_ids.len();
    info!("Inserted {} documents into {}", inserted, collection.namespace());
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_helpers::create_test_collection;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_documents_inserts_batch() {
        let collection = create_test_collection("students").await;
        let mut generator = StudentGenerator::seeded(11, GeneratorConfig::default());

        let inserted = add_documents(&collection, &mut generator, 25).await.unwrap();
        assert_eq!(inserted, 25);
        assert_eq!(collection.count_documents(&json!({})).await.unwrap(), 25);
        assert_eq!(
            collection.distinct("student_id", &json!({})).await.unwrap().len(),
            25
        );
    }

    #[tokio::test]
    async fn test_add_documents_exhausted_inserts_nothing() {
        let collection = create_test_collection("students").await;
        let mut generator = StudentGenerator::seeded(
            11,
            GeneratorConfig {
                id_digits: 1,
                ..Default::default()
            },
        );

        let err = add_documents(&collection, &mut generator, 11).await.unwrap_err();
        assert!(matches!(
            err,
            SeedError::Generator(GeneratorError::IdSpaceExhausted { .. })
        ));
        assert_eq!(collection.count_documents(&json!({})).await.unwrap(), 0);
    }
}
