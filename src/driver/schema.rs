//! Schema introspection by sampling.

use serde_json::{json, Value};

use crate::error_handling::StoreError;
use crate::store::Collection;

/// Name and type of one top-level field of a sampled document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub type_name: String,
}

/// Describes the fields of one randomly sampled document.
///
/// Returns an empty list when the collection is empty.
pub async fn sample_schema(collection: &Collection) -> Result<Vec<FieldInfo>, StoreError> {
    let pipeline = json!([
        {"$sample": {"size": 1}},
        {"$project": {"fields": {"$objectToArray": "$$ROOT"}}},
        {"$project": {"fields": {"$map": {
            "input": "$fields",
            "as": "field",
            "in": {"name": "$$field.k", "type": {"$type": "$$field.v"}}
        }}}}
    ]);

    let Some(sample) = collection.aggregate(&pipeline).await?.into_iter().next() else {
        return Ok(Vec::new());
    };
    let fields = sample
        .get("fields")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    Ok(fields
        .iter()
        .filter_map(|field| {
            Some(FieldInfo {
                name: field.get("name")?.as_str()?.to_string(),
                type_name: field.get("type")?.as_str()?.to_string(),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_helpers::create_test_collection;

    #[tokio::test]
    async fn test_schema_of_sampled_document() {
        let collection = create_test_collection("students").await;
        collection
            .insert_one(
                json!({"student_id": 12, "gpa": 3.5, "address": {"city": "Oslo"}, "courses": [], "is_active": false})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .await
            .unwrap();

        let schema = sample_schema(&collection).await.unwrap();
        let pairs: Vec<(&str, &str)> = schema
            .iter()
            .map(|f| (f.name.as_str(), f.type_name.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("_id", "objectId"),
                ("student_id", "int"),
                ("gpa", "double"),
                ("address", "object"),
                ("courses", "array"),
                ("is_active", "bool"),
            ]
        );
    }

    #[tokio::test]
    async fn test_schema_of_empty_collection() {
        let collection = create_test_collection("students").await;
        assert!(sample_schema(&collection).await.unwrap().is_empty());
    }
}
