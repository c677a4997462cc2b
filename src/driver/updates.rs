//! In-place department updates.

use log::{debug, info};
use serde_json::json;

use crate::config::RenameStrategy;
use crate::error_handling::StoreError;
use crate::store::{Collection, UpdateResult};

/// Moves the first student named `first_name` to `department`.
pub async fn reassign_department(
    collection: &Collection,
    first_name: &str,
    department: &str,
) -> Result<UpdateResult, StoreError> {
    collection
        .update_one(
            &json!({"first_name": first_name}),
            &json!({"$set": {"department": department}}),
        )
        .await
}

/// Renames a department with a single multi-document `$set`.
pub async fn rename_department(
    collection: &Collection,
    from: &str,
    to: &str,
) -> Result<UpdateResult, StoreError> {
    let result = collection
        .update_many(
            &json!({"department": from}),
            &json!({"$set": {"department": to}}),
        )
        .await?;
    info!(
        "Renamed department {:?} to {:?} on {} documents",
        from, to, result.modified_count
    );
    Ok(result)
}

/// Renames a department in two passes: the field is first removed from
/// every student in `from`, then set to `to` on every student without one.
///
/// Students that had no department before the call end up in `to` as well.
/// The returned result is that of the second pass.
pub async fn rename_department_via_unset(
    collection: &Collection,
    from: &str,
    to: &str,
) -> Result<UpdateResult, StoreError> {
    let unset = collection
        .update_many(
            &json!({"department": from}),
            &json!({"$unset": {"department": ""}}),
        )
        .await?;
    debug!("Unset department on {} documents", unset.modified_count);

    let result = collection
        .update_many(
            &json!({"department": {"$exists": false}}),
            &json!({"$set": {"department": to}}),
        )
        .await?;
    info!(
        "Renamed department {:?} to {:?} on {} documents (unset then set)",
        from, to, result.modified_count
    );
    Ok(result)
}

/// Renames a department with the given strategy.
pub async fn rename_with(
    collection: &Collection,
    strategy: RenameStrategy,
    from: &str,
    to: &str,
) -> Result<UpdateResult, StoreError> {
    match strategy {
        RenameStrategy::Direct => rename_department(collection, from, to).await,
        RenameStrategy::UnsetThenSet => rename_department_via_unset(collection, from, to).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_helpers::create_test_collection;
    use crate::store::Document;
    use serde_json::Value;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    async fn faculty() -> Collection {
        let collection = create_test_collection("students").await;
        collection
            .insert_many(vec![
                doc(json!({"first_name": "Jennifer", "department": "Physics"})),
                doc(json!({"first_name": "Jennifer", "department": "Business"})),
                doc(json!({"first_name": "Ravi", "department": "Finance"})),
            ])
            .await
            .unwrap();
        collection
    }

    #[tokio::test]
    async fn test_reassign_touches_one_student() {
        let collection = faculty().await;
        let result = reassign_department(&collection, "Jennifer", "Finance").await.unwrap();
        assert_eq!(result.modified_count, 1);
        assert_eq!(
            collection.count_documents(&json!({"department": "Finance"})).await.unwrap(),
            2
        );
        assert_eq!(
            collection.count_documents(&json!({"department": "Business"})).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_both_strategies_rename_every_match() {
        for strategy in [RenameStrategy::Direct, RenameStrategy::UnsetThenSet] {
            let collection = faculty().await;
            reassign_department(&collection, "Jennifer", "Finance").await.unwrap();

            let result = rename_with(&collection, strategy, "Finance", "Financial Services")
                .await
                .unwrap();
            assert_eq!(result.modified_count, 2, "{strategy:?}");
            assert_eq!(
                collection.count_documents(&json!({"department": "Finance"})).await.unwrap(),
                0
            );
            assert_eq!(
                collection
                    .count_documents(&json!({"department": "Financial Services"}))
                    .await
                    .unwrap(),
                2
            );
        }
    }

    #[tokio::test]
    async fn test_unset_strategy_also_fills_missing_departments() {
        for (strategy, expected) in [
            (RenameStrategy::Direct, 1),
            (RenameStrategy::UnsetThenSet, 2),
        ] {
            let collection = faculty().await;
            collection
                .insert_one(doc(json!({"first_name": "Mina"})))
                .await
                .unwrap();

            let result = rename_with(&collection, strategy, "Finance", "Financial Services")
                .await
                .unwrap();
            assert_eq!(result.modified_count, expected, "{strategy:?}");
            let mina = collection
                .find_one(&json!({"first_name": "Mina"}), None)
                .await
                .unwrap()
                .unwrap();
            match strategy {
                RenameStrategy::Direct => assert!(mina.get("department").is_none()),
                RenameStrategy::UnsetThenSet => {
                    assert_eq!(mina.get("department"), Some(&json!("Financial Services")))
                }
            }
        }
    }

    #[tokio::test]
    async fn test_rename_of_unknown_department_is_noop() {
        let collection = faculty().await;
        let result = rename_department(&collection, "Law", "Legal Studies").await.unwrap();
        assert_eq!(result, UpdateResult::default());
    }
}
