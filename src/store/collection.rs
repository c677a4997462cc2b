//! Collection operations.
//!
//! Every operation loads the collection's documents in insertion order,
//! evaluates filters in-process, and writes changes back inside a single
//! SQLite transaction, so a multi-document insert, update, or delete is
//! all-or-nothing.

use futures::TryStreamExt;
use log::debug;
use serde_json::Value;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::error_handling::StoreError;
use crate::store::aggregate::Pipeline;
use crate::store::filter::Filter;
use crate::store::object_id::ObjectId;
use crate::store::options::{
    DeleteResult, FindOptions, InsertManyResult, InsertOneResult, UpdateResult,
};
use crate::store::projection::{Projection, SortSpec};
use crate::store::update::Update;
use crate::store::value::{compare_values, resolve_path, values_equal, Document, ID_FIELD};

#[derive(Debug, Clone)]
pub struct Collection {
    pool: SqlitePool,
    database: String,
    name: String,
}

/// A document together with the row it lives in.
struct StoredDocument {
    row_id: i64,
    body: Document,
}

/// Adds a fresh ObjectId as the first field when `_id` is missing.
fn ensure_id(doc: Document) -> (Value, Document) {
    if let Some(id) = doc.get(ID_FIELD) {
        return (id.clone(), doc);
    }
    let id = ObjectId::new().to_value();
    let mut with_id = Document::with_capacity(doc.len() + 1);
    with_id.insert(ID_FIELD.to_string(), id.clone());
    with_id.extend(doc);
    (id, with_id)
}

fn insert_error(e: sqlx::Error, key: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return StoreError::DuplicateKey(key.to_string());
        }
    }
    StoreError::SqlError(e)
}

impl Collection {
    pub(crate) fn new(pool: SqlitePool, database: String, name: String) -> Self {
        Self {
            pool,
            database,
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `database.collection`
    pub fn namespace(&self) -> String {
        format!("{}.{}", self.database, self.name)
    }

    async fn load(&self) -> Result<Vec<StoredDocument>, StoreError> {
        let mut rows = sqlx::query(
            "SELECT rowid AS row_id, doc_key, body FROM documents
             WHERE database_name = ? AND collection_name = ?
             ORDER BY rowid",
        )
        .bind(&self.database)
        .bind(&self.name)
        .fetch(&self.pool);

        let mut docs = Vec::new();
        while let Some(row) = rows.try_next().await? {
            let row_id: i64 = row.try_get("row_id")?;
            let key: String = row.try_get("doc_key")?;
            let body: String = row.try_get("body")?;
            let body = serde_json::from_str(&body)
                .map_err(|source| StoreError::CorruptDocument { id: key, source })?;
            docs.push(StoredDocument { row_id, body });
        }
        Ok(docs)
    }

    async fn load_matching(&self, filter: &Value) -> Result<Vec<StoredDocument>, StoreError> {
        let filter = Filter::parse(filter)?;
        Ok(self
            .load()
            .await?
            .into_iter()
            .filter(|doc| filter.matches(&doc.body))
            .collect())
    }

    async fn insert_into(
        &self,
        conn: &mut SqliteConnection,
        doc: Document,
    ) -> Result<Value, StoreError> {
        let (id, doc) = ensure_id(doc);
        let key = serde_json::to_string(&id)?;
        let body = serde_json::to_string(&doc)?;
        sqlx::query(
            "INSERT INTO documents (database_name, collection_name, doc_key, body)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&self.database)
        .bind(&self.name)
        .bind(&key)
        .bind(&body)
        .execute(&mut *conn)
        .await
        .map_err(|e| insert_error(e, &key))?;
        Ok(id)
    }

    pub async fn insert_one(&self, doc: Document) -> Result<InsertOneResult, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let inserted_id = self.insert_into(&mut conn, doc).await?;
        Ok(InsertOneResult { inserted_id })
    }

    /// Inserts every document or none of them.
    ///
    /// # Errors
    ///
    /// `StoreError::DuplicateKey` if an `_id` already exists in the collection
    /// or appears twice in `docs`.
    pub async fn insert_many(&self, docs: Vec<Document>) -> Result<InsertManyResult, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted_ids = Vec::with_capacity(docs.len());
        for doc in docs {
            inserted_ids.push(self.insert_into(&mut tx, doc).await?);
        }
        tx.commit().await?;
        debug!(
            "Inserted {} documents into {}",
            inserted_ids.len(),
            self.namespace()
        );
        Ok(InsertManyResult { inserted_ids })
    }

    /// Empties the collection and inserts `docs` in one transaction.
    pub async fn replace_all(&self, docs: Vec<Document>) -> Result<InsertManyResult, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM documents WHERE database_name = ? AND collection_name = ?")
            .bind(&self.database)
            .bind(&self.name)
            .execute(&mut *tx)
            .await?;
        let mut inserted_ids = Vec::with_capacity(docs.len());
        for doc in docs {
            inserted_ids.push(self.insert_into(&mut tx, doc).await?);
        }
        tx.commit().await?;
        Ok(InsertManyResult { inserted_ids })
    }

    pub async fn find(
        &self,
        filter: &Value,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let projection = options
            .projection
            .as_ref()
            .map(Projection::parse)
            .transpose()?;
        let sort = options.sort.as_ref().map(SortSpec::parse).transpose()?;

        let mut docs: Vec<Document> = self
            .load_matching(filter)
            .await?
            .into_iter()
            .map(|doc| doc.body)
            .collect();
        if let Some(sort) = &sort {
            sort.sort(&mut docs);
        }

        let page = docs
            .into_iter()
            .skip(options.skip)
            .take(options.limit.unwrap_or(usize::MAX));
        Ok(match &projection {
            Some(projection) => page.map(|doc| projection.apply(&doc)).collect(),
            None => page.collect(),
        })
    }

    pub async fn find_one(
        &self,
        filter: &Value,
        projection: Option<Value>,
    ) -> Result<Option<Document>, StoreError> {
        let options = FindOptions {
            projection,
            limit: Some(1),
            ..Default::default()
        };
        Ok(self.find(filter, options).await?.into_iter().next())
    }

    pub async fn count_documents(&self, filter: &Value) -> Result<u64, StoreError> {
        Ok(self.load_matching(filter).await?.len() as u64)
    }

    async fn update(&self, filter: &Value, update: &Value, multi: bool) -> Result<UpdateResult, StoreError> {
        let update = Update::parse(update)?;
        let candidates = self.load_matching(filter).await?;

        let mut result = UpdateResult::default();
        let mut tx = self.pool.begin().await?;
        for mut doc in candidates {
            result.matched_count += 1;
            if update.apply(&mut doc.body)? {
                sqlx::query("UPDATE documents SET body = ? WHERE rowid = ?")
                    .bind(serde_json::to_string(&doc.body)?)
                    .bind(doc.row_id)
                    .execute(&mut *tx)
                    .await?;
                result.modified_count += 1;
            }
            if !multi {
                break;
            }
        }
        tx.commit().await?;
        Ok(result)
    }

    /// Applies `update` to the first matching document.
    pub async fn update_one(&self, filter: &Value, update: &Value) -> Result<UpdateResult, StoreError> {
        self.update(filter, update, false).await
    }

    /// Applies `update` to every matching document.
    pub async fn update_many(&self, filter: &Value, update: &Value) -> Result<UpdateResult, StoreError> {
        self.update(filter, update, true).await
    }

    pub async fn delete_many(&self, filter: &Value) -> Result<DeleteResult, StoreError> {
        // Fast path: an empty filter truncates the collection
        if filter.as_object().is_some_and(|f| f.is_empty()) {
            let done = sqlx::query(
                "DELETE FROM documents WHERE database_name = ? AND collection_name = ?",
            )
            .bind(&self.database)
            .bind(&self.name)
            .execute(&self.pool)
            .await?;
            return Ok(DeleteResult {
                deleted_count: done.rows_affected(),
            });
        }

        let doomed = self.load_matching(filter).await?;
        let mut tx = self.pool.begin().await?;
        for doc in &doomed {
            sqlx::query("DELETE FROM documents WHERE rowid = ?")
                .bind(doc.row_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(DeleteResult {
            deleted_count: doomed.len() as u64,
        })
    }

    /// Distinct values of `field` among matching documents; array values
    /// contribute their elements. Sorted by the store's value order.
    pub async fn distinct(&self, field: &str, filter: &Value) -> Result<Vec<Value>, StoreError> {
        let mut values: Vec<Value> = Vec::new();
        for doc in self.load_matching(filter).await? {
            for found in resolve_path(&doc.body, field) {
                let items = match found {
                    Value::Array(items) => items.iter().collect::<Vec<_>>(),
                    other => vec![other],
                };
                for item in items {
                    if !values.iter().any(|v| values_equal(v, item)) {
                        values.push(item.clone());
                    }
                }
            }
        }
        values.sort_by(compare_values);
        Ok(values)
    }

    pub async fn aggregate(&self, pipeline: &Value) -> Result<Vec<Document>, StoreError> {
        let pipeline = Pipeline::parse(pipeline)?;
        let docs = self.load().await?.into_iter().map(|doc| doc.body).collect();
        let mut rng = rand::rng();
        pipeline.run(docs, &mut rng)
    }

    /// Removes every document of the collection.
    pub async fn drop(&self) -> Result<(), StoreError> {
        self.delete_many(&serde_json::json!({})).await?;
        Ok(())
    }
}
