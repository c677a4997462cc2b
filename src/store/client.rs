//! Store handles: [`Client`] owns the pool, [`Database`] and
//! [`Collection`](crate::store::Collection) are cheap named views onto it.

use futures::TryStreamExt;
use sqlx::{Row, SqlitePool};

use crate::error_handling::StoreError;
use crate::store::collection::Collection;
use crate::store::migrations::run_migrations;
use crate::store::pool::init_pool;

#[derive(Debug, Clone)]
pub struct Client {
    pool: SqlitePool,
}

impl Client {
    /// Opens the store behind a SQLite URL and applies pending migrations.
    pub async fn connect(connection_string: &str) -> Result<Self, StoreError> {
        let pool = init_pool(connection_string).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool whose migrations have already been applied.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn database(&self, name: &str) -> Database {
        Database {
            pool: self.pool.clone(),
            name: name.to_string(),
        }
    }

    /// Databases holding at least one document.
    pub async fn list_database_names(&self) -> Result<Vec<String>, StoreError> {
        let mut rows = sqlx::query(
            "SELECT DISTINCT database_name FROM documents ORDER BY database_name",
        )
        .fetch(&self.pool);

        let mut names = Vec::new();
        while let Some(row) = rows.try_next().await? {
            names.push(row.try_get("database_name")?);
        }
        Ok(names)
    }
}

#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    name: String,
}

impl Database {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Collections exist implicitly; this never touches the store.
    pub fn collection(&self, name: &str) -> Collection {
        Collection::new(self.pool.clone(), self.name.clone(), name.to_string())
    }

    /// Collections holding at least one document.
    pub async fn list_collection_names(&self) -> Result<Vec<String>, StoreError> {
        let mut rows = sqlx::query(
            "SELECT DISTINCT collection_name FROM documents
             WHERE database_name = ?
             ORDER BY collection_name",
        )
        .bind(&self.name)
        .fetch(&self.pool);

        let mut names = Vec::new();
        while let Some(row) = rows.try_next().await? {
            names.push(row.try_get("collection_name")?);
        }
        Ok(names)
    }
}
