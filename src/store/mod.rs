//! Embedded schemaless document store.
//!
//! Documents are JSON objects kept in a single SQLite table keyed by
//! `(database, collection, _id)`. Queries are expressed as JSON documents
//! (filters, updates, projections, sorts and aggregation pipelines) and
//! evaluated in-process; see the submodules for each language.
//!
//! ```no_run
//! use serde_json::json;
//! use student_records::store::{Client, FindOptions};
//!
//! # async fn demo() -> Result<(), student_records::StoreError> {
//! let client = Client::connect("sqlite::memory:").await?;
//! let students = client.database("school").collection("students");
//! let honors = students
//!     .find(&json!({"gpa": {"$gte": 3.5}}), FindOptions::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
mod client;
mod collection;
pub mod filter;
mod migrations;
mod object_id;
mod options;
mod pool;
pub mod projection;
pub mod update;
pub mod value;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use aggregate::Pipeline;
pub use client::{Client, Database};
pub use collection::Collection;
pub use filter::{Condition, Filter};
pub use migrations::run_migrations;
pub use object_id::{ObjectId, OID_KEY};
pub use options::{DeleteResult, FindOptions, InsertManyResult, InsertOneResult, UpdateResult};
pub use pool::init_pool;
pub use projection::{Projection, SortSpec};
pub use update::{Update, UpdateOp};
pub use value::{Document, ID_FIELD};
