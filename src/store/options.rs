//! Option and result types for collection operations.

use serde_json::Value;

/// Options for [`crate::store::Collection::find`].
///
/// ```
/// use serde_json::json;
/// use student_records::store::FindOptions;
///
/// let options = FindOptions {
///     projection: Some(json!({"_id": false, "first_name": true, "email": true})),
///     limit: Some(5),
///     ..Default::default()
/// };
/// assert_eq!(options.skip, 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Field inclusion/exclusion document
    pub projection: Option<Value>,
    /// `{field: 1 | -1}` ordering; insertion order when absent
    pub sort: Option<Value>,
    /// Documents to skip after sorting
    pub skip: usize,
    /// Maximum number of documents returned
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertOneResult {
    pub inserted_id: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertManyResult {
    /// `_id` of every inserted document, in input order
    pub inserted_ids: Vec<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted_count: u64,
}
