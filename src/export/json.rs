//! JSON array export and import.

use std::path::Path;

use log::{debug, info};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use crate::error_handling::TransferError;
use crate::store::{Collection, Document, FindOptions, ObjectId, ID_FIELD};

use super::ExportOptions;

/// Replaces every ObjectId in `value` with its hex string.
fn stringify_object_ids(value: Value) -> Value {
    if let Some(oid) = ObjectId::from_value(&value) {
        return Value::String(oid.to_hex());
    }
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, stringify_object_ids(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(stringify_object_ids).collect()),
        other => other,
    }
}

/// Turns a top-level 24-hex `_id` string back into a native ObjectId.
///
/// Any other `_id` is kept as written, so identifiers the store accepted on
/// insert survive an export and re-import.
fn restore_id(mut doc: Document) -> Document {
    let oid = doc
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .and_then(|hex| ObjectId::parse_str(hex).ok());
    if let Some(oid) = oid {
        doc.insert(ID_FIELD.to_string(), oid.to_value());
    }
    doc
}

/// Writes the whole collection to `opts.output` as a JSON array.
///
/// Documents are written in insertion order. With `opts.truncate` the
/// collection is emptied after the file has been written successfully.
///
/// # Returns
///
/// The number of documents written.
pub async fn export_json(collection: &Collection, opts: &ExportOptions) -> Result<usize, TransferError> {
    let docs: Vec<Value> = collection
        .find(&serde_json::json!({}), FindOptions::default())
        .await?
        .into_iter()
        .map(|doc| stringify_object_ids(Value::Object(doc)))
        .collect();

    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    docs.serialize(&mut serializer)?;

    tokio::fs::write(&opts.output, &buf)
        .await
        .map_err(|source| TransferError::IoError {
            path: opts.output.display().to_string(),
            source,
        })?;
    info!(
        "Exported {} documents from {} to {}",
        docs.len(),
        collection.namespace(),
        opts.output.display()
    );

    if opts.truncate {
        let deleted = collection.delete_many(&serde_json::json!({})).await?;
        debug!("Truncated {}: {} documents removed", collection.namespace(), deleted.deleted_count);
    }
    Ok(docs.len())
}

/// Inserts the documents of a JSON array file into `collection`.
///
/// A top-level `_id` holding 24 hex characters is converted back to an
/// ObjectId; documents without `_id` get a fresh one. The insert is
/// all-or-nothing.
///
/// # Errors
///
/// `TransferError::FormatError` when the file is not an array of objects, and
/// `TransferError::StoreError` for duplicate identifiers.
pub async fn import_json(collection: &Collection, path: &Path) -> Result<usize, TransferError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| TransferError::IoError {
            path: path.display().to_string(),
            source,
        })?;

    let Value::Array(items) = serde_json::from_slice::<Value>(&bytes)? else {
        return Err(TransferError::FormatError(
            "expected a JSON array of documents".to_string(),
        ));
    };

    let docs = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(doc) => Ok(restore_id(doc)),
            other => Err(TransferError::FormatError(format!(
                "document {index} is not an object: {other}"
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let inserted = collection.insert_many(docs).await?.inserted_ids.len();
    info!(
        "Imported {} documents from {} into {}",
        inserted,
        path.display(),
        collection.namespace()
    );
    Ok(inserted)
}
