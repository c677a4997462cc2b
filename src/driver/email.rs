//! Email recomputation from name fields.

use log::{debug, info, warn};
use serde_json::Value;

use crate::error_handling::StoreError;
use crate::store::{Collection, FindOptions};

/// `first.last@domain`, lowercase.
pub fn derive_email(first_name: &str, last_name: &str, domain: &str) -> String {
    format!(
        "{}.{}@{}",
        first_name.to_lowercase(),
        last_name.to_lowercase(),
        domain.to_lowercase()
    )
}

/// Rewrites every student's email from their current name fields.
///
/// All documents are read, rewritten and stored back in place of the old
/// collection contents; identifiers are kept. Documents without string
/// name fields keep their email.
///
/// # Returns
///
/// The number of emails recomputed.
pub async fn recompute_emails(collection: &Collection, domain: &str) -> Result<usize, StoreError> {
    let mut docs = collection
        .find(&serde_json::json!({}), FindOptions::default())
        .await?;

    let mut updated = 0;
    for doc in &mut docs {
        let email = match (
            doc.get("first_name").and_then(Value::as_str),
            doc.get("last_name").and_then(Value::as_str),
        ) {
            (Some(first), Some(last)) => derive_email(first, last, domain),
            _ => {
                warn!("Skipping email recomputation for document without names: {:?}", doc.get("_id"));
                continue;
            }
        };
        debug!("New email: {}", email);
        doc.insert("email".to_string(), Value::String(email));
        updated += 1;
    }

    collection.replace_all(docs).await?;
    info!("Recomputed {} emails in {}", updated, collection.namespace());
    Ok(updated)
}
