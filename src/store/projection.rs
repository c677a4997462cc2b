//! Projections and sort specifications.

use std::cmp::Ordering;

use serde_json::Value;

use crate::error_handling::StoreError;
use crate::store::filter::truthy;
use crate::store::value::{compare_values, get_path, remove_path, Document, ID_FIELD};

/// Field inclusion/exclusion limiting the shape of returned documents.
///
/// Inclusion and exclusion cannot be mixed, except that `_id` (included by
/// default) may always be switched off.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Include { paths: Vec<String>, include_id: bool },
    Exclude { paths: Vec<String> },
}

impl Projection {
    pub fn parse(spec: &Value) -> Result<Self, StoreError> {
        let map = spec.as_object().ok_or_else(|| {
            StoreError::InvalidProjection(format!("expected a document, got {spec}"))
        })?;

        let mut includes = Vec::new();
        let mut excludes = Vec::new();
        let mut id_flag = None;
        for (path, flag) in map {
            if !matches!(flag, Value::Bool(_) | Value::Number(_)) {
                return Err(StoreError::InvalidProjection(format!(
                    "{path}: expected true/false or 1/0, got {flag}"
                )));
            }
            if path == ID_FIELD {
                id_flag = Some(truthy(flag));
            } else if truthy(flag) {
                includes.push(path.clone());
            } else {
                excludes.push(path.clone());
            }
        }
        Self::from_flags(includes, excludes, id_flag)
    }

    pub(crate) fn from_flags(
        includes: Vec<String>,
        mut excludes: Vec<String>,
        id_flag: Option<bool>,
    ) -> Result<Self, StoreError> {
        if !includes.is_empty() && !excludes.is_empty() {
            return Err(StoreError::InvalidProjection(format!(
                "cannot mix inclusion ({}) and exclusion ({})",
                includes.join(", "),
                excludes.join(", ")
            )));
        }
        if !includes.is_empty() || (excludes.is_empty() && id_flag == Some(true)) {
            return Ok(Projection::Include {
                paths: includes,
                include_id: id_flag.unwrap_or(true),
            });
        }
        if id_flag == Some(false) {
            excludes.push(ID_FIELD.to_string());
        }
        Ok(Projection::Exclude { paths: excludes })
    }

    pub fn apply(&self, doc: &Document) -> Document {
        match self {
            Projection::Include { paths, include_id } => {
                let mut wanted: Vec<&str> = paths.iter().map(String::as_str).collect();
                if *include_id {
                    wanted.push(ID_FIELD);
                }
                include(doc, &wanted)
            }
            Projection::Exclude { paths } => {
                let mut out = doc.clone();
                for path in paths {
                    remove_path(&mut out, path);
                }
                out
            }
        }
    }
}

/// Copies the listed paths, keeping the source document's field order.
fn include(src: &Document, paths: &[&str]) -> Document {
    let mut out = Document::new();
    for (key, value) in src {
        if paths.iter().any(|p| p == key) {
            out.insert(key.clone(), value.clone());
            continue;
        }
        let prefix = format!("{key}.");
        let nested: Vec<&str> = paths
            .iter()
            .filter_map(|p| p.strip_prefix(prefix.as_str()))
            .collect();
        if nested.is_empty() {
            continue;
        }
        match value {
            Value::Object(child) => {
                out.insert(key.clone(), Value::Object(include(child, &nested)));
            }
            Value::Array(items) => {
                let projected = items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|child| Value::Object(include(child, &nested)))
                    .collect();
                out.insert(key.clone(), Value::Array(projected));
            }
            _ => {}
        }
    }
    out
}

/// `{field: 1 | -1, ...}` ordering; missing fields sort as null.
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    keys: Vec<(String, bool)>,
}

impl SortSpec {
    pub fn parse(spec: &Value) -> Result<Self, StoreError> {
        let map = spec
            .as_object()
            .filter(|map| !map.is_empty())
            .ok_or_else(|| StoreError::InvalidSort(format!("expected a nonempty document, got {spec}")))?;
        let keys = map
            .iter()
            .map(|(path, direction)| match direction.as_i64() {
                Some(1) => Ok((path.clone(), true)),
                Some(-1) => Ok((path.clone(), false)),
                _ => Err(StoreError::InvalidSort(format!(
                    "{path}: direction must be 1 or -1, got {direction}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { keys })
    }

    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for (path, ascending) in &self.keys {
            let left = get_path(a, path).unwrap_or(&Value::Null);
            let right = get_path(b, path).unwrap_or(&Value::Null);
            let ord = compare_values(left, right);
            let ord = if *ascending { ord } else { ord.reverse() };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Stable sort, so ties keep insertion order.
    pub fn sort(&self, docs: &mut [Document]) {
        docs.sort_by(|a, b| self.compare(a, b));
    }
}
