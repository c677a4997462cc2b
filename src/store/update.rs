//! Update documents: `$set`, `$unset`, `$rename`, `$inc`.

use serde_json::{Number, Value};

use crate::error_handling::StoreError;
use crate::store::value::{get_path, remove_path, set_path, values_equal, Document, ID_FIELD};

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    Set { path: String, value: Value },
    Unset { path: String },
    Rename { from: String, to: String },
    Inc { path: String, amount: Number },
}

/// Parsed update document, applied in the order the operators were written.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    ops: Vec<UpdateOp>,
}

fn touches_id(path: &str) -> bool {
    path == ID_FIELD || path.starts_with("_id.")
}

impl Update {
    pub fn parse(spec: &Value) -> Result<Self, StoreError> {
        let map = spec
            .as_object()
            .ok_or_else(|| StoreError::InvalidUpdate(format!("expected a document, got {spec}")))?;
        if map.is_empty() {
            return Err(StoreError::InvalidUpdate("update document is empty".into()));
        }

        let mut ops = Vec::new();
        for (op, fields) in map {
            let fields = fields.as_object().ok_or_else(|| {
                StoreError::InvalidUpdate(format!("{op} needs a document of fields"))
            })?;
            for (path, operand) in fields {
                if touches_id(path) {
                    return Err(StoreError::ImmutableId);
                }
                let parsed = match op.as_str() {
                    "$set" => UpdateOp::Set {
                        path: path.clone(),
                        value: operand.clone(),
                    },
                    "$unset" => UpdateOp::Unset { path: path.clone() },
                    "$rename" => {
                        let to = operand.as_str().ok_or_else(|| {
                            StoreError::InvalidUpdate(format!("$rename target for {path} must be a string"))
                        })?;
                        if touches_id(to) {
                            return Err(StoreError::ImmutableId);
                        }
                        if to == path {
                            return Err(StoreError::InvalidUpdate(format!(
                                "$rename source and target are both {path}"
                            )));
                        }
                        UpdateOp::Rename {
                            from: path.clone(),
                            to: to.to_string(),
                        }
                    }
                    "$inc" => match operand {
                        Value::Number(amount) => UpdateOp::Inc {
                            path: path.clone(),
                            amount: amount.clone(),
                        },
                        _ => {
                            return Err(StoreError::InvalidUpdate(format!(
                                "$inc amount for {path} must be a number"
                            )))
                        }
                    },
                    other if other.starts_with('$') => {
                        return Err(StoreError::InvalidUpdate(format!(
                            "unknown update operator: {other}"
                        )))
                    }
                    other => {
                        return Err(StoreError::InvalidUpdate(format!(
                            "update documents may only contain operators, found field {other}"
                        )))
                    }
                };
                ops.push(parsed);
            }
        }
        Ok(Self { ops })
    }

    pub fn ops(&self) -> &[UpdateOp] {
        &self.ops
    }

    /// Applies every operator; returns whether the document changed.
    pub fn apply(&self, doc: &mut Document) -> Result<bool, StoreError> {
        let mut modified = false;
        for op in &self.ops {
            match op {
                UpdateOp::Set { path, value } => {
                    let previous = set_path(doc, path, value.clone())?;
                    modified |= !previous.is_some_and(|p| p == *value);
                }
                UpdateOp::Unset { path } => {
                    modified |= remove_path(doc, path).is_some();
                }
                UpdateOp::Rename { from, to } => {
                    if let Some(value) = remove_path(doc, from) {
                        set_path(doc, to, value)?;
                        modified = true;
                    }
                }
                UpdateOp::Inc { path, amount } => {
                    let current = get_path(doc, path).cloned();
                    let next = match current {
                        None => Value::Number(amount.clone()),
                        Some(Value::Number(n)) => Value::Number(add_numbers(&n, amount)?),
                        Some(other) => {
                            return Err(StoreError::InvalidUpdate(format!(
                                "cannot apply $inc to {path}: value {other} is not a number"
                            )))
                        }
                    };
                    let unchanged = get_path(doc, path)
                        .is_some_and(|existing| values_equal(existing, &next));
                    set_path(doc, path, next)?;
                    modified |= !unchanged;
                }
            }
        }
        Ok(modified)
    }
}

fn add_numbers(a: &Number, b: &Number) -> Result<Number, StoreError> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(sum) = x.checked_add(y) {
            return Ok(Number::from(sum));
        }
    }
    let sum = a.as_f64().unwrap_or_default() + b.as_f64().unwrap_or_default();
    Number::from_f64(sum)
        .ok_or_else(|| StoreError::InvalidUpdate(format!("$inc produced a non-finite number: {sum}")))
}
