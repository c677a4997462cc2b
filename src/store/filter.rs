//! Query filters.
//!
//! A filter document is parsed once into a [`Filter`] tree and then evaluated
//! against each candidate document. Supported forms:
//!
//! - implicit equality: `{"department": "Physics"}`
//! - field operators: `$eq $ne $gt $gte $lt $lte $in $nin $all $exists $size $not`
//! - logical operators: `$and $or $nor` over arrays of filter documents
//! - dotted paths into nested documents and arrays of documents
//!
//! Equality against an array field matches when the array itself or any of its
//! elements is equal. Ordering operators only compare values of the same type
//! class, so `{"gpa": {"$gte": 3.5}}` never matches a string `gpa`.

use std::cmp::Ordering;

use serde_json::Value;

use crate::error_handling::StoreError;
use crate::store::object_id::is_object_id;
use crate::store::value::{compare_values, resolve_path, same_type_class, values_equal, Document};

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// All children match; an empty list matches every document.
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Nor(Vec<Filter>),
    Field { path: String, condition: Condition },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    All(Vec<Value>),
    Exists(bool),
    Size(usize),
    Not(Box<Condition>),
    /// Several operators on one field, e.g. `{"$gte": 2, "$lte": 3}`.
    AllOf(Vec<Condition>),
}

/// True for objects made of `$`-operators (as opposed to literal sub-documents).
pub(crate) fn is_operator_document(value: &Value) -> bool {
    match value {
        Value::Object(map) if !map.is_empty() && !is_object_id(value) => {
            map.keys().all(|k| k.starts_with('$'))
        }
        _ => false,
    }
}

impl Filter {
    /// Filter matching every document.
    pub fn all() -> Self {
        Filter::And(Vec::new())
    }

    pub fn parse(spec: &Value) -> Result<Self, StoreError> {
        let map = spec
            .as_object()
            .ok_or_else(|| StoreError::InvalidFilter(format!("expected a document, got {spec}")))?;

        let mut clauses = Vec::with_capacity(map.len());
        for (key, value) in map {
            let clause = match key.as_str() {
                "$and" => Filter::And(parse_filter_list(key, value)?),
                "$or" => Filter::Or(parse_filter_list(key, value)?),
                "$nor" => Filter::Nor(parse_filter_list(key, value)?),
                op if op.starts_with('$') => {
                    return Err(StoreError::InvalidFilter(format!(
                        "unknown top level operator: {op}"
                    )))
                }
                path => Filter::Field {
                    path: path.to_string(),
                    condition: parse_condition(value)?,
                },
            };
            clauses.push(clause);
        }

        if clauses.len() == 1 {
            Ok(clauses.remove(0))
        } else {
            Ok(Filter::And(clauses))
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::And(children) => children.iter().all(|f| f.matches(doc)),
            Filter::Or(children) => children.iter().any(|f| f.matches(doc)),
            Filter::Nor(children) => !children.iter().any(|f| f.matches(doc)),
            Filter::Field { path, condition } => condition.matches(&resolve_path(doc, path)),
        }
    }
}

fn parse_filter_list(op: &str, value: &Value) -> Result<Vec<Filter>, StoreError> {
    let items = value
        .as_array()
        .filter(|items| !items.is_empty())
        .ok_or_else(|| StoreError::InvalidFilter(format!("{op} must be a nonempty array")))?;
    items.iter().map(Filter::parse).collect()
}

fn parse_condition(value: &Value) -> Result<Condition, StoreError> {
    let Some(map) = value.as_object().filter(|_| is_operator_document(value)) else {
        return Ok(Condition::Eq(value.clone()));
    };

    let mut conditions = map
        .iter()
        .map(|(op, operand)| parse_operator(op, operand))
        .collect::<Result<Vec<_>, _>>()?;

    if conditions.len() == 1 {
        Ok(conditions.remove(0))
    } else {
        Ok(Condition::AllOf(conditions))
    }
}

fn parse_operator(op: &str, operand: &Value) -> Result<Condition, StoreError> {
    let condition = match op {
        "$eq" => Condition::Eq(operand.clone()),
        "$ne" => Condition::Ne(operand.clone()),
        "$gt" => Condition::Gt(operand.clone()),
        "$gte" => Condition::Gte(operand.clone()),
        "$lt" => Condition::Lt(operand.clone()),
        "$lte" => Condition::Lte(operand.clone()),
        "$in" => Condition::In(operand_array(op, operand)?),
        "$nin" => Condition::Nin(operand_array(op, operand)?),
        "$all" => Condition::All(operand_array(op, operand)?),
        "$exists" => Condition::Exists(truthy(operand)),
        "$size" => {
            let size = operand
                .as_u64()
                .ok_or_else(|| StoreError::InvalidFilter("$size needs a non-negative integer".into()))?;
            Condition::Size(size as usize)
        }
        "$not" => {
            if !is_operator_document(operand) {
                return Err(StoreError::InvalidFilter(
                    "$not needs an operator document".into(),
                ));
            }
            Condition::Not(Box::new(parse_condition(operand)?))
        }
        other => {
            return Err(StoreError::InvalidFilter(format!(
                "unknown operator: {other}"
            )))
        }
    };
    Ok(condition)
}

fn operand_array(op: &str, operand: &Value) -> Result<Vec<Value>, StoreError> {
    operand
        .as_array()
        .cloned()
        .ok_or_else(|| StoreError::InvalidFilter(format!("{op} needs an array")))
}

/// Boolean reading of flags such as `$exists: 1` or projection values.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Null => false,
        _ => true,
    }
}

/// Candidate values plus, for array candidates, their elements.
fn expanded<'a>(candidates: &[&'a Value]) -> Vec<&'a Value> {
    let mut out = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        out.push(*candidate);
        if let Value::Array(items) = candidate {
            out.extend(items.iter());
        }
    }
    out
}

fn equals_any(candidates: &[&Value], target: &Value) -> bool {
    if candidates.is_empty() {
        return target.is_null();
    }
    expanded(candidates)
        .into_iter()
        .any(|value| values_equal(value, target))
}

fn compares(candidates: &[&Value], target: &Value, accept: fn(Ordering) -> bool) -> bool {
    expanded(candidates)
        .into_iter()
        .any(|value| same_type_class(value, target) && accept(compare_values(value, target)))
}

impl Condition {
    /// Evaluates against the values found at the field path (empty when missing).
    pub fn matches(&self, candidates: &[&Value]) -> bool {
        match self {
            Condition::Eq(target) => equals_any(candidates, target),
            Condition::Ne(target) => !equals_any(candidates, target),
            Condition::Gt(target) => compares(candidates, target, Ordering::is_gt),
            Condition::Gte(target) => compares(candidates, target, Ordering::is_ge),
            Condition::Lt(target) => compares(candidates, target, Ordering::is_lt),
            Condition::Lte(target) => compares(candidates, target, Ordering::is_le),
            Condition::In(targets) => targets.iter().any(|t| equals_any(candidates, t)),
            Condition::Nin(targets) => !targets.iter().any(|t| equals_any(candidates, t)),
            Condition::All(targets) => {
                !targets.is_empty() && targets.iter().all(|t| equals_any(candidates, t))
            }
            Condition::Exists(expected) => !candidates.is_empty() == *expected,
            Condition::Size(size) => candidates
                .iter()
                .any(|value| value.as_array().is_some_and(|items| items.len() == *size)),
            Condition::Not(inner) => !inner.matches(candidates),
            Condition::AllOf(conditions) => conditions.iter().all(|c| c.matches(candidates)),
        }
    }
}
