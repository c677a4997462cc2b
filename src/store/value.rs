//! Document values: ordering, type names, and dotted-path access.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::error_handling::StoreError;
use crate::store::object_id::is_object_id;

/// A stored document: a JSON object whose field order is preserved.
pub type Document = Map<String, Value>;

/// Name of the identifier field every stored document carries.
pub const ID_FIELD: &str = "_id";

/// Rank of a value's type in the cross-type sort order.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Object(_) if is_object_id(value) => 7,
        Value::Object(_) => 4,
        Value::Array(_) => 5,
        Value::Bool(_) => 8,
    }
}

/// True when both values belong to the same comparison class.
pub fn same_type_class(a: &Value, b: &Value) -> bool {
    type_rank(a) == type_rank(b)
}

/// Total order over values: null < numbers < strings < documents < arrays <
/// ObjectIds < booleans. Numbers compare by magnitude regardless of integer
/// or floating representation.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (left, right) in x.iter().zip(y) {
                let ord = compare_values(left, right);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => {
            for ((lk, lv), (rk, rv)) in x.iter().zip(y) {
                let ord = lk.cmp(rk).then_with(|| compare_values(lv, rv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => Ordering::Equal,
    }
}

fn compare_numbers(x: &serde_json::Number, y: &serde_json::Number) -> Ordering {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a.cmp(&b);
    }
    let a = x.as_f64().unwrap_or(f64::NAN);
    let b = y.as_f64().unwrap_or(f64::NAN);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Equality as used by filters: `3` equals `3.0`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Ordering::Equal
}

/// Type name as reported by the `$type` expression.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                if i32::try_from(i).is_ok() {
                    "int"
                } else {
                    "long"
                }
            } else if n.is_u64() {
                "long"
            } else {
                "double"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) if is_object_id(value) => "objectId",
        Value::Object(_) => "object",
    }
}

/// All values reachable through a dotted path, descending into arrays of
/// documents the way filters do. An empty result means the field is missing.
pub fn resolve_path<'a>(doc: &'a Document, path: &str) -> Vec<&'a Value> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut out = Vec::new();
    if let Some((head, rest)) = segments.split_first() {
        if let Some(value) = doc.get(*head) {
            collect(value, rest, &mut out);
        }
    }
    out
}

fn collect<'a>(current: &'a Value, segments: &[&str], out: &mut Vec<&'a Value>) {
    let Some((head, rest)) = segments.split_first() else {
        out.push(current);
        return;
    };
    match current {
        Value::Object(map) => {
            if let Some(next) = map.get(*head) {
                collect(next, rest, out);
            }
        }
        Value::Array(items) => {
            if let Ok(index) = head.parse::<usize>() {
                if let Some(next) = items.get(index) {
                    collect(next, rest, out);
                }
            }
            for item in items.iter().filter(|item| item.is_object()) {
                collect(item, segments, out);
            }
        }
        _ => {}
    }
}

/// Single value at a dotted path, following documents and array indexes only.
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Sets a value at a dotted path, creating intermediate documents.
///
/// Returns the previous value, if any.
pub fn set_path(doc: &mut Document, path: &str, value: Value) -> Result<Option<Value>, StoreError> {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };
    let mut current = doc;
    if let Some(parents) = parents {
        for segment in parents.split('.') {
            let next = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            current = match next {
                Value::Object(map) => map,
                _ => return Err(StoreError::PathConflict(path.to_string())),
            };
        }
    }
    Ok(current.insert(leaf.to_string(), value))
}

/// Removes the value at a dotted path, returning it if it existed.
pub fn remove_path(doc: &mut Document, path: &str) -> Option<Value> {
    match path.split_once('.') {
        None => doc.shift_remove(path),
        Some((head, rest)) => match doc.get_mut(head)? {
            Value::Object(child) => remove_path(child, rest),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn test_cross_type_order() {
        let ordered = [
            json!(null),
            json!(-1),
            json!(2.5),
            json!("a"),
            json!({"a": 1}),
            json!([1]),
            json!({"$oid": "68332eb9da0b77ec6b8d1476"}),
            json!(false),
            json!(true),
        ];
        for pair in ordered.windows(2) {
            assert_eq!(
                compare_values(&pair[0], &pair[1]),
                Ordering::Less,
                "{} should sort before {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_integer_and_float_compare_by_magnitude() {
        assert!(values_equal(&json!(3), &json!(3.0)));
        assert_eq!(compare_values(&json!(3), &json!(3.5)), Ordering::Less);
        assert_eq!(compare_values(&json!(4.0), &json!(3)), Ordering::Greater);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(type_name(&json!(12345678)), "int");
        assert_eq!(type_name(&json!(5_000_000_000i64)), "long");
        assert_eq!(type_name(&json!(3.25)), "double");
        assert_eq!(type_name(&json!("x")), "string");
        assert_eq!(type_name(&json!(["x"])), "array");
        assert_eq!(type_name(&json!({"city": "x"})), "object");
        assert_eq!(
            type_name(&json!({"$oid": "68332eb9da0b77ec6b8d1476"})),
            "objectId"
        );
        assert_eq!(type_name(&json!(true)), "bool");
        assert_eq!(type_name(&json!(null)), "null");
    }

    #[test]
    fn test_resolve_path_descends_into_arrays_of_documents() {
        let d = doc(json!({
            "address": {"state": "Alaska"},
            "terms": [{"course": "Calculus"}, {"course": "Physics"}]
        }));
        assert_eq!(resolve_path(&d, "address.state"), vec![&json!("Alaska")]);
        assert_eq!(
            resolve_path(&d, "terms.course"),
            vec![&json!("Calculus"), &json!("Physics")]
        );
        assert_eq!(resolve_path(&d, "terms.1.course"), vec![&json!("Physics")]);
        assert!(resolve_path(&d, "address.zip_code").is_empty());
    }

    #[test]
    fn test_set_path_creates_intermediate_documents() {
        let mut d = doc(json!({"name": "x"}));
        let previous = set_path(&mut d, "address.city", json!("Springfield")).unwrap();
        assert!(previous.is_none());
        assert_eq!(get_path(&d, "address.city"), Some(&json!("Springfield")));

        let previous = set_path(&mut d, "name", json!("y")).unwrap();
        assert_eq!(previous, Some(json!("x")));
    }

    #[test]
    fn test_set_path_through_scalar_conflicts() {
        let mut d = doc(json!({"name": "x"}));
        let err = set_path(&mut d, "name.first", json!("y")).unwrap_err();
        assert!(matches!(err, StoreError::PathConflict(_)));
    }

    #[test]
    fn test_remove_path_keeps_field_order() {
        let mut d = doc(json!({"a": 1, "b": {"c": 2, "d": 3}, "e": 4}));
        assert_eq!(remove_path(&mut d, "b.c"), Some(json!(2)));
        assert_eq!(remove_path(&mut d, "a"), Some(json!(1)));
        assert_eq!(remove_path(&mut d, "missing.path"), None);
        let keys: Vec<&String> = d.keys().collect();
        assert_eq!(keys, vec!["b", "e"]);
    }
}
