//! Aggregation expressions.
//!
//! Strings beginning with `$` are field paths evaluated against the current
//! document, `$$name` refers to a variable (`ROOT`, `CURRENT`, or an alias
//! bound by `$map`), objects with a single `$`-key are operators, and anything
//! else is a literal. Evaluation yields `None` for missing values so callers
//! can omit the field instead of writing `null`.

use serde_json::{json, Map, Value};

use crate::error_handling::StoreError;
use crate::store::value::{get_path, type_name, Document};

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    FieldPath(String),
    Variable { name: String, path: Option<String> },
    Object(Vec<(String, Expression)>),
    Array(Vec<Expression>),
    ObjectToArray(Box<Expression>),
    Map {
        input: Box<Expression>,
        alias: String,
        body: Box<Expression>,
    },
    Type(Box<Expression>),
    Concat(Vec<Expression>),
    ToLower(Box<Expression>),
    ToUpper(Box<Expression>),
}

/// Variables visible while evaluating an expression.
pub struct Scope<'a> {
    current: &'a Document,
    bindings: Vec<(String, Value)>,
}

impl<'a> Scope<'a> {
    pub fn new(current: &'a Document) -> Self {
        Self {
            current,
            bindings: Vec::new(),
        }
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        match name {
            "ROOT" | "CURRENT" => Some(Value::Object(self.current.clone())),
            _ => self
                .bindings
                .iter()
                .rev()
                .find(|(bound, _)| bound == name)
                .map(|(_, value)| value.clone()),
        }
    }
}

fn invalid(msg: impl Into<String>) -> StoreError {
    StoreError::InvalidPipeline(msg.into())
}

impl Expression {
    pub fn parse(spec: &Value) -> Result<Self, StoreError> {
        match spec {
            Value::String(s) if s.starts_with("$$") => {
                let body = &s[2..];
                let (name, path) = match body.split_once('.') {
                    Some((name, path)) => (name, Some(path.to_string())),
                    None => (body, None),
                };
                if name.is_empty() {
                    return Err(invalid(format!("empty variable name in {s:?}")));
                }
                Ok(Expression::Variable {
                    name: name.to_string(),
                    path,
                })
            }
            Value::String(s) if s.starts_with('$') => {
                if s.len() == 1 {
                    return Err(invalid("'$' is not a valid field path"));
                }
                Ok(Expression::FieldPath(s[1..].to_string()))
            }
            Value::Array(items) => Ok(Expression::Array(
                items.iter().map(Expression::parse).collect::<Result<_, _>>()?,
            )),
            Value::Object(map) => {
                let mut entries = map.iter();
                match (entries.next(), entries.next()) {
                    (Some((op, operand)), None) if op.starts_with('$') => {
                        Self::parse_operator(op, operand)
                    }
                    _ => {
                        if let Some(op) = map.keys().find(|k| k.starts_with('$')) {
                            return Err(invalid(format!(
                                "operator {op} must be the only field of its document"
                            )));
                        }
                        Ok(Expression::Object(
                            map.iter()
                                .map(|(k, v)| Ok((k.clone(), Expression::parse(v)?)))
                                .collect::<Result<_, StoreError>>()?,
                        ))
                    }
                }
            }
            literal => Ok(Expression::Literal(literal.clone())),
        }
    }

    fn parse_operator(op: &str, operand: &Value) -> Result<Self, StoreError> {
        let unary = |operand: &Value| -> Result<Box<Expression>, StoreError> {
            // Accepts both `{"$op": expr}` and `{"$op": [expr]}`
            match operand {
                Value::Array(items) if items.len() == 1 => Ok(Box::new(Expression::parse(&items[0])?)),
                Value::Array(_) => Err(invalid(format!("{op} takes exactly one argument"))),
                other => Ok(Box::new(Expression::parse(other)?)),
            }
        };

        match op {
            "$literal" => Ok(Expression::Literal(operand.clone())),
            "$objectToArray" => Ok(Expression::ObjectToArray(unary(operand)?)),
            "$type" => Ok(Expression::Type(unary(operand)?)),
            "$toLower" => Ok(Expression::ToLower(unary(operand)?)),
            "$toUpper" => Ok(Expression::ToUpper(unary(operand)?)),
            "$concat" => {
                let parts = operand
                    .as_array()
                    .ok_or_else(|| invalid("$concat needs an array of expressions"))?;
                Ok(Expression::Concat(
                    parts.iter().map(Expression::parse).collect::<Result<_, _>>()?,
                ))
            }
            "$map" => {
                let args = operand
                    .as_object()
                    .ok_or_else(|| invalid("$map needs a document with input/as/in"))?;
                let input = args
                    .get("input")
                    .ok_or_else(|| invalid("$map is missing 'input'"))?;
                let body = args.get("in").ok_or_else(|| invalid("$map is missing 'in'"))?;
                let alias = match args.get("as") {
                    Some(Value::String(alias)) => alias.clone(),
                    Some(other) => return Err(invalid(format!("$map 'as' must be a string, got {other}"))),
                    None => "this".to_string(),
                };
                Ok(Expression::Map {
                    input: Box::new(Expression::parse(input)?),
                    alias,
                    body: Box::new(Expression::parse(body)?),
                })
            }
            other => Err(invalid(format!("unknown expression operator: {other}"))),
        }
    }

    pub fn evaluate(&self, scope: &mut Scope<'_>) -> Result<Option<Value>, StoreError> {
        let value = match self {
            Expression::Literal(value) => Some(value.clone()),
            Expression::FieldPath(path) => get_path(scope.current, path).cloned(),
            Expression::Variable { name, path } => {
                let value = scope
                    .lookup(name)
                    .ok_or_else(|| invalid(format!("use of undefined variable: {name}")))?;
                match path {
                    None => Some(value),
                    Some(path) => value.as_object().and_then(|doc| get_path(doc, path).cloned()),
                }
            }
            Expression::Object(fields) => {
                let mut out = Map::with_capacity(fields.len());
                for (key, expr) in fields {
                    if let Some(value) = expr.evaluate(scope)? {
                        out.insert(key.clone(), value);
                    }
                }
                Some(Value::Object(out))
            }
            Expression::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for expr in items {
                    out.push(expr.evaluate(scope)?.unwrap_or(Value::Null));
                }
                Some(Value::Array(out))
            }
            Expression::ObjectToArray(inner) => match inner.evaluate(scope)? {
                None | Some(Value::Null) => Some(Value::Null),
                Some(Value::Object(map)) => Some(Value::Array(
                    map.into_iter().map(|(k, v)| json!({"k": k, "v": v})).collect(),
                )),
                Some(other) => {
                    return Err(invalid(format!(
                        "$objectToArray requires a document input, found: {}",
                        type_name(&other)
                    )))
                }
            },
            Expression::Map { input, alias, body } => match input.evaluate(scope)? {
                None | Some(Value::Null) => Some(Value::Null),
                Some(Value::Array(items)) => {
                    let mut out = Vec::with_capacity(items.len());
                    for item in items {
                        scope.bindings.push((alias.clone(), item));
                        let result = body.evaluate(scope);
                        scope.bindings.pop();
                        out.push(result?.unwrap_or(Value::Null));
                    }
                    Some(Value::Array(out))
                }
                Some(other) => {
                    return Err(invalid(format!(
                        "input to $map must be an array, not {}",
                        type_name(&other)
                    )))
                }
            },
            Expression::Type(inner) => Some(Value::String(
                inner
                    .evaluate(scope)?
                    .as_ref()
                    .map_or("missing", type_name)
                    .to_string(),
            )),
            Expression::Concat(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part.evaluate(scope)? {
                        None | Some(Value::Null) => return Ok(Some(Value::Null)),
                        Some(Value::String(s)) => out.push_str(&s),
                        Some(other) => {
                            return Err(invalid(format!(
                                "$concat only supports strings, not {}",
                                type_name(&other)
                            )))
                        }
                    }
                }
                Some(Value::String(out))
            }
            Expression::ToLower(inner) => Some(Value::String(
                string_operand(inner.evaluate(scope)?, "$toLower")?.to_lowercase(),
            )),
            Expression::ToUpper(inner) => Some(Value::String(
                string_operand(inner.evaluate(scope)?, "$toUpper")?.to_uppercase(),
            )),
        };
        Ok(value)
    }
}

/// `$toLower`/`$toUpper` treat missing and null as the empty string.
fn string_operand(value: Option<Value>, op: &str) -> Result<String, StoreError> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(invalid(format!(
            "{op} cannot convert a value of type {}",
            type_name(&other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(spec: Value, doc: Value) -> Option<Value> {
        let doc = doc.as_object().cloned().unwrap();
        let expr = Expression::parse(&spec).expect("valid expression");
        expr.evaluate(&mut Scope::new(&doc)).expect("evaluates")
    }

    #[test]
    fn test_field_paths_and_literals() {
        let doc = json!({"address": {"state": "Ohio"}, "gpa": 3.2});
        assert_eq!(eval(json!("$address.state"), doc.clone()), Some(json!("Ohio")));
        assert_eq!(eval(json!("$missing"), doc.clone()), None);
        assert_eq!(eval(json!(1), doc.clone()), Some(json!(1)));
        assert_eq!(eval(json!({"$literal": "$gpa"}), doc), Some(json!("$gpa")));
    }

    #[test]
    fn test_schema_projection_expression() {
        let doc = json!({
            "_id": {"$oid": "68332eb9da0b77ec6b8d1476"},
            "student_id": 12345678,
            "gpa": 3.25,
            "courses": ["Calculus"]
        });
        let spec = json!({
            "$map": {
                "input": {"$objectToArray": "$$ROOT"},
                "as": "field",
                "in": {"name": "$$field.k", "type": {"$type": "$$field.v"}}
            }
        });
        assert_eq!(
            eval(spec, doc),
            Some(json!([
                {"name": "_id", "type": "objectId"},
                {"name": "student_id", "type": "int"},
                {"name": "gpa", "type": "double"},
                {"name": "courses", "type": "array"}
            ]))
        );
    }

    #[test]
    fn test_concat_and_case() {
        let doc = json!({"first_name": "Ada", "last_name": "Lovelace"});
        let spec = json!({
            "$concat": [{"$toLower": "$first_name"}, ".", {"$toLower": "$last_name"}, "@uniofstn.edu"]
        });
        assert_eq!(eval(spec, doc.clone()), Some(json!("ada.lovelace@uniofstn.edu")));
        assert_eq!(
            eval(json!({"$concat": ["$first_name", "$nickname"]}), doc.clone()),
            Some(Value::Null)
        );
        assert_eq!(eval(json!({"$toUpper": ["$first_name"]}), doc), Some(json!("ADA")));
    }

    #[test]
    fn test_type_of_missing() {
        assert_eq!(eval(json!({"$type": "$nope"}), json!({})), Some(json!("missing")));
    }

    #[test]
    fn test_object_expression_omits_missing_fields() {
        let doc = json!({"a": 1});
        assert_eq!(
            eval(json!({"x": "$a", "y": "$b"}), doc),
            Some(json!({"x": 1}))
        );
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(Expression::parse(&json!({"$frobnicate": 1})).is_err());
        assert!(Expression::parse(&json!({"$type": "$a", "other": 1})).is_err());
        assert!(Expression::parse(&json!("$")).is_err());

        let doc = json!({"a": 1}).as_object().cloned().unwrap();
        let expr = Expression::parse(&json!("$$nope")).unwrap();
        assert!(expr.evaluate(&mut Scope::new(&doc)).is_err());
        let expr = Expression::parse(&json!({"$objectToArray": "$a"})).unwrap();
        assert!(expr.evaluate(&mut Scope::new(&doc)).is_err());
    }
}
