//! `$group` stage and its accumulators.

use std::collections::HashMap;

use serde_json::{Number, Value};

use crate::error_handling::StoreError;
use crate::store::aggregate::expression::{Expression, Scope};
use crate::store::value::{compare_values, values_equal, Document, ID_FIELD};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorKind {
    Sum,
    Avg,
    Min,
    Max,
    First,
    Last,
    Push,
    AddToSet,
}

impl AccumulatorKind {
    fn from_operator(op: &str) -> Option<Self> {
        Some(match op {
            "$sum" | "$count" => Self::Sum,
            "$avg" => Self::Avg,
            "$min" => Self::Min,
            "$max" => Self::Max,
            "$first" => Self::First,
            "$last" => Self::Last,
            "$push" => Self::Push,
            "$addToSet" => Self::AddToSet,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSpec {
    key: Expression,
    fields: Vec<(String, AccumulatorKind, Expression)>,
}

/// Running state of one accumulator for one group.
#[derive(Debug, Clone)]
enum State {
    Sum { int: i64, float: f64, is_float: bool },
    Avg { total: f64, count: u64 },
    Extreme(Option<Value>),
    First(Option<Value>),
    Last(Option<Value>),
    List(Vec<Value>),
}

impl State {
    fn new(kind: AccumulatorKind) -> Self {
        match kind {
            AccumulatorKind::Sum => State::Sum {
                int: 0,
                float: 0.0,
                is_float: false,
            },
            AccumulatorKind::Avg => State::Avg { total: 0.0, count: 0 },
            AccumulatorKind::Min | AccumulatorKind::Max => State::Extreme(None),
            AccumulatorKind::First => State::First(None),
            AccumulatorKind::Last => State::Last(None),
            AccumulatorKind::Push | AccumulatorKind::AddToSet => State::List(Vec::new()),
        }
    }

    fn add(&mut self, kind: AccumulatorKind, value: Option<Value>) {
        match self {
            State::Sum { int, float, is_float } => {
                // Non-numeric values are ignored by $sum
                if let Some(Value::Number(n)) = value {
                    match n.as_i64() {
                        Some(i) if !*is_float => match int.checked_add(i) {
                            Some(sum) => *int = sum,
                            None => {
                                *is_float = true;
                                *float = *int as f64 + i as f64;
                            }
                        },
                        _ => {
                            if !*is_float {
                                *is_float = true;
                                *float = *int as f64;
                            }
                            *float += n.as_f64().unwrap_or_default();
                        }
                    }
                }
            }
            State::Avg { total, count } => {
                if let Some(Value::Number(n)) = value {
                    *total += n.as_f64().unwrap_or_default();
                    *count += 1;
                }
            }
            State::Extreme(current) => {
                let Some(value) = value.filter(|v| !v.is_null()) else {
                    return;
                };
                let replace = match current {
                    None => true,
                    Some(existing) => {
                        let ord = compare_values(&value, existing);
                        if kind == AccumulatorKind::Min {
                            ord.is_lt()
                        } else {
                            ord.is_gt()
                        }
                    }
                };
                if replace {
                    *current = Some(value);
                }
            }
            State::First(current) => {
                if current.is_none() {
                    *current = Some(value.unwrap_or(Value::Null));
                }
            }
            State::Last(current) => *current = Some(value.unwrap_or(Value::Null)),
            State::List(items) => {
                let Some(value) = value else { return };
                if kind == AccumulatorKind::AddToSet && items.iter().any(|v| values_equal(v, &value)) {
                    return;
                }
                items.push(value);
            }
        }
    }

    fn finish(self) -> Value {
        match self {
            State::Sum { int, float, is_float } => {
                if is_float {
                    Number::from_f64(float).map_or(Value::Null, Value::Number)
                } else {
                    Value::from(int)
                }
            }
            State::Avg { total, count } => {
                if count == 0 {
                    Value::Null
                } else {
                    Number::from_f64(total / count as f64).map_or(Value::Null, Value::Number)
                }
            }
            State::Extreme(value) | State::First(value) | State::Last(value) => {
                value.unwrap_or(Value::Null)
            }
            State::List(items) => Value::Array(items),
        }
    }
}

/// Hash form of a group key: numbers that compare equal share one form.
fn key_form(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.as_i64().is_none() && n.as_u64().is_none() => {
            let f = n.as_f64().unwrap_or(f64::NAN);
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Value::from(f as i64)
            } else {
                value.clone()
            }
        }
        Value::Array(items) => Value::Array(items.iter().map(key_form).collect()),
        Value::Object(map) => Value::Object(
            map.iter().map(|(k, v)| (k.clone(), key_form(v))).collect(),
        ),
        other => other.clone(),
    }
}

impl GroupSpec {
    pub fn parse(spec: &Value) -> Result<Self, StoreError> {
        let map = spec
            .as_object()
            .ok_or_else(|| StoreError::InvalidPipeline("$group needs a document".into()))?;
        let key_spec = map.get(ID_FIELD).ok_or_else(|| {
            StoreError::InvalidPipeline("a group specification must include an _id".into())
        })?;
        let key = Expression::parse(key_spec)?;

        let mut fields = Vec::new();
        for (name, accumulator) in map.iter().filter(|(name, _)| *name != ID_FIELD) {
            let (op, operand) = accumulator
                .as_object()
                .filter(|acc| acc.len() == 1)
                .and_then(|acc| acc.iter().next())
                .ok_or_else(|| {
                    StoreError::InvalidPipeline(format!(
                        "the field '{name}' must be an accumulator object"
                    ))
                })?;
            let kind = AccumulatorKind::from_operator(op).ok_or_else(|| {
                StoreError::InvalidPipeline(format!("unknown group operator '{op}'"))
            })?;
            // {"$count": {}} counts documents, i.e. sums the literal 1
            let expr = if op == "$count" {
                Expression::Literal(Value::from(1))
            } else {
                Expression::parse(operand)?
            };
            fields.push((name.clone(), kind, expr));
        }
        Ok(Self { key, fields })
    }

    /// Groups documents in first-seen key order.
    pub fn run(&self, docs: Vec<Document>) -> Result<Vec<Document>, StoreError> {
        let mut groups: Vec<(Value, Vec<State>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for doc in &docs {
            let mut scope = Scope::new(doc);
            let key = self.key.evaluate(&mut scope)?.unwrap_or(Value::Null);
            let slot = *index
                .entry(serde_json::to_string(&key_form(&key))?)
                .or_insert_with(|| {
                    let states = self.fields.iter().map(|(_, kind, _)| State::new(*kind)).collect();
                    groups.push((key.clone(), states));
                    groups.len() - 1
                });

            for ((_, kind, expr), state) in self.fields.iter().zip(groups[slot].1.iter_mut()) {
                let value = expr.evaluate(&mut scope)?;
                state.add(*kind, value);
            }
        }

        Ok(groups
            .into_iter()
            .map(|(key, states)| {
                let mut out = Document::new();
                out.insert(ID_FIELD.to_string(), key);
                for ((name, _, _), state) in self.fields.iter().zip(states) {
                    out.insert(name.clone(), state.finish());
                }
                out
            })
            .collect())
    }
}
