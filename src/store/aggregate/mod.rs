//! Aggregation pipelines.
//!
//! A pipeline is an array of single-key stage documents evaluated in order
//! over the collection's documents:
//!
//! | stage                  | effect                                           |
//! |------------------------|--------------------------------------------------|
//! | `$match`               | keep documents matching a filter                 |
//! | `$group`               | group by an expression and accumulate            |
//! | `$project`             | include/exclude fields or compute new ones       |
//! | `$addFields` / `$set`  | compute fields on top of the existing document   |
//! | `$sort`                | order by one or more fields                      |
//! | `$skip` / `$limit`     | page through the stream                          |
//! | `$sample`              | pick `size` documents at random                  |
//! | `$count`               | replace the stream with a single count document  |
//! | `$unwind`              | emit one document per element of an array field |

mod expression;
mod group;

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;

use crate::error_handling::StoreError;
use crate::store::filter::{truthy, Filter};
use crate::store::projection::{Projection, SortSpec};
use crate::store::value::{get_path, set_path, Document, ID_FIELD};

pub use expression::{Expression, Scope};
pub use group::{AccumulatorKind, GroupSpec};

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Filter),
    Group(GroupSpec),
    Project {
        projection: Projection,
        computed: Vec<(String, Expression)>,
    },
    AddFields(Vec<(String, Expression)>),
    Sort(SortSpec),
    Skip(usize),
    Limit(usize),
    Sample(usize),
    Count(String),
    Unwind(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

fn invalid(msg: impl Into<String>) -> StoreError {
    StoreError::InvalidPipeline(msg.into())
}

fn positive_count(stage: &str, operand: &Value) -> Result<usize, StoreError> {
    operand
        .as_u64()
        .filter(|n| *n > 0)
        .map(|n| n as usize)
        .ok_or_else(|| invalid(format!("{stage} needs a positive integer, got {operand}")))
}

fn computed_fields(stage: &str, operand: &Value) -> Result<Vec<(String, Expression)>, StoreError> {
    operand
        .as_object()
        .ok_or_else(|| invalid(format!("{stage} needs a document")))?
        .iter()
        .map(|(path, spec)| Ok((path.clone(), Expression::parse(spec)?)))
        .collect()
}

impl Stage {
    pub fn parse(spec: &Value) -> Result<Self, StoreError> {
        let (name, operand) = spec
            .as_object()
            .filter(|stage| stage.len() == 1)
            .and_then(|stage| stage.iter().next())
            .ok_or_else(|| {
                invalid(format!(
                    "a pipeline stage must be a document with exactly one field, got {spec}"
                ))
            })?;

        let stage = match name.as_str() {
            "$match" => Stage::Match(Filter::parse(operand)?),
            "$group" => Stage::Group(GroupSpec::parse(operand)?),
            "$project" => Self::parse_project(operand)?,
            "$addFields" | "$set" => Stage::AddFields(computed_fields(name, operand)?),
            "$sort" => Stage::Sort(SortSpec::parse(operand)?),
            "$skip" => Stage::Skip(operand.as_u64().ok_or_else(|| invalid("$skip needs a non-negative integer"))? as usize),
            "$limit" => Stage::Limit(positive_count(name, operand)?),
            "$sample" => {
                let size = operand
                    .get("size")
                    .ok_or_else(|| invalid("$sample needs a 'size' field"))?;
                Stage::Sample(
                    size.as_u64()
                        .ok_or_else(|| invalid(format!("$sample size must be a non-negative integer, got {size}")))?
                        as usize,
                )
            }
            "$count" => match operand.as_str() {
                Some(field) if !field.is_empty() && !field.starts_with('$') && !field.contains('.') => {
                    Stage::Count(field.to_string())
                }
                _ => return Err(invalid(format!("$count needs a plain field name, got {operand}"))),
            },
            "$unwind" => {
                let path = match operand {
                    Value::String(path) => path.as_str(),
                    Value::Object(args) => args.get("path").and_then(Value::as_str).unwrap_or_default(),
                    _ => "",
                };
                match path.strip_prefix('$') {
                    Some(field) if !field.is_empty() => Stage::Unwind(field.to_string()),
                    _ => return Err(invalid(format!("$unwind needs a '$'-prefixed field path, got {operand}"))),
                }
            }
            other => return Err(invalid(format!("unrecognized pipeline stage name: '{other}'"))),
        };
        Ok(stage)
    }

    fn parse_project(operand: &Value) -> Result<Self, StoreError> {
        let map = operand
            .as_object()
            .filter(|map| !map.is_empty())
            .ok_or_else(|| invalid("$project needs a nonempty document"))?;

        let mut includes = Vec::new();
        let mut excludes = Vec::new();
        let mut id_flag = None;
        let mut computed = Vec::new();
        for (path, spec) in map {
            match spec {
                Value::Bool(_) | Value::Number(_) if path == ID_FIELD => id_flag = Some(truthy(spec)),
                Value::Bool(_) | Value::Number(_) if truthy(spec) => includes.push(path.clone()),
                Value::Bool(_) | Value::Number(_) => excludes.push(path.clone()),
                _ => computed.push((path.clone(), Expression::parse(spec)?)),
            }
        }
        if !computed.is_empty() && !excludes.is_empty() {
            return Err(invalid(
                "$project cannot combine field exclusion with computed fields",
            ));
        }
        // Computed fields put the projection in inclusion mode
        let projection = if !computed.is_empty() {
            Projection::Include {
                paths: includes,
                include_id: id_flag.unwrap_or(true),
            }
        } else {
            Projection::from_flags(includes, excludes, id_flag).map_err(|e| invalid(e.to_string()))?
        };
        Ok(Stage::Project { projection, computed })
    }

    fn run<R: Rng + ?Sized>(&self, mut docs: Vec<Document>, rng: &mut R) -> Result<Vec<Document>, StoreError> {
        let out = match self {
            Stage::Match(filter) => docs.into_iter().filter(|d| filter.matches(d)).collect(),
            Stage::Group(group) => group.run(docs)?,
            Stage::Project { projection, computed } => docs
                .iter()
                .map(|doc| {
                    let mut out = projection.apply(doc);
                    add_computed(doc, &mut out, computed)?;
                    Ok(out)
                })
                .collect::<Result<_, StoreError>>()?,
            Stage::AddFields(computed) => docs
                .into_iter()
                .map(|doc| {
                    let mut out = doc.clone();
                    add_computed(&doc, &mut out, computed)?;
                    Ok(out)
                })
                .collect::<Result<_, StoreError>>()?,
            Stage::Sort(spec) => {
                spec.sort(&mut docs);
                docs
            }
            Stage::Skip(n) => docs.into_iter().skip(*n).collect(),
            Stage::Limit(n) => docs.into_iter().take(*n).collect(),
            Stage::Sample(size) => {
                docs.shuffle(rng);
                docs.truncate(*size);
                docs
            }
            Stage::Count(field) => {
                if docs.is_empty() {
                    Vec::new()
                } else {
                    let mut out = Document::new();
                    out.insert(field.clone(), Value::from(docs.len() as u64));
                    vec![out]
                }
            }
            Stage::Unwind(path) => {
                let mut out = Vec::with_capacity(docs.len());
                for doc in docs {
                    match get_path(&doc, path) {
                        Some(Value::Array(items)) => {
                            for item in items.clone() {
                                let mut copy = doc.clone();
                                set_path(&mut copy, path, item)?;
                                out.push(copy);
                            }
                        }
                        None | Some(Value::Null) => {}
                        Some(_) => out.push(doc),
                    }
                }
                out
            }
        };
        Ok(out)
    }
}

/// Evaluates expressions against `source` and writes them into `target`.
fn add_computed(
    source: &Document,
    target: &mut Document,
    computed: &[(String, Expression)],
) -> Result<(), StoreError> {
    let mut scope = Scope::new(source);
    for (path, expr) in computed {
        if let Some(value) = expr.evaluate(&mut scope)? {
            set_path(target, path, value)?;
        }
    }
    Ok(())
}

impl Pipeline {
    pub fn parse(spec: &Value) -> Result<Self, StoreError> {
        let stages = spec
            .as_array()
            .ok_or_else(|| invalid(format!("a pipeline must be an array of stages, got {spec}")))?
            .iter()
            .map(Stage::parse)
            .collect::<Result<_, _>>()?;
        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn run<R: Rng + ?Sized>(&self, docs: Vec<Document>, rng: &mut R) -> Result<Vec<Document>, StoreError> {
        self.stages
            .iter()
            .try_fold(docs, |docs, stage| stage.run(docs, &mut *rng))
    }
}
