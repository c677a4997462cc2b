//! Read-only walkthrough queries: counts, lookups, groupings and
//! composite filters.

use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::error_handling::StoreError;
use crate::store::{Collection, Document, FindOptions};

/// Inclusive range of dates, compared as ISO `YYYY-MM-DD` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parses two ISO dates.
    pub fn parse(start: &str, end: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self {
            start: NaiveDate::parse_from_str(start, "%Y-%m-%d")?,
            end: NaiveDate::parse_from_str(end, "%Y-%m-%d")?,
        })
    }

    /// `{"$gte": start, "$lte": end}` condition for a date field.
    pub fn condition(&self) -> Value {
        json!({
            "$gte": self.start.format("%Y-%m-%d").to_string(),
            "$lte": self.end.format("%Y-%m-%d").to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentAverage {
    /// `None` for documents without a department
    pub department: Option<String>,
    pub average_gpa: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentCount {
    pub department: Option<String>,
    pub count: u64,
}

fn group_key(doc: &Document) -> Option<String> {
    doc.get("_id").and_then(Value::as_str).map(str::to_string)
}

pub async fn count_born_between(collection: &Collection, range: &DateRange) -> Result<u64, StoreError> {
    collection
        .count_documents(&json!({"date_of_birth": range.condition()}))
        .await
}

/// Average GPA per department of students born within `range`.
pub async fn average_gpa_by_department(
    collection: &Collection,
    range: &DateRange,
) -> Result<Vec<DepartmentAverage>, StoreError> {
    let pipeline = json!([
        {"$match": {"date_of_birth": range.condition()}},
        {"$group": {"_id": "$department", "avgGPA": {"$avg": "$gpa"}}}
    ]);
    Ok(collection
        .aggregate(&pipeline)
        .await?
        .iter()
        .map(|doc| DepartmentAverage {
            department: group_key(doc),
            average_gpa: doc.get("avgGPA").and_then(Value::as_f64),
        })
        .collect())
}

/// Looks a document up by `_id`, returning only `first_name` and `department`.
pub async fn find_by_id(collection: &Collection, id: &Value) -> Result<Option<Document>, StoreError> {
    collection
        .find_one(
            &json!({"_id": id}),
            Some(json!({"_id": 0, "first_name": 1, "department": 1})),
        )
        .await
}

/// First student with the given first name, without `_id`.
pub async fn find_by_first_name(
    collection: &Collection,
    first_name: &str,
) -> Result<Option<Document>, StoreError> {
    collection
        .find_one(&json!({"first_name": first_name}), Some(json!({"_id": 0})))
        .await
}

/// Department names currently in use, sorted.
pub async fn distinct_departments(collection: &Collection) -> Result<Vec<String>, StoreError> {
    Ok(collection
        .distinct("department", &json!({}))
        .await?
        .into_iter()
        .filter_map(|value| match value {
            Value::String(name) => Some(name),
            _ => None,
        })
        .collect())
}

pub async fn count_in_department(collection: &Collection, department: &str) -> Result<u64, StoreError> {
    collection
        .count_documents(&json!({"department": department}))
        .await
}

/// Number of students per department, smallest department first.
///
/// With a `birth_range` only students born within it are counted.
pub async fn counts_by_department(
    collection: &Collection,
    birth_range: Option<&DateRange>,
) -> Result<Vec<DepartmentCount>, StoreError> {
    let mut stages = Vec::new();
    if let Some(range) = birth_range {
        stages.push(json!({"$match": {"date_of_birth": range.condition()}}));
    }
    stages.push(json!({"$group": {"_id": "$department", "count": {"$sum": 1}}}));
    stages.push(json!({"$sort": {"count": 1}}));

    Ok(collection
        .aggregate(&Value::Array(stages))
        .await?
        .iter()
        .map(|doc| DepartmentCount {
            department: group_key(doc),
            count: doc.get("count").and_then(Value::as_u64).unwrap_or_default(),
        })
        .collect())
}

/// Name and email of the first `limit` students.
pub async fn preview(collection: &Collection, limit: usize) -> Result<Vec<Document>, StoreError> {
    collection
        .find(
            &json!({}),
            FindOptions {
                projection: Some(json!({"_id": 0, "first_name": 1, "last_name": 1, "email": 1})),
                limit: Some(limit),
                ..Default::default()
            },
        )
        .await
}

/// High achievers taking a given set of courses in a given set of states.
#[derive(Debug, Clone)]
pub struct ScholarFilter {
    pub min_gpa: f64,
    pub max_gpa: f64,
    pub excluded_departments: Vec<String>,
    /// Every one of these must be among the student's courses
    pub required_courses: Vec<String>,
    pub states: Vec<String>,
}

impl Default for ScholarFilter {
    fn default() -> Self {
        Self {
            min_gpa: 3.5,
            max_gpa: 4.0,
            excluded_departments: vec!["Engineering".to_string()],
            required_courses: vec!["Statistics".to_string(), "Machine Learning".to_string()],
            states: vec![
                "Alaska".to_string(),
                "Indiana".to_string(),
                "Washington".to_string(),
            ],
        }
    }
}

impl ScholarFilter {
    pub fn to_filter(&self) -> Value {
        json!({
            "gpa": {"$gte": self.min_gpa, "$lte": self.max_gpa},
            "department": {"$nin": self.excluded_departments},
            "courses": {"$all": self.required_courses},
            "address.state": {"$in": self.states},
        })
    }

    /// Matching students' names and GPAs.
    pub async fn find(&self, collection: &Collection) -> Result<Vec<Document>, StoreError> {
        collection
            .find(
                &self.to_filter(),
                FindOptions {
                    projection: Some(json!({"_id": 0, "first_name": 1, "last_name": 1, "gpa": 1})),
                    ..Default::default()
                },
            )
            .await
    }
}

/// Students in one of several departments with a minimum GPA and a set of
/// courses, excluding some states.
#[derive(Debug, Clone)]
pub struct TrackFilter {
    /// Any one of these
    pub departments: Vec<String>,
    pub min_gpa: f64,
    pub required_courses: Vec<String>,
    /// None of these
    pub excluded_states: Vec<String>,
}

impl Default for TrackFilter {
    fn default() -> Self {
        Self {
            departments: vec!["Computer Science".to_string(), "Engineering".to_string()],
            min_gpa: 3.5,
            required_courses: vec!["Programming".to_string(), "Database Systems".to_string()],
            excluded_states: vec!["Alaska".to_string(), "Hawaii".to_string()],
        }
    }
}

impl TrackFilter {
    pub fn to_filter(&self) -> Value {
        let departments: Vec<Value> = self
            .departments
            .iter()
            .map(|d| json!({"department": d}))
            .collect();
        let states: Vec<Value> = self
            .excluded_states
            .iter()
            .map(|s| json!({"address.state": s}))
            .collect();

        let mut clauses = Vec::new();
        // Empty $or/$nor arrays are invalid filters
        if !departments.is_empty() {
            clauses.push(json!({"$or": departments}));
        }
        clauses.push(json!({"gpa": {"$gte": self.min_gpa}}));
        clauses.push(json!({"courses": {"$all": self.required_courses}}));
        if !states.is_empty() {
            clauses.push(json!({"$nor": states}));
        }
        json!({"$and": clauses})
    }

    /// Matching students' names, departments and GPAs.
    pub async fn find(&self, collection: &Collection) -> Result<Vec<Document>, StoreError> {
        collection
            .find(
                &self.to_filter(),
                FindOptions {
                    projection: Some(json!({
                        "_id": 0, "first_name": 1, "last_name": 1, "department": 1, "gpa": 1
                    })),
                    ..Default::default()
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_helpers::create_test_collection;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    async fn roster() -> Collection {
        let collection = create_test_collection("students").await;
        collection
            .insert_many(vec![
                doc(json!({"first_name": "Ada", "last_name": "King", "department": "Computer Science",
                    "gpa": 3.9, "date_of_birth": "2004-05-01", "email": "a@x.org",
                    "courses": ["Programming", "Database Systems", "Statistics", "Machine Learning"],
                    "address": {"state": "Indiana"}})),
                doc(json!({"first_name": "Bo", "last_name": "Chen", "department": "Engineering",
                    "gpa": 3.7, "date_of_birth": "2002-12-31", "email": "b@x.org",
                    "courses": ["Programming", "Database Systems", "Statistics", "Machine Learning"],
                    "address": {"state": "Alaska"}})),
                doc(json!({"first_name": "Cy", "last_name": "Diaz", "department": "Computer Science",
                    "gpa": 3.0, "date_of_birth": "2007-12-31", "email": "c@x.org",
                    "courses": ["Calculus"], "address": {"state": "Ohio"}})),
                doc(json!({"first_name": "Di", "last_name": "Eze", "department": "Business",
                    "gpa": 2.5, "date_of_birth": "2003-01-01", "email": "d@x.org",
                    "courses": ["Statistics"], "address": {"state": "Washington"}})),
            ])
            .await
            .unwrap();
        collection
    }

    fn window() -> DateRange {
        DateRange::parse("2003-01-01", "2007-12-31").unwrap()
    }

    #[test]
    fn test_date_range_parse_rejects_garbage() {
        assert!(DateRange::parse("2003-13-01", "2007-12-31").is_err());
        assert_eq!(
            window().condition(),
            json!({"$gte": "2003-01-01", "$lte": "2007-12-31"})
        );
    }

    #[tokio::test]
    async fn test_range_count_is_inclusive() {
        let collection = roster().await;
        assert_eq!(count_born_between(&collection, &window()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_grouped_counts_sum_to_range_count() {
        let collection = roster().await;
        let counts = counts_by_department(&collection, Some(&window())).await.unwrap();
        let total: u64 = counts.iter().map(|c| c.count).sum();
        assert_eq!(total, count_born_between(&collection, &window()).await.unwrap());
        assert_eq!(
            counts.first(),
            Some(&DepartmentCount {
                department: Some("Business".to_string()),
                count: 1
            })
        );
    }

    #[tokio::test]
    async fn test_average_gpa_by_department() {
        let collection = roster().await;
        let averages = average_gpa_by_department(&collection, &window()).await.unwrap();
        let cs = averages
            .iter()
            .find(|a| a.department.as_deref() == Some("Computer Science"))
            .unwrap();
        assert!((cs.average_gpa.unwrap() - 3.45).abs() < 1e-9);
        assert!(averages
            .iter()
            .all(|a| a.department.as_deref() != Some("Engineering")));
    }

    #[tokio::test]
    async fn test_lookups_apply_projections() {
        let collection = roster().await;
        let first = collection.find_one(&json!({}), None).await.unwrap().unwrap();

        let by_id = find_by_id(&collection, &first["_id"]).await.unwrap().unwrap();
        assert_eq!(
            by_id,
            doc(json!({"first_name": "Ada", "department": "Computer Science"}))
        );

        let by_name = find_by_first_name(&collection, "Cy").await.unwrap().unwrap();
        assert!(!by_name.contains_key("_id"));
        assert_eq!(by_name["last_name"], json!("Diaz"));

        assert!(find_by_first_name(&collection, "Nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_distinct_and_department_counts() {
        let collection = roster().await;
        assert_eq!(
            distinct_departments(&collection).await.unwrap(),
            vec!["Business", "Computer Science", "Engineering"]
        );
        assert_eq!(count_in_department(&collection, "Computer Science").await.unwrap(), 2);

        let counts = counts_by_department(&collection, None).await.unwrap();
        assert_eq!(counts.last().map(|c| c.count), Some(2));
    }

    #[tokio::test]
    async fn test_preview_limits_and_projects() {
        let collection = roster().await;
        let rows = preview(&collection, 2).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            doc(json!({"first_name": "Ada", "last_name": "King", "email": "a@x.org"}))
        );
    }

    #[tokio::test]
    async fn test_scholar_filter() {
        let collection = roster().await;
        let scholars = ScholarFilter::default().find(&collection).await.unwrap();
        // Bo is in Engineering, Di lacks the courses and the GPA
        assert_eq!(
            scholars,
            vec![doc(json!({"first_name": "Ada", "last_name": "King", "gpa": 3.9}))]
        );
    }

    #[tokio::test]
    async fn test_track_filter_excludes_states() {
        let collection = roster().await;
        let matches = TrackFilter::default().find(&collection).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["first_name"], json!("Ada"));

        let anywhere = TrackFilter {
            excluded_states: Vec::new(),
            ..Default::default()
        };
        assert_eq!(anywhere.find(&collection).await.unwrap().len(), 2);
    }
}
