//! Student record types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::EnumIter as EnumIterMacro;

use crate::store::Document;

/// Departments a generated student can be enrolled in.
///
/// Updates may later move students into departments outside this set
/// (e.g. "Finance"), so stored documents are not limited to these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "Computer Science")]
    ComputerScience,
    Engineering,
    Mathematics,
    Physics,
    Business,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro, Serialize, Deserialize)]
pub enum GradeLevel {
    Freshman,
    Sophomore,
    Junior,
    Senior,
}

/// Course catalog students pick their courses from.
pub const COURSES: [&str; 8] = [
    "Calculus",
    "Physics",
    "Programming",
    "Database Systems",
    "Data Structures",
    "Statistics",
    "Machine Learning",
    "Web Development",
];

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::ComputerScience => "Computer Science",
            Department::Engineering => "Engineering",
            Department::Mathematics => "Mathematics",
            Department::Physics => "Physics",
            Department::Business => "Business",
        }
    }
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GradeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            GradeLevel::Freshman => "Freshman",
            GradeLevel::Sophomore => "Sophomore",
            GradeLevel::Junior => "Junior",
            GradeLevel::Senior => "Senior",
        }
    }
}

impl std::fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

/// A synthetic student record.
///
/// Field order here is the field order of the stored document. The
/// department is kept as free text since renames can move it outside
/// [`Department`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: String,
    pub grade_level: GradeLevel,
    pub gpa: f64,
    pub date_of_birth: NaiveDate,
    pub address: Address,
    pub courses: Vec<String>,
    pub enrolled_date: NaiveDate,
    pub is_active: bool,
    pub phone_number: String,
}

impl Student {
    /// Converts the record into a store document (without `_id`).
    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(doc) => Ok(doc),
            // Structs always serialize to objects
            other => Err(serde::ser::Error::custom(format!(
                "expected an object, got {other}"
            ))),
        }
    }

    /// Reads a record back from a stored document. `_id` and any fields
    /// added by updates are ignored.
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(doc.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::IntoEnumIterator;

    fn sample_student() -> Student {
        Student {
            student_id: 12_345_678,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            department: Department::Mathematics.to_string(),
            grade_level: GradeLevel::Junior,
            gpa: 3.92,
            date_of_birth: NaiveDate::from_ymd_opt(2004, 12, 10).unwrap(),
            address: Address {
                street: "12 St James's Square".to_string(),
                city: "London".to_string(),
                state: "NY".to_string(),
                zip_code: "10001".to_string(),
            },
            courses: vec!["Calculus".to_string(), "Programming".to_string()],
            enrolled_date: NaiveDate::from_ymd_opt(2023, 9, 1).unwrap(),
            is_active: true,
            phone_number: "555-0100".to_string(),
        }
    }

    #[test]
    fn test_department_names_match_serde() {
        for department in Department::iter() {
            assert_eq!(
                serde_json::to_value(department).unwrap(),
                json!(department.as_str())
            );
        }
        assert_eq!(Department::iter().count(), 5);
    }

    #[test]
    fn test_grade_level_display() {
        let names: Vec<String> = GradeLevel::iter().map(|g| g.to_string()).collect();
        assert_eq!(names, vec!["Freshman", "Sophomore", "Junior", "Senior"]);
    }

    #[test]
    fn test_document_field_order_and_dates() {
        let doc = sample_student().to_document().unwrap();
        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "student_id",
                "first_name",
                "last_name",
                "email",
                "department",
                "grade_level",
                "gpa",
                "date_of_birth",
                "address",
                "courses",
                "enrolled_date",
                "is_active",
                "phone_number"
            ]
        );
        assert_eq!(doc["date_of_birth"], json!("2004-12-10"));
        assert_eq!(doc["address"]["zip_code"], json!("10001"));
    }

    #[test]
    fn test_from_document_ignores_id() {
        let student = sample_student();
        let mut doc = student.to_document().unwrap();
        doc.insert("_id".to_string(), json!({"$oid": "65a1b2c3d4e5f60718293a4b"}));
        assert_eq!(Student::from_document(&doc).unwrap(), student);
    }
}
