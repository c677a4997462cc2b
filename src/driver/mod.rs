//! The query/transform walkthrough.
//!
//! Every step is available as a standalone operation; [`run_walkthrough`]
//! runs them in a fixed order against one collection and collects their
//! outcomes in a [`WalkthroughReport`].

mod email;
mod queries;
mod schema;
mod updates;

use anyhow::{Context, Result};
use log::info;
use serde_json::{json, Value};

use crate::config::{
    Config, BIRTH_WINDOW_END, BIRTH_WINDOW_START, PREVIEW_LIMIT, REASSIGNED_DEPARTMENT,
    RENAMED_DEPARTMENT,
};
use crate::export::{export_json, import_json, ExportOptions};
use crate::generator::{add_documents, GeneratorConfig, StudentGenerator};
use crate::store::{Client, Document};

pub use email::{derive_email, recompute_emails};
pub use queries::{
    average_gpa_by_department, count_born_between, count_in_department, counts_by_department,
    distinct_departments, find_by_first_name, find_by_id, preview, DateRange, DepartmentAverage,
    DepartmentCount, ScholarFilter, TrackFilter,
};
pub use schema::{sample_schema, FieldInfo};
pub use updates::{rename_department, rename_department_via_unset, rename_with, reassign_department};

/// Outcomes of a walkthrough run.
#[derive(Debug, Clone)]
pub struct WalkthroughReport {
    /// Documents generated and inserted at startup (0 if not seeded)
    pub inserted: usize,
    pub schema: Vec<FieldInfo>,
    /// Students born within the birth window
    pub born_in_window: u64,
    pub average_gpa: Vec<DepartmentAverage>,
    /// Whether a student with the spotlight name was moved to "Finance"
    pub reassigned: bool,
    /// Departments after the reassignment, before the rename
    pub departments: Vec<String>,
    /// Documents moved to "Financial Services"
    pub renamed: u64,
    pub business_count: u64,
    pub department_counts: Vec<DepartmentCount>,
    pub exported: usize,
    pub imported: usize,
    pub preview: Vec<Document>,
    pub emails_recomputed: usize,
    pub scholars: Vec<Document>,
    pub track_matches: Vec<Document>,
}

fn describe(doc: Option<&Document>, field: &str) -> String {
    doc.and_then(|d| d.get(field))
        .and_then(Value::as_str)
        .unwrap_or("Not found")
        .to_string()
}

/// Builds the record generator, deterministic when `rng_seed` is given.
pub fn build_generator(rng_seed: Option<u64>) -> StudentGenerator {
    match rng_seed {
        Some(seed) => StudentGenerator::seeded(seed, GeneratorConfig::default()),
        None => StudentGenerator::new(GeneratorConfig::default()),
    }
}

/// Runs the full walkthrough against the configured collection.
///
/// The collection is seeded with `config.batch_size` generated records when
/// `config.seed` is set or the collection is empty.
///
/// # Errors
///
/// Stops at the first failing step; earlier steps are not rolled back.
///
/// # Example
///
/// ```no_run
/// use student_records::{run_walkthrough, Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config {
///     connection_string: "sqlite::memory:".to_string(),
///     rng_seed: Some(7),
///     ..Default::default()
/// };
/// let report = run_walkthrough(config).await?;
/// println!("{} students born in the window", report.born_in_window);
/// # Ok(())
/// # }
/// ```
pub async fn run_walkthrough(config: Config) -> Result<WalkthroughReport> {
    let client = Client::connect(&config.connection_string)
        .await
        .context("Failed to open document store")?;
    let collection = client.database(&config.database).collection(&config.collection);
    let window = DateRange::parse(BIRTH_WINDOW_START, BIRTH_WINDOW_END)
        .context("Invalid birth window")?;

    let existing = collection.count_documents(&json!({})).await?;
    let inserted = if config.seed || existing == 0 {
        let mut generator = build_generator(config.rng_seed);
        let inserted = add_documents(&collection, &mut generator, config.batch_size)
            .await
            .context("Failed to seed collection")?;
        println!("Inserted {} documents", inserted);
        inserted
    } else {
        info!("Using {} existing documents in {}", existing, collection.namespace());
        0
    };

    let schema = sample_schema(&collection).await.context("Failed to sample schema")?;
    for field in &schema {
        println!("  {}: {}", field.name, field.type_name);
    }

    let born_in_window = count_born_between(&collection, &window).await?;
    println!(
        "Students born between {} and {}: {}",
        window.start, window.end, born_in_window
    );

    let average_gpa = average_gpa_by_department(&collection, &window).await?;
    for avg in &average_gpa {
        println!(
            "  {}: average GPA {:.2}",
            avg.department.as_deref().unwrap_or("(none)"),
            avg.average_gpa.unwrap_or_default()
        );
    }

    let first_id = collection
        .find_one(&json!({}), Some(json!({"_id": 1})))
        .await?
        .and_then(|doc| doc.get("_id").cloned());
    if let Some(id) = first_id {
        let record = find_by_id(&collection, &id).await?;
        println!(
            "Department of {} in record: {}",
            describe(record.as_ref(), "first_name"),
            describe(record.as_ref(), "department")
        );
    }

    let reassignment =
        reassign_department(&collection, &config.spotlight_name, REASSIGNED_DEPARTMENT).await?;
    let record = find_by_first_name(&collection, &config.spotlight_name).await?;
    println!(
        "New department of {} in record: {}",
        config.spotlight_name,
        describe(record.as_ref(), "department")
    );

    let departments = distinct_departments(&collection).await?;
    println!("Unique departments in the collection: {:?}", departments);

    let renamed = rename_with(
        &collection,
        config.rename_strategy,
        REASSIGNED_DEPARTMENT,
        RENAMED_DEPARTMENT,
    )
    .await
    .context("Failed to rename department")?
    .modified_count;

    let business_count = count_in_department(&collection, "Business").await?;
    println!("Students in Business: {}", business_count);

    let department_counts = counts_by_department(&collection, None).await?;
    for count in &department_counts {
        println!(
            "  {}: {}",
            count.department.as_deref().unwrap_or("(none)"),
            count.count
        );
    }

    let exported = export_json(
        &collection,
        &ExportOptions {
            output: config.export_path.clone(),
            truncate: true,
        },
    )
    .await
    .context("Failed to export collection")?;
    let imported = import_json(&collection, &config.export_path)
        .await
        .context("Failed to import collection")?;
    println!(
        "Exported {} and re-imported {} documents via {}",
        exported,
        imported,
        config.export_path.display()
    );

    let preview_rows = preview(&collection, PREVIEW_LIMIT).await?;
    let emails_recomputed = recompute_emails(&collection, &config.email_domain)
        .await
        .context("Failed to recompute emails")?;
    for row in preview(&collection, PREVIEW_LIMIT).await? {
        println!(
            "  {} {} <{}>",
            describe(Some(&row), "first_name"),
            describe(Some(&row), "last_name"),
            describe(Some(&row), "email")
        );
    }

    let scholars = ScholarFilter::default().find(&collection).await?;
    println!("Scholar filter matches: {}", scholars.len());
    let track_matches = TrackFilter::default().find(&collection).await?;
    println!("Track filter matches: {}", track_matches.len());

    Ok(WalkthroughReport {
        inserted,
        schema,
        born_in_window,
        average_gpa,
        reassigned: reassignment.modified_count > 0,
        departments,
        renamed,
        business_count,
        department_counts,
        exported,
        imported,
        preview: preview_rows,
        emails_recomputed,
        scholars,
        track_matches,
    })
}
