//! Random student record generation.

use std::collections::HashSet;

use chrono::{Days, Months, NaiveDate, Utc};
use fake::faker::address::en::{BuildingNumber, CityName, StateName, StreetName, ZipCode};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use strum::IntoEnumIterator;

use crate::config::{
    ENROLLMENT_WINDOW_YEARS, MAX_COURSES, MAX_GPA, MAX_STUDENT_AGE, MIN_COURSES, MIN_GPA,
    MIN_STUDENT_AGE, STUDENT_ID_DIGITS,
};
use crate::error_handling::GeneratorError;
use crate::models::{Address, Department, GradeLevel, Student, COURSES};

/// Parameters of the generated population.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// `student_id` values are drawn from `0..10^id_digits`.
    pub id_digits: u32,
    /// Ages and enrollment dates are computed relative to this date.
    pub reference_date: NaiveDate,
    pub min_age: u32,
    pub max_age: u32,
    /// Students enrolled at most this many years before the reference date.
    pub enrollment_years: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            id_digits: STUDENT_ID_DIGITS,
            reference_date: Utc::now().date_naive(),
            min_age: MIN_STUDENT_AGE,
            max_age: MAX_STUDENT_AGE,
            enrollment_years: ENROLLMENT_WINDOW_YEARS,
        }
    }
}

impl GeneratorConfig {
    /// Number of distinct identifiers available.
    pub fn id_capacity(&self) -> u64 {
        10u64.checked_pow(self.id_digits).unwrap_or(u64::MAX)
    }
}

/// Produces schema-consistent random students.
///
/// Identifiers are unique across everything one generator produces; once
/// `10^id_digits` ids have been handed out every further request fails.
pub struct StudentGenerator<R: Rng = StdRng> {
    rng: R,
    config: GeneratorConfig,
    issued_ids: HashSet<u64>,
    departments: Vec<Department>,
    grade_levels: Vec<GradeLevel>,
}

impl StudentGenerator<StdRng> {
    /// Generator seeded from the operating system.
    pub fn new(config: GeneratorConfig) -> Self {
        Self::with_rng(StdRng::from_os_rng(), config)
    }

    /// Deterministic generator: the same seed and config yield the same records.
    pub fn seeded(seed: u64, config: GeneratorConfig) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), config)
    }
}

impl<R: Rng> StudentGenerator<R> {
    pub fn with_rng(rng: R, config: GeneratorConfig) -> Self {
        Self {
            rng,
            config,
            issued_ids: HashSet::new(),
            departments: Department::iter().collect(),
            grade_levels: GradeLevel::iter().collect(),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// How many identifiers this generator has handed out.
    pub fn issued(&self) -> usize {
        self.issued_ids.len()
    }

    fn ensure_capacity(&self, requested: usize) -> Result<(), GeneratorError> {
        let capacity = self.config.id_capacity();
        let issued = self.issued_ids.len();
        let needed = (issued as u64).saturating_add(requested as u64);
        if needed > capacity {
            return Err(GeneratorError::IdSpaceExhausted {
                requested,
                issued,
                capacity,
            });
        }
        Ok(())
    }

    fn unique_id(&mut self) -> u64 {
        let capacity = self.config.id_capacity();
        loop {
            let id = self.rng.random_range(0..capacity);
            if self.issued_ids.insert(id) {
                return id;
            }
        }
    }

    /// A random date in `[start, end]`.
    fn date_between(&mut self, start: NaiveDate, end: NaiveDate) -> NaiveDate {
        let span = (end - start).num_days().max(0) as u64;
        let offset = self.rng.random_range(0..=span);
        start.checked_add_days(Days::new(offset)).unwrap_or(end)
    }

    /// Birth date giving an age in `[min_age, max_age]` on the reference date.
    fn date_of_birth(&mut self) -> NaiveDate {
        let reference = self.config.reference_date;
        let latest = reference
            .checked_sub_months(Months::new(12 * self.config.min_age))
            .unwrap_or(NaiveDate::MIN);
        let earliest = reference
            .checked_sub_months(Months::new(12 * (self.config.max_age + 1)))
            .and_then(|d| d.checked_add_days(Days::new(1)))
            .unwrap_or(NaiveDate::MIN);
        self.date_between(earliest, latest)
    }

    fn enrolled_date(&mut self) -> NaiveDate {
        let reference = self.config.reference_date;
        let earliest = reference
            .checked_sub_months(Months::new(12 * self.config.enrollment_years))
            .unwrap_or(NaiveDate::MIN);
        self.date_between(earliest, reference)
    }

    fn address(&mut self) -> Address {
        let number: String = BuildingNumber().fake_with_rng(&mut self.rng);
        let street: String = StreetName().fake_with_rng(&mut self.rng);
        Address {
            street: format!("{number} {street}"),
            city: CityName().fake_with_rng(&mut self.rng),
            state: StateName().fake_with_rng(&mut self.rng),
            zip_code: ZipCode().fake_with_rng(&mut self.rng),
        }
    }

    fn courses(&mut self) -> Vec<String> {
        let count = self.rng.random_range(MIN_COURSES..=MAX_COURSES);
        COURSES
            .choose_multiple(&mut self.rng, count)
            .map(|course| course.to_string())
            .collect()
    }

    /// Produces the next student.
    ///
    /// # Errors
    ///
    /// `GeneratorError::IdSpaceExhausted` once every identifier is taken.
    pub fn next_student(&mut self) -> Result<Student, GeneratorError> {
        self.ensure_capacity(1)?;
        Ok(self.build_student())
    }

    /// Produces `n` students, or none if fewer than `n` identifiers remain.
    pub fn generate(&mut self, n: usize) -> Result<Vec<Student>, GeneratorError> {
        self.ensure_capacity(n)?;
        Ok((0..n).map(|_| self.build_student()).collect())
    }

    fn build_student(&mut self) -> Student {
        let student_id = self.unique_id();
        let department = self.departments[self.rng.random_range(0..self.departments.len())];
        let grade_level = self.grade_levels[self.rng.random_range(0..self.grade_levels.len())];
        let gpa = (self.rng.random_range(MIN_GPA..=MAX_GPA) * 100.0).round() / 100.0;

        Student {
            student_id,
            first_name: FirstName().fake_with_rng(&mut self.rng),
            last_name: LastName().fake_with_rng(&mut self.rng),
            email: SafeEmail().fake_with_rng(&mut self.rng),
            department: department.to_string(),
            grade_level,
            gpa,
            date_of_birth: self.date_of_birth(),
            address: self.address(),
            courses: self.courses(),
            enrolled_date: self.enrolled_date(),
            is_active: self.rng.random(),
            phone_number: PhoneNumber().fake_with_rng(&mut self.rng),
        }
    }
}
