use super::user::UserId;
use crate::error::LmsError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub String);

impl CourseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lecture {
    pub id: String,
    pub title: String,
    pub duration_minutes: u32,
    pub url: String,
    #[serde(default)]
    pub preview_free: bool,
}

/// An ordered group of lectures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub lectures: Vec<Lecture>,
}

impl Chapter {
    pub fn duration_minutes(&self) -> u32 {
        self.lectures.iter().map(|l| l.duration_minutes).sum()
    }
}

/// A course and the set of students enrolled in it.
///
/// Deserialization runs the same checks as [`Course::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CourseRecord")]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub price: Decimal,
    /// Discount in whole percent, `0..=100`.
    pub discount: u8,
    #[serde(default)]
    pub content: Vec<Chapter>,
    #[serde(default)]
    pub enrolled_students: BTreeSet<UserId>,
}

#[derive(Deserialize)]
struct CourseRecord {
    id: CourseId,
    title: String,
    price: Decimal,
    discount: u8,
    #[serde(default)]
    content: Vec<Chapter>,
    #[serde(default)]
    enrolled_students: BTreeSet<UserId>,
}

impl TryFrom<CourseRecord> for Course {
    type Error = LmsError;

    fn try_from(record: CourseRecord) -> Result<Self, Self::Error> {
        let mut course = Course::new(record.id, record.title, record.price, record.discount)?
            .with_content(record.content);
        course.enrolled_students = record.enrolled_students;
        Ok(course)
    }
}

impl Course {
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        price: Decimal,
        discount: u8,
    ) -> Result<Self, LmsError> {
        if price < Decimal::ZERO {
            return Err(LmsError::ValidationError(
                "Course price must not be negative".to_string(),
            ));
        }
        if discount > 100 {
            return Err(LmsError::ValidationError(
                "Discount must be between 0 and 100".to_string(),
            ));
        }
        Ok(Self {
            id,
            title: title.into(),
            price,
            discount,
            content: Vec::new(),
            enrolled_students: BTreeSet::new(),
        })
    }

    pub fn with_content(mut self, content: Vec<Chapter>) -> Self {
        self.content = content;
        self
    }

    /// Price after discount, rounded half-up to cents.
    pub fn effective_price(&self) -> Decimal {
        let reduction = self.price * Decimal::from(self.discount) / Decimal::ONE_HUNDRED;
        (self.price - reduction).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    pub fn lecture_count(&self) -> usize {
        self.content.iter().map(|c| c.lectures.len()).sum()
    }

    pub fn total_duration_minutes(&self) -> u32 {
        self.content.iter().map(Chapter::duration_minutes).sum()
    }

    /// Adds the student if absent. Returns `true` when the set changed.
    pub fn admit(&mut self, student: &UserId) -> bool {
        self.enrolled_students.insert(student.clone())
    }

    /// Drops the student if present. Returns `true` when the set changed.
    pub fn dismiss(&mut self, student: &UserId) -> bool {
        self.enrolled_students.remove(student)
    }

    pub fn has_student(&self, student: &UserId) -> bool {
        self.enrolled_students.contains(student)
    }
}
