use super::course::{Course, CourseId};
use super::user::UserId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal purchase id, embedded in the checkout session metadata at creation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseId(pub String);

impl PurchaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl PurchaseStatus {
    pub fn is_terminal(self) -> bool {
        self != PurchaseStatus::Pending
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Completed => "completed",
            PurchaseStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result of asking a purchase to move into a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// pending -> requested state.
    Applied,
    /// Already in the requested state (replayed event).
    Unchanged,
    /// Already in the other terminal state; left as is.
    Rejected(PurchaseStatus),
}

/// One checkout attempt and its lifecycle status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub amount: Decimal,
    #[serde(default)]
    pub status: PurchaseStatus,
}

impl Purchase {
    /// A pending purchase recording the course's discounted price.
    pub fn pending(id: PurchaseId, user_id: UserId, course: &Course) -> Self {
        Self {
            id,
            user_id,
            course_id: course.id.clone(),
            amount: course.effective_price(),
            status: PurchaseStatus::Pending,
        }
    }

    pub fn complete(&mut self) -> Transition {
        self.transition(PurchaseStatus::Completed)
    }

    pub fn fail(&mut self) -> Transition {
        self.transition(PurchaseStatus::Failed)
    }

    fn transition(&mut self, to: PurchaseStatus) -> Transition {
        match self.status {
            PurchaseStatus::Pending => {
                self.status = to;
                Transition::Applied
            }
            current if current == to => Transition::Unchanged,
            current => Transition::Rejected(current),
        }
    }
}
