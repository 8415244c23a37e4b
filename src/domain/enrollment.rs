//! The effect of a purchase reaching a terminal state.
//!
//! These functions only touch in-memory records. Stores call them while holding
//! their write guard and persist every record they return in one atomic write,
//! so the user side and the course side of an enrollment never diverge.

use super::course::{Course, CourseId};
use super::purchase::{Purchase, PurchaseStatus, Transition};
use super::user::{User, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Purchase is completed and both sides reference each other.
    /// `newly_enrolled` is false when a replayed event found everything in place.
    Enrolled { newly_enrolled: bool },
    /// The purchase had already failed; nothing was changed.
    Rejected(PurchaseStatus),
    PurchaseMissing,
    UserMissing(UserId),
    CourseMissing(CourseId),
}

impl Completion {
    /// Whether the caller must persist the records passed to [`complete`].
    pub fn is_write(&self) -> bool {
        matches!(self, Completion::Enrolled { newly_enrolled: true })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Marked(Transition),
    PurchaseMissing,
}

impl Failure {
    pub fn is_write(&self) -> bool {
        matches!(self, Failure::Marked(Transition::Applied))
    }
}

/// Completes the purchase and links user and course, or changes nothing.
pub fn complete(purchase: &mut Purchase, user: Option<&mut User>, course: Option<&mut Course>) -> Completion {
    if purchase.status == PurchaseStatus::Failed {
        return Completion::Rejected(PurchaseStatus::Failed);
    }
    let Some(user) = user else {
        return Completion::UserMissing(purchase.user_id.clone());
    };
    let Some(course) = course else {
        return Completion::CourseMissing(purchase.course_id.clone());
    };

    let transition = purchase.complete();
    let user_changed = user.enroll(&course.id);
    let course_changed = course.admit(&user.id);

    Completion::Enrolled {
        newly_enrolled: transition == Transition::Applied || user_changed || course_changed,
    }
}

/// Marks the purchase failed. Enrollment is never touched.
pub fn fail(purchase: &mut Purchase) -> Failure {
    Failure::Marked(purchase.fail())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::purchase::PurchaseId;
    use crate::domain::user::UserProfile;
    use rust_decimal_macros::dec;

    fn records() -> (Purchase, User, Course) {
        let course = Course::new(CourseId::new("c1"), "Rust", dec!(20.00), 0).unwrap();
        let user = User::new(
            UserId::new("u1"),
            UserProfile {
                email: "u1@example.com".to_string(),
                name: "U One".to_string(),
                image_url: None,
            },
        );
        let purchase = Purchase::pending(PurchaseId::new("p1"), user.id.clone(), &course);
        (purchase, user, course)
    }

    #[test]
    fn test_complete_links_both_sides() {
        let (mut purchase, mut user, mut course) = records();

        let outcome = complete(&mut purchase, Some(&mut user), Some(&mut course));

        assert_eq!(outcome, Completion::Enrolled { newly_enrolled: true });
        assert_eq!(purchase.status, PurchaseStatus::Completed);
        assert!(user.is_enrolled(&course.id));
        assert!(course.has_student(&user.id));
    }

    #[test]
    fn test_complete_twice_is_a_no_op() {
        let (mut purchase, mut user, mut course) = records();
        complete(&mut purchase, Some(&mut user), Some(&mut course));

        let outcome = complete(&mut purchase, Some(&mut user), Some(&mut course));

        assert_eq!(outcome, Completion::Enrolled { newly_enrolled: false });
        assert_eq!(user.enrolled_courses.len(), 1);
        assert_eq!(course.enrolled_students.len(), 1);
    }

    #[test]
    fn test_complete_repairs_one_sided_link() {
        let (mut purchase, mut user, mut course) = records();
        purchase.complete();
        user.enroll(&course.id);

        let outcome = complete(&mut purchase, Some(&mut user), Some(&mut course));

        assert_eq!(outcome, Completion::Enrolled { newly_enrolled: true });
        assert!(course.has_student(&user.id));
    }

    #[test]
    fn test_complete_with_missing_side_changes_nothing() {
        let (mut purchase, mut user, _) = records();

        let outcome = complete(&mut purchase, Some(&mut user), None);

        assert_eq!(outcome, Completion::CourseMissing(CourseId::new("c1")));
        assert!(!outcome.is_write());
        assert_eq!(purchase.status, PurchaseStatus::Pending);
        assert!(user.enrolled_courses.is_empty());

        let outcome = complete(&mut purchase, None, None);
        assert_eq!(outcome, Completion::UserMissing(UserId::new("u1")));
    }

    #[test]
    fn test_failed_purchase_is_not_completed() {
        let (mut purchase, mut user, mut course) = records();
        assert_eq!(fail(&mut purchase), Failure::Marked(Transition::Applied));

        let outcome = complete(&mut purchase, Some(&mut user), Some(&mut course));

        assert_eq!(outcome, Completion::Rejected(PurchaseStatus::Failed));
        assert!(user.enrolled_courses.is_empty());
        assert!(course.enrolled_students.is_empty());
    }

    #[test]
    fn test_fail_after_completion_is_rejected() {
        let (mut purchase, mut user, mut course) = records();
        complete(&mut purchase, Some(&mut user), Some(&mut course));

        assert_eq!(
            fail(&mut purchase),
            Failure::Marked(Transition::Rejected(PurchaseStatus::Completed))
        );
        assert_eq!(purchase.status, PurchaseStatus::Completed);
    }
}
