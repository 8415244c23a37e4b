use super::course::{Course, CourseId};
use super::enrollment::{Completion, Failure};
use super::purchase::{Purchase, PurchaseId};
use super::user::{User, UserId, UserProfile};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts the user unless one with the same id exists. Returns `true` if inserted.
    async fn create(&self, user: User) -> Result<bool>;
    async fn get(&self, id: &UserId) -> Result<Option<User>>;
    /// Returns `false` when no such user exists.
    async fn update_profile(&self, id: &UserId, profile: UserProfile) -> Result<bool>;
    /// Removes the user and their id from every course they were enrolled in.
    async fn delete(&self, id: &UserId) -> Result<bool>;
}

#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Inserts the course unless one with the same id exists. Returns `true` if inserted.
    async fn insert(&self, course: Course) -> Result<bool>;
    async fn get(&self, id: &CourseId) -> Result<Option<Course>>;
}

#[async_trait]
pub trait PurchaseStore: Send + Sync {
    /// Inserts the purchase unless one with the same id exists. An existing
    /// purchase keeps its status. Returns `true` if inserted.
    async fn insert(&self, purchase: Purchase) -> Result<bool>;
    async fn get(&self, id: &PurchaseId) -> Result<Option<Purchase>>;
}

/// Terminal purchase transitions, each applied as a single conditional write.
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    async fn complete_purchase(&self, id: &PurchaseId) -> Result<Completion>;
    async fn fail_purchase(&self, id: &PurchaseId) -> Result<Failure>;
}

/// Resolves a payment intent to the purchase recorded in its checkout session metadata.
#[async_trait]
pub trait CheckoutSessions: Send + Sync {
    async fn purchase_for_payment_intent(&self, payment_intent: &str) -> Result<Option<PurchaseId>>;
}

pub type UserStoreRef = Arc<dyn UserStore>;
pub type CourseStoreRef = Arc<dyn CourseStore>;
pub type PurchaseStoreRef = Arc<dyn PurchaseStore>;
pub type EnrollmentStoreRef = Arc<dyn EnrollmentStore>;
pub type CheckoutSessionsRef = Arc<dyn CheckoutSessions>;

/// A backend implementing every persistence port, cloned into each handle.
pub trait Repository:
    UserStore + CourseStore + PurchaseStore + EnrollmentStore + Clone + 'static
{
}

impl<T> Repository for T where
    T: UserStore + CourseStore + PurchaseStore + EnrollmentStore + Clone + 'static
{
}
