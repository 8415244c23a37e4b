use crate::domain::course::{Course, CourseId};
use crate::domain::enrollment::{self, Completion, Failure};
use crate::domain::ports::{CourseStore, EnrollmentStore, PurchaseStore, UserStore};
use crate::domain::purchase::{Purchase, PurchaseId};
use crate::domain::user::{User, UserId, UserProfile};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    courses: HashMap<CourseId, Course>,
    purchases: HashMap<PurchaseId, Purchase>,
}

/// A thread-safe in-memory store for users, courses and purchases.
///
/// All three collections sit behind one `RwLock`, so an enrollment touches the
/// purchase, the user and the course under a single write guard.
/// Ideal for testing and local runs where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create(&self, user: User) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.id) {
            return Ok(false);
        }
        tables.users.insert(user.id.clone(), user);
        Ok(true)
    }

    async fn get(&self, id: &UserId) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(id).cloned())
    }

    async fn update_profile(&self, id: &UserId, profile: UserProfile) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(id) {
            Some(user) => {
                user.apply_profile(profile);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &UserId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.remove(id) else {
            return Ok(false);
        };
        for course_id in &user.enrolled_courses {
            if let Some(course) = tables.courses.get_mut(course_id) {
                course.dismiss(id);
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl CourseStore for InMemoryStore {
    async fn insert(&self, course: Course) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.courses.contains_key(&course.id) {
            return Ok(false);
        }
        tables.courses.insert(course.id.clone(), course);
        Ok(true)
    }

    async fn get(&self, id: &CourseId) -> Result<Option<Course>> {
        let tables = self.tables.read().await;
        Ok(tables.courses.get(id).cloned())
    }
}

#[async_trait]
impl PurchaseStore for InMemoryStore {
    async fn insert(&self, purchase: Purchase) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.purchases.contains_key(&purchase.id) {
            return Ok(false);
        }
        tables.purchases.insert(purchase.id.clone(), purchase);
        Ok(true)
    }

    async fn get(&self, id: &PurchaseId) -> Result<Option<Purchase>> {
        let tables = self.tables.read().await;
        Ok(tables.purchases.get(id).cloned())
    }
}

#[async_trait]
impl EnrollmentStore for InMemoryStore {
    async fn complete_purchase(&self, id: &PurchaseId) -> Result<Completion> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        let Some(purchase) = tables.purchases.get_mut(id) else {
            return Ok(Completion::PurchaseMissing);
        };
        let user = tables.users.get_mut(&purchase.user_id);
        let course = tables.courses.get_mut(&purchase.course_id);

        Ok(enrollment::complete(purchase, user, course))
    }

    async fn fail_purchase(&self, id: &PurchaseId) -> Result<Failure> {
        let mut tables = self.tables.write().await;
        match tables.purchases.get_mut(id) {
            Some(purchase) => Ok(enrollment::fail(purchase)),
            None => Ok(Failure::PurchaseMissing),
        }
    }
}
