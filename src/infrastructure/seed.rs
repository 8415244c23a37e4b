use crate::domain::course::Course;
use crate::domain::ports::{CourseStore, PurchaseStore, UserStore};
use crate::domain::purchase::Purchase;
use crate::domain::user::User;
use crate::error::Result;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Fixture records loaded into a store at startup.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub purchases: Vec<Purchase>,
}

impl Seed {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Inserts every record that is not already stored.
    ///
    /// Existing users, courses and purchases are left untouched, so re-seeding a
    /// persistent store keeps completed purchases and both sides of enrollment.
    pub async fn apply<S>(self, store: &S) -> Result<()>
    where
        S: UserStore + CourseStore + PurchaseStore,
    {
        let total = self.users.len() + self.courses.len() + self.purchases.len();
        let (mut users, mut courses, mut purchases) = (0, 0, 0);

        for user in self.users {
            users += usize::from(UserStore::create(store, user).await?);
        }
        for course in self.courses {
            courses += usize::from(CourseStore::insert(store, course).await?);
        }
        for purchase in self.purchases {
            purchases += usize::from(PurchaseStore::insert(store, purchase).await?);
        }

        let skipped = total - users - courses - purchases;
        info!(users, courses, purchases, skipped, "Seeded store");
        Ok(())
    }
}
