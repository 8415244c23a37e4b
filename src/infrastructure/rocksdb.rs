use crate::domain::course::{Course, CourseId};
use crate::domain::enrollment::{self, Completion, Failure};
use crate::domain::ports::{CourseStore, EnrollmentStore, PurchaseStore, UserStore};
use crate::domain::purchase::{Purchase, PurchaseId};
use crate::domain::user::{User, UserId, UserProfile};
use crate::error::{LmsError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for user records.
pub const CF_USERS: &str = "users";
/// Column Family for course records.
pub const CF_COURSES: &str = "courses";
/// Column Family for purchase records.
pub const CF_PURCHASES: &str = "purchases";

/// A persistent store implementation using RocksDB.
///
/// Users, courses and purchases live in separate Column Families as JSON values
/// keyed by their id. Every read-modify-write goes through `write_lock` and is
/// committed as one `WriteBatch`, which makes enrollment a check-and-set: two
/// copies of the same event cannot both observe the pre-enrollment state.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_USERS, CF_COURSES, CF_PURCHASES]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| LmsError::Persistence(format!("{name} column family not found")))
    }

    fn read<T: DeserializeOwned>(&self, cf_name: &str, key: &str) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key.as_bytes())? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes).map_err(|e| {
                    LmsError::Persistence(format!("Deserialization error in {cf_name}: {e}"))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn stage<T: Serialize>(
        &self,
        batch: &mut WriteBatch,
        cf_name: &str,
        key: &str,
        value: &T,
    ) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value)
            .map_err(|e| LmsError::Persistence(format!("Serialization error in {cf_name}: {e}")))?;
        batch.put_cf(cf, key.as_bytes(), bytes);
        Ok(())
    }

    fn put<T: Serialize>(&self, cf_name: &str, key: &str, value: &T) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.stage(&mut batch, cf_name, key, value)?;
        self.db.write(batch)?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for RocksDBStore {
    async fn create(&self, user: User) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        if self.read::<User>(CF_USERS, user.id.as_str())?.is_some() {
            return Ok(false);
        }
        self.put(CF_USERS, user.id.as_str(), &user)?;
        Ok(true)
    }

    async fn get(&self, id: &UserId) -> Result<Option<User>> {
        self.read(CF_USERS, id.as_str())
    }

    async fn update_profile(&self, id: &UserId, profile: UserProfile) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let Some(mut user) = self.read::<User>(CF_USERS, id.as_str())? else {
            return Ok(false);
        };
        user.apply_profile(profile);
        self.put(CF_USERS, id.as_str(), &user)?;
        Ok(true)
    }

    async fn delete(&self, id: &UserId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let Some(user) = self.read::<User>(CF_USERS, id.as_str())? else {
            return Ok(false);
        };

        let mut batch = WriteBatch::default();
        for course_id in &user.enrolled_courses {
            if let Some(mut course) = self.read::<Course>(CF_COURSES, course_id.as_str())?
                && course.dismiss(id)
            {
                self.stage(&mut batch, CF_COURSES, course_id.as_str(), &course)?;
            }
        }
        batch.delete_cf(self.cf(CF_USERS)?, id.as_str().as_bytes());
        self.db.write(batch)?;
        Ok(true)
    }
}

#[async_trait]
impl CourseStore for RocksDBStore {
    async fn insert(&self, course: Course) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        if self.read::<Course>(CF_COURSES, course.id.as_str())?.is_some() {
            return Ok(false);
        }
        self.put(CF_COURSES, course.id.as_str(), &course)?;
        Ok(true)
    }

    async fn get(&self, id: &CourseId) -> Result<Option<Course>> {
        self.read(CF_COURSES, id.as_str())
    }
}

#[async_trait]
impl PurchaseStore for RocksDBStore {
    async fn insert(&self, purchase: Purchase) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        if self.read::<Purchase>(CF_PURCHASES, purchase.id.as_str())?.is_some() {
            return Ok(false);
        }
        self.put(CF_PURCHASES, purchase.id.as_str(), &purchase)?;
        Ok(true)
    }

    async fn get(&self, id: &PurchaseId) -> Result<Option<Purchase>> {
        self.read(CF_PURCHASES, id.as_str())
    }
}

#[async_trait]
impl EnrollmentStore for RocksDBStore {
    async fn complete_purchase(&self, id: &PurchaseId) -> Result<Completion> {
        let _guard = self.write_lock.lock().await;
        let Some(mut purchase) = self.read::<Purchase>(CF_PURCHASES, id.as_str())? else {
            return Ok(Completion::PurchaseMissing);
        };
        let mut user: Option<User> = self.read(CF_USERS, purchase.user_id.as_str())?;
        let mut course: Option<Course> = self.read(CF_COURSES, purchase.course_id.as_str())?;

        let outcome = enrollment::complete(&mut purchase, user.as_mut(), course.as_mut());

        if outcome.is_write()
            && let (Some(user), Some(course)) = (user, course)
        {
            let mut batch = WriteBatch::default();
            self.stage(&mut batch, CF_USERS, user.id.as_str(), &user)?;
            self.stage(&mut batch, CF_COURSES, course.id.as_str(), &course)?;
            self.stage(&mut batch, CF_PURCHASES, purchase.id.as_str(), &purchase)?;
            self.db.write(batch)?;
        }

        Ok(outcome)
    }

    async fn fail_purchase(&self, id: &PurchaseId) -> Result<Failure> {
        let _guard = self.write_lock.lock().await;
        let Some(mut purchase) = self.read::<Purchase>(CF_PURCHASES, id.as_str())? else {
            return Ok(Failure::PurchaseMissing);
        };

        let outcome = enrollment::fail(&mut purchase);
        if outcome.is_write() {
            self.put(CF_PURCHASES, id.as_str(), &purchase)?;
        }
        Ok(outcome)
    }
}
