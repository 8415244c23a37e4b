use super::course::CourseId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identifier issued by the identity provider (e.g. `user_34gt...`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fields mirrored from the identity provider on every create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub name: String,
    pub image_url: Option<String>,
}

impl UserProfile {
    /// Builds a profile, deriving the display name from whatever name fields
    /// the provider supplied.
    pub fn from_provider(
        id: &UserId,
        email: String,
        first_name: Option<&str>,
        last_name: Option<&str>,
        image_url: Option<String>,
    ) -> Self {
        let name = display_name(id, &email, first_name, last_name);
        Self {
            email,
            name,
            image_url,
        }
    }
}

/// Joins first and last name. Falls back to the email local part, then to the id.
pub fn display_name(
    id: &UserId,
    email: &str,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> String {
    let joined = [first_name, last_name]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if !joined.is_empty() {
        return joined;
    }

    let local_part = email.split('@').next().unwrap_or_default().trim();
    if !local_part.is_empty() {
        return local_part.to_string();
    }

    id.0.clone()
}

/// A learner (or educator) known to the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub enrolled_courses: BTreeSet<CourseId>,
}

impl User {
    pub fn new(id: UserId, profile: UserProfile) -> Self {
        Self {
            id,
            email: profile.email,
            name: profile.name,
            image_url: profile.image_url,
            enrolled_courses: BTreeSet::new(),
        }
    }

    /// Overwrites the mirrored fields, leaving enrollment untouched.
    pub fn apply_profile(&mut self, profile: UserProfile) {
        self.email = profile.email;
        self.name = profile.name;
        self.image_url = profile.image_url;
    }

    /// Adds the course if absent. Returns `true` when the set changed.
    pub fn enroll(&mut self, course: &CourseId) -> bool {
        self.enrolled_courses.insert(course.clone())
    }

    pub fn is_enrolled(&self, course: &CourseId) -> bool {
        self.enrolled_courses.contains(course)
    }
}
