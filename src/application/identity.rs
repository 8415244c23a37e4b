use crate::domain::events::IdentityEvent;
use crate::domain::ports::UserStoreRef;
use crate::domain::user::User;
use crate::error::Result;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityOutcome {
    Created,
    Updated,
    Deleted,
    /// Delete for a user that was never mirrored locally.
    AlreadyAbsent,
}

/// Mirrors identity-provider user records into the local user store.
pub struct IdentitySync {
    users: UserStoreRef,
}

impl IdentitySync {
    pub fn new(users: UserStoreRef) -> Self {
        Self { users }
    }

    pub async fn apply(&self, event: IdentityEvent) -> Result<IdentityOutcome> {
        match event {
            IdentityEvent::Created { id, profile } | IdentityEvent::Updated { id, profile } => {
                // Replayed creates and updates for unseen users converge on the same record.
                if self.users.update_profile(&id, profile.clone()).await? {
                    info!(user = %id, email = %profile.email, "User updated");
                    return Ok(IdentityOutcome::Updated);
                }
                let email = profile.email.clone();
                if self.users.create(User::new(id.clone(), profile.clone())).await? {
                    info!(user = %id, email = %email, "New user created");
                    Ok(IdentityOutcome::Created)
                } else {
                    // Lost a race with a concurrent create; the profile still wins.
                    self.users.update_profile(&id, profile).await?;
                    Ok(IdentityOutcome::Updated)
                }
            }
            IdentityEvent::Deleted { id } => {
                if self.users.delete(&id).await? {
                    info!(user = %id, "User deleted");
                    Ok(IdentityOutcome::Deleted)
                } else {
                    warn!(user = %id, "Delete for unknown user");
                    Ok(IdentityOutcome::AlreadyAbsent)
                }
            }
        }
    }
}
