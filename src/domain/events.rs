use super::user::{UserId, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded,
    Failed,
}

/// A verified payment-provider event that affects a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub event_id: String,
    /// Provider-chosen id; resolved to a purchase through the checkout session.
    pub payment_intent: String,
    pub outcome: PaymentOutcome,
}

/// A verified identity-provider user lifecycle event.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityEvent {
    Created { id: UserId, profile: UserProfile },
    Updated { id: UserId, profile: UserProfile },
    Deleted { id: UserId },
}

impl IdentityEvent {
    pub fn user_id(&self) -> &UserId {
        match self {
            IdentityEvent::Created { id, .. }
            | IdentityEvent::Updated { id, .. }
            | IdentityEvent::Deleted { id } => id,
        }
    }
}
