use crate::domain::enrollment::{Completion, Failure};
use crate::domain::events::{PaymentEvent, PaymentOutcome};
use crate::domain::ports::{CheckoutSessionsRef, EnrollmentStoreRef};
use crate::domain::purchase::{PurchaseId, Transition};
use crate::error::Result;
use tracing::{info, warn};

/// What a payment event did to local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    Enrolled {
        purchase: PurchaseId,
        newly_enrolled: bool,
    },
    MarkedFailed {
        purchase: PurchaseId,
        transition: Transition,
    },
    /// The payment intent has no checkout session carrying a purchase id.
    SessionNotFound,
    /// Logged and acknowledged; retrying would not help.
    Skipped {
        purchase: PurchaseId,
        reason: Completion,
    },
    PurchaseNotFound(PurchaseId),
}

/// Brings purchase and enrollment state in line with verified payment events.
///
/// Each event is scoped to its own purchase id; duplicate or out-of-order
/// deliveries are absorbed by the conditional writes in the enrollment store.
pub struct Reconciler {
    enrollments: EnrollmentStoreRef,
    sessions: CheckoutSessionsRef,
}

impl Reconciler {
    pub fn new(enrollments: EnrollmentStoreRef, sessions: CheckoutSessionsRef) -> Self {
        Self {
            enrollments,
            sessions,
        }
    }

    /// Applies one event. Only persistence and provider failures are errors.
    pub async fn reconcile(&self, event: &PaymentEvent) -> Result<Reconciliation> {
        let Some(purchase_id) = self
            .sessions
            .purchase_for_payment_intent(&event.payment_intent)
            .await?
        else {
            warn!(
                event_id = %event.event_id,
                payment_intent = %event.payment_intent,
                "No checkout session with a purchase id for payment intent"
            );
            return Ok(Reconciliation::SessionNotFound);
        };

        match event.outcome {
            PaymentOutcome::Succeeded => self.on_success(event, purchase_id).await,
            PaymentOutcome::Failed => self.on_failure(event, purchase_id).await,
        }
    }

    async fn on_success(&self, event: &PaymentEvent, purchase: PurchaseId) -> Result<Reconciliation> {
        let completion = self.enrollments.complete_purchase(&purchase).await?;

        match completion {
            Completion::Enrolled { newly_enrolled } => {
                if newly_enrolled {
                    info!(event_id = %event.event_id, purchase = %purchase, "Enrollment successful");
                } else {
                    info!(event_id = %event.event_id, purchase = %purchase, "Duplicate success event, already enrolled");
                }
                Ok(Reconciliation::Enrolled {
                    purchase,
                    newly_enrolled,
                })
            }
            Completion::PurchaseMissing => {
                warn!(event_id = %event.event_id, purchase = %purchase, "Purchase not found");
                Ok(Reconciliation::PurchaseNotFound(purchase))
            }
            reason => {
                warn!(
                    event_id = %event.event_id,
                    purchase = %purchase,
                    reason = ?reason,
                    "Success event left purchase unchanged"
                );
                Ok(Reconciliation::Skipped { purchase, reason })
            }
        }
    }

    async fn on_failure(&self, event: &PaymentEvent, purchase: PurchaseId) -> Result<Reconciliation> {
        match self.enrollments.fail_purchase(&purchase).await? {
            Failure::Marked(transition) => {
                match transition {
                    Transition::Rejected(current) => warn!(
                        event_id = %event.event_id,
                        purchase = %purchase,
                        status = %current,
                        "Payment failure for a purchase already settled"
                    ),
                    _ => info!(event_id = %event.event_id, purchase = %purchase, "Payment failed for purchase"),
                }
                Ok(Reconciliation::MarkedFailed {
                    purchase,
                    transition,
                })
            }
            Failure::PurchaseMissing => {
                warn!(event_id = %event.event_id, purchase = %purchase, "Purchase not found");
                Ok(Reconciliation::PurchaseNotFound(purchase))
            }
        }
    }
}
