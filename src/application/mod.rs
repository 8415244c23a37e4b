//! Application layer orchestrating the webhook-driven state changes.
//!
//! `Reconciler` turns verified payment events into purchase and enrollment
//! transitions; `IdentitySync` mirrors identity-provider user records. Both
//! receive their collaborators as injected port handles, so one instance is
//! built at startup and shared by every request.

pub mod identity;
pub mod reconciler;
