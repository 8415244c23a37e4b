//! HTTP surface: the two provider webhook endpoints and a health check.

pub mod error;
pub mod identity;
pub mod payment;
pub mod signature;

use crate::application::identity::IdentitySync;
use crate::application::reconciler::Reconciler;
use crate::domain::ports::{CheckoutSessionsRef, Repository};
use axum::Router;
use axum::routing::{get, post};
use signature::{StripeSignature, SvixSignature};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Everything a webhook request needs, built once at startup.
pub struct AppState {
    pub reconciler: Reconciler,
    pub identity: IdentitySync,
    pub payment_signature: StripeSignature,
    pub identity_signature: SvixSignature,
}

impl AppState {
    pub fn new<S: Repository>(
        store: S,
        sessions: CheckoutSessionsRef,
        payment_signature: StripeSignature,
        identity_signature: SvixSignature,
    ) -> Self {
        Self {
            reconciler: Reconciler::new(Arc::new(store.clone()), sessions),
            identity: IdentitySync::new(Arc::new(store)),
            payment_signature,
            identity_signature,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/stripe", post(payment::payment_webhook))
        .route("/clerk", post(identity::identity_webhook))
        .route("/health", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        }))
        .with_state(state)
}
