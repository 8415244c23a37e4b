use crate::domain::ports::CheckoutSessions;
use crate::domain::purchase::PurchaseId;
use crate::error::{LmsError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Metadata key under which checkout creation stores the internal purchase id.
pub const PURCHASE_ID_METADATA_KEY: &str = "purchaseId";

#[derive(Debug, Deserialize)]
struct SessionList {
    #[serde(default)]
    data: Vec<CheckoutSession>,
}

#[derive(Debug, Deserialize)]
struct CheckoutSession {
    id: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

/// Pulls the purchase id out of a checkout-session list response body.
fn purchase_from_session_list(body: &[u8]) -> Result<Option<PurchaseId>> {
    let list: SessionList = serde_json::from_slice(body)
        .map_err(|e| LmsError::PaymentProvider(format!("Unexpected session list body: {e}")))?;

    let Some(session) = list.data.into_iter().next() else {
        return Ok(None);
    };
    debug!(session_id = %session.id, "Resolved checkout session");

    Ok(session
        .metadata
        .get(PURCHASE_ID_METADATA_KEY)
        .filter(|id| !id.is_empty())
        .map(|id| PurchaseId::new(id.as_str())))
}

/// Looks up checkout sessions through the payment provider's REST API.
///
/// Built once at startup and shared through the application state. Every
/// lookup is bounded by `timeout`, so a stalled provider fails the webhook with
/// a retryable error instead of holding it open.
#[derive(Clone)]
pub struct StripeCheckoutClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeCheckoutClient {
    pub fn new(
        api_base: impl Into<String>,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LmsError::PaymentProvider(format!("HTTP client setup failed: {e}")))?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }
}

#[async_trait]
impl CheckoutSessions for StripeCheckoutClient {
    async fn purchase_for_payment_intent(&self, payment_intent: &str) -> Result<Option<PurchaseId>> {
        let url = format!("{}/v1/checkout/sessions", self.api_base);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .query(&[("payment_intent", payment_intent), ("limit", "1")])
            .send()
            .await
            .map_err(|e| LmsError::PaymentProvider(format!("Session lookup failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LmsError::PaymentProvider(format!(
                "Session lookup for {payment_intent} returned {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| LmsError::PaymentProvider(format!("Session lookup body: {e}")))?;
        purchase_from_session_list(&body)
    }
}

/// A fixed payment-intent -> purchase map for tests and local runs.
#[derive(Default, Clone)]
pub struct InMemoryCheckoutSessions {
    sessions: Arc<RwLock<HashMap<String, PurchaseId>>>,
}

impl InMemoryCheckoutSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, payment_intent: impl Into<String>, purchase: PurchaseId) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(payment_intent.into(), purchase);
    }
}

#[async_trait]
impl CheckoutSessions for InMemoryCheckoutSessions {
    async fn purchase_for_payment_intent(&self, payment_intent: &str) -> Result<Option<PurchaseId>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(payment_intent).cloned())
    }
}
