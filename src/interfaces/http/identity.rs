use super::AppState;
use crate::domain::events::IdentityEvent;
use crate::domain::user::{UserId, UserProfile};
use crate::error::{LmsError, Result};
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct IdentityEnvelope {
    #[serde(rename = "type")]
    kind: String,
    data: Value,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    #[serde(default)]
    id: Option<String>,
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: String,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    primary_email_address_id: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

impl ProviderUser {
    fn into_event(self, created: bool) -> Result<IdentityEvent> {
        let primary = self.primary_email_address_id.as_deref();
        let email = self
            .email_addresses
            .iter()
            .find(|e| primary.is_some() && e.id.as_deref() == primary)
            .or_else(|| self.email_addresses.first())
            .map(|e| e.email_address.clone())
            .ok_or_else(|| LmsError::MalformedPayload(format!("User {} has no email address", self.id)))?;

        let id = UserId::new(self.id);
        let profile = UserProfile::from_provider(
            &id,
            email,
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            self.image_url,
        );
        Ok(if created {
            IdentityEvent::Created { id, profile }
        } else {
            IdentityEvent::Updated { id, profile }
        })
    }
}

#[derive(Debug, Deserialize)]
struct DeletedUser {
    id: String,
}

#[derive(Debug, PartialEq)]
pub enum ParsedIdentityEvent {
    Identity(IdentityEvent),
    Unhandled(String),
}

/// Parses a verified identity-provider body into a typed event.
pub fn parse_identity_event(body: &[u8]) -> Result<ParsedIdentityEvent> {
    let envelope: IdentityEnvelope = serde_json::from_slice(body)
        .map_err(|e| LmsError::MalformedPayload(format!("Identity event envelope: {e}")))?;

    let malformed = |e: serde_json::Error| LmsError::MalformedPayload(format!("{} data: {e}", envelope.kind));

    let event = match envelope.kind.as_str() {
        "user.created" | "user.updated" => {
            let user: ProviderUser = serde_json::from_value(envelope.data.clone()).map_err(malformed)?;
            user.into_event(envelope.kind == "user.created")?
        }
        "user.deleted" => {
            let user: DeletedUser = serde_json::from_value(envelope.data.clone()).map_err(malformed)?;
            IdentityEvent::Deleted {
                id: UserId::new(user.id),
            }
        }
        _ => return Ok(ParsedIdentityEvent::Unhandled(envelope.kind.clone())),
    };
    Ok(ParsedIdentityEvent::Identity(event))
}

/// `POST /clerk`: verify, parse, mirror the user record.
pub async fn identity_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    state
        .identity_signature
        .verify(&headers, &body, Utc::now().timestamp())
        .inspect_err(|e| warn!(error = %e, "Identity webhook signature rejected"))?;

    match parse_identity_event(&body)? {
        ParsedIdentityEvent::Identity(event) => {
            info!(user = %event.user_id(), "Identity webhook received");
            let outcome = state.identity.apply(event).await?;
            info!(outcome = ?outcome, "Identity webhook processed");
            Ok(Json(json!({ "success": true })))
        }
        ParsedIdentityEvent::Unhandled(kind) => {
            info!(kind = %kind, "Unhandled identity event type");
            Ok(Json(json!({ "success": false, "message": "Unhandled event" })))
        }
    }
}
