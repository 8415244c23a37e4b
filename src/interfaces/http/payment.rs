use super::AppState;
use crate::domain::events::{PaymentEvent, PaymentOutcome};
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

pub const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const PAYMENT_FAILED: &str = "payment_intent.payment_failed";

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: Value,
}

#[derive(Debug, Deserialize)]
struct PaymentIntentObject {
    id: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ParsedPaymentEvent {
    Payment(PaymentEvent),
    Unhandled { event_id: String, kind: String },
}

/// Parses a verified payment-provider body into a typed event.
pub fn parse_payment_event(body: &[u8]) -> Result<ParsedPaymentEvent> {
    let envelope: EventEnvelope = serde_json::from_slice(body)
        .map_err(|e| LmsError::MalformedPayload(format!("Payment event envelope: {e}")))?;

    let outcome = match envelope.kind.as_str() {
        PAYMENT_SUCCEEDED => PaymentOutcome::Succeeded,
        PAYMENT_FAILED => PaymentOutcome::Failed,
        _ => {
            return Ok(ParsedPaymentEvent::Unhandled {
                event_id: envelope.id,
                kind: envelope.kind,
            });
        }
    };

    let intent: PaymentIntentObject = serde_json::from_value(envelope.data.object)
        .map_err(|e| LmsError::MalformedPayload(format!("Payment intent object: {e}")))?;
    if intent.id.is_empty() {
        return Err(LmsError::MalformedPayload("Empty payment intent id".to_string()));
    }

    Ok(ParsedPaymentEvent::Payment(PaymentEvent {
        event_id: envelope.id,
        payment_intent: intent.id,
        outcome,
    }))
}

/// `POST /stripe`: verify, parse, reconcile, acknowledge.
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    state
        .payment_signature
        .verify(&headers, &body, Utc::now().timestamp())
        .inspect_err(|e| warn!(error = %e, "Payment webhook signature rejected"))?;

    match parse_payment_event(&body)? {
        ParsedPaymentEvent::Payment(event) => {
            info!(event_id = %event.event_id, outcome = ?event.outcome, "Payment webhook received");
            let result = state.reconciler.reconcile(&event).await?;
            info!(event_id = %event.event_id, result = ?result, "Payment webhook processed");
        }
        ParsedPaymentEvent::Unhandled { event_id, kind } => {
            info!(event_id = %event_id, kind = %kind, "Unhandled payment event type");
        }
    }

    Ok(Json(json!({ "received": true })))
}
