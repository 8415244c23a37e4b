#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use lms_webhooks::domain::course::{Course, CourseId};
use lms_webhooks::domain::ports::{CheckoutSessionsRef, CourseStore, PurchaseStore, UserStore};
use lms_webhooks::domain::purchase::{Purchase, PurchaseId};
use lms_webhooks::domain::user::{User, UserId, UserProfile};
use lms_webhooks::infrastructure::checkout::InMemoryCheckoutSessions;
use lms_webhooks::infrastructure::in_memory::InMemoryStore;
use lms_webhooks::interfaces::http::signature::{StripeSignature, SvixSignature};
use lms_webhooks::interfaces::http::{AppState, router};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use sha2::Sha256;
use std::sync::Arc;
use tower::ServiceExt;

type HmacSha256 = Hmac<Sha256>;

pub const STRIPE_WEBHOOK_SECRET: &str = "whsec_test123secret456";
/// `whsec_` + base64("identity-test-key").
pub const CLERK_WEBHOOK_SECRET: &str = "whsec_aWRlbnRpdHktdGVzdC1rZXk=";
const CLERK_KEY: &[u8] = b"identity-test-key";

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn stripe_signature_header(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

pub fn svix_signature(payload: &[u8], msg_id: &str, timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(CLERK_KEY).expect("HMAC can take key of any size");
    mac.update(format!("{msg_id}.{timestamp}.").as_bytes());
    mac.update(payload);
    format!("v1,{}", BASE64.encode(mac.finalize().into_bytes()))
}

pub fn payment_event(event_id: &str, kind: &str, payment_intent: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": event_id,
        "object": "event",
        "type": kind,
        "data": { "object": { "id": payment_intent, "object": "payment_intent", "amount": 4500 } }
    }))
    .unwrap()
}

pub fn user(id: &str) -> User {
    User::new(
        UserId::new(id),
        UserProfile {
            email: format!("{id}@example.com"),
            name: id.to_uppercase(),
            image_url: None,
        },
    )
}

/// u1 with a pending purchase p1 of c1, reachable from payment intent `pi_1`.
pub async fn seeded() -> (InMemoryStore, InMemoryCheckoutSessions) {
    let store = InMemoryStore::new();
    let sessions = InMemoryCheckoutSessions::new();
    seed_purchase(&store, &sessions, "u1", "c1", "p1", "pi_1").await;
    (store, sessions)
}

pub async fn seed_purchase(
    store: &InMemoryStore,
    sessions: &InMemoryCheckoutSessions,
    user_id: &str,
    course_id: &str,
    purchase_id: &str,
    payment_intent: &str,
) {
    if UserStore::get(store, &UserId::new(user_id)).await.unwrap().is_none() {
        store.create(user(user_id)).await.unwrap();
    }
    let course = match CourseStore::get(store, &CourseId::new(course_id)).await.unwrap() {
        Some(course) => course,
        None => {
            let course = Course::new(CourseId::new(course_id), "Rust in Practice", dec!(50.00), 10).unwrap();
            CourseStore::insert(store, course.clone()).await.unwrap();
            course
        }
    };
    let purchase = Purchase::pending(PurchaseId::new(purchase_id), UserId::new(user_id), &course);
    PurchaseStore::insert(store, purchase).await.unwrap();
    sessions.register(payment_intent, PurchaseId::new(purchase_id)).await;
}

pub fn app(store: InMemoryStore, sessions: InMemoryCheckoutSessions) -> Router {
    app_with_sessions(store, Arc::new(sessions))
}

pub fn app_with_sessions(store: InMemoryStore, sessions: CheckoutSessionsRef) -> Router {
    let state = AppState::new(
        store,
        sessions,
        StripeSignature::new(STRIPE_WEBHOOK_SECRET, 300),
        SvixSignature::new(CLERK_WEBHOOK_SECRET, 300).unwrap(),
    );
    router(Arc::new(state))
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn stripe_request(payload: Vec<u8>, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/stripe")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("stripe-signature", signature);
    }
    builder.body(Body::from(payload)).unwrap()
}

pub fn signed_stripe_request(payload: Vec<u8>) -> Request<Body> {
    let signature = stripe_signature_header(&payload, STRIPE_WEBHOOK_SECRET, now());
    stripe_request(payload, Some(signature))
}

pub fn clerk_request(payload: Vec<u8>, msg_id: &str, signature: &str, timestamp: i64) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/clerk")
        .header("content-type", "application/json")
        .header("svix-id", msg_id)
        .header("svix-timestamp", timestamp.to_string())
        .header("svix-signature", signature)
        .body(Body::from(payload))
        .unwrap()
}

pub fn signed_clerk_request(payload: Value) -> Request<Body> {
    let payload = serde_json::to_vec(&payload).unwrap();
    let timestamp = now();
    let signature = svix_signature(&payload, "msg_test", timestamp);
    clerk_request(payload, "msg_test", &signature, timestamp)
}
