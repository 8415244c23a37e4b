//! Webhook signature verification for the two providers.
//!
//! Both schemes sign the raw request body together with a timestamp using
//! HMAC-SHA256; they differ in header layout and key encoding. Verification runs
//! on raw bytes before any JSON is parsed.

use crate::error::{LmsError, Result};
use axum::http::HeaderMap;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";
pub const SVIX_ID_HEADER: &str = "svix-id";
pub const SVIX_TIMESTAMP_HEADER: &str = "svix-timestamp";
pub const SVIX_SIGNATURE_HEADER: &str = "svix-signature";

/// Default allowed clock skew between the provider's timestamp and ours.
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str> {
    headers
        .get(name)
        .ok_or_else(|| LmsError::Authentication(format!("Missing {name} header")))?
        .to_str()
        .map_err(|_| LmsError::Authentication(format!("Unreadable {name} header")))
}

fn check_timestamp(timestamp: &str, now: i64, tolerance_secs: u64) -> Result<()> {
    let timestamp: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| LmsError::Authentication("Invalid signature timestamp".to_string()))?;
    if now.abs_diff(timestamp) > tolerance_secs {
        return Err(LmsError::Authentication(
            "Signature timestamp outside tolerance".to_string(),
        ));
    }
    Ok(())
}

fn keyed_mac(key: &[u8]) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(key)
        .map_err(|_| LmsError::Authentication("Invalid webhook secret".to_string()))
}

/// Verifies the payment provider's `Stripe-Signature` header
/// (`t=<unix>,v1=<hex>[,v1=<hex>...]`).
#[derive(Clone)]
pub struct StripeSignature {
    secret: String,
    tolerance_secs: u64,
}

impl StripeSignature {
    pub fn new(secret: impl Into<String>, tolerance_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs,
        }
    }

    pub fn verify(&self, headers: &HeaderMap, payload: &[u8], now: i64) -> Result<()> {
        let value = header(headers, STRIPE_SIGNATURE_HEADER)?;

        let mut timestamp = None;
        let mut candidates = Vec::new();
        for part in value.split(',') {
            match part.trim().split_once('=') {
                Some(("t", t)) => timestamp = Some(t),
                Some(("v1", sig)) => candidates.push(sig),
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| LmsError::Authentication("Missing timestamp in signature".to_string()))?;
        if candidates.is_empty() {
            return Err(LmsError::Authentication(
                "Missing v1 signature".to_string(),
            ));
        }
        check_timestamp(timestamp, now, self.tolerance_secs)?;

        let mut mac = keyed_mac(self.secret.as_bytes())?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);

        let matched = candidates.into_iter().any(|sig| {
            hex::decode(sig).is_ok_and(|bytes| mac.clone().verify_slice(&bytes).is_ok())
        });
        if matched {
            Ok(())
        } else {
            Err(LmsError::Authentication("Signature mismatch".to_string()))
        }
    }
}

/// Verifies the identity provider's svix headers
/// (`svix-id`, `svix-timestamp`, `svix-signature: v1,<base64> ...`).
#[derive(Clone)]
pub struct SvixSignature {
    key: Vec<u8>,
    tolerance_secs: u64,
}

impl SvixSignature {
    /// `secret` is `whsec_<base64 key>`; the prefix is optional.
    pub fn new(secret: &str, tolerance_secs: u64) -> Result<Self> {
        let encoded = secret.strip_prefix("whsec_").unwrap_or(secret);
        let key = BASE64
            .decode(encoded)
            .map_err(|e| LmsError::ValidationError(format!("Identity webhook secret is not base64: {e}")))?;
        Ok(Self {
            key,
            tolerance_secs,
        })
    }

    pub fn verify(&self, headers: &HeaderMap, payload: &[u8], now: i64) -> Result<()> {
        let id = header(headers, SVIX_ID_HEADER)?;
        let timestamp = header(headers, SVIX_TIMESTAMP_HEADER)?;
        let signatures = header(headers, SVIX_SIGNATURE_HEADER)?;

        check_timestamp(timestamp, now, self.tolerance_secs)?;

        let mut mac = keyed_mac(&self.key)?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);

        let matched = signatures
            .split_whitespace()
            .filter_map(|entry| entry.strip_prefix("v1,"))
            .any(|sig| BASE64.decode(sig).is_ok_and(|bytes| mac.clone().verify_slice(&bytes).is_ok()));
        if matched {
            Ok(())
        } else {
            Err(LmsError::Authentication("Signature mismatch".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const NOW: i64 = 1_761_647_050;
    const STRIPE_SECRET: &str = "whsec_test123secret456";
    // base64("identity-test-key")
    const SVIX_SECRET: &str = "whsec_aWRlbnRpdHktdGVzdC1rZXk=";

    fn stripe_sig(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    fn stripe_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(STRIPE_SIGNATURE_HEADER, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn svix_headers(id: &str, timestamp: i64, payload: &[u8]) -> HeaderMap {
        let mut mac = HmacSha256::new_from_slice(b"identity-test-key").unwrap();
        mac.update(format!("{id}.{timestamp}.").as_bytes());
        mac.update(payload);
        let sig = BASE64.encode(mac.finalize().into_bytes());

        let mut headers = HeaderMap::new();
        headers.insert(SVIX_ID_HEADER, HeaderValue::from_str(id).unwrap());
        headers.insert(SVIX_TIMESTAMP_HEADER, HeaderValue::from_str(&timestamp.to_string()).unwrap());
        headers.insert(
            SVIX_SIGNATURE_HEADER,
            HeaderValue::from_str(&format!("v1,bm90LWl0 v1,{sig}")).unwrap(),
        );
        headers
    }

    #[test]
    fn test_stripe_valid_signature() {
        let payload = br#"{"id":"evt_1"}"#;
        let sig = stripe_sig(payload, STRIPE_SECRET, NOW);
        let verifier = StripeSignature::new(STRIPE_SECRET, DEFAULT_TOLERANCE_SECS);

        let headers = stripe_headers(&format!("t={NOW},v1={sig}"));
        assert!(verifier.verify(&headers, payload, NOW).is_ok());

        // A rotated secret produces an extra v1 entry; any match is enough.
        let headers = stripe_headers(&format!("t={NOW},v1=deadbeef,v1={sig},v0=abc"));
        assert!(verifier.verify(&headers, payload, NOW + 10).is_ok());
    }

    #[test]
    fn test_stripe_rejections() {
        let payload = br#"{"id":"evt_1"}"#;
        let verifier = StripeSignature::new(STRIPE_SECRET, DEFAULT_TOLERANCE_SECS);

        let wrong_secret = stripe_sig(payload, "wrong_secret", NOW);
        let headers = stripe_headers(&format!("t={NOW},v1={wrong_secret}"));
        assert!(matches!(
            verifier.verify(&headers, payload, NOW),
            Err(LmsError::Authentication(_))
        ));

        let sig = stripe_sig(payload, STRIPE_SECRET, NOW);
        let headers = stripe_headers(&format!("t={NOW},v1={sig}"));
        assert!(verifier.verify(&headers, br#"{"id":"evt_2"}"#, NOW).is_err());
        assert!(verifier.verify(&headers, payload, NOW + 301).is_err());

        assert!(verifier.verify(&stripe_headers("v1=abc"), payload, NOW).is_err());
        assert!(verifier.verify(&stripe_headers(&format!("t={NOW}")), payload, NOW).is_err());
        assert!(verifier.verify(&stripe_headers("garbage"), payload, NOW).is_err());
        assert!(verifier.verify(&HeaderMap::new(), payload, NOW).is_err());
    }

    #[test]
    fn test_svix_valid_signature() {
        let payload = br#"{"type":"user.created"}"#;
        let verifier = SvixSignature::new(SVIX_SECRET, DEFAULT_TOLERANCE_SECS).unwrap();

        let headers = svix_headers("msg_1", NOW, payload);
        assert!(verifier.verify(&headers, payload, NOW).is_ok());
    }

    #[test]
    fn test_svix_rejections() {
        let payload = br#"{"type":"user.created"}"#;
        let verifier = SvixSignature::new(SVIX_SECRET, DEFAULT_TOLERANCE_SECS).unwrap();

        let headers = svix_headers("msg_1", NOW, payload);
        assert!(verifier.verify(&headers, br#"{"type":"user.deleted"}"#, NOW).is_err());
        assert!(verifier.verify(&headers, payload, NOW - 600).is_err());

        let mut missing = headers.clone();
        missing.remove(SVIX_ID_HEADER);
        assert!(matches!(
            verifier.verify(&missing, payload, NOW),
            Err(LmsError::Authentication(_))
        ));

        let mut swapped_id = headers;
        swapped_id.insert(SVIX_ID_HEADER, HeaderValue::from_static("msg_2"));
        assert!(verifier.verify(&swapped_id, payload, NOW).is_err());
    }

    #[test]
    fn test_svix_secret_must_be_base64() {
        assert!(matches!(
            SvixSignature::new("whsec_***not base64***", DEFAULT_TOLERANCE_SECS),
            Err(LmsError::ValidationError(_))
        ));
        assert!(SvixSignature::new("aWRlbnRpdHktdGVzdC1rZXk=", DEFAULT_TOLERANCE_SECS).is_ok());
    }
}
