//! Stripe webhook verification and event parsing.
//!
//! The `Stripe-Signature` header looks like `t=1704067200,v1=<hex>,v1=<hex>`.
//! The signed payload is `"{t}.{raw body}"`, MAC'd with HMAC-SHA256 using
//! the endpoint's signing secret. More than one `v1` entry may be present
//! while a secret is being rolled; any match is accepted.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use summer_camp_core::{RegistrationId, from_cents};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age (either direction) of a signed timestamp, in seconds.
pub const TOLERANCE_SECS: i64 = 300;

/// Reasons a webhook delivery is rejected.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing Stripe-Signature header")]
    MissingSignature,

    #[error("malformed Stripe-Signature header: {0}")]
    MalformedSignature(&'static str),

    #[error("timestamp outside the {TOLERANCE_SECS}s tolerance")]
    Expired,

    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Parsed `Stripe-Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parse `t=...,v1=...` pairs; unknown keys such as `v0` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::MalformedSignature`] when the timestamp or
    /// every `v1` entry is missing or unreadable.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        if header.trim().is_empty() {
            return Err(WebhookError::MissingSignature);
        }

        let mut timestamp = None;
        let mut signatures = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                return Err(WebhookError::MalformedSignature("expected key=value pairs"));
            };
            match key.trim() {
                "t" => {
                    timestamp = Some(
                        value
                            .trim()
                            .parse::<i64>()
                            .map_err(|_| WebhookError::MalformedSignature("invalid timestamp"))?,
                    );
                }
                "v1" => {
                    let bytes = hex::decode(value.trim())
                        .map_err(|_| WebhookError::MalformedSignature("signature is not hex"))?;
                    signatures.push(bytes);
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(WebhookError::MalformedSignature("missing timestamp"))?;
        if signatures.is_empty() {
            return Err(WebhookError::MalformedSignature("missing v1 signature"));
        }

        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

/// Verify a delivery against the signing secret at time `now` (unix seconds).
///
/// # Errors
///
/// Returns a [`WebhookError`] describing why the delivery is not authentic.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &SecretString,
    now: i64,
) -> Result<(), WebhookError> {
    let header = SignatureHeader::parse(header)?;

    if now.abs_diff(header.timestamp) > TOLERANCE_SECS.unsigned_abs() {
        tracing::warn!(
            event_timestamp = header.timestamp,
            current_time = now,
            "Webhook timestamp outside tolerance"
        );
        return Err(WebhookError::Expired);
    }

    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| WebhookError::SignatureMismatch)?;
    mac.update(header.timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    // verify_slice compares in constant time
    let matched = header
        .signatures
        .iter()
        .any(|signature| mac.clone().verify_slice(signature).is_ok());

    if matched {
        Ok(())
    } else {
        Err(WebhookError::SignatureMismatch)
    }
}

/// Compute the `v1` signature for a payload. Used by tests and local tooling.
#[must_use]
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).unwrap_or_else(|_| unreachable!());
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

/// The envelope of every Stripe event.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

/// `payment_status` of a Checkout Session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPaymentStatus {
    Paid,
    /// Delayed methods (SEPA, bank transfer) complete the session before the
    /// money arrives; `async_payment_succeeded` follows once it does.
    Unpaid,
    NoPaymentRequired,
}

/// The fields of a Checkout Session this site reads.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub payment_status: Option<CheckoutPaymentStatus>,
    #[serde(default)]
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSessionObject {
    /// Registration the session pays for, from metadata or the client
    /// reference id.
    #[must_use]
    pub fn registration_id(&self) -> Option<RegistrationId> {
        self.metadata
            .get("registration_id")
            .or(self.client_reference_id.as_ref())
            .and_then(|id| id.parse().ok())
    }

    /// Whether the funds for this session have been received.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        matches!(
            self.payment_status,
            Some(CheckoutPaymentStatus::Paid | CheckoutPaymentStatus::NoPaymentRequired)
        )
    }

    /// Amount charged, in euros.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        from_cents(self.amount_total.unwrap_or(0))
    }
}

/// Events this site acts on.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    CheckoutCompleted(CheckoutSessionObject),
    CheckoutExpired(CheckoutSessionObject),
    /// Any other event type, acknowledged and ignored.
    Ignored(String),
}

impl WebhookEvent {
    /// Parse a raw event body.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::InvalidPayload`] if the JSON does not match
    /// the event shape.
    pub fn parse(payload: &[u8]) -> Result<Self, WebhookError> {
        let event: StripeEvent = serde_json::from_slice(payload)?;
        tracing::debug!(
            event_id = %event.id,
            event_type = %event.event_type,
            "Parsed Stripe event"
        );

        Ok(match event.event_type.as_str() {
            "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
                Self::CheckoutCompleted(serde_json::from_value(event.data.object)?)
            }
            "checkout.session.expired" => {
                Self::CheckoutExpired(serde_json::from_value(event.data.object)?)
            }
            _ => Self::Ignored(event.event_type),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_Kq81bXz0PmR2";
    const NOW: i64 = 1_767_225_600;

    fn secret() -> SecretString {
        SecretString::from(SECRET)
    }

    #[test]
    fn test_valid_signature() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = sign(payload, SECRET, NOW);
        assert!(verify_signature(payload, &header, &secret(), NOW + 10).is_ok());
    }

    #[test]
    fn test_tampered_payload() {
        let header = sign(br#"{"amount":100}"#, SECRET, NOW);
        let result = verify_signature(br#"{"amount":1}"#, &header, &secret(), NOW);
        assert!(matches!(result, Err(WebhookError::SignatureMismatch)));
    }

    #[test]
    fn test_wrong_secret() {
        let payload = b"{}";
        let header = sign(payload, "whsec_other", NOW);
        let result = verify_signature(payload, &header, &secret(), NOW);
        assert!(matches!(result, Err(WebhookError::SignatureMismatch)));
    }

    #[test]
    fn test_old_and_future_timestamps() {
        let payload = b"{}";
        let header = sign(payload, SECRET, NOW);
        assert!(matches!(
            verify_signature(payload, &header, &secret(), NOW + TOLERANCE_SECS + 1),
            Err(WebhookError::Expired)
        ));
        assert!(matches!(
            verify_signature(payload, &header, &secret(), NOW - TOLERANCE_SECS - 1),
            Err(WebhookError::Expired)
        ));
    }

    #[test]
    fn test_any_v1_signature_may_match() {
        let payload = b"{}";
        let valid = sign(payload, SECRET, NOW);
        let v1 = valid.split_once("v1=").unwrap().1;
        let header = format!("t={NOW},v1={},v0=abcd,v1={v1}", "00".repeat(32));
        assert!(verify_signature(payload, &header, &secret(), NOW).is_ok());
    }

    #[test]
    fn test_malformed_headers() {
        assert!(matches!(
            SignatureHeader::parse(""),
            Err(WebhookError::MissingSignature)
        ));
        assert!(matches!(
            SignatureHeader::parse("v1=abcd"),
            Err(WebhookError::MalformedSignature(_))
        ));
        assert!(matches!(
            SignatureHeader::parse("t=123"),
            Err(WebhookError::MalformedSignature(_))
        ));
        assert!(matches!(
            SignatureHeader::parse("t=123,v1=zz"),
            Err(WebhookError::MalformedSignature(_))
        ));
        for t in [i64::MIN, i64::MAX] {
            let header = format!("t={t},v1=00");
            assert!(matches!(
                verify_signature(b"{}", &header, &secret(), NOW),
                Err(WebhookError::Expired)
            ));
        }
    }

    #[test]
    fn test_parse_completed_event() {
        let id = RegistrationId::generate();
        let payload = serde_json::json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": { "object": {
                "id": "cs_test_1",
                "amount_total": 15000,
                "payment_status": "paid",
                "client_reference_id": id.to_string(),
                "metadata": { "registration_id": id.to_string() }
            }}
        })
        .to_string();

        let WebhookEvent::CheckoutCompleted(session) =
            WebhookEvent::parse(payload.as_bytes()).unwrap()
        else {
            panic!("expected a completed checkout");
        };
        assert_eq!(session.id, "cs_test_1");
        assert_eq!(session.registration_id(), Some(id));
        assert_eq!(session.amount(), Decimal::new(150, 0));
        assert!(session.is_paid());
    }

    #[test]
    fn test_delayed_payment_session_is_not_paid() {
        let payload = br#"{"id":"evt_3","type":"checkout.session.completed","data":{"object":{
            "id":"cs_sepa","amount_total":15000,"payment_status":"unpaid"}}}"#;
        let WebhookEvent::CheckoutCompleted(session) = WebhookEvent::parse(payload).unwrap() else {
            panic!("expected a completed checkout");
        };
        assert_eq!(session.payment_status, Some(CheckoutPaymentStatus::Unpaid));
        assert!(!session.is_paid());

        let free = br#"{"id":"cs_free","payment_status":"no_payment_required"}"#;
        let session: CheckoutSessionObject = serde_json::from_slice(free).unwrap();
        assert!(session.is_paid());
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        let payload = br#"{"id":"evt_2","type":"invoice.paid","data":{"object":{}}}"#;
        assert!(matches!(
            WebhookEvent::parse(payload).unwrap(),
            WebhookEvent::Ignored(t) if t == "invoice.paid"
        ));
    }
}
