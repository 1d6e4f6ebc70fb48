//! Stripe REST API client.

use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::{debug, error, instrument};

use super::error::StripeError;
use super::types::{ApiErrorBody, CreatePaymentIntent, PaymentIntent, WebhookEvent};
use crate::config::StripeConfig;

/// Maximum age of a webhook signature timestamp, in seconds.
const SIGNATURE_TOLERANCE_SECS: u64 = 300;

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: SecretString,
    webhook_secret: SecretString,
    api_base: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("secret_key", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    /// Create a new Stripe client.
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            client: Client::new(),
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Create a `PaymentIntent`.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Api` with Stripe's status and message when the
    /// request is rejected, or `Request`/`Response` for transport failures.
    #[instrument(skip(self, params), fields(amount = params.amount, currency = %params.currency))]
    pub async fn create_payment_intent(
        &self,
        params: &CreatePaymentIntent,
    ) -> Result<PaymentIntent, StripeError> {
        let mut request = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&params.form_params());

        if let Some(key) = &params.idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StripeError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message.or(b.error.error_type))
                .unwrap_or_else(|| format!("unexpected response: {body}"));
            error!(status = status.as_u16(), message = %message, "Stripe API error creating PaymentIntent");
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let intent: PaymentIntent = response
            .json()
            .await
            .map_err(|e| StripeError::Response(e.to_string()))?;

        debug!(payment_intent_id = %intent.id, status = %intent.status, "PaymentIntent created");

        Ok(intent)
    }

    /// Verify a webhook's `Stripe-Signature` header and parse the event.
    ///
    /// See <https://docs.stripe.com/webhooks#verify-manually>.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::InvalidSignature` if the header is malformed,
    /// stale, or no `v1` signature matches, and `InvalidPayload` if the body
    /// is not an event.
    #[instrument(skip_all)]
    pub fn construct_event(&self, body: &str, header: &str) -> Result<WebhookEvent, StripeError> {
        let now = chrono::Utc::now().timestamp();
        verify_signature(
            self.webhook_secret.expose_secret(),
            body,
            header,
            now,
        )?;
        serde_json::from_str(body).map_err(|e| StripeError::InvalidPayload(e.to_string()))
    }
}

/// Check a `Stripe-Signature` header (`t=...,v1=...[,v1=...]`) at time `now`.
fn verify_signature(secret: &str, body: &str, header: &str, now: i64) -> Result<(), StripeError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| StripeError::InvalidSignature("Missing timestamp".to_string()))?;
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| StripeError::InvalidSignature("Invalid timestamp".to_string()))?;

    if now.abs_diff(ts) > SIGNATURE_TOLERANCE_SECS {
        return Err(StripeError::InvalidSignature(
            "Timestamp outside tolerance".to_string(),
        ));
    }
    if signatures.is_empty() {
        return Err(StripeError::InvalidSignature(
            "No v1 signature".to_string(),
        ));
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| StripeError::InvalidSignature(e.to_string()))?;
    mac.update(format!("{timestamp}.{body}").as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if signatures
        .iter()
        .any(|sig| constant_time_compare(&expected, sig))
    {
        debug!("Stripe signature verified");
        Ok(())
    } else {
        Err(StripeError::InvalidSignature(
            "Signature mismatch".to_string(),
        ))
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_Kq8vN2mXp4Lr7Tz";
    const NOW: i64 = 1_760_000_000;

    fn sign(timestamp: i64, body: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).expect("valid key");
        mac.update(format!("{timestamp}.{body}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_signature_verification_valid() {
        let body = r#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;
        let header = format!("t={NOW},v1={}", sign(NOW, body));
        assert!(verify_signature(SECRET, body, &header, NOW).is_ok());
    }

    #[test]
    fn test_signature_verification_accepts_any_v1() {
        let body = "{}";
        let header = format!("t={NOW},v1=deadbeef,v1={},v0=ignored", sign(NOW, body));
        assert!(verify_signature(SECRET, body, &header, NOW + 10).is_ok());
    }

    #[test]
    fn test_signature_verification_tampered_body() {
        let header = format!("t={NOW},v1={}", sign(NOW, "original"));
        let result = verify_signature(SECRET, "tampered", &header, NOW);
        assert!(matches!(result, Err(StripeError::InvalidSignature(_))));
    }

    #[test]
    fn test_signature_verification_old_timestamp() {
        let body = "{}";
        let old = NOW - 600;
        let header = format!("t={old},v1={}", sign(old, body));
        let result = verify_signature(SECRET, body, &header, NOW);
        assert!(matches!(result, Err(StripeError::InvalidSignature(_))));
    }

    #[test]
    fn test_signature_verification_malformed_header() {
        assert!(verify_signature(SECRET, "{}", "garbage", NOW).is_err());
        assert!(verify_signature(SECRET, "{}", "t=abc,v1=00", NOW).is_err());
        assert!(verify_signature(SECRET, "{}", &format!("t={NOW}"), NOW).is_err());
        assert!(matches!(
            verify_signature(SECRET, "{}", "t=-9223372036854775808,v1=00", NOW),
            Err(StripeError::InvalidSignature(_))
        ));
        assert!(matches!(
            verify_signature(SECRET, "{}", &format!("t={},v1=00", i64::MAX), NOW),
            Err(StripeError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "ab"));
    }
}
