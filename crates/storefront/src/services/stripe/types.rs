//! Stripe API payloads.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Parameters for `POST /v1/payment_intents`.
#[derive(Debug, Clone)]
pub struct CreatePaymentIntent {
    /// Amount in minor units.
    pub amount: i64,
    /// Lowercase ISO currency code.
    pub currency: String,
    pub description: Option<String>,
    pub metadata: BTreeMap<String, String>,
    /// Sent as the `Idempotency-Key` header.
    pub idempotency_key: Option<String>,
}

impl CreatePaymentIntent {
    /// Form-encoded body, with automatic payment methods enabled.
    #[must_use]
    pub fn form_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("amount".to_string(), self.amount.to_string()),
            ("currency".to_string(), self.currency.clone()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];
        if let Some(description) = &self.description {
            params.push(("description".to_string(), description.clone()));
        }
        for (key, value) in &self.metadata {
            params.push((format!("metadata[{key}]"), value.clone()));
        }
        params
    }
}

/// The subset of a `PaymentIntent` the storefront uses.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub latest_charge: Option<String>,
}

/// A webhook event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    pub object: WebhookObject,
}

/// The event's object: a `PaymentIntent` or a `Charge`, depending on the
/// event type. Only the fields both handlers need are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookObject {
    pub id: String,
    /// Set on `PaymentIntent` objects.
    #[serde(default)]
    pub latest_charge: Option<String>,
    /// Set on `Charge` objects.
    #[serde(default)]
    pub payment_intent: Option<String>,
}

/// Error body returned by the Stripe API.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_form_params_include_metadata() {
        let mut metadata = BTreeMap::new();
        metadata.insert("user_id".to_string(), "7".to_string());
        metadata.insert("line_count".to_string(), "2".to_string());

        let params = CreatePaymentIntent {
            amount: 459_900,
            currency: "php".to_string(),
            description: None,
            metadata,
            idempotency_key: None,
        }
        .form_params();

        assert!(params.contains(&("amount".to_string(), "459900".to_string())));
        assert!(params.contains(&(
            "automatic_payment_methods[enabled]".to_string(),
            "true".to_string()
        )));
        assert!(params.contains(&("metadata[user_id]".to_string(), "7".to_string())));
        assert!(params.contains(&("metadata[line_count]".to_string(), "2".to_string())));
    }

    #[test]
    fn test_deserialize_charge_event() {
        let body = r#"{
            "id": "evt_1",
            "type": "charge.refunded",
            "data": {"object": {"id": "ch_1", "payment_intent": "pi_1", "amount": 100}}
        }"#;
        let event: WebhookEvent = serde_json::from_str(body).unwrap();
        assert_eq!(event.event_type, "charge.refunded");
        assert_eq!(event.data.object.payment_intent.as_deref(), Some("pi_1"));
        assert!(event.data.object.latest_charge.is_none());
    }
}
