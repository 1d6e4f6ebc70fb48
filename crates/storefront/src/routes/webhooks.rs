//! Stripe webhook handler.
//!
//! Signature verification happens before anything is parsed. Each handled
//! event moves the payments of one `PaymentIntent` along a single allowed
//! status edge, so replays and out-of-order deliveries are no-ops.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::instrument;

use stridewell_core::PaymentStatus;

use crate::db::PaymentRepository;
use crate::error::{AppError, Result};
use crate::services::stripe::{StripeError, WebhookEvent};
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "stripe-signature";

/// A status change requested by a webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Transition {
    intent_id: String,
    from: PaymentStatus,
    to: PaymentStatus,
    charge_id: Option<String>,
}

/// Map an event to the transition it asks for. `None` for events we ignore.
fn transition_for(event: &WebhookEvent) -> Option<Transition> {
    let object = &event.data.object;
    let (intent_id, from, to, charge_id) = match event.event_type.as_str() {
        "payment_intent.succeeded" => (
            object.id.clone(),
            PaymentStatus::Pending,
            PaymentStatus::Completed,
            object.latest_charge.clone(),
        ),
        "payment_intent.payment_failed" => (
            object.id.clone(),
            PaymentStatus::Pending,
            PaymentStatus::Failed,
            None,
        ),
        "payment_intent.canceled" => (
            object.id.clone(),
            PaymentStatus::Pending,
            PaymentStatus::Cancelled,
            None,
        ),
        "charge.refunded" => (
            object.payment_intent.clone()?,
            PaymentStatus::Completed,
            PaymentStatus::Refunded,
            Some(object.id.clone()),
        ),
        _ => return None,
    };

    Some(Transition {
        intent_id,
        from,
        to,
        charge_id,
    })
}

/// Receive a Stripe event.
#[instrument(skip(state, headers, body), fields(event_id = tracing::field::Empty))]
pub async fn stripe(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let stripe = state
        .stripe()
        .ok_or_else(|| AppError::NotFound("stripe webhooks are not enabled".to_string()))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| StripeError::InvalidSignature("Missing Stripe-Signature".to_string()))?;

    let event = stripe.construct_event(&body, signature)?;
    tracing::Span::current().record("event_id", event.id.as_str());

    let Some(transition) = transition_for(&event) else {
        tracing::debug!(event_id = %event.id, event_type = %event.event_type, "Ignoring Stripe event");
        return Ok((StatusCode::OK, Json(serde_json::json!({ "received": true }))));
    };

    let updated = PaymentRepository::new(state.pool())
        .transition_by_intent(
            &transition.intent_id,
            transition.from,
            transition.to,
            transition.charge_id.as_deref(),
        )
        .await?;

    tracing::info!(
        event_id = %event.id,
        event_type = %event.event_type,
        payment_intent_id = %transition.intent_id,
        to = %transition.to,
        updated,
        "Stripe event applied"
    );

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "received": true, "updated": updated })),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn event(event_type: &str, object: serde_json::Value) -> WebhookEvent {
        serde_json::from_value(serde_json::json!({
            "id": "evt_1",
            "type": event_type,
            "data": { "object": object }
        }))
        .unwrap()
    }

    #[test]
    fn test_succeeded_records_charge() {
        let t = transition_for(&event(
            "payment_intent.succeeded",
            serde_json::json!({ "id": "pi_1", "latest_charge": "ch_1" }),
        ))
        .unwrap();
        assert_eq!(t.intent_id, "pi_1");
        assert_eq!(t.from, PaymentStatus::Pending);
        assert_eq!(t.to, PaymentStatus::Completed);
        assert_eq!(t.charge_id.as_deref(), Some("ch_1"));
    }

    #[test]
    fn test_failure_and_cancel() {
        let failed = transition_for(&event(
            "payment_intent.payment_failed",
            serde_json::json!({ "id": "pi_2" }),
        ))
        .unwrap();
        assert_eq!(failed.to, PaymentStatus::Failed);

        let cancelled = transition_for(&event(
            "payment_intent.canceled",
            serde_json::json!({ "id": "pi_3" }),
        ))
        .unwrap();
        assert_eq!(cancelled.to, PaymentStatus::Cancelled);
        assert_eq!(cancelled.charge_id, None);
    }

    #[test]
    fn test_refund_matches_by_payment_intent() {
        let t = transition_for(&event(
            "charge.refunded",
            serde_json::json!({ "id": "ch_9", "payment_intent": "pi_9" }),
        ))
        .unwrap();
        assert_eq!(t.intent_id, "pi_9");
        assert_eq!(t.from, PaymentStatus::Completed);
        assert_eq!(t.to, PaymentStatus::Refunded);

        let orphan = event("charge.refunded", serde_json::json!({ "id": "ch_10" }));
        assert!(transition_for(&orphan).is_none());
    }

    #[test]
    fn test_transitions_are_allowed_edges() {
        for event_type in [
            "payment_intent.succeeded",
            "payment_intent.payment_failed",
            "payment_intent.canceled",
        ] {
            let t = transition_for(&event(event_type, serde_json::json!({ "id": "pi" }))).unwrap();
            assert!(t.from.can_transition_to(t.to));
        }
    }

    #[test]
    fn test_unknown_events_ignored() {
        let e = event("customer.created", serde_json::json!({ "id": "cus_1" }));
        assert!(transition_for(&e).is_none());
    }
}
