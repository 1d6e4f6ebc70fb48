//! Checkout route handlers.

use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use stridewell_core::cart::MAX_LINE_QUANTITY;
use stridewell_core::{Cart, CartLine, ProductId};

use super::cart::{checkout_ref, load_cart, save_cart};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::checkout::{CheckoutReceipt, CheckoutService};
use crate::state::AppState;

/// Body for a single-product checkout.
#[derive(Debug, Deserialize)]
pub struct BuyNowRequest {
    pub product_id: ProductId,
    pub size: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

fn service(state: &AppState) -> CheckoutService<'_> {
    let config = state.config();
    CheckoutService::new(
        state.pool(),
        config.checkout_mode,
        state.stripe(),
        &config.currency,
    )
}

/// Check out the session cart.
///
/// The cart is cleared only once the payment rows are committed; a failed
/// checkout leaves it untouched. A second submission of the same cart, for
/// example a double click, gets 409 instead of a second set of payments.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<(StatusCode, Json<CheckoutReceipt>)> {
    let cart = load_cart(&session).await?;
    let checkout_ref = checkout_ref(&session).await?;
    let receipt = service(&state)
        .checkout(user.id, cart.lines(), checkout_ref)
        .await?;

    save_cart(&session, &Cart::new()).await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Buy one product directly, leaving the cart alone.
#[instrument(skip(state, user, body), fields(user_id = %user.id, product_id = %body.product_id))]
pub async fn buy_now(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<BuyNowRequest>,
) -> Result<(StatusCode, Json<CheckoutReceipt>)> {
    if body.quantity == 0 || body.quantity > MAX_LINE_QUANTITY {
        return Err(AppError::BadRequest(format!(
            "quantity must be between 1 and {MAX_LINE_QUANTITY}"
        )));
    }

    // Title and price are filled in from the catalog during checkout.
    let line = CartLine {
        product_id: body.product_id,
        size: stridewell_core::catalog::non_empty(body.size),
        quantity: body.quantity,
        title: String::new(),
        unit_price: Decimal::ZERO,
    };
    let receipt = service(&state)
        .checkout(user.id, &[line], Uuid::new_v4())
        .await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}
