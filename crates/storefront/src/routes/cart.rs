//! Cart route handlers.
//!
//! The cart lives in the visitor's session under [`session_keys::CART`], so
//! anonymous visitors can shop and the cart survives login and logout.

use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use stridewell_core::{Cart, CartError, CartLine, ProductId};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::session_keys;
use crate::state::AppState;

/// Cart as returned to the client.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total: Decimal,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.lines().to_vec(),
            total: cart.total(),
            item_count: cart.item_count(),
        }
    }
}

/// Body for adding a line.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub size: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Body for changing a line's quantity.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub product_id: ProductId,
    pub size: Option<String>,
    pub quantity: i64,
}

/// Body identifying a line.
#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest {
    pub product_id: ProductId,
    pub size: Option<String>,
}

/// Load the session cart, empty if there is none.
pub(crate) async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Store the cart. Any change to the cart gets a new checkout reference.
pub(crate) async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    rotate_checkout_ref(session).await?;
    Ok(())
}

async fn rotate_checkout_ref(session: &Session) -> Result<Uuid> {
    let checkout_ref = Uuid::new_v4();
    session
        .insert(session_keys::CHECKOUT_REF, checkout_ref)
        .await?;
    Ok(checkout_ref)
}

/// Reference for checking out the cart as it is now.
///
/// Requests that see the same cart see the same reference, which is what
/// lets the checkout reject a double submission.
pub(crate) async fn checkout_ref(session: &Session) -> Result<Uuid> {
    match session.get::<Uuid>(session_keys::CHECKOUT_REF).await? {
        Some(checkout_ref) => Ok(checkout_ref),
        None => rotate_checkout_ref(session).await,
    }
}

fn cart_error(err: CartError) -> AppError {
    match err {
        CartError::LineNotFound => AppError::NotFound(err.to_string()),
        CartError::InvalidQuantity => AppError::BadRequest(err.to_string()),
    }
}

/// Show the cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Add a product to the cart.
#[instrument(skip(state, session, body), fields(product_id = %body.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    let product = ProductRepository::new(state.pool())
        .get_active(body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", body.product_id)))?;

    let size = stridewell_core::catalog::non_empty(body.size);
    if !product.accepts_size(size.as_deref()) {
        return Err(AppError::BadRequest(if product.sizes.is_empty() {
            "this product has no sizes".to_string()
        } else {
            format!("size must be one of: {}", product.sizes.join(", "))
        }));
    }

    let mut cart = load_cart(&session).await?;
    cart.add(CartLine {
        product_id: product.id,
        size,
        quantity: body.quantity,
        title: product.title,
        unit_price: product.price,
    })
    .map_err(cart_error)?;
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Change a line's quantity. Zero or less removes the line.
#[instrument(skip(session, body), fields(product_id = %body.product_id))]
pub async fn update(
    session: Session,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    let size = stridewell_core::catalog::non_empty(body.size);
    cart.update_quantity(body.product_id, size.as_deref(), body.quantity)
        .map_err(cart_error)?;
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Remove a line.
#[instrument(skip(session, body), fields(product_id = %body.product_id))]
pub async fn remove(
    session: Session,
    Json(body): Json<RemoveItemRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    let size = stridewell_core::catalog::non_empty(body.size);
    if !cart.remove(body.product_id, size.as_deref()) {
        return Err(cart_error(CartError::LineNotFound));
    }
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<StatusCode> {
    session.remove::<Cart>(session_keys::CART).await?;
    rotate_checkout_ref(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_checkout_ref_is_stable_until_the_cart_changes() {
        let session = session();
        let first = checkout_ref(&session).await.unwrap();
        assert_eq!(checkout_ref(&session).await.unwrap(), first);

        let mut cart = Cart::new();
        cart.add(CartLine {
            product_id: ProductId::new(7),
            size: None,
            quantity: 1,
            title: "Court Classic".into(),
            unit_price: Decimal::new(399_900, 2),
        })
        .unwrap();
        save_cart(&session, &cart).await.unwrap();
        let after_add = checkout_ref(&session).await.unwrap();
        assert_ne!(after_add, first);
        assert_eq!(checkout_ref(&session).await.unwrap(), after_add);

        clear(session.clone()).await.unwrap();
        assert_ne!(checkout_ref(&session).await.unwrap(), after_add);
        assert!(load_cart(&session).await.unwrap().is_empty());
    }

    #[test]
    fn test_cart_view_totals() {
        let mut cart = Cart::new();
        cart.add(CartLine {
            product_id: ProductId::new(1),
            size: Some("42".into()),
            quantity: 2,
            title: "Trail Runner".into(),
            unit_price: Decimal::new(4_599, 0),
        })
        .unwrap();

        let view = CartView::from(&cart);
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.total, Decimal::new(9_198, 0));
        assert_eq!(view.item_count, 2);
    }

    #[test]
    fn test_add_item_quantity_defaults_to_one() {
        let body: AddItemRequest =
            serde_json::from_str(r#"{"product_id": 7, "size": "42"}"#).unwrap();
        assert_eq!(body.quantity, 1);
        assert_eq!(body.product_id, ProductId::new(7));
    }

    #[test]
    fn test_cart_error_mapping() {
        assert!(matches!(
            cart_error(CartError::LineNotFound),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            cart_error(CartError::InvalidQuantity),
            AppError::BadRequest(_)
        ));
    }
}
