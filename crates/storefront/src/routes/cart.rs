//! Cart route handlers.
//!
//! Every cart belongs to the signed-in user; there are no guest carts.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Number, Value, json};
use tracing::instrument;

use verdant_core::ProductId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::CartService;
use crate::services::cart::parse_quantity;
use crate::state::AppState;

/// Add-to-cart request body.
///
/// `quantity` is kept as a raw JSON number so fractional and negative
/// values can be rejected with a useful message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: Number,
}

/// Current cart lines.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let items = CartService::new(state.store()).get_cart(user.id).await?;
    Ok(Json(json!({ "success": true, "items": items })))
}

/// Add units of a product, merging with an existing line.
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: std::result::Result<Json<AddToCartRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(form) = payload?;
    let quantity = parse_quantity(&form.quantity)?;

    let items = CartService::new(state.store())
        .add_item(user.id, form.product_id, quantity)
        .await?;

    Ok(Json(json!({ "success": true, "items": items })))
}

/// Remove every unit of one product.
#[instrument(skip(state, user, product_id), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    product_id: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<Json<Value>> {
    let Path(product_id) = product_id?;

    let items = CartService::new(state.store())
        .remove_item(user.id, product_id)
        .await?;

    Ok(Json(json!({ "success": true, "items": items })))
}

/// Empty the cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    CartService::new(state.store()).clear_cart(user.id).await?;
    Ok(Json(json!({ "success": true, "items": [] })))
}
