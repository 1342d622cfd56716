//! Checkout and order history.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::OrderService;
use crate::state::AppState;

/// Turn the cart into an order and empty it.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<(StatusCode, Json<Value>)> {
    let order = OrderService::new(state.store()).place_order(user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": order })),
    ))
}

/// Every order the user has placed, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn history(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let orders = OrderService::new(state.store()).list_orders(user.id).await?;
    Ok(Json(json!({ "orders": orders })))
}
