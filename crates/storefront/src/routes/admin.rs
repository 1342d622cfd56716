//! Admin panel route handlers.
//!
//! Every handler takes [`RequireAdmin`], which re-checks the admin flag
//! against the store on each request.

use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use verdant_core::ProductId;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::{ActivityService, CatalogService, ProductForm};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Product fields sent by the admin form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub image_url: String,
}

impl From<ProductRequest> for ProductForm {
    fn from(req: ProductRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            price: req.price,
            category: req.category,
            image_url: req.image_url,
        }
    }
}

/// Edit request: the product id plus its replacement fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditProductRequest {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub image_url: String,
}

/// Delete request body.
#[derive(Debug, Deserialize)]
pub struct DeleteProductRequest {
    pub id: ProductId,
}

// =============================================================================
// Handlers
// =============================================================================

/// Every user's activities, with the user's public profile.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn activities(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Value>> {
    let activities = ActivityService::new(state.store()).list_all().await?;
    Ok(Json(json!({ "success": true, "activities": activities })))
}

/// The full catalog.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn products(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Value>> {
    let products = CatalogService::new(state.store(), state.product_cache())
        .list_products()
        .await?;

    Ok(Json(json!({ "success": true, "products": products })))
}

/// Create a product.
#[instrument(skip(state, admin, payload), fields(admin_id = %admin.id))]
pub async fn add_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    payload: std::result::Result<Json<ProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    let Json(form) = payload?;

    let product = CatalogService::new(state.store(), state.product_cache())
        .create_product(form.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "product": product })),
    ))
}

/// Replace a product's fields.
#[instrument(skip(state, admin, payload), fields(admin_id = %admin.id))]
pub async fn edit_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    payload: std::result::Result<Json<EditProductRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(req) = payload?;
    let form = ProductForm {
        name: req.name,
        description: req.description,
        price: req.price,
        category: req.category,
        image_url: req.image_url,
    };

    let product = CatalogService::new(state.store(), state.product_cache())
        .update_product(req.id, form)
        .await?;

    Ok(Json(json!({ "success": true, "product": product })))
}

/// Delete a product that has no order or review history.
#[instrument(skip(state, admin, payload), fields(admin_id = %admin.id))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    payload: std::result::Result<Json<DeleteProductRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(req) = payload?;

    CatalogService::new(state.store(), state.product_cache())
        .delete_product(req.id)
        .await?;

    Ok(Json(json!({ "success": true })))
}
