//! Review route handlers.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use verdant_core::{OrderId, ProductId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::ReviewQuery;
use crate::routes::products::page_request;
use crate::services::ReviewService;
use crate::state::AppState;

/// Default page size when only `page` is given.
const REVIEW_PAGE_SIZE: u32 = 10;

/// Query parameters for the review feed. Without `page` or `pageSize`
/// every matching review is returned.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewFeedQuery {
    pub product_id: Option<ProductId>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// New review request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub rating: i64,
    pub comment: String,
}

/// Public review feed, newest first.
#[instrument(skip(state, query))]
pub async fn index(
    State(state): State<AppState>,
    query: std::result::Result<Query<ReviewFeedQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query?;

    let page = if query.page.is_some() || query.page_size.is_some() {
        Some(page_request(query.page, query.page_size, REVIEW_PAGE_SIZE)?)
    } else {
        None
    };

    let reviews = ReviewService::new(state.store())
        .list_reviews(ReviewQuery {
            product_id: query.product_id,
            page,
        })
        .await?;

    Ok(Json(json!({ "success": true, "data": reviews })))
}

/// Review a product from one of the user's orders.
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: std::result::Result<Json<CreateReviewRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    let Json(form) = payload?;

    let review = ReviewService::new(state.store())
        .create_review(
            user.id,
            form.order_id,
            form.product_id,
            form.rating,
            &form.comment,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": review })),
    ))
}
