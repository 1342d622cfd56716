//! Activity log for the signed-in user.

use axum::{Json, extract::State};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::ActivityService;
use crate::state::AppState;

/// The user's own activities, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let activities = ActivityService::new(state.store())
        .list_for_user(user.id)
        .await?;

    Ok(Json(json!({ "success": true, "activities": activities })))
}
