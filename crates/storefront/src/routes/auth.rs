//! Authentication route handlers.
//!
//! Password sign-up and sign-in backed by the signed session cookie, plus
//! profile reads and edits for the signed-in user.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, RequireAuth, set_current_user, sign_in_expiry};
use crate::models::{CurrentUser, User, UserProfile};
use crate::services::{AuthService, ProfileUpdate};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub category: String,
}

/// Sign-in request body.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new account and sign it in.
///
/// New accounts get the long-lived session, as if "remember me" were ticked.
#[instrument(skip(state, session, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(form) = payload?;

    let user = AuthService::new(state.store())
        .sign_up(&form.name, &form.email, &form.password, &form.category)
        .await?;

    start_session(&session, &user, true).await?;
    tracing::info!(user_id = %user.id, "User signed up");

    Ok(Json(json!({ "success": true })))
}

/// Password sign-in.
#[instrument(skip(state, session, payload))]
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(form) = payload?;

    let user = AuthService::new(state.store())
        .sign_in(&form.email, &form.password)
        .await?;

    start_session(&session, &user, form.remember).await?;
    tracing::info!(user_id = %user.id, remember = form.remember, "User signed in");

    Ok(Json(json!({ "success": true })))
}

/// End the session. Succeeds whether or not anyone was signed in.
#[instrument(skip(state, session, user))]
pub async fn sign_out(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<Value>> {
    if let Some(user) = user {
        AuthService::new(state.store()).sign_out(user.id).await;
        tracing::info!(user_id = %user.id, "User signed out");
    }

    session.flush().await?;
    clear_sentry_user();

    Ok(Json(json!({ "success": true })))
}

/// The signed-in user's public profile, read fresh from the store.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_user(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let user = AuthService::new(state.store()).get_user(user.id).await?;

    Ok(Json(json!({
        "success": true,
        "user": UserProfile::from(&user),
    })))
}

/// Apply a profile edit and refresh the session snapshot.
#[instrument(skip(state, session, user, payload), fields(user_id = %user.id))]
pub async fn update_user(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    payload: std::result::Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(update) = payload?;

    let updated = AuthService::new(state.store())
        .update_user(user.id, update)
        .await?;

    set_current_user(&session, &CurrentUser::from(&updated)).await?;

    Ok(Json(json!({ "success": true })))
}

// =============================================================================
// Helpers
// =============================================================================

/// Rotate the session id, then attach the user to it.
async fn start_session(session: &Session, user: &User, remember: bool) -> Result<()> {
    session.cycle_id().await?;
    session.set_expiry(Some(sign_in_expiry(remember)));
    set_current_user(session, &CurrentUser::from(user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}
