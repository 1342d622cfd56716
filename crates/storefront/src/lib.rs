//! Verdant Storefront library.
//!
//! JSON API for a sustainable-living shop: catalog browsing, carts,
//! checkout, reviews, activity history and a small admin panel. The binary
//! in `main.rs` wires this to `PostgreSQL`; tests drive [`app`] directly
//! with the in-memory store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, extract::Request, middleware::from_fn};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;

use crate::middleware::{
    RateLimitConfigError, SessionKeyError, create_session_layer, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// The router could not be assembled from the configuration.
#[derive(Debug, Error)]
pub enum AppBuildError {
    #[error(transparent)]
    Session(#[from] SessionKeyError),

    #[error(transparent)]
    RateLimit(#[from] RateLimitConfigError),
}

/// Build the full storefront router.
///
/// # Middleware Order (outermost first)
///
/// `TraceLayer`, request ID, security headers, session, then the
/// per-group rate limiters. Sentry layers are added by the binary.
///
/// # Errors
///
/// Returns `AppBuildError` if the session secret or a limiter quota is
/// unusable.
pub fn app<S>(state: AppState, session_store: S) -> Result<Router, AppBuildError>
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(session_store, state.config())?;

    let router = routes::routes(state.config().rate_limiting)?
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state);

    Ok(router)
}
