//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness check
//! GET    /health/ready            - Readiness check (pings the store)
//!
//! # Auth (strict rate limit)
//! POST   /auth/sign-up            - Register and start a session
//! POST   /auth/sign-in            - Password sign-in
//! POST   /auth/sign-out           - End the session
//! POST   /auth/get-user           - Current user's profile
//! POST   /auth/update-user        - Edit profile / change password
//!
//! # Catalog
//! GET    /products                - Homepage sample (?category=)
//! GET    /products/filters        - Filtered, sorted, paginated listing
//! GET    /products/search         - Free-text search
//! GET    /products/{id}           - Product detail
//!
//! # Cart (requires auth)
//! GET    /cart                    - Cart lines
//! POST   /cart                    - Add a product
//! DELETE /cart/{productId}        - Remove one product
//! DELETE /cart                    - Empty the cart
//!
//! # Orders (requires auth)
//! POST   /order                   - Check out the cart
//! GET    /order/get-orders        - Order history
//!
//! # Reviews
//! GET    /review                  - Public review feed
//! POST   /review                  - Review a purchased product (requires auth)
//!
//! # Activity
//! GET    /user/activities         - Own activity log (requires auth)
//!
//! # Admin (requires admin)
//! GET    /admin/user/activities   - Everyone's activity log
//! GET    /admin/products          - Full catalog
//! POST   /admin/product/add       - Create a product
//! POST   /admin/product/edit      - Replace a product
//! DELETE /admin/product/delete    - Delete a product without history
//! ```

pub mod activities;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;
pub mod reviews;

use axum::{
    Router,
    middleware::map_response,
    routing::{delete, get, post},
};

use crate::config::RateLimiting;
use crate::middleware::{
    RateLimitConfigError, api_rate_limiter, auth_rate_limiter, rate_limited_json,
};
use crate::state::AppState;

/// Create the health check routes router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(auth::sign_up))
        .route("/sign-in", post(auth::sign_in))
        .route("/sign-out", post(auth::sign_out))
        .route("/get-user", post(auth::get_user))
        .route("/update-user", post(auth::update_user))
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::homepage))
        .route("/filters", get(products::filter))
        .route("/search", get(products::search))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add).delete(cart::clear))
        .route("/{product_id}", delete(cart::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::place))
        .route("/get-orders", get(orders::history))
}

/// Create the review routes router.
pub fn review_routes() -> Router<AppState> {
    Router::new().route("/", get(reviews::index).post(reviews::create))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/user/activities", get(admin::activities))
        .route("/products", get(admin::products))
        .route("/product/add", post(admin::add_product))
        .route("/product/edit", post(admin::edit_product))
        .route("/product/delete", delete(admin::delete_product))
}

/// Assemble every route group, attaching rate limiters when enabled.
///
/// # Errors
///
/// Returns `RateLimitConfigError` if a limiter quota is invalid.
pub fn routes(rate_limiting: RateLimiting) -> Result<Router<AppState>, RateLimitConfigError> {
    let mut auth = auth_routes();
    let mut api = Router::new()
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/order", order_routes())
        .nest("/review", review_routes())
        .route("/user/activities", get(activities::index))
        .nest("/admin", admin_routes());

    if matches!(rate_limiting, RateLimiting::Enabled) {
        auth = auth
            .layer(auth_rate_limiter()?)
            .layer(map_response(rate_limited_json));
        api = api
            .layer(api_rate_limiter()?)
            .layer(map_response(rate_limited_json));
    }

    Ok(Router::new()
        .merge(health_routes())
        .nest("/auth", auth)
        .merge(api))
}
