//! Storage layer for the storefront.
//!
//! # Database: schema `storefront`
//!
//! ## Tables
//!
//! - `user` - Shopper accounts (argon2 password hash, preferred category, admin flag)
//! - `product` - Catalog
//! - `cart` / `cart_item` - One cart per user, one line per product
//! - `order` / `order_item` - Immutable orders; line prices are not stored
//! - `review` - At most one per (user, product)
//! - `activity` - Append-only audit trail
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Backends
//!
//! Handlers and services only see the [`Store`] trait family. [`PgStore`]
//! is the production backend; [`InMemoryStore`] backs tests and local demos.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p verdant-cli -- migrate
//! ```

mod activities;
mod carts;
pub mod memory;
mod orders;
mod products;
mod reviews;
mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use verdant_core::{ActivityType, Email, OrderId, PageRequest, ProductId, Quantity, UserId};

use crate::models::{
    Activity, ActivityWithUser, CartItem, NewReview, NewUser, Order, Product, ProductFilter,
    ProductInput, Review, ReviewQuery, ReviewWithAuthor, SampleScope, User, UserChanges,
};

pub use memory::InMemoryStore;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique and foreign-key violations to `Conflict`, leaving other
    /// errors as `Database`.
    pub(crate) fn from_constraint(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
        {
            return Self::Conflict(what.to_owned());
        }
        Self::Database(err)
    }
}

/// A merged cart line would exceed [`Quantity::MAX_PER_LINE`].
pub(crate) fn line_limit_exceeded() -> RepositoryError {
    RepositoryError::Conflict(format!(
        "a cart line can hold at most {} units",
        Quantity::MAX_PER_LINE
    ))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Account persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account. `Conflict` if the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// The account and its password hash, for sign-in.
    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError>;

    /// Apply a partial update. `NotFound` for an unknown user, `Conflict` if
    /// the new email is taken.
    async fn update_user(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<User, RepositoryError>;

    /// Grant or revoke admin rights. `NotFound` for an unknown email.
    async fn set_admin(&self, email: &Email, is_admin: bool) -> Result<User, RepositoryError>;
}

/// Catalog reads and admin writes.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// One page of products matching `filter`, plus the total match count.
    async fn filter_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<Product>, u64), RepositoryError>;

    /// Case-insensitive substring search over name and description, ordered
    /// by name. `term` is matched literally.
    async fn search_products(
        &self,
        term: &str,
        page: PageRequest,
    ) -> Result<(Vec<Product>, u64), RepositoryError>;

    /// Up to `limit` products from `scope`, in storage order.
    async fn sample_products(
        &self,
        scope: SampleScope,
        limit: u32,
    ) -> Result<Vec<Product>, RepositoryError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn create_product(&self, input: &ProductInput) -> Result<Product, RepositoryError>;

    /// Replace a product's fields. `NotFound` for an unknown id.
    async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError>;

    /// `NotFound` for an unknown id, `Conflict` when orders or reviews
    /// reference the product.
    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError>;
}

/// Per-user carts. Every mutation is serialized per cart.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Lines of the user's cart, or `None` if no cart exists yet.
    async fn get_cart(&self, user_id: UserId) -> Result<Option<Vec<CartItem>>, RepositoryError>;

    /// Create the cart if needed and add `quantity` to the product's line.
    /// `NotFound` if the product does not exist, `Conflict` (with nothing
    /// written) if the line would exceed [`Quantity::MAX_PER_LINE`].
    async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Vec<CartItem>, RepositoryError>;

    /// Drop the product's line. `NotFound` if the user has no cart.
    async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Vec<CartItem>, RepositoryError>;

    /// Drop every line. `NotFound` if the user has no cart.
    async fn clear_cart(&self, user_id: UserId) -> Result<(), RepositoryError>;
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Atomically turn the user's cart into an order.
    ///
    /// Locks the cart, prices its lines at current product prices, writes the
    /// order and its lines, then empties the cart. Returns `None` (and writes
    /// nothing) when the cart is missing or empty.
    async fn place_order(&self, user_id: UserId) -> Result<Option<Order>, RepositoryError>;

    /// Every order of the user, newest first.
    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// Whether `order_id` belongs to `user_id` and has a line for `product_id`.
    async fn order_contains(
        &self,
        user_id: UserId,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError>;
}

/// Review persistence.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn find_review(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<Review>, RepositoryError>;

    /// Insert a review. `Conflict` if the user already reviewed the product.
    async fn create_review(&self, review: NewReview) -> Result<Review, RepositoryError>;

    /// Reviews with author details, newest first.
    async fn list_reviews(
        &self,
        query: ReviewQuery,
    ) -> Result<Vec<ReviewWithAuthor>, RepositoryError>;
}

/// Append-only activity log.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn record_activity(
        &self,
        user_id: UserId,
        kind: ActivityType,
    ) -> Result<Activity, RepositoryError>;

    /// The user's own activities, newest first.
    async fn list_activities(&self, user_id: UserId) -> Result<Vec<Activity>, RepositoryError>;

    /// Every activity with its user, newest first.
    async fn list_all_activities(&self) -> Result<Vec<ActivityWithUser>, RepositoryError>;
}

/// Everything the storefront needs from its backing store.
#[async_trait]
pub trait Store:
    UserStore + CatalogStore + CartStore + OrderStore + ReviewStore + ActivityStore
{
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// `PostgreSQL`-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Parse a stored category name.
pub(crate) fn parse_category(raw: &str) -> Result<verdant_core::Category, RepositoryError> {
    raw.parse()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid category in database: {e}")))
}

/// Parse a stored email address.
pub(crate) fn parse_email(raw: &str) -> Result<Email, RepositoryError> {
    Email::parse(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category_reports_corruption() {
        assert!(parse_category("Save Water").is_ok());
        assert!(matches!(
            parse_category("Gardening"),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_parse_email_reports_corruption() {
        assert!(matches!(
            parse_email("not-an-email"),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_from_constraint_passes_through_other_errors() {
        let err = RepositoryError::from_constraint(sqlx::Error::RowNotFound, "x");
        assert!(matches!(err, RepositoryError::Database(_)));
    }
}
