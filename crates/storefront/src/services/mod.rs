//! Business logic services for the storefront.
//!
//! Each service borrows the shared [`Store`](crate::db::Store) and is built
//! per request from `AppState`.
//!
//! # Services
//!
//! - `auth` - Sign-up, password sign-in and profile updates (argon2)
//! - `cart` - Per-user cart mutations
//! - `orders` - Checkout and order history
//! - `reviews` - Review creation with purchase checks, public feed
//! - `catalog` - Filtering, search, homepage sampling and admin product CRUD
//! - `activity` - Best-effort audit trail

pub mod activity;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod reviews;

pub use activity::ActivityService;
pub use auth::{AuthError, AuthService, ProfileUpdate};
pub use cart::{CartError, CartService};
pub use catalog::{CatalogError, CatalogService, ProductCache, ProductForm};
pub use orders::{OrderError, OrderService};
pub use reviews::{ReviewError, ReviewService};
