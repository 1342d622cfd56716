//! Core types for Verdant.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod activity;
pub mod catalog;
pub mod email;
pub mod id;
pub mod page;
pub mod price;
pub mod quantity;
pub mod rating;

pub use activity::ActivityType;
pub use catalog::{Category, CatalogParseError, CategoryFilter, PriceRange, ProductSort};
pub use email::{Email, EmailError};
pub use id::*;
pub use page::{PageRequest, PageRequestError, Pagination};
pub use price::{Price, PriceError};
pub use quantity::{Quantity, QuantityError};
pub use rating::{Rating, RatingError};
