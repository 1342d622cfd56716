//! Verdant Core - Shared domain types.
//!
//! This crate provides the types used across all Verdant components:
//! - `storefront` - JSON storefront API (catalog, cart, orders, reviews, admin)
//! - `cli` - Command-line tools for migrations, catalog seeding and admin grants
//!
//! # Architecture
//!
//! The core crate contains only types and pure validation - no I/O, no database
//! access, no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, quantities, ratings,
//!   categories, catalog sorting and pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
