//! Cart manager.
//!
//! One cart per user, created lazily by the first add. The cart row is never
//! deleted, only emptied.

use serde_json::Number;
use thiserror::Error;
use tracing::instrument;

use verdant_core::{ActivityType, ProductId, Quantity, UserId};

use crate::db::{RepositoryError, Store};
use crate::models::CartItem;
use crate::services::activity::ActivityService;

/// Largest quantity a single add may request.
pub const MAX_QUANTITY_PER_ADD: i64 = 1000;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("{0}")]
    InvalidQuantity(String),

    #[error("Product not found")]
    ProductNotFound,

    #[error("Cart not found")]
    CartNotFound,

    #[error("a cart line can hold at most {} units", Quantity::MAX_PER_LINE)]
    LineLimitExceeded,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Validate a quantity taken straight from a JSON body.
///
/// Accepts whole numbers (including `2.0`) from 1 to
/// [`MAX_QUANTITY_PER_ADD`].
///
/// # Errors
///
/// Returns `CartError::InvalidQuantity` for fractional, non-positive or
/// oversized values.
pub fn parse_quantity(raw: &Number) -> Result<Quantity, CartError> {
    let whole = match raw.as_i64() {
        Some(n) => n,
        None => whole_from_float(raw.as_f64().unwrap_or(f64::NAN))?,
    };

    if !(1..=MAX_QUANTITY_PER_ADD).contains(&whole) {
        return Err(out_of_range());
    }

    Quantity::try_from(whole).map_err(|e| CartError::InvalidQuantity(e.to_string()))
}

/// A quantity sent as a float, such as `2.0`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn whole_from_float(value: f64) -> Result<i64, CartError> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(CartError::InvalidQuantity(
            "quantity must be a whole number".to_owned(),
        ));
    }
    if !(1.0..=MAX_QUANTITY_PER_ADD as f64).contains(&value) {
        return Err(out_of_range());
    }
    // Whole and in range, so the cast is exact.
    Ok(value as i64)
}

fn out_of_range() -> CartError {
    CartError::InvalidQuantity(format!(
        "quantity must be between 1 and {MAX_QUANTITY_PER_ADD}"
    ))
}

/// Per-user cart operations.
pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Current lines, empty when the user has never added anything.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on storage failure.
    pub async fn get_cart(&self, user_id: UserId) -> Result<Vec<CartItem>, CartError> {
        Ok(self.store.get_cart(user_id).await?.unwrap_or_default())
    }

    /// Add `quantity` units of a product, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` for an unknown product and
    /// `CartError::LineLimitExceeded` if the merged line would pass
    /// [`Quantity::MAX_PER_LINE`]; the cart is left unchanged then.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Vec<CartItem>, CartError> {
        let items = self
            .store
            .add_item(user_id, product_id, quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CartError::ProductNotFound,
                RepositoryError::Conflict(_) => CartError::LineLimitExceeded,
                other => CartError::Repository(other),
            })?;

        ActivityService::new(self.store)
            .record(user_id, ActivityType::AddToCart)
            .await;

        Ok(items)
    }

    /// Drop every line for `product_id`. Removing an absent product is a
    /// no-op that still returns the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` when the user has no cart.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Vec<CartItem>, CartError> {
        let items = self
            .store
            .remove_item(user_id, product_id)
            .await
            .map_err(not_found_as_missing_cart)?;

        ActivityService::new(self.store)
            .record(user_id, ActivityType::RemoveFromCart)
            .await;

        Ok(items)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` when the user has no cart.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: UserId) -> Result<(), CartError> {
        self.store
            .clear_cart(user_id)
            .await
            .map_err(not_found_as_missing_cart)?;

        ActivityService::new(self.store)
            .record(user_id, ActivityType::ClearCart)
            .await;

        Ok(())
    }
}

fn not_found_as_missing_cart(e: RepositoryError) -> CartError {
    match e {
        RepositoryError::NotFound => CartError::CartNotFound,
        other => CartError::Repository(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn number(raw: &str) -> Number {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_parse_quantity_accepts_whole_numbers() {
        assert_eq!(parse_quantity(&number("3")).unwrap().get(), 3);
        assert_eq!(parse_quantity(&number("2.0")).unwrap().get(), 2);
        assert_eq!(parse_quantity(&number("1000")).unwrap().get(), 1000);
        assert_eq!(parse_quantity(&number("1000.0")).unwrap().get(), 1000);
    }

    #[test]
    fn test_parse_quantity_rejects_bad_values() {
        for raw in ["0", "-1", "0.0", "1.5", "1001", "1001.0", "1e30", "-1e30", "18446744073709551615"] {
            assert!(
                matches!(
                    parse_quantity(&number(raw)),
                    Err(CartError::InvalidQuantity(_))
                ),
                "{raw} should be rejected"
            );
        }
    }
}
