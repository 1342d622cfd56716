//! Order processor.
//!
//! Checkout is a single storage transaction: the cart is locked, priced at
//! current product prices, written as an order and emptied. A concurrent
//! cart change lands either wholly before or wholly after it.

use thiserror::Error;
use tracing::instrument;

use verdant_core::{ActivityType, UserId};

use crate::db::{RepositoryError, Store};
use crate::models::Order;
use crate::services::activity::ActivityService;

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Places and lists orders.
pub struct OrderService<'a> {
    store: &'a dyn Store,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Turn the user's cart into an order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EmptyCart` when there is no cart or it has no
    /// lines. Nothing is written in that case.
    #[instrument(skip(self))]
    pub async fn place_order(&self, user_id: UserId) -> Result<Order, OrderError> {
        let order = self
            .store
            .place_order(user_id)
            .await?
            .ok_or(OrderError::EmptyCart)?;

        tracing::info!(order_id = %order.id, total = %order.total, "Order placed");

        ActivityService::new(self.store)
            .record(user_id, ActivityType::PlaceOrder)
            .await;

        Ok(order)
    }

    /// Every order of the user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` on storage failure.
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.list_orders(user_id).await?)
    }
}
