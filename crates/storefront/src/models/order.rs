//! Order types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use verdant_core::{OrderId, OrderItemId, Price, ProductId, Quantity, UserId};

use super::cart::CartItem;
use super::product::Product;

/// A placed order. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: Price,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// An order line joined with the product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub product: Product,
}

/// What gets written for a new order, computed from the locked cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub total: Price,
    pub lines: Vec<OrderLine>,
}

/// One order line to insert. The unit price is not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

impl OrderDraft {
    /// Build a draft from cart lines priced at the products' current price.
    #[must_use]
    pub fn from_cart(items: &[CartItem]) -> Self {
        Self {
            total: items.iter().map(CartItem::line_total).sum(),
            lines: items
                .iter()
                .map(|item| OrderLine {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}
