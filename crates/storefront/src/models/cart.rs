//! Cart line types.

use serde::Serialize;

use verdant_core::{CartId, CartItemId, Price, ProductId, Quantity};

use super::product::Product;

/// A cart line joined with the current product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub product: Product,
}

impl CartItem {
    /// Line cost at the product's current price.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}
