//! Catalog product types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use verdant_core::{Category, CategoryFilter, Price, PriceRange, ProductId, ProductSort};

/// A product as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: Category,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated fields for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: Category,
    pub image_url: String,
}

/// Which slice of the catalog a homepage sample draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleScope {
    Any,
    In(Category),
    NotIn(Category),
}

impl SampleScope {
    /// Whether `product` belongs to this slice.
    #[must_use]
    pub fn includes(self, product: &Product) -> bool {
        match self {
            Self::Any => true,
            Self::In(c) => product.category == c,
            Self::NotIn(c) => product.category != c,
        }
    }
}

/// Listing options for the product browser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: CategoryFilter,
    pub price: PriceRange,
    pub sort: ProductSort,
}

impl ProductFilter {
    /// Whether `product` passes the category and price constraints.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.category
            .category()
            .is_none_or(|c| c == product.category)
            && self.price.contains(product.price)
    }
}
