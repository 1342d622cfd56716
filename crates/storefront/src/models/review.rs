//! Review types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use verdant_core::{Category, OrderId, PageRequest, ProductId, Rating, ReviewId, UserId};

/// A stored review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub rating: Rating,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public author details shown next to a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reviewer {
    pub id: UserId,
    pub name: String,
    pub category: Category,
}

/// A review joined with its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    pub user: Reviewer,
}

/// A validated review to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub user_id: UserId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub rating: Rating,
    pub comment: String,
}

/// Listing options for the public review feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewQuery {
    pub product_id: Option<ProductId>,
    /// `None` returns every matching review.
    pub page: Option<PageRequest>,
}
