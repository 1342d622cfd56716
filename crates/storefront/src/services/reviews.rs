//! Review ledger.
//!
//! A user may review a product once, and only for a product that appears in
//! one of their own orders.

use thiserror::Error;
use tracing::instrument;

use verdant_core::{ActivityType, OrderId, ProductId, Rating, UserId};

use crate::db::{RepositoryError, Store};
use crate::models::{NewReview, Review, ReviewQuery, ReviewWithAuthor};
use crate::services::activity::ActivityService;

/// Shortest accepted review comment, in characters.
pub const MIN_COMMENT_LENGTH: usize = 10;

/// Errors from review operations.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("{0}")]
    Validation(String),

    #[error("product was not purchased in this order")]
    NotPurchased,

    #[error("You have already reviewed this product")]
    DuplicateReview,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Reads and writes product reviews.
pub struct ReviewService<'a> {
    store: &'a dyn Store,
}

impl<'a> ReviewService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Create a review for a purchased product.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Validation` for a bad rating or short comment,
    /// `ReviewError::DuplicateReview` if the user already reviewed the
    /// product and `ReviewError::NotPurchased` if the order does not belong
    /// to the user or lacks the product.
    #[instrument(skip(self, comment))]
    pub async fn create_review(
        &self,
        user_id: UserId,
        order_id: OrderId,
        product_id: ProductId,
        rating: i64,
        comment: &str,
    ) -> Result<Review, ReviewError> {
        let rating = Rating::new(rating).map_err(|e| ReviewError::Validation(e.to_string()))?;
        let comment = comment.trim();
        if comment.chars().count() < MIN_COMMENT_LENGTH {
            return Err(ReviewError::Validation(format!(
                "comment must be at least {MIN_COMMENT_LENGTH} characters"
            )));
        }

        if self.store.find_review(user_id, product_id).await?.is_some() {
            return Err(ReviewError::DuplicateReview);
        }

        if !self
            .store
            .order_contains(user_id, order_id, product_id)
            .await?
        {
            return Err(ReviewError::NotPurchased);
        }

        let review = self
            .store
            .create_review(NewReview {
                user_id,
                order_id,
                product_id,
                rating,
                comment: comment.to_owned(),
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => ReviewError::DuplicateReview,
                other => ReviewError::Repository(other),
            })?;

        ActivityService::new(self.store)
            .record(user_id, ActivityType::CreateReview)
            .await;

        Ok(review)
    }

    /// Public review feed, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Repository` on storage failure.
    pub async fn list_reviews(
        &self,
        query: ReviewQuery,
    ) -> Result<Vec<ReviewWithAuthor>, ReviewError> {
        Ok(self.store.list_reviews(query).await?)
    }
}
