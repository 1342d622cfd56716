//! `PostgreSQL` review repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use tracing::instrument;

use verdant_core::{OrderId, ProductId, Rating, ReviewId, UserId};

use super::{PgStore, RepositoryError, ReviewStore, parse_category};
use crate::models::{NewReview, Review, ReviewQuery, ReviewWithAuthor, Reviewer};

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    user_id: UserId,
    order_id: OrderId,
    product_id: ProductId,
    rating: Rating,
    comment: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            order_id: row.order_id,
            product_id: row.product_id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewWithAuthorRow {
    #[sqlx(flatten)]
    review: ReviewRow,
    author_name: String,
    author_category: String,
}

impl TryFrom<ReviewWithAuthorRow> for ReviewWithAuthor {
    type Error = RepositoryError;

    fn try_from(row: ReviewWithAuthorRow) -> Result<Self, Self::Error> {
        let user = Reviewer {
            id: row.review.user_id,
            name: row.author_name,
            category: parse_category(&row.author_category)?,
        };
        Ok(Self {
            review: row.review.into(),
            user,
        })
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn find_review(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<Review>, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT id, user_id, order_id, product_id, rating, comment, created_at, updated_at
            FROM storefront.review
            WHERE user_id = $1 AND product_id = $2
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Review::from))
    }

    #[instrument(skip(self, review), fields(user_id = %review.user_id, product_id = %review.product_id))]
    async fn create_review(&self, review: NewReview) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            INSERT INTO storefront.review (user_id, order_id, product_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, order_id, product_id, rating, comment, created_at, updated_at
            ",
        )
        .bind(review.user_id)
        .bind(review.order_id)
        .bind(review.product_id)
        .bind(review.rating)
        .bind(&review.comment)
        .fetch_one(self.pool())
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "review already exists"))?;

        Ok(row.into())
    }

    async fn list_reviews(
        &self,
        query: ReviewQuery,
    ) -> Result<Vec<ReviewWithAuthor>, RepositoryError> {
        let mut select = QueryBuilder::<Postgres>::new(
            r"
            SELECT r.id, r.user_id, r.order_id, r.product_id, r.rating, r.comment,
                   r.created_at, r.updated_at,
                   u.name AS author_name, u.category AS author_category
            FROM storefront.review r
            JOIN storefront.user u ON u.id = r.user_id
            ",
        );
        if let Some(product_id) = query.product_id {
            select.push(" WHERE r.product_id = ").push_bind(product_id);
        }
        select.push(" ORDER BY r.created_at DESC, r.id DESC");
        if let Some(page) = query.page {
            select
                .push(" LIMIT ")
                .push_bind(page.limit())
                .push(" OFFSET ")
                .push_bind(page.offset());
        }

        let rows = select
            .build_query_as::<ReviewWithAuthorRow>()
            .fetch_all(self.pool())
            .await?;

        rows.into_iter().map(ReviewWithAuthor::try_from).collect()
    }
}
