//! `PostgreSQL` catalog repository.
//!
//! Listing queries are assembled with `sqlx::QueryBuilder` so every optional
//! filter is still a bound parameter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use tracing::instrument;

use verdant_core::{PageRequest, Price, ProductId, ProductSort};

use super::{CatalogStore, PgStore, RepositoryError, parse_category};
use crate::models::{Product, ProductFilter, ProductInput, SampleScope};

/// Column list for `storefront.product`, unqualified.
const PRODUCT_COLUMNS: &str =
    "id, name, description, price, category, image_url, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(super) struct ProductRow {
    pub(super) id: ProductId,
    name: String,
    description: String,
    price: Price,
    category: String,
    image_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            category: parse_category(&row.category)?,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

fn into_count(total: i64) -> Result<u64, RepositoryError> {
    u64::try_from(total)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative row count: {total}")))
}

/// Escape `LIKE` wildcards so `term` matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    qb.push(" WHERE TRUE");
    if let Some(category) = filter.category.category() {
        qb.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(min) = filter.price.min() {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.price.max() {
        qb.push(" AND price <= ").push_bind(max);
    }
}

fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: SampleScope) {
    match scope {
        SampleScope::Any => {}
        SampleScope::In(category) => {
            qb.push(" WHERE category = ").push_bind(category.as_str());
        }
        SampleScope::NotIn(category) => {
            qb.push(" WHERE category <> ").push_bind(category.as_str());
        }
    }
}

const fn order_clause(sort: ProductSort) -> &'static str {
    match sort {
        ProductSort::None => " ORDER BY id",
        ProductSort::PriceAsc => " ORDER BY price ASC, id ASC",
        ProductSort::PriceDesc => " ORDER BY price DESC, id ASC",
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    #[instrument(skip(self))]
    async fn filter_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<Product>, u64), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM storefront.product");
        push_filter(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT ");
        select.push(PRODUCT_COLUMNS).push(" FROM storefront.product");
        push_filter(&mut select, filter);
        select
            .push(order_clause(filter.sort))
            .push(" LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool())
            .await?;

        Ok((into_products(rows)?, into_count(total)?))
    }

    #[instrument(skip(self))]
    async fn search_products(
        &self,
        term: &str,
        page: PageRequest,
    ) -> Result<(Vec<Product>, u64), RepositoryError> {
        let pattern = like_pattern(term);

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM storefront.product
            WHERE name ILIKE $1 OR description ILIKE $1
            ",
        )
        .bind(&pattern)
        .fetch_one(self.pool())
        .await?;

        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, category, image_url, created_at, updated_at
            FROM storefront.product
            WHERE name ILIKE $1 OR description ILIKE $1
            ORDER BY name ASC, id ASC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool())
        .await?;

        Ok((into_products(rows)?, into_count(total)?))
    }

    async fn sample_products(
        &self,
        scope: SampleScope,
        limit: u32,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut select = QueryBuilder::<Postgres>::new("SELECT ");
        select.push(PRODUCT_COLUMNS).push(" FROM storefront.product");
        push_scope(&mut select, scope);
        select.push(" ORDER BY id LIMIT ").push_bind(i64::from(limit));

        let rows = select
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool())
            .await?;
        into_products(rows)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, category, image_url, created_at, updated_at
            FROM storefront.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .map(Product::try_from)
        .transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, category, image_url, created_at, updated_at
            FROM storefront.product
            ORDER BY id
            ",
        )
        .fetch_all(self.pool())
        .await?;
        into_products(rows)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create_product(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO storefront.product (name, description, price, category, image_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, price, category, image_url, created_at, updated_at
            ",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.category.as_str())
        .bind(&input.image_url)
        .fetch_one(self.pool())
        .await?
        .try_into()
    }

    #[instrument(skip(self, input))]
    async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE storefront.product
            SET name = $2, description = $3, price = $4, category = $5, image_url = $6,
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, description, price, category, image_url, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.category.as_str())
        .bind(&input.image_url)
        .fetch_optional(self.pool())
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.product WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| {
                RepositoryError::from_constraint(e, "product has order or review history")
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("bottle"), "%bottle%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\"), "%c:\\\\%");
    }

    #[test]
    fn test_order_clause_is_deterministic() {
        assert!(order_clause(ProductSort::PriceAsc).ends_with("id ASC"));
        assert!(order_clause(ProductSort::PriceDesc).ends_with("id ASC"));
    }
}
