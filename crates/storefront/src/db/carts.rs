//! `PostgreSQL` cart repository.
//!
//! Every mutation runs in a transaction that first takes the row lock on the
//! user's `cart` row, so concurrent requests for the same user apply one at a
//! time. Line quantities are merged with `ON CONFLICT ... DO UPDATE`.

use async_trait::async_trait;
use sqlx::PgExecutor;
use tracing::instrument;

use verdant_core::{CartId, CartItemId, ProductId, Quantity, UserId};

use super::products::ProductRow;
use super::{CartStore, PgStore, RepositoryError, line_limit_exceeded};
use crate::models::CartItem;

#[derive(sqlx::FromRow)]
struct CartItemRow {
    item_id: CartItemId,
    cart_id: CartId,
    quantity: Quantity,
    #[sqlx(flatten)]
    product: ProductRow,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.item_id,
            cart_id: row.cart_id,
            product_id: row.product.id,
            quantity: row.quantity,
            product: row.product.try_into()?,
        })
    }
}

/// Load a cart's lines joined with current product data.
pub(super) async fn load_items<'e, E>(
    executor: E,
    cart_id: CartId,
) -> Result<Vec<CartItem>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, CartItemRow>(
        r"
        SELECT ci.id AS item_id, ci.cart_id, ci.quantity,
               p.id, p.name, p.description, p.price, p.category, p.image_url,
               p.created_at, p.updated_at
        FROM storefront.cart_item ci
        JOIN storefront.product p ON p.id = ci.product_id
        WHERE ci.cart_id = $1
        ORDER BY ci.id
        ",
    )
    .bind(cart_id)
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(CartItem::try_from).collect()
}

/// Lock the user's cart row for the rest of the transaction.
pub(super) async fn lock_cart<'e, E>(
    executor: E,
    user_id: UserId,
) -> Result<Option<CartId>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let id: Option<CartId> =
        sqlx::query_scalar("SELECT id FROM storefront.cart WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(executor)
            .await?;
    Ok(id)
}

#[async_trait]
impl CartStore for PgStore {
    async fn get_cart(&self, user_id: UserId) -> Result<Option<Vec<CartItem>>, RepositoryError> {
        let cart_id: Option<CartId> =
            sqlx::query_scalar("SELECT id FROM storefront.cart WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(self.pool())
                .await?;

        match cart_id {
            Some(id) => Ok(Some(load_items(self.pool(), id).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Vec<CartItem>, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        // Upsert takes the row lock whether or not the cart already existed.
        let cart_id: CartId = sqlx::query_scalar(
            r"
            INSERT INTO storefront.cart (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = now()
            RETURNING id
            ",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        // A merge past the line limit matches no row; dropping `tx` rolls back.
        let written = sqlx::query(
            r"
            INSERT INTO storefront.cart_item (cart_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id) DO UPDATE
            SET quantity = cart_item.quantity + EXCLUDED.quantity
            WHERE cart_item.quantity::BIGINT + EXCLUDED.quantity <= $4
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .bind(Quantity::MAX_PER_LINE)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                RepositoryError::NotFound
            }
            other => RepositoryError::Database(other),
        })?;

        if written.rows_affected() == 0 {
            return Err(line_limit_exceeded());
        }

        let items = load_items(&mut *tx, cart_id).await?;
        tx.commit().await?;

        Ok(items)
    }

    #[instrument(skip(self))]
    async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Vec<CartItem>, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let cart_id = lock_cart(&mut *tx, user_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        sqlx::query("DELETE FROM storefront.cart_item WHERE cart_id = $1 AND product_id = $2")
            .bind(cart_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE storefront.cart SET updated_at = now() WHERE id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        let items = load_items(&mut *tx, cart_id).await?;
        tx.commit().await?;

        Ok(items)
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self, user_id: UserId) -> Result<(), RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let cart_id = lock_cart(&mut *tx, user_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        sqlx::query("DELETE FROM storefront.cart_item WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE storefront.cart SET updated_at = now() WHERE id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
