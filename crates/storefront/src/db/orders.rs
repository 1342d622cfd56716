//! `PostgreSQL` order repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, Postgres, QueryBuilder};
use tracing::instrument;

use verdant_core::{OrderId, OrderItemId, Price, ProductId, Quantity, UserId};

use super::carts::{load_items, lock_cart};
use super::products::ProductRow;
use super::{OrderStore, PgStore, RepositoryError};
use crate::models::{Order, OrderDraft, OrderItem};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    total: Price,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    item_id: OrderItemId,
    order_id: OrderId,
    quantity: Quantity,
    #[sqlx(flatten)]
    product: ProductRow,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.item_id,
            order_id: row.order_id,
            product_id: row.product.id,
            quantity: row.quantity,
            product: row.product.try_into()?,
        })
    }
}

/// Load the lines of every order in `order_ids`, grouped by order.
async fn load_items_by_order<'e, E>(
    executor: E,
    order_ids: &[OrderId],
) -> Result<HashMap<OrderId, Vec<OrderItem>>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let ids: Vec<i32> = order_ids.iter().map(OrderId::as_i32).collect();
    let rows = sqlx::query_as::<_, OrderItemRow>(
        r"
        SELECT oi.id AS item_id, oi.order_id, oi.quantity,
               p.id, p.name, p.description, p.price, p.category, p.image_url,
               p.created_at, p.updated_at
        FROM storefront.order_item oi
        JOIN storefront.product p ON p.id = oi.product_id
        WHERE oi.order_id = ANY($1)
        ORDER BY oi.id
        ",
    )
    .bind(ids)
    .fetch_all(executor)
    .await?;

    let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for row in rows {
        let item = OrderItem::try_from(row)?;
        grouped.entry(item.order_id).or_default().push(item);
    }
    Ok(grouped)
}

fn assemble(row: OrderRow, items: &mut HashMap<OrderId, Vec<OrderItem>>) -> Order {
    Order {
        id: row.id,
        user_id: row.user_id,
        total: row.total,
        created_at: row.created_at,
        items: items.remove(&row.id).unwrap_or_default(),
    }
}

#[async_trait]
impl OrderStore for PgStore {
    #[instrument(skip(self))]
    async fn place_order(&self, user_id: UserId) -> Result<Option<Order>, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let Some(cart_id) = lock_cart(&mut *tx, user_id).await? else {
            return Ok(None);
        };

        let cart = load_items(&mut *tx, cart_id).await?;
        if cart.is_empty() {
            return Ok(None);
        }

        let draft = OrderDraft::from_cart(&cart);

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO storefront.order (user_id, total)
            VALUES ($1, $2)
            RETURNING id, user_id, total, created_at
            ",
        )
        .bind(user_id)
        .bind(draft.total)
        .fetch_one(&mut *tx)
        .await?;

        let mut insert = QueryBuilder::<Postgres>::new(
            "INSERT INTO storefront.order_item (order_id, product_id, quantity) ",
        );
        insert.push_values(&draft.lines, |mut b, line| {
            b.push_bind(row.id)
                .push_bind(line.product_id)
                .push_bind(line.quantity);
        });
        insert.build().execute(&mut *tx).await?;

        sqlx::query("DELETE FROM storefront.cart_item WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE storefront.cart SET updated_at = now() WHERE id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        let mut items = load_items_by_order(&mut *tx, &[row.id]).await?;
        tx.commit().await?;

        Ok(Some(assemble(row, &mut items)))
    }

    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, total, created_at
            FROM storefront.order
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<OrderId> = rows.iter().map(|r| r.id).collect();
        let mut items = load_items_by_order(self.pool(), &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| assemble(row, &mut items))
            .collect())
    }

    async fn order_contains(
        &self,
        user_id: UserId,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let found: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1
                FROM storefront.order o
                JOIN storefront.order_item oi ON oi.order_id = o.id
                WHERE o.id = $1 AND o.user_id = $2 AND oi.product_id = $3
            )
            ",
        )
        .bind(order_id)
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool())
        .await?;

        Ok(found)
    }
}
