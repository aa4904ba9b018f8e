//! Pass order repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgExecutor, PgPool};

use ticketwave_core::{CurrencyCode, Merchandise, OrderId, PaymentPlan, Price, UserId};

use super::RepositoryError;
use crate::models::Order;

#[derive(FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    plan: String,
    amount: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    payments_made: i32,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let plan = row.plan.parse().map_err(RepositoryError::DataCorruption)?;
        let status = row.status.parse().map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            plan,
            amount: Price::new(row.amount, CurrencyCode::USD),
            status,
            created_at: row.created_at,
            payments_made: u32::try_from(row.payments_made).unwrap_or(0),
        })
    }
}

/// Insert an active order and its merchandise, returning the order id.
pub(crate) async fn insert(
    conn: &mut sqlx::PgConnection,
    user_id: UserId,
    plan: PaymentPlan,
    items: &[Merchandise],
) -> Result<OrderId, RepositoryError> {
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO orders (user_id, plan, amount) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(user_id)
    .bind(plan.as_str())
    .bind(plan.charge_today().amount)
    .fetch_one(&mut *conn)
    .await?;

    for item in items {
        sqlx::query("INSERT INTO order_items (order_id, item_id) VALUES ($1, $2)")
            .bind(id)
            .bind(item.id())
            .execute(&mut *conn)
            .await?;
    }

    Ok(OrderId::new(id))
}

/// Flag the user as a pass holder.
pub(crate) async fn mark_has_ticket<'e>(
    executor: impl PgExecutor<'e>,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE users SET has_ticket = TRUE, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Repository for pass orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's most recent active order, with its installment count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored plan or status is unknown.
    pub async fn active_for_user(&self, user_id: UserId) -> Result<Option<Order>, RepositoryError> {
        sqlx::query_as::<_, OrderRow>(
            "SELECT o.id, o.user_id, o.plan, o.amount, o.status, o.created_at, \
                    (SELECT COUNT(*) FROM payments p WHERE p.order_id = o.id)::INT AS payments_made \
             FROM orders o \
             WHERE o.user_id = $1 AND o.status = 'active' \
             ORDER BY o.created_at DESC \
             LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .map(Order::try_from)
        .transpose()
    }

    /// Item ids attached to an order, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<String>, RepositoryError> {
        let items = sqlx::query_scalar::<_, String>(
            "SELECT item_id FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;
        Ok(items)
    }
}
