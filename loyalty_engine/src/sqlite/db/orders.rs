use chrono::Utc;
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Order, OrderNumber, OrderStatusType},
    traits::AccrualUpdate,
};

/// Inserts a new order for the user in the `REGISTERED` state. If an order with the same number already exists,
/// nothing is changed and `None` is returned.
///
/// The statement is a write, so inside a transaction it takes the write lock immediately.
pub async fn insert_order(
    user_id: i64,
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let now = Utc::now();
    let order: Option<Order> = sqlx::query_as(
        r#"
            INSERT INTO orders (order_number, user_id, status, submitted_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (order_number) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order_number)
    .bind(user_id)
    .bind(OrderStatusType::Registered)
    .bind(now)
    .fetch_optional(conn)
    .await?;
    if let Some(order) = &order {
        debug!("🗃️ Order {} inserted with id {} for user #{user_id}", order.order_number, order.id);
    }
    Ok(order)
}

pub async fn fetch_order_by_number(
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(order_number)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Returns the user's orders, oldest first.
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY submitted_at ASC, id ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Returns all orders in any of the given states, oldest first.
pub async fn fetch_orders_by_status(
    statuses: &[OrderStatusType],
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    if statuses.is_empty() {
        return Ok(vec![]);
    }
    let mut builder = QueryBuilder::new("SELECT * FROM orders WHERE status IN (");
    let mut list = builder.separated(", ");
    for status in statuses {
        list.push_bind(*status);
    }
    list.push_unseparated(") ORDER BY submitted_at ASC, id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    Ok(orders)
}

/// Writes the new status (and accrual, for `PROCESSED` orders) to the order, unless the order is already in a terminal
/// state. Returns the updated order, or `None` if no row was changed.
///
/// This is the first statement of the accrual apply transaction.
pub async fn update_unsettled_order(
    update: &AccrualUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let accrual = match update.status {
        OrderStatusType::Processed => update.accrual,
        _ => None,
    };
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, accrual = $2, updated_at = $3
            WHERE order_number = $4 AND status NOT IN ('PROCESSED', 'INVALID')
            RETURNING *;
        "#,
    )
    .bind(update.status)
    .bind(accrual)
    .bind(Utc::now())
    .bind(&update.order_number)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
