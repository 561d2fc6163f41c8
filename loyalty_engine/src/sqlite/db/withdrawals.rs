use chrono::Utc;
use lp_common::Points;
use sqlx::SqliteConnection;

use crate::db_types::Withdrawal;

pub async fn insert_withdrawal(
    user_id: i64,
    order_number: &str,
    amount: Points,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, sqlx::Error> {
    let withdrawal = sqlx::query_as(
        r#"
            INSERT INTO withdrawals (user_id, order_number, amount, processed_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(order_number)
    .bind(amount)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(withdrawal)
}

/// Returns the user's withdrawals, newest first.
pub async fn fetch_withdrawals_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, sqlx::Error> {
    let withdrawals =
        sqlx::query_as("SELECT * FROM withdrawals WHERE user_id = $1 ORDER BY processed_at DESC, id DESC")
            .bind(user_id)
            .fetch_all(conn)
            .await?;
    Ok(withdrawals)
}
