use chrono::Utc;
use log::{debug, trace};
use lp_common::Points;
use sqlx::SqliteConnection;

use crate::db_types::UserAccount;

pub async fn insert_user(
    login: &str,
    password_hash: &str,
    conn: &mut SqliteConnection,
) -> Result<UserAccount, sqlx::Error> {
    let now = Utc::now();
    let account: UserAccount = sqlx::query_as(
        r#"
            INSERT INTO users (login, password_hash, balance, withdrawn, created_at, updated_at)
            VALUES ($1, $2, 0, 0, $3, $3)
            RETURNING *;
        "#,
    )
    .bind(login)
    .bind(password_hash)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ User account #{} created for '{login}'", account.id);
    Ok(account)
}

pub async fn user_account_by_id(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<UserAccount>, sqlx::Error> {
    let account = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(account)
}

pub async fn user_account_by_login(
    login: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<UserAccount>, sqlx::Error> {
    let account = sqlx::query_as("SELECT * FROM users WHERE login = $1").bind(login).fetch_optional(conn).await?;
    Ok(account)
}

/// Adds `amount` to the user's balance. Returns `false` if the user does not exist.
pub async fn credit_balance(user_id: i64, amount: Points, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET balance = balance + $1, updated_at = $2 WHERE id = $3")
        .bind(amount)
        .bind(Utc::now())
        .bind(user_id)
        .execute(conn)
        .await?;
    trace!("🗃️ Credited {amount} to user #{user_id}. {} rows affected", result.rows_affected());
    Ok(result.rows_affected() == 1)
}

/// Moves `amount` from the user's balance to the withdrawn total, provided the balance covers it. Returns `false` if
/// no row was changed, either because the balance is too low or because the user does not exist.
pub async fn debit_balance(user_id: i64, amount: Points, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE users SET balance = balance - $1, withdrawn = withdrawn + $1, updated_at = $2
            WHERE id = $3 AND balance >= $1
        "#,
    )
    .bind(amount)
    .bind(Utc::now())
    .bind(user_id)
    .execute(conn)
    .await?;
    trace!("🗃️ Debit of {amount} from user #{user_id}. {} rows affected", result.rows_affected());
    Ok(result.rows_affected() == 1)
}
