//! Payment Repository
//!
//! Append-only ledger. Rows are immutable after insert; there is no
//! update path. Inserts take a generic executor so the reconciliation
//! service can run them inside its own transaction.

use super::RepoResult;
use shared::models::{Payment, PaymentCreate};
use sqlx::SqlitePool;

const PAYMENT_SELECT: &str =
    "SELECT id, order_id, amount, payment_method, notes, date, created_at FROM payments";

/// Insert one payment row. Caller has already validated the amount.
pub async fn insert<'e, E>(db: E, order_id: i64, data: &PaymentCreate) -> RepoResult<Payment>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let date = data.date.unwrap_or(now);
    sqlx::query(
        "INSERT INTO payments (id, order_id, amount, payment_method, notes, date, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(id)
    .bind(order_id)
    .bind(data.amount)
    .bind(data.payment_method)
    .bind(&data.notes)
    .bind(date)
    .bind(now)
    .execute(db)
    .await?;

    Ok(Payment {
        id,
        order_id,
        amount: data.amount,
        payment_method: data.payment_method,
        notes: data.notes.clone(),
        date,
        created_at: now,
    })
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Payment>> {
    let sql = format!("{} ORDER BY created_at DESC", PAYMENT_SELECT);
    let rows = sqlx::query_as::<_, Payment>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Payment>> {
    let sql = format!("{} WHERE id = ?", PAYMENT_SELECT);
    let row = sqlx::query_as::<_, Payment>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<Payment>> {
    let sql = format!("{} WHERE order_id = ? ORDER BY date ASC, created_at ASC", PAYMENT_SELECT);
    let rows = sqlx::query_as::<_, Payment>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Effective-date range query (reports, journal day summaries)
pub async fn find_by_time_range(pool: &SqlitePool, from: i64, to: i64) -> RepoResult<Vec<Payment>> {
    let sql = format!(
        "{} WHERE date >= ? AND date < ? ORDER BY date ASC, created_at ASC",
        PAYMENT_SELECT
    );
    let rows = sqlx::query_as::<_, Payment>(&sql)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// All amounts for one order, for Decimal summation by the caller
pub async fn amounts_for_order<'e, E>(db: E, order_id: i64) -> RepoResult<Vec<f64>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let amounts: Vec<f64> =
        sqlx::query_scalar("SELECT amount FROM payments WHERE order_id = ? ORDER BY date ASC")
            .bind(order_id)
            .fetch_all(db)
            .await?;
    Ok(amounts)
}
