//! Order Repository
//!
//! Reads, direct edits and deletion. All money movements (deposit /
//! balance / status) go through the reconciliation service in
//! `crate::orders`; direct edits here never touch the deposit.

use super::{RepoError, RepoResult};
use crate::orders::money;
use crate::utils::time::parse_date;
use shared::models::{Order, OrderStatus, OrderUpdate};
use sqlx::SqlitePool;

// Explicit default-fill at the read boundary: legacy rows may carry a
// NULL quantity.
const ORDER_SELECT: &str = "SELECT id, client_id, service_id, start_date, expected_end_date, details, COALESCE(quantity, 1) AS quantity, total, deposit, balance, status, created_at, updated_at FROM orders";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Order>> {
    let sql = format!("{} ORDER BY created_at DESC", ORDER_SELECT);
    let rows = sqlx::query_as::<_, Order>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{} WHERE id = ?", ORDER_SELECT);
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Fetch inside a caller-owned transaction (reconciliation paths)
pub async fn fetch_by_id<'e, E>(db: E, id: i64) -> RepoResult<Option<Order>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let sql = format!("{} WHERE id = ?", ORDER_SELECT);
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn find_by_client(pool: &SqlitePool, client_id: i64) -> RepoResult<Vec<Order>> {
    let sql = format!("{} WHERE client_id = ? ORDER BY created_at DESC", ORDER_SELECT);
    let rows = sqlx::query_as::<_, Order>(&sql)
        .bind(client_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Orders still owing money (`balance > 0`)
pub async fn find_pending(pool: &SqlitePool) -> RepoResult<Vec<Order>> {
    let sql = format!("{} WHERE balance > 0 ORDER BY created_at DESC", ORDER_SELECT);
    let rows = sqlx::query_as::<_, Order>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

/// Direct edit: dates, details, quantity, total, manual status.
///
/// The deposit is held constant and the balance recomputed from it, so
/// the invariant `balance == max(0, total - deposit)` survives a total
/// change. Manual status values are checked against the balance:
/// "completado" requires balance == 0, the other two require balance > 0.
pub async fn update(pool: &SqlitePool, id: i64, data: OrderUpdate) -> RepoResult<Order> {
    if let Some(d) = &data.start_date {
        parse_date(d)?;
    }
    if let Some(d) = &data.expected_end_date {
        parse_date(d)?;
    }
    if let Some(q) = data.quantity
        && q < 1
    {
        return Err(RepoError::Validation(format!("quantity must be >= 1, got {q}")));
    }

    let mut tx = pool.begin().await?;

    let current = fetch_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))?;

    let total = data.total.unwrap_or(current.total);
    if !total.is_finite() || total < 0.0 {
        return Err(RepoError::Validation(format!("total must be >= 0, got {total}")));
    }
    let total = money::round(total);
    if money::lt(total, current.deposit) {
        return Err(RepoError::Validation(format!(
            "total ({total}) cannot drop below the recorded deposit ({})",
            current.deposit
        )));
    }

    let (balance, derived_status) = money::settle(total, current.deposit);
    let status = match data.status {
        Some(OrderStatus::Completado) if balance > 0.0 => {
            return Err(RepoError::Validation(
                "Order cannot be completado while balance > 0".into(),
            ));
        }
        Some(s @ (OrderStatus::Pendiente | OrderStatus::Cancelado)) if balance == 0.0 => {
            return Err(RepoError::Validation(format!(
                "A fully paid order is completado, not {}",
                s.as_str()
            )));
        }
        Some(s) => s,
        // Cancellation survives edits while money is still owed
        None if current.status == OrderStatus::Cancelado && balance > 0.0 => {
            OrderStatus::Cancelado
        }
        None => derived_status,
    };

    let now = shared::util::now_millis();
    sqlx::query(
        "UPDATE orders SET start_date = COALESCE(?1, start_date), expected_end_date = COALESCE(?2, expected_end_date), details = COALESCE(?3, details), quantity = COALESCE(?4, quantity), total = ?5, balance = ?6, status = ?7, updated_at = ?8 WHERE id = ?9",
    )
    .bind(data.start_date)
    .bind(data.expected_end_date)
    .bind(data.details)
    .bind(data.quantity)
    .bind(total)
    .bind(balance)
    .bind(status)
    .bind(now)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))
}

/// Delete an order and its payment ledger in one transaction — no
/// orphaned payment rows.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let mut tx = pool.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM orders WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Ok(false);
    }

    sqlx::query("DELETE FROM payments WHERE order_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}
