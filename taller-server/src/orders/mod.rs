//! Balance Reconciliation
//!
//! Keeps an order's deposit/balance/status triple consistent with its
//! payment ledger. Every money movement runs as one store transaction
//! spanning the order row and the new payment row: a failed
//! reconciliation leaves neither a dangling payment nor a half-updated
//! order.
//!
//! Invariants after every operation here:
//! - `0 <= deposit <= total`
//! - `balance == max(0, total - deposit)`
//! - `status == "completado"` iff `balance == 0`
//!
//! A `"cancelado"` order refuses payment registration; cancellation is a
//! manual transition, never derived, and never silently overwritten.

pub mod money;

#[cfg(test)]
mod tests;

use sqlx::SqlitePool;

use crate::db::repository::{RepoError, client as client_repo, order as order_repo,
    payment as payment_repo, service as service_repo};
use crate::utils::time::parse_date;
use crate::utils::validation::{
    MAX_NOTE_LEN, validate_non_negative_amount, validate_optional_text, validate_positive_amount,
};
use crate::utils::{AppError, AppResult};
use shared::models::{Order, OrderCreate, OrderStatus, Payment, PaymentCreate, PaymentMethod};

/// Bounded retry for conflict-type store aborts (busy/locked). Other
/// failures propagate on the first attempt.
const MAX_TX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 25;

/// Internal transaction error: keeps the store classification (for
/// transiency checks) separate from already-shaped application errors.
enum TxError {
    Repo(RepoError),
    App(AppError),
}

impl From<RepoError> for TxError {
    fn from(e: RepoError) -> Self {
        TxError::Repo(e)
    }
}

impl From<sqlx::Error> for TxError {
    fn from(e: sqlx::Error) -> Self {
        TxError::Repo(RepoError::from(e))
    }
}

impl TxError {
    fn is_transient(&self) -> bool {
        matches!(self, TxError::Repo(e) if e.is_transient())
    }

    fn into_app(self) -> AppError {
        match self {
            TxError::Repo(e) => AppError::from(e),
            TxError::App(e) => e,
        }
    }
}

/// Register a payment against an order.
///
/// One atomic transaction: read the order, add the amount to the
/// deposit, recompute balance/status, insert the payment row, update the
/// order row. Retries on transient store conflicts with exponential
/// backoff, then gives up.
pub async fn register_payment(
    pool: &SqlitePool,
    order_id: i64,
    input: PaymentCreate,
) -> AppResult<Payment> {
    validate_payment_input(&input)?;
    let input = PaymentCreate {
        amount: money::round(input.amount),
        ..input
    };

    let mut attempt = 0;
    loop {
        attempt += 1;
        match try_register_payment(pool, order_id, &input).await {
            Ok(payment) => {
                tracing::info!(
                    order_id,
                    payment_id = payment.id,
                    amount = payment.amount,
                    method = payment.payment_method.as_str(),
                    "Payment registered"
                );
                return Ok(payment);
            }
            Err(e) if e.is_transient() && attempt < MAX_TX_ATTEMPTS => {
                let delay = RETRY_BASE_DELAY_MS << attempt;
                tracing::warn!(
                    order_id,
                    attempt,
                    delay_ms = delay,
                    "Store busy during payment registration, retrying"
                );
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            }
            Err(e) => return Err(e.into_app()),
        }
    }
}

async fn try_register_payment(
    pool: &SqlitePool,
    order_id: i64,
    input: &PaymentCreate,
) -> Result<Payment, TxError> {
    let mut tx = pool.begin().await.map_err(RepoError::from)?;

    let order = order_repo::fetch_by_id(&mut *tx, order_id)
        .await?
        .ok_or_else(|| TxError::App(AppError::not_found(format!("Order {order_id}"))))?;

    let payment = apply_payment(&mut tx, &order, input).await?;

    tx.commit().await.map_err(RepoError::from)?;
    Ok(payment)
}

/// Shared tail of payment registration, inside a caller-owned
/// transaction: ledger insert + order update.
async fn apply_payment(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    order: &Order,
    input: &PaymentCreate,
) -> Result<Payment, TxError> {
    if order.status == OrderStatus::Cancelado {
        return Err(TxError::App(AppError::business_rule(format!(
            "Order {} is cancelado; reactivate it before registering payments",
            order.id
        ))));
    }
    if money::lt(order.balance, input.amount) {
        return Err(TxError::App(AppError::validation(format!(
            "amount ({}) exceeds outstanding balance ({})",
            input.amount, order.balance
        ))));
    }

    let new_deposit = money::add(order.deposit, input.amount);
    let (new_balance, new_status) = money::settle(order.total, new_deposit);

    let payment = payment_repo::insert(&mut **tx, order.id, input).await?;

    let now = shared::util::now_millis();
    sqlx::query(
        "UPDATE orders SET deposit = ?1, balance = ?2, status = ?3, updated_at = ?4 WHERE id = ?5",
    )
    .bind(new_deposit)
    .bind(new_balance)
    .bind(new_status)
    .bind(now)
    .bind(order.id)
    .execute(&mut **tx)
    .await
    .map_err(RepoError::from)?;

    Ok(payment)
}

/// Insert a payment without touching the order — an explicit bypass for
/// historical backfill. The order invariant stays stale until
/// [`recalc_order_from_payments`] runs; the caller owns that gap.
pub async fn register_payment_only(
    pool: &SqlitePool,
    order_id: i64,
    input: PaymentCreate,
) -> AppResult<Payment> {
    validate_payment_input(&input)?;
    let input = PaymentCreate {
        amount: money::round(input.amount),
        ..input
    };

    let order = order_repo::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id}")))?;

    let payment = payment_repo::insert(pool, order.id, &input).await?;
    tracing::info!(
        order_id,
        payment_id = payment.id,
        amount = payment.amount,
        "Detached payment registered (order left unreconciled)"
    );
    Ok(payment)
}

/// Repair path: recompute deposit/balance/status from the full payment
/// ledger. Reads and writes in one transaction so concurrent inserts
/// cannot slip between the sum and the update. Idempotent.
///
/// A `"cancelado"` order stays cancelled while money is owed; a ledger
/// covering the full total completes the order on any path.
pub async fn recalc_order_from_payments(pool: &SqlitePool, order_id: i64) -> AppResult<Order> {
    let mut tx = pool.begin().await.map_err(RepoError::from)?;

    let order = order_repo::fetch_by_id(&mut *tx, order_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {order_id}")))?;

    let amounts = payment_repo::amounts_for_order(&mut *tx, order_id).await?;
    let deposit = money::sum(&amounts);
    let (balance, derived_status) = money::settle(order.total, deposit);
    let status = if order.status == OrderStatus::Cancelado && balance > 0.0 {
        OrderStatus::Cancelado
    } else {
        derived_status
    };

    let now = shared::util::now_millis();
    sqlx::query(
        "UPDATE orders SET deposit = ?1, balance = ?2, status = ?3, updated_at = ?4 WHERE id = ?5",
    )
    .bind(deposit)
    .bind(balance)
    .bind(status)
    .bind(now)
    .bind(order_id)
    .execute(&mut *tx)
    .await
    .map_err(RepoError::from)?;

    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(order_id, deposit, balance, status = status.as_str(), "Order recalculated");

    Ok(Order {
        deposit,
        balance,
        status,
        updated_at: now,
        ..order
    })
}

/// Create an order, resolving the service by id or free-text name, in
/// one transaction. An initial deposit is registered as a real payment
/// inside the same transaction, so the ledger explains every cent of
/// the deposit from the start.
pub async fn create_order_with_service_resolution(
    pool: &SqlitePool,
    input: OrderCreate,
) -> AppResult<Order> {
    validate_non_negative_amount(input.total, "total")?;
    validate_non_negative_amount(input.deposit, "deposit")?;
    let input = OrderCreate {
        total: money::round(input.total),
        deposit: money::round(input.deposit),
        ..input
    };
    if money::lt(input.total, input.deposit) {
        return Err(AppError::validation(format!(
            "deposit ({}) cannot exceed total ({})",
            input.deposit, input.total
        )));
    }
    let quantity = input.quantity.unwrap_or(1);
    if quantity < 1 {
        return Err(AppError::validation(format!("quantity must be >= 1, got {quantity}")));
    }
    parse_date(&input.start_date)?;
    parse_date(&input.expected_end_date)?;
    if input.service_id.is_none()
        && input.service_name.as_deref().map(str::trim).unwrap_or("").is_empty()
    {
        return Err(AppError::validation(
            "either serviceId or serviceName is required".to_string(),
        ));
    }

    client_repo::find_by_id(pool, input.client_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Client {}", input.client_id)))?;

    let mut tx = pool.begin().await.map_err(RepoError::from)?;

    // Resolve the service inside the transaction: closes the duplicate
    // race for this call path (the plain resolver stays advisory).
    let service_id = match input.service_id {
        Some(id) => {
            service_repo::fetch_by_id(&mut *tx, id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Service {id}")))?
                .id
        }
        None => {
            let name = input.service_name.as_deref().unwrap_or("").trim();
            service_repo::resolve_in_tx(&mut tx, name, None).await?.id
        }
    };

    let now = shared::util::now_millis();
    let order_id = shared::util::snowflake_id();
    let (balance, status) = money::settle(input.total, 0.0);
    sqlx::query(
        "INSERT INTO orders (id, client_id, service_id, start_date, expected_end_date, details, quantity, total, deposit, balance, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?10, ?11, ?11)",
    )
    .bind(order_id)
    .bind(input.client_id)
    .bind(service_id)
    .bind(&input.start_date)
    .bind(&input.expected_end_date)
    .bind(&input.details)
    .bind(quantity)
    .bind(input.total)
    .bind(balance)
    .bind(status)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(RepoError::from)?;

    if input.deposit > 0.0 {
        let order = order_repo::fetch_by_id(&mut *tx, order_id)
            .await?
            .ok_or_else(|| AppError::database("Order vanished inside its own transaction"))?;
        let initial = PaymentCreate {
            amount: input.deposit,
            payment_method: PaymentMethod::Efectivo,
            notes: Some("Abono inicial".to_string()),
            date: Some(now),
        };
        apply_payment(&mut tx, &order, &initial)
            .await
            .map_err(TxError::into_app)?;
    }

    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(order_id, client_id = input.client_id, service_id, "Order created");

    order_repo::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| AppError::database("Failed to create order"))
}

fn validate_payment_input(input: &PaymentCreate) -> AppResult<()> {
    validate_positive_amount(input.amount, "amount")?;
    validate_optional_text(&input.notes, "notes", MAX_NOTE_LEN)?;
    Ok(())
}
