//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::repository::{order, payment};
use crate::orders;
use crate::utils::AppResult;
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use shared::models::{Order, OrderCreate, OrderUpdate, Payment, PaymentCreate};

const RESOURCE: &str = "orders";
const PAYMENT_RESOURCE: &str = "payment";

/// GET /api/orders — newest first
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Order>>> {
    let rows = order::find_all(&state.pool).await?;
    Ok(Json(rows))
}

/// GET /api/orders/pending — orders still owing money
pub async fn list_pending(State(state): State<ServerState>) -> AppResult<Json<Vec<Order>>> {
    let rows = order::find_pending(&state.pool).await?;
    Ok(Json(rows))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let found = order::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| crate::utils::AppError::not_found(format!("Order {id}")))?;
    Ok(Json(found))
}

/// GET /api/orders/{id}/payments — the order's ledger, oldest first
pub async fn list_payments(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Payment>>> {
    order::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| crate::utils::AppError::not_found(format!("Order {id}")))?;
    let rows = payment::find_by_order(&state.pool, id).await?;
    Ok(Json(rows))
}

/// POST /api/orders — create with service resolution
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<OrderCreate>,
) -> AppResult<Json<Order>> {
    validate_optional_text(&Some(payload.details.clone()), "details", MAX_NOTE_LEN)?;

    let created = orders::create_order_with_service_resolution(&state.pool, payload).await?;
    state.broadcast_sync(RESOURCE, "created", &created.id.to_string());
    if created.deposit > 0.0 {
        state.broadcast_sync(PAYMENT_RESOURCE, "created", &created.id.to_string());
    }
    Ok(Json(created))
}

/// POST /api/orders/{id}/payments — the reconciliation protocol
pub async fn register_payment(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<PaymentCreate>,
) -> AppResult<Json<Payment>> {
    let registered = orders::register_payment(&state.pool, id, payload).await?;
    state.broadcast_sync(PAYMENT_RESOURCE, "created", &registered.id.to_string());
    state.broadcast_sync(RESOURCE, "updated", &id.to_string());
    Ok(Json(registered))
}

/// POST /api/orders/{id}/payments/detached — admin escape hatch; leaves
/// the order unreconciled until a recalc
pub async fn register_payment_only(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<PaymentCreate>,
) -> AppResult<Json<Payment>> {
    let registered = orders::register_payment_only(&state.pool, id, payload).await?;
    state.broadcast_sync(PAYMENT_RESOURCE, "created", &registered.id.to_string());
    Ok(Json(registered))
}

/// POST /api/orders/{id}/recalc — repair deposit/balance/status from the
/// ledger
pub async fn recalc(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let recalced = orders::recalc_order_from_payments(&state.pool, id).await?;
    state.broadcast_sync(RESOURCE, "updated", &id.to_string());
    Ok(Json(recalced))
}

/// PUT /api/orders/{id} — direct edits (dates, details, total, manual
/// status); deposits only move through payments
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderUpdate>,
) -> AppResult<Json<Order>> {
    validate_optional_text(&payload.details, "details", MAX_NOTE_LEN)?;

    let updated = order::update(&state.pool, id, payload).await?;
    state.broadcast_sync(RESOURCE, "updated", &id.to_string());
    Ok(Json(updated))
}

/// DELETE /api/orders/{id} — admin only; removes the payment ledger in
/// the same transaction
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let deleted = order::delete(&state.pool, id).await?;
    if deleted {
        state.broadcast_sync(RESOURCE, "deleted", &id.to_string());
        state.broadcast_sync(PAYMENT_RESOURCE, "deleted", &id.to_string());
    }
    Ok(Json(deleted))
}
