//! Payment API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::repository::payment;
use crate::utils::AppResult;
use shared::models::Payment;

/// GET /api/payments — newest first
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Payment>>> {
    let rows = payment::find_all(&state.pool).await?;
    Ok(Json(rows))
}

/// GET /api/payments/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Payment>> {
    let found = payment::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| crate::utils::AppError::not_found(format!("Payment {id}")))?;
    Ok(Json(found))
}
