//! Journal API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::repository::{journal, journal_day};
use crate::journal as journal_service;
use crate::utils::AppResult;
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use shared::models::{JournalDayClosure, JournalDaySummary, JournalEntry, JournalEntryCreate};

const RESOURCE: &str = "journal";

#[derive(Deserialize)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// GET /api/journal?from&to — newest business date first
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<Vec<JournalEntry>>> {
    let rows = journal::find_all(&state.pool, query.from.as_deref(), query.to.as_deref()).await?;
    Ok(Json(rows))
}

/// POST /api/journal — manual ingreso/egreso
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<JournalEntryCreate>,
) -> AppResult<Json<JournalEntry>> {
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;

    let created = journal::create(&state.pool, payload).await?;
    state.broadcast_sync(RESOURCE, "created", &created.id.to_string());
    Ok(Json(created))
}

/// GET /api/journal/day/{date} — reconciled view of one business date
pub async fn day_summary(
    State(state): State<ServerState>,
    Path(date): Path<String>,
) -> AppResult<Json<JournalDaySummary>> {
    let summary =
        journal_service::day_summary(&state.pool, &date, state.config.timezone).await?;
    Ok(Json(summary))
}

/// POST /api/journal/day/{date}/close — admin only; append-only snapshot
pub async fn close_day(
    State(state): State<ServerState>,
    Path(date): Path<String>,
) -> AppResult<Json<JournalDayClosure>> {
    let closure = journal_service::close_day(&state.pool, &date, state.config.timezone).await?;
    state.broadcast_sync("journal_day", "created", &closure.id.to_string());
    Ok(Json(closure))
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// GET /api/journal/days — past closures, newest first
pub async fn list_closures(
    State(state): State<ServerState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Vec<JournalDayClosure>>> {
    let rows = journal_day::find_all(
        &state.pool,
        query.limit.unwrap_or(30),
        query.offset.unwrap_or(0),
    )
    .await?;
    Ok(Json(rows))
}

/// DELETE /api/journal/{id} — admin only; manual entries only, closures
/// are immutable
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let deleted = journal::delete(&state.pool, id).await?;
    if deleted {
        state.broadcast_sync(RESOURCE, "deleted", &id.to_string());
    }
    Ok(Json(deleted))
}
