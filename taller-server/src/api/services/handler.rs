//! Service API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::repository::service;
use crate::utils::AppResult;
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use shared::models::{Service, ServiceCreate, ServiceUpdate};

const RESOURCE: &str = "service";

/// GET /api/services — alphabetical, the way pickers consume it
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Service>>> {
    let services = service::find_all(&state.pool).await?;
    Ok(Json(services))
}

/// GET /api/services/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Service>> {
    let found = service::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| crate::utils::AppError::not_found(format!("Service {id}")))?;
    Ok(Json(found))
}

/// POST /api/services
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ServiceCreate>,
) -> AppResult<Json<Service>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;

    let created = service::create(&state.pool, payload).await?;
    state.broadcast_sync(RESOURCE, "created", &created.id.to_string());
    Ok(Json(created))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub name: String,
    pub default_price: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    #[serde(flatten)]
    pub service: Service,
    pub created: bool,
}

/// POST /api/services/resolve — find by normalized name or create
pub async fn resolve(
    State(state): State<ServerState>,
    Json(payload): Json<ResolveRequest>,
) -> AppResult<Json<ResolveResponse>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;

    let (resolved, created) =
        service::get_or_create_by_name(&state.pool, &payload.name, payload.default_price).await?;
    if created {
        state.broadcast_sync(RESOURCE, "created", &resolved.id.to_string());
    }
    Ok(Json(ResolveResponse {
        service: resolved,
        created,
    }))
}

/// PUT /api/services/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ServiceUpdate>,
) -> AppResult<Json<Service>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }

    let updated = service::update(&state.pool, id, payload).await?;
    state.broadcast_sync(RESOURCE, "updated", &id.to_string());
    Ok(Json(updated))
}

/// DELETE /api/services/{id} — admin only; soft delete
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let deleted = service::delete(&state.pool, id).await?;
    if deleted {
        state.broadcast_sync(RESOURCE, "deleted", &id.to_string());
    }
    Ok(Json(deleted))
}
