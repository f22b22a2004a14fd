//! Client API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::repository::{client, order};
use crate::utils::AppResult;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_required_text,
};
use shared::models::{Client, ClientCreate, ClientUpdate, Order};

const RESOURCE: &str = "client";

/// GET /api/clients
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Client>>> {
    let clients = client::find_all(&state.pool).await?;
    Ok(Json(clients))
}

#[derive(Deserialize)]
pub struct PhoneQuery {
    pub phone: String,
}

/// GET /api/clients/by-phone?phone=xxx — exact match or null
pub async fn find_by_phone(
    State(state): State<ServerState>,
    Query(query): Query<PhoneQuery>,
) -> AppResult<Json<Option<Client>>> {
    let found = client::find_by_phone(&state.pool, &query.phone).await?;
    Ok(Json(found))
}

/// GET /api/clients/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Client>> {
    let found = client::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| crate::utils::AppError::not_found(format!("Client {id}")))?;
    Ok(Json(found))
}

/// GET /api/clients/{id}/orders
pub async fn list_orders(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = order::find_by_client(&state.pool, id).await?;
    Ok(Json(orders))
}

/// POST /api/clients
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ClientCreate>,
) -> AppResult<Json<Client>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;

    let created = client::create(&state.pool, payload).await?;
    state.broadcast_sync(RESOURCE, "created", &created.id.to_string());
    Ok(Json(created))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub name: String,
    pub phone: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    #[serde(flatten)]
    pub client: Client,
    pub created: bool,
}

/// POST /api/clients/resolve — find by phone or create
pub async fn resolve(
    State(state): State<ServerState>,
    Json(payload): Json<ResolveRequest>,
) -> AppResult<Json<ResolveResponse>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;

    let (resolved, created) =
        client::get_or_create_by_phone(&state.pool, &payload.name, &payload.phone).await?;
    if created {
        state.broadcast_sync(RESOURCE, "created", &resolved.id.to_string());
    }
    Ok(Json(ResolveResponse {
        client: resolved,
        created,
    }))
}

/// PUT /api/clients/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ClientUpdate>,
) -> AppResult<Json<Client>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(phone) = &payload.phone {
        validate_required_text(phone, "phone", MAX_SHORT_TEXT_LEN)?;
    }

    let updated = client::update(&state.pool, id, payload).await?;
    state.broadcast_sync(RESOURCE, "updated", &id.to_string());
    Ok(Json(updated))
}

/// DELETE /api/clients/{id} — admin only
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let deleted = client::delete(&state.pool, id).await?;
    if deleted {
        state.broadcast_sync(RESOURCE, "deleted", &id.to_string());
    }
    Ok(Json(deleted))
}
