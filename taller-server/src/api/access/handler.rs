//! Access List API Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};

use crate::auth::{CurrentUser, hash_password};
use crate::core::ServerState;
use crate::db::repository::access;
use crate::utils::validation::{MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_PASSWORD_LEN, validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::{AccessCreate, AccessEntry, AccessUpdate};

const RESOURCE: &str = "access";

/// GET /api/access
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<AccessEntry>>> {
    let entries = access::find_all(&state.pool).await?;
    Ok(Json(entries))
}

/// POST /api/access
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<AccessCreate>,
) -> AppResult<Json<AccessEntry>> {
    validate_required_text(&payload.email, "email", MAX_EMAIL_LEN)?;
    if !payload.email.contains('@') {
        return Err(AppError::validation("email must contain @"));
    }
    validate_required_text(&payload.password, "password", MAX_PASSWORD_LEN)?;
    validate_optional_text(&payload.display_name, "displayName", MAX_NAME_LEN)?;

    let hash = hash_password(&payload.password)?;
    let created = access::create(
        &state.pool,
        &payload.email,
        payload.role,
        payload.display_name.as_deref(),
        &hash,
    )
    .await?;
    state.broadcast_sync(RESOURCE, "created", &created.email);
    Ok(Json(created))
}

/// PUT /api/access/{email}
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(email): Path<String>,
    Json(payload): Json<AccessUpdate>,
) -> AppResult<Json<AccessEntry>> {
    validate_optional_text(&payload.display_name, "displayName", MAX_NAME_LEN)?;
    if let Some(password) = &payload.password {
        validate_required_text(password, "password", MAX_PASSWORD_LEN)?;
    }

    // An admin cannot lock themselves out
    let email_norm = shared::util::normalize_email(&email);
    if email_norm == current_user.email
        && (payload.active == Some(false)
            || payload.role.map(|r| r != shared::models::Role::Admin).unwrap_or(false))
    {
        return Err(AppError::business_rule(
            "Cannot demote or deactivate your own session",
        ));
    }

    let hash = match &payload.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };
    let updated = access::update(
        &state.pool,
        &email,
        payload.role,
        payload.active,
        payload.display_name.as_deref(),
        hash.as_deref(),
    )
    .await?;
    state.broadcast_sync(RESOURCE, "updated", &updated.email);
    Ok(Json(updated))
}

/// DELETE /api/access/{email}
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(email): Path<String>,
) -> AppResult<Json<bool>> {
    if shared::util::normalize_email(&email) == current_user.email {
        return Err(AppError::business_rule("Cannot delete your own session"));
    }
    let deleted = access::delete(&state.pool, &email).await?;
    if deleted {
        state.broadcast_sync(RESOURCE, "deleted", &email);
    }
    Ok(Json(deleted))
}
