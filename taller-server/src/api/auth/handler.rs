//! Auth API Handlers

use axum::{Json, extract::{Extension, State}};
use serde::{Deserialize, Serialize};

use crate::auth::{CurrentUser, verify_password};
use crate::core::ServerState;
use crate::db::repository::access as access_repo;
use crate::utils::{AppError, AppResult};
use shared::models::Role;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
}

/// POST /api/auth/login
///
/// Admits a session only for an active access-list entry with a valid
/// password; missing, inactive and wrong-password cases all return the
/// same error.
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let entry = access_repo::find_by_email(&state.pool, &payload.email).await?;

    let entry = match entry {
        Some(e) if e.active => e,
        Some(_) => {
            tracing::warn!(target: "security", email = %payload.email, "Inactive account login attempt");
            return Err(AppError::invalid_credentials());
        }
        None => return Err(AppError::invalid_credentials()),
    };

    if !verify_password(&payload.password, &entry.password_hash) {
        tracing::warn!(target: "security", email = %entry.email, "Wrong password");
        return Err(AppError::invalid_credentials());
    }

    let display_name = entry.display_name.clone().unwrap_or_else(|| entry.email.clone());
    let token = state
        .jwt_service
        .generate_token(&entry.email, &display_name, entry.role)
        .map_err(|e| AppError::internal(format!("Token generation failed: {e}")))?;

    tracing::info!(email = %entry.email, role = entry.role.as_str(), "Login");

    Ok(Json(LoginResponse {
        token,
        user: SessionUser {
            email: entry.email,
            display_name,
            role: entry.role,
        },
    }))
}

/// GET /api/auth/me
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<SessionUser> {
    Json(SessionUser {
        email: user.email.clone(),
        display_name: user.display_name.clone(),
        role: user.role,
    })
}
