//! Sync API
//!
//! Cheap cache invalidation: clients poll the version map and refetch a
//! collection when its counter moves.

use std::collections::BTreeMap;

use axum::{Json, Router, extract::State, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/sync/versions", get(versions))
}

async fn versions(State(state): State<ServerState>) -> Json<BTreeMap<String, u64>> {
    Json(state.resource_versions.snapshot())
}
