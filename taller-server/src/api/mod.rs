//! API routing
//!
//! One module per resource, each with a `router()` (routes + gating) and
//! a `handler` submodule. `require_auth` wraps the whole tree; admin
//! routes add `require_admin` per module.

pub mod access;
pub mod auth;
pub mod clients;
pub mod health;
pub mod journal;
pub mod orders;
pub mod payments;
pub mod reports;
pub mod services;
pub mod sync;

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::core::ServerState;

pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(clients::router())
        .merge(services::router())
        .merge(orders::router())
        .merge(payments::router())
        .merge(journal::router())
        .merge(reports::router())
        .merge(access::router())
        .merge(sync::router())
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
