//! Clients API

mod handler;

use axum::{Router, middleware, routing::{delete, get, post}};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/clients", routes())
}

fn routes() -> Router<ServerState> {
    let employee_routes = Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/by-phone", get(handler::find_by_phone))
        .route("/resolve", post(handler::resolve))
        .route("/{id}", get(handler::get_by_id).put(handler::update))
        .route("/{id}/orders", get(handler::list_orders));

    // Deletes are admin-only
    let admin_routes = Router::new()
        .route("/{id}", delete(handler::delete))
        .layer(middleware::from_fn(require_admin));

    employee_routes.merge(admin_routes)
}
