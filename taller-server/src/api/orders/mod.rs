//! Orders API
//!
//! Money movements (payments, recalc) live under the order they belong
//! to; the detached-payment escape hatch and deletion are admin-only.

mod handler;

use axum::{Router, middleware, routing::{delete, get, post}};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    let employee_routes = Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/pending", get(handler::list_pending))
        .route("/{id}", get(handler::get_by_id).put(handler::update))
        .route("/{id}/payments", get(handler::list_payments).post(handler::register_payment))
        .route("/{id}/recalc", post(handler::recalc));

    let admin_routes = Router::new()
        .route("/{id}", delete(handler::delete))
        .route("/{id}/payments/detached", post(handler::register_payment_only))
        .layer(middleware::from_fn(require_admin));

    employee_routes.merge(admin_routes)
}
