//! Journal API

mod handler;

use axum::{Router, middleware, routing::{delete, get, post}};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/journal", routes())
}

fn routes() -> Router<ServerState> {
    let employee_routes = Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/day/{date}", get(handler::day_summary))
        .route("/days", get(handler::list_closures));

    // Closing a day and deleting entries are admin-only
    let admin_routes = Router::new()
        .route("/day/{date}/close", post(handler::close_day))
        .route("/{id}", delete(handler::delete))
        .layer(middleware::from_fn(require_admin));

    employee_routes.merge(admin_routes)
}
