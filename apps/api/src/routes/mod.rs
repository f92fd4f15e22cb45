pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::template::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/templates",
            get(handlers::handle_list_templates).post(handlers::handle_create_template),
        )
        .route("/api/v1/templates/move", post(handlers::handle_move))
        .route("/api/v1/templates/edit", post(handlers::handle_edit))
        .route(
            "/api/v1/templates/:id",
            get(handlers::handle_get_template).put(handlers::handle_save_template),
        )
        .route(
            "/api/v1/templates/:id/compile",
            post(handlers::handle_compile),
        )
        .with_state(state)
}
