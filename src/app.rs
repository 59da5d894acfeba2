use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/deliveries", get(handlers::list_deliveries))
        .route("/api/add-delivery", post(handlers::add_delivery))
        .route("/api/carriers", get(handlers::list_carriers))
        .route(
            "/api/session",
            post(handlers::create_session).delete(handlers::destroy_session),
        )
        .route("/api/dashboard", get(handlers::dashboard))
        .with_state(state)
}
