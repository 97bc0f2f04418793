use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/filters", post(handlers::submit_filters))
        .route(
            "/api/filters",
            get(handlers::get_filters).post(handlers::post_filters),
        )
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/churn", get(handlers::get_churn))
        .route("/api/am-performance", get(handlers::get_am_performance))
        .route("/api/am-profiles/:name", get(handlers::get_am_profile))
        .with_state(state)
}
