pub mod compose;
pub mod errors;
pub mod health;
pub mod images;
pub mod instagram;
pub mod recommend;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::utils::timing::{complete_request_timer, RequestTimer};

use errors::ApiError;

pub(crate) fn finish_timer<T>(timer: &mut RequestTimer, result: &Result<T, ApiError>) {
    match result {
        Ok(_) => complete_request_timer(timer, "success", None),
        Err(err) => complete_request_timer(
            timer,
            "error",
            Some(format!("{} {}", err.status().as_u16(), err)),
        ),
    }
}

pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz_handler))
        .route("/api/recommend", post(recommend::recommend_handler))
        .route("/api/generate-image", post(images::generate_image_handler))
        .route("/api/instagram", post(instagram::instagram_handler))
        .route("/api/compose", post(compose::compose_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
