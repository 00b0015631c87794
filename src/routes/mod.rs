pub mod api_routes;
pub mod middleware;

use crate::config::AppState;
use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tokio::sync::RwLock;

async fn handler_404() -> Response {
    (StatusCode::NOT_FOUND, "404 Not Found").into_response()
}

/// The whole application: the API under `/api/v1`, a 404 fallback and the
/// middleware stack.
pub fn app(app_state: Arc<RwLock<AppState>>) -> Router {
    let app = Router::new()
        .nest("/api/v1", api_routes::get_routes())
        .fallback(handler_404)
        .with_state(app_state);

    middleware::configure_middleware(app)
}
