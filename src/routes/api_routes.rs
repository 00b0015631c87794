use crate::config::AppState;
use crate::controllers::articles_handler::{active_articles, articles, humanized_articles};
use axum::{Router, routing::get};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Returns a router with all the routes for the API
///
/// - `GET /articles`: every article
/// - `GET /articles/active`: active articles, without attachments
/// - `GET /articles/humanized`: every article plus a readable filter
pub fn get_routes() -> Router<Arc<RwLock<AppState>>> {
    Router::new()
        .route("/articles", get(articles))
        .route("/articles/active", get(active_articles))
        .route("/articles/humanized", get(humanized_articles))
}
