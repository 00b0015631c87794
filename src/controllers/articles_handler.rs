use crate::collection::{MemoryCollectionError, PgCollectionError};
use crate::config::{AppState, PAGINATE, PAGINATE_ACTIVE, PAGINATE_HUMANIZE};
use crate::models::article_model::{ArticleError, ArticleQuery, active_filter};
use crate::pagination::{PaginationError, PaginationRequest};
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_macros::debug_handler;
use std::sync::Arc;
use tokio::sync::RwLock;

#[debug_handler]
/// Lists one page of articles
///
/// This function is a handler for the route `GET /api/v1/articles`.
///
/// # Parameters
/// - `app_state` - Thread-safe shared state wrapped in an Arc and RwLock
/// - `query` - Paging, ordering and filter parameters
///
/// # Returns
/// `Response` with a status code of 200 OK and the page as JSON.
///
/// # Errors
/// 400 for a page index before the first page or a query the collection
/// rejects, 500 for anything else.
pub async fn articles(
    State(app_state): State<Arc<RwLock<AppState>>>,
    Query(query): Query<ArticleQuery>,
) -> Response {
    articles_page(&app_state, PAGINATE, query.into_request(None)).await
}

#[debug_handler]
/// Lists one page of active articles, without attachments
///
/// This function is a handler for the route `GET /api/v1/articles/active`.
pub async fn active_articles(
    State(app_state): State<Arc<RwLock<AppState>>>,
    Query(query): Query<ArticleQuery>,
) -> Response {
    // a request filter replaces the configured one, so it has to carry it
    let request = query.into_request(Some(active_filter()));
    articles_page(&app_state, PAGINATE_ACTIVE, request).await
}

#[debug_handler]
/// Lists one page of articles along with a readable form of the filter
///
/// This function is a handler for the route `GET /api/v1/articles/humanized`.
pub async fn humanized_articles(
    State(app_state): State<Arc<RwLock<AppState>>>,
    Query(query): Query<ArticleQuery>,
) -> Response {
    articles_page(&app_state, PAGINATE_HUMANIZE, query.into_request(None)).await
}

async fn articles_page(
    app_state: &Arc<RwLock<AppState>>,
    method_name: &str,
    request: PaginationRequest,
) -> Response {
    let app_state_lock = app_state.read().await;

    match app_state_lock.articles.paginate(method_name, request).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => {
            tracing::debug!("{method_name} failed: {e}");
            ArticleError::response(error_status(&e), Box::new(e))
        }
    }
}

/// SQLSTATE for a column the table doesn't have.
const UNDEFINED_COLUMN: &str = "42703";

/// Status code reported for a failed pagination call.
pub fn error_status(error: &PaginationError) -> StatusCode {
    match error {
        PaginationError::InvalidPageIndex { .. } => StatusCode::BAD_REQUEST,
        PaginationError::UnknownMethod(_) => StatusCode::NOT_FOUND,
        _ => {
            let bad_column = match error.downcast_ref::<PgCollectionError>() {
                Some(
                    PgCollectionError::InvalidIdentifier(_)
                    | PgCollectionError::InvalidOperand { .. }
                    | PgCollectionError::NegativeWindow { .. },
                ) => true,
                Some(PgCollectionError::Database(sqlx::Error::Database(db_error))) => {
                    db_error.code().as_deref() == Some(UNDEFINED_COLUMN)
                }
                _ => false,
            };
            let bad_window = matches!(
                error.downcast_ref::<MemoryCollectionError>(),
                Some(MemoryCollectionError::NegativeWindow { .. } | MemoryCollectionError::InvalidOperand { .. })
            );
            if bad_column || bad_window {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status() {
        let invalid = PaginationError::InvalidPageIndex {
            page_index: -1,
            zero_base_index: -1,
        };
        assert_eq!(error_status(&invalid), StatusCode::BAD_REQUEST);

        let identifier = PaginationError::Collection(Box::new(PgCollectionError::InvalidIdentifier(
            "title; drop".to_string(),
        )));
        assert_eq!(error_status(&identifier), StatusCode::BAD_REQUEST);

        let pg_window = PaginationError::Collection(Box::new(PgCollectionError::NegativeWindow {
            offset: 0,
            limit: -2,
        }));
        assert_eq!(error_status(&pg_window), StatusCode::BAD_REQUEST);

        let pool_closed = PaginationError::Collection(Box::new(PgCollectionError::Database(
            sqlx::Error::PoolClosed,
        )));
        assert_eq!(error_status(&pool_closed), StatusCode::INTERNAL_SERVER_ERROR);

        let memory = PaginationError::Collection(Box::new(MemoryCollectionError::UnknownRelation(
            "article_tags".to_string(),
        )));
        assert_eq!(error_status(&memory), StatusCode::INTERNAL_SERVER_ERROR);

        let window = PaginationError::Collection(Box::new(MemoryCollectionError::NegativeWindow {
            offset: 0,
            limit: -5,
        }));
        assert_eq!(error_status(&window), StatusCode::BAD_REQUEST);

        let hook = PaginationError::Hook("formatter exploded".into());
        assert_eq!(error_status(&hook), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
