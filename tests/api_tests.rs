use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use relpage::collection::MemoryCollection;
use relpage::config::AppState;
use relpage::models::article_model::{ARTICLE_TAGS_TABLE, Article};
use relpage::routes;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

/// ids 1..=5 with counters [4, 4, 1, 3, 2]; 2 and 4 are inactive.
fn app() -> axum::Router {
    let articles = [4, 4, 1, 3, 2].into_iter().zip(1..).map(|(counter, id)| Article {
        id,
        title: format!("title{id}"),
        counter,
        inactive: id % 2 == 0,
        attachment: Some(format!("attachment{id}.pdf")),
        created_at: None,
    });
    let collection = MemoryCollection::from_entities(articles)
        .unwrap()
        .with_relation_table(
            ARTICLE_TAGS_TABLE,
            vec![
                json!({"article_id": 1, "tag": "rust"}),
                json!({"article_id": 3, "tag": "rust"}),
                json!({"article_id": 5, "tag": "async"}),
            ],
        )
        .unwrap();
    let app_state = AppState::with_collection(Arc::new(collection)).unwrap();

    routes::app(Arc::new(RwLock::new(app_state)))
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, body)
}

fn ids(body: &Value) -> Vec<i64> {
    body["entities"]
        .as_array()
        .map(|entities| entities.iter().filter_map(|e| e["id"].as_i64()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_first_page() {
    let (status, body) = get("/api/v1/articles?page_size=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 2]);
    assert_eq!(body["pageIndex"], 0);
    assert_eq!(body["pageSize"], 2);
    assert_eq!(body["count"], 5);
    assert_eq!(body["pageCount"], 3);
    assert_eq!(body["orders"], json!([{"field": "id", "direction": "asc"}]));
    assert!(body["where"].is_null());
}

#[tokio::test]
async fn test_default_page_size() {
    let (status, body) = get("/api/v1/articles").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pageSize"], 10);
    assert_eq!(ids(&body), vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_order_by_counter_descending() {
    let (status, body) = get("/api/v1/articles?page_size=3&order_by=counter&order=DESC").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 2, 4]);
    assert_eq!(
        body["orders"],
        json!([
            {"field": "counter", "direction": "desc"},
            {"field": "id", "direction": "asc"}
        ])
    );
}

#[tokio::test]
async fn test_primary_desc_page() {
    let (status, body) =
        get("/api/v1/articles?page_index=2&page_size=2&order_by=counter&primary_desc=true").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1]);
}

#[tokio::test]
async fn test_negative_page_index_is_bad_request() {
    let (status, body) = get("/api/v1/articles?page_index=-1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "400");
    assert_eq!(
        body["error"],
        "page index under zero-base < 0: page_index = -1, zero_base_index = -1"
    );
}

#[tokio::test]
async fn test_negative_page_size_is_bad_request() {
    let (status, body) = get("/api/v1/articles?page_size=-2").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "400");
}

#[tokio::test]
async fn test_malformed_query_is_rejected() {
    let (status, _) = get("/api/v1/articles?order_by=counter&order=sideways").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_active_articles_hide_inactive_and_attachments() {
    let (status, body) = get("/api/v1/articles/active").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 3, 5]);
    assert_eq!(body["count"], 3);
    assert_eq!(body["attributes"], json!({"exclude": ["attachment"]}));
    for entity in body["entities"].as_array().unwrap() {
        assert!(entity.get("attachment").is_none(), "{entity}");
    }
}

#[tokio::test]
async fn test_active_articles_keep_their_filter_with_query_filters() {
    let (status, body) = get("/api/v1/articles/active?min_counter=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 5]);
}

#[tokio::test]
async fn test_filter_by_tag_and_title() {
    let (_, body) = get("/api/v1/articles?tag=rust").await;
    assert_eq!(ids(&body), vec![1, 3]);
    assert_eq!(body["count"], 2);

    let (_, body) = get("/api/v1/articles?title_prefix=title3").await;
    assert_eq!(ids(&body), vec![3]);
}

#[tokio::test]
async fn test_humanized_articles() {
    let (status, body) = get("/api/v1/articles/humanized?min_counter=3").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 2, 4]);
    assert_eq!(body["humanizedWhere"], json!({"counter": {"greater than or equal": 3}}));

    let (_, plain) = get("/api/v1/articles?min_counter=3").await;
    assert!(plain.get("humanizedWhere").is_none());
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, _) = get("/api/v1/authors").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
