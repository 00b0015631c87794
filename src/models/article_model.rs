use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};
use sqlx::{FromRow, Pool, Postgres};
use std::error::Error;

use crate::collection::{PgCollection, PgCollectionError};
use crate::pagination::{PaginationQuery, PaginationRequest};
use crate::query::{Direction, Filter, Include, Relation};

/// Table the article paginators read from.
pub const ARTICLES_TABLE: &str = "articles";
/// Relation table holding one row per (article, tag) pair.
pub const ARTICLE_TAGS_TABLE: &str = "article_tags";

/// Struct representing an error returned by the article endpoints.
///
/// # Fields
/// - `status` - The HTTP status code associated with the error
/// - `error` - A string describing the specific error that occurred
#[derive(Debug)]
pub struct ArticleError {
    pub status: StatusCode,
    pub error: String,
}

/// Serializes into `{"status": "400", "error": "..."}`.
impl Serialize for ArticleError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let status: String = self.status.as_u16().to_string();
        let mut state = serializer.serialize_struct("ArticleError", 2)?;
        state.serialize_field("status", &status)?;
        state.serialize_field("error", &self.error)?;
        state.end()
    }
}

impl ArticleError {
    /// Creates a `Response` with the status code and a JSON body describing `error`.
    pub fn response(status: StatusCode, error: Box<dyn Error>) -> Response {
        let error = ArticleError {
            status,
            error: error.to_string(),
        };

        (status, Json(error)).into_response()
    }
}

/// A stored article.
///
/// Columns a projection can leave out deserialize to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Article {
    pub id: i32,
    pub title: String,
    pub counter: i32,
    #[serde(default)]
    pub inactive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// An article to be inserted, with its tags.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub counter: i32,
    #[serde(default)]
    pub inactive: bool,
    #[serde(default)]
    pub attachment: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewArticle {
    pub fn new(title: impl Into<String>, counter: i32) -> Self {
        Self {
            title: title.into(),
            counter,
            ..Self::default()
        }
    }
}

/// Query string accepted by the article listing endpoints.
///
/// The paging fields are those of [`PaginationQuery`]; the rest narrow the
/// listing down.
#[derive(Debug, Default, Deserialize)]
pub struct ArticleQuery {
    pub page_index: Option<i64>,
    pub page_size: Option<i64>,
    pub order_by: Option<String>,
    pub order: Option<Direction>,
    pub primary_desc: Option<bool>,
    /// Only articles whose title starts with this text.
    pub title_prefix: Option<String>,
    pub min_counter: Option<i64>,
    /// Only articles carrying this tag.
    pub tag: Option<String>,
}

impl ArticleQuery {
    /// Builds the pagination request, ANDing the query's own filters onto
    /// `base_filter`.
    pub fn into_request(self, base_filter: Option<Filter>) -> PaginationRequest {
        let mut conditions: Vec<Filter> = base_filter.into_iter().collect();
        if let Some(prefix) = &self.title_prefix {
            conditions.push(Filter::field("title").starts_with(prefix));
        }
        if let Some(min_counter) = self.min_counter {
            conditions.push(Filter::field("counter").gte(min_counter));
        }
        let filter = conditions.into_iter().reduce(Filter::and);

        let include = self.tag.map(|tag| {
            Include::new(vec![
                Relation::new(ARTICLE_TAGS_TABLE, "id", "article_id")
                    .with_filter(Filter::field("tag").eq(tag)),
            ])
        });

        let mut request = PaginationRequest::from(PaginationQuery {
            page_index: self.page_index,
            page_size: self.page_size,
            order_by: self.order_by,
            order: self.order,
            primary_desc: self.primary_desc,
        });
        request.filter = filter;
        request.include = include;
        request
    }
}

/// Filter applied by the `paginateActive` listing.
pub fn active_filter() -> Filter {
    Filter::field("inactive").eq(false)
}

/// The `articles` table as a pagination collection.
///
/// # Errors
/// Returns an error if the table name is rejected as an identifier.
pub fn articles_collection(db_pool: &Pool<Postgres>) -> Result<PgCollection<Article>, PgCollectionError> {
    PgCollection::new(db_pool.clone(), ARTICLES_TABLE)
}

/// Inserts an article and its tags
///
/// # Returns
/// The stored `Article`
///
/// # Errors
/// If any insert fails, the transaction is rolled back and the error is returned.
pub async fn article_add(db_pool: &Pool<Postgres>, article: NewArticle) -> Result<Article, Box<dyn Error>> {
    let mut tx = db_pool.begin().await?;

    let stored = sqlx::query_as::<Postgres, Article>(
        "INSERT INTO articles (title, counter, inactive, attachment) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(&article.title)
    .bind(article.counter)
    .bind(article.inactive)
    .bind(&article.attachment)
    .fetch_one(&mut *tx)
    .await?;

    for tag in &article.tags {
        sqlx::query("INSERT INTO article_tags (article_id, tag) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(stored.id)
            .bind(tag)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    tracing::debug!("Added article {} with {} tags", stored.id, article.tags.len());

    Ok(stored)
}

/// Deletes every article and tag and restarts the id sequence
///
/// # Errors
/// If the query fails, a boxed error is returned.
pub async fn articles_clear(db_pool: &Pool<Postgres>) -> Result<(), Box<dyn Error>> {
    sqlx::query("TRUNCATE articles, article_tags RESTART IDENTITY")
        .execute(db_pool)
        .await?;

    tracing::info!("Cleared articles");

    Ok(())
}
