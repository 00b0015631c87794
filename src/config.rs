use crate::collection::Collection;
use crate::db_config::*;
use crate::models::article_model::{Article, active_filter, articles_collection};
use crate::pagination::{PaginationConfig, PaginationError, PaginationMethods, humanize_where};
use crate::query::Attributes;
use sqlx::{Pool, Postgres};
use std::error::Error;
use std::sync::Arc;

pub const PAGINATE: &str = "paginate";
pub const PAGINATE_ACTIVE: &str = "paginateActive";
pub const PAGINATE_HUMANIZE: &str = "paginateHumanize";

/// Page size of every article listing unless a request asks otherwise.
pub const ARTICLES_PAGE_SIZE: i64 = 10;

/// The application state
///
/// # Fields
/// - `articles`: The article pagination methods, addressed by name
#[derive(Debug)]
pub struct AppState {
    pub articles: PaginationMethods<Article>,
}

impl AppState {
    /// Creates a new `AppState` backed by the database.
    ///
    /// # Errors
    /// This function will return an error if:
    /// - The database cannot be set up
    /// - The article paginators cannot be bound
    pub async fn new() -> Result<Self, Box<dyn Error>> {
        let article_data = ArticleData::new().await?;
        let collection = articles_collection(&article_data.articles_db)?;

        Ok(Self::with_collection(Arc::new(collection))?)
    }

    /// Binds the article paginators to `collection`:
    /// - `paginate`: every article
    /// - `paginateActive`: articles not marked inactive, without their attachment
    /// - `paginateHumanize`: every article, with a readable copy of the filter
    ///
    /// # Errors
    /// Returns an error if a hook is attached to a method that isn't bound.
    pub fn with_collection<C>(collection: Arc<C>) -> Result<Self, PaginationError>
    where
        C: Collection<Entity = Article> + 'static,
    {
        let mut articles = PaginationMethods::new();

        articles.bind(
            PaginationConfig {
                method_name: PAGINATE.to_string(),
                page_size: ARTICLES_PAGE_SIZE,
                ..Default::default()
            },
            Arc::clone(&collection),
        );
        articles.bind(
            PaginationConfig {
                method_name: PAGINATE_ACTIVE.to_string(),
                page_size: ARTICLES_PAGE_SIZE,
                filter: Some(active_filter()),
                attributes: Some(Attributes::exclude(["attachment"])),
                ..Default::default()
            },
            Arc::clone(&collection),
        );
        articles.bind(
            PaginationConfig {
                method_name: PAGINATE_HUMANIZE.to_string(),
                page_size: ARTICLES_PAGE_SIZE,
                ..Default::default()
            },
            collection,
        );
        articles.attach_hook(PAGINATE_HUMANIZE, humanize_where)?;

        Ok(Self { articles })
    }
}

/// The struct holds the database connection pool
///
/// # Fields
/// - `articles_db`: The database connection pool
#[derive(Debug)]
pub struct ArticleData {
    pub articles_db: Pool<Postgres>,
}

impl ArticleData {
    /// Creates a new `ArticleData` instance using [`db_setup`].
    ///
    /// # Errors
    /// This function will return an error if the database connection pool cannot be initialized.
    pub async fn new() -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            articles_db: db_setup().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::MemoryCollection;
    use crate::pagination::PaginationRequest;

    fn article(id: i32, inactive: bool) -> Article {
        Article {
            id,
            title: format!("title{id}"),
            counter: id,
            inactive,
            attachment: Some(format!("attachment{id}.pdf")),
            created_at: None,
        }
    }

    fn state() -> AppState {
        let collection =
            MemoryCollection::from_entities((1..=4).map(|id| article(id, id % 2 == 0))).unwrap();
        AppState::with_collection(Arc::new(collection)).unwrap()
    }

    #[tokio::test]
    async fn test_all_article_methods_are_bound() {
        let state = state();

        for name in [PAGINATE, PAGINATE_ACTIVE, PAGINATE_HUMANIZE] {
            assert!(state.articles.contains(name), "{name}");
        }
        let result = state.articles.paginate(PAGINATE, PaginationRequest::new()).await.unwrap();
        assert_eq!(result.page_size, ARTICLES_PAGE_SIZE);
        assert_eq!(result.count, 4);
    }

    #[tokio::test]
    async fn test_active_listing_hides_inactive_and_attachments() {
        let result = state()
            .articles
            .paginate(PAGINATE_ACTIVE, PaginationRequest::new())
            .await
            .unwrap();

        let ids: Vec<i32> = result.entities.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(result.entities.iter().all(|a| a.attachment.is_none()));
    }

    #[tokio::test]
    async fn test_humanize_listing_renders_filter() {
        let result = state()
            .articles
            .paginate(
                PAGINATE_HUMANIZE,
                PaginationRequest {
                    filter: Some(active_filter()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(
            result.humanized_where,
            Some(serde_json::json!({"inactive": {"equal": false}}))
        );
    }
}
