use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::collection::{Collection, SliceQuery};
use crate::pagination::{
    PaginationConfig, PaginationError, PaginationRequest, PaginationResult, ReadConsistency, page_count,
};
use crate::query::with_tie_break;

/// Anything that turns a [`PaginationRequest`] into one page of `E`.
#[async_trait]
pub trait Paginate<E>: Send + Sync {
    /// Name the operation is registered under.
    fn method_name(&self) -> &str;

    async fn paginate(&self, request: PaginationRequest) -> Result<PaginationResult<E>, PaginationError>;
}

#[async_trait]
impl<E, P> Paginate<E> for Arc<P>
where
    E: Send + 'static,
    P: Paginate<E> + ?Sized,
{
    fn method_name(&self) -> &str {
        (**self).method_name()
    }

    async fn paginate(&self, request: PaginationRequest) -> Result<PaginationResult<E>, PaginationError> {
        (**self).paginate(request).await
    }
}

/// Pagination bound to one collection.
///
/// The config is fixed at binding time and shared read-only by every call, so
/// a paginator can serve concurrent requests.
#[derive(Debug)]
pub struct Paginator<C> {
    config: PaginationConfig,
    collection: Arc<C>,
}

impl<C> Clone for Paginator<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            collection: Arc::clone(&self.collection),
        }
    }
}

impl<C: Collection> Paginator<C> {
    pub fn bind(config: PaginationConfig, collection: C) -> Self {
        Self::bind_shared(config, Arc::new(collection))
    }

    /// Binds to a collection shared with other paginators.
    pub fn bind_shared(config: PaginationConfig, collection: Arc<C>) -> Self {
        Self { config, collection }
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    pub fn collection(&self) -> &Arc<C> {
        &self.collection
    }

    /// Computes one page.
    ///
    /// # Errors
    /// - `InvalidPageIndex` if the page index is below the first page; the
    ///   collection isn't touched in that case
    /// - `Collection` with the collection's own error if the count or the
    ///   fetch fails
    #[tracing::instrument(level = "debug", skip_all, fields(method = %self.config.method_name))]
    pub async fn invoke(
        &self,
        request: PaginationRequest,
    ) -> Result<PaginationResult<C::Entity>, PaginationError> {
        let request = request.resolve(&self.config);

        let zero_base_index = self.config.to_zero_base(request.page_index);
        if zero_base_index < 0 {
            return Err(PaginationError::InvalidPageIndex {
                page_index: request.page_index,
                zero_base_index,
            });
        }

        let orders = with_tie_break(
            &request.orders,
            &self.config.primary_key_field,
            request.primary_desc,
        );
        let query = SliceQuery {
            filter: request.filter.as_ref(),
            include: request.include.as_ref(),
            attributes: request.attributes.as_ref(),
            order: &orders,
            offset: zero_base_index.saturating_mul(request.page_size),
            limit: request.page_size,
        };
        debug!(
            page_index = request.page_index,
            offset = query.offset,
            limit = query.limit,
            "paginating"
        );

        let (count, entities) = match self.config.consistency {
            ReadConsistency::Independent => {
                let count = self
                    .collection
                    .count(query.filter, query.include)
                    .await
                    .map_err(PaginationError::collection)?;
                let entities = self
                    .collection
                    .fetch_slice(&query)
                    .await
                    .map_err(PaginationError::collection)?;
                (count, entities)
            }
            ReadConsistency::Snapshot => self
                .collection
                .count_and_fetch_slice(&query)
                .await
                .map_err(PaginationError::collection)?,
        };
        debug!(count, fetched = entities.len(), "page read");

        Ok(PaginationResult {
            entities,
            page_index: request.page_index,
            page_size: request.page_size,
            count,
            page_count: page_count(count, request.page_size),
            where_: request.filter,
            orders,
            attributes: request.attributes,
            include: request.include,
            humanized_where: None,
        })
    }
}

#[async_trait]
impl<C> Paginate<C::Entity> for Paginator<C>
where
    C: Collection + 'static,
    C::Entity: 'static,
{
    fn method_name(&self) -> &str {
        &self.config.method_name
    }

    async fn paginate(
        &self,
        request: PaginationRequest,
    ) -> Result<PaginationResult<C::Entity>, PaginationError> {
        self.invoke(request).await
    }
}
