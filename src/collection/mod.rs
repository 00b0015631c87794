//! The persistence collaborators a paginator reads from.

mod memory;
mod postgres;

pub use memory::{MemoryCollection, MemoryCollectionError};
pub use postgres::{PgCollection, PgCollectionError};

use async_trait::async_trait;

use crate::query::{Attributes, Filter, Include, Order};

/// One ordered, offset-limited read against a collection.
#[derive(Debug, Clone, Copy)]
pub struct SliceQuery<'a> {
    pub filter: Option<&'a Filter>,
    pub include: Option<&'a Include>,
    pub attributes: Option<&'a Attributes>,
    pub order: &'a [Order],
    pub offset: i64,
    pub limit: i64,
}

/// A queryable, uniquely keyed collection of records.
///
/// Implementations decide how negative offsets and limits are treated; the
/// paginator forwards them unchanged.
#[async_trait]
pub trait Collection: Send + Sync {
    type Entity: Send;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Number of records matching `filter` and `include`, ignoring order and
    /// windowing.
    async fn count(
        &self,
        filter: Option<&Filter>,
        include: Option<&Include>,
    ) -> Result<i64, Self::Error>;

    async fn fetch_slice(&self, query: &SliceQuery<'_>) -> Result<Vec<Self::Entity>, Self::Error>;

    /// Count and fetch as one unit. Collections that can read both from a
    /// single snapshot override this; the default issues the two reads back to
    /// back without any isolation.
    async fn count_and_fetch_slice(
        &self,
        query: &SliceQuery<'_>,
    ) -> Result<(i64, Vec<Self::Entity>), Self::Error> {
        let count = self.count(query.filter, query.include).await?;
        let entities = self.fetch_slice(query).await?;
        Ok((count, entities))
    }
}
