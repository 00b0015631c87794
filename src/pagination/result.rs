use serde::Serialize;
use serde_json::Value;

use crate::query::{Attributes, Filter, Include, Order};

/// One page of entities plus what a paged UI needs to render around it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResult<E> {
    pub entities: Vec<E>,
    /// Index of this page in the configured base.
    pub page_index: i64,
    pub page_size: i64,
    /// Matching records across all pages.
    pub count: i64,
    pub page_count: i64,
    #[serde(rename = "where")]
    pub where_: Option<Filter>,
    /// Effective order, including the primary key tie-break.
    pub orders: Vec<Order>,
    pub attributes: Option<Attributes>,
    pub include: Option<Include>,
    /// Readable form of `where_`, only set by the humanize hook.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humanized_where: Option<Value>,
}

impl<E> PaginationResult<E> {
    pub fn map_entities<T>(self, f: impl FnMut(E) -> T) -> PaginationResult<T> {
        PaginationResult {
            entities: self.entities.into_iter().map(f).collect(),
            page_index: self.page_index,
            page_size: self.page_size,
            count: self.count,
            page_count: self.page_count,
            where_: self.where_,
            orders: self.orders,
            attributes: self.attributes,
            include: self.include,
            humanized_where: self.humanized_where,
        }
    }
}

/// `ceil(count / page_size)`, or 0 when the page size isn't positive.
pub fn page_count(count: i64, page_size: i64) -> i64 {
    if page_size <= 0 || count <= 0 {
        return 0;
    }
    count / page_size + i64::from(count % page_size != 0)
}
