use serde::{Deserialize, Serialize};

use crate::query::{Attributes, Filter, Include, Order};

/// How the count and the page are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReadConsistency {
    /// Two independent reads. A write landing between them can leave `count`
    /// out of step with the fetched page.
    #[default]
    Independent,
    /// Both reads come from one snapshot, when the collection supports it.
    Snapshot,
}

/// Pagination defaults bound once to a collection.
///
/// # Fields
/// - `method_name`: name the paginator is registered under, `paginate` by default
/// - `primary_key_field`: unique, totally ordered field used as the tie-break, `id` by default
/// - `one_base_index`: page indices start at 1 instead of 0
/// - `page_size`: default page size, 1 unless configured
/// - `filter`, `orders`, `attributes`, `include`: defaults for requests that leave them out
/// - `consistency`: see [`ReadConsistency`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaginationConfig {
    pub method_name: String,
    pub primary_key_field: String,
    pub one_base_index: bool,
    pub page_size: i64,
    pub filter: Option<Filter>,
    pub orders: Vec<Order>,
    pub attributes: Option<Attributes>,
    pub include: Option<Include>,
    pub consistency: ReadConsistency,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            method_name: default_method_name(),
            primary_key_field: default_primary_key_field(),
            one_base_index: false,
            page_size: 1,
            filter: None,
            orders: Vec::new(),
            attributes: None,
            include: None,
            consistency: ReadConsistency::default(),
        }
    }
}

fn default_method_name() -> String {
    "paginate".to_string()
}

fn default_primary_key_field() -> String {
    "id".to_string()
}

impl PaginationConfig {
    /// Index of the first page in the configured base.
    pub fn initial_page_index(&self) -> i64 {
        if self.one_base_index { 1 } else { 0 }
    }

    /// Saturates at `i64::MIN`, which is still rejected as a page before the first.
    pub fn to_zero_base(&self, page_index: i64) -> i64 {
        page_index.saturating_sub(self.initial_page_index())
    }
}
