use serde::{Deserialize, Serialize};

use crate::pagination::PaginationConfig;
use crate::query::{Attributes, Direction, Filter, Include, Order};

/// One pagination call. Every field left as `None` falls back to the bound
/// [`PaginationConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaginationRequest {
    /// Sort the primary key tie-break descending.
    pub primary_desc: Option<bool>,
    pub page_size: Option<i64>,
    /// Page index in the configured base.
    pub page_index: Option<i64>,
    pub filter: Option<Filter>,
    pub orders: Option<Vec<Order>>,
    pub attributes: Option<Attributes>,
    pub include: Option<Include>,
}

impl PaginationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(page_index: i64, page_size: i64) -> Self {
        Self {
            page_index: Some(page_index),
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    /// Merges the request over `config`, request fields winning.
    pub(crate) fn resolve(self, config: &PaginationConfig) -> ResolvedRequest {
        ResolvedRequest {
            primary_desc: self.primary_desc.unwrap_or(false),
            page_size: self.page_size.unwrap_or(config.page_size),
            page_index: self.page_index.unwrap_or_else(|| config.initial_page_index()),
            filter: self.filter.or_else(|| config.filter.clone()),
            orders: self.orders.unwrap_or_else(|| config.orders.clone()),
            attributes: self.attributes.or_else(|| config.attributes.clone()),
            include: self.include.or_else(|| config.include.clone()),
        }
    }
}

/// A request with every default applied.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedRequest {
    pub primary_desc: bool,
    pub page_size: i64,
    pub page_index: i64,
    pub filter: Option<Filter>,
    pub orders: Vec<Order>,
    pub attributes: Option<Attributes>,
    pub include: Option<Include>,
}

/// Pagination parameters as they arrive in a query string, e.g.
/// `?page_index=2&page_size=10&order_by=title&order=desc`.
#[derive(Debug, Deserialize, Default)]
pub struct PaginationQuery {
    pub page_index: Option<i64>,
    pub page_size: Option<i64>,
    pub order_by: Option<String>,
    pub order: Option<Direction>,
    pub primary_desc: Option<bool>,
}

impl From<PaginationQuery> for PaginationRequest {
    fn from(query: PaginationQuery) -> Self {
        let orders = query.order_by.map(|field| {
            vec![Order {
                field,
                direction: query.order.unwrap_or_default(),
            }]
        });

        Self {
            primary_desc: query.primary_desc,
            page_size: query.page_size,
            page_index: query.page_index,
            orders,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_falls_back_to_config() {
        let config = PaginationConfig {
            page_size: 3,
            one_base_index: true,
            filter: Some(Filter::field("inactive").eq(false)),
            orders: vec![Order::desc("title")],
            ..Default::default()
        };
        let resolved = PaginationRequest::new().resolve(&config);

        assert_eq!(resolved.page_size, 3);
        assert_eq!(resolved.page_index, 1);
        assert!(!resolved.primary_desc);
        assert_eq!(resolved.filter, config.filter);
        assert_eq!(resolved.orders, vec![Order::desc("title")]);
        assert!(resolved.attributes.is_none());
    }

    #[test]
    fn test_request_fields_take_precedence() {
        let config = PaginationConfig {
            page_size: 3,
            orders: vec![Order::desc("title")],
            attributes: Some(Attributes::exclude(["attachment"])),
            ..Default::default()
        };
        let request = PaginationRequest {
            primary_desc: Some(true),
            page_size: Some(2),
            page_index: Some(4),
            orders: Some(vec![Order::asc("counter")]),
            attributes: Some(Attributes::only(["id"])),
            ..Default::default()
        };
        let resolved = request.resolve(&config);

        assert!(resolved.primary_desc);
        assert_eq!(resolved.page_size, 2);
        assert_eq!(resolved.page_index, 4);
        assert_eq!(resolved.orders, vec![Order::asc("counter")]);
        assert_eq!(resolved.attributes, Some(Attributes::only(["id"])));
    }

    #[test]
    fn test_query_string_conversion() {
        let query = PaginationQuery {
            page_index: Some(1),
            page_size: Some(2),
            order_by: Some("title".to_string()),
            order: Some(Direction::Desc),
            primary_desc: None,
        };
        let request = PaginationRequest::from(query);

        assert_eq!(request.page_index, Some(1));
        assert_eq!(request.page_size, Some(2));
        assert_eq!(request.orders, Some(vec![Order::desc("title")]));
        assert!(request.primary_desc.is_none());
    }

    #[test]
    fn test_query_without_order_by_keeps_default_orders() {
        let request = PaginationRequest::from(PaginationQuery {
            order: Some(Direction::Desc),
            ..Default::default()
        });
        assert!(request.orders.is_none());
    }
}
