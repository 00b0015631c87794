use crate::pagination::{BoxError, PaginationResult};

/// Result hook that adds a readable rendering of the effective filter.
///
/// Each operator is spelled out as a phrase, so
/// `counter > 3 OR counter <= 1` becomes
/// `{"or": [{"counter": {"greater than": 3}}, {"counter": {"less than or equal": 1}}]}`.
/// Entities and every other field pass through unchanged.
pub async fn humanize_where<E>(mut result: PaginationResult<E>) -> Result<PaginationResult<E>, BoxError> {
    result.humanized_where = result.where_.as_ref().map(|filter| filter.humanize());
    Ok(result)
}
