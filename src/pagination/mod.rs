//! Offset pagination bound to a [`Collection`](crate::collection::Collection).
//!
//! A [`Paginator`] pairs a [`PaginationConfig`] with a collection and turns
//! each [`PaginationRequest`] into a [`PaginationResult`]: one page of
//! entities plus the total count, page count and the effective query. Result
//! hooks post-process pages, and [`PaginationMethods`] keeps paginators
//! addressable by name.

mod config;
mod error;
mod hook;
mod humanize;
mod paginator;
mod registry;
mod request;
mod result;

pub use config::{PaginationConfig, ReadConsistency};
pub use error::{BoxError, PaginationError};
pub use hook::{Hooked, ResultHook, SyncHook, attach_hook, sync_hook};
pub use humanize::humanize_where;
pub use paginator::{Paginate, Paginator};
pub use registry::PaginationMethods;
pub use request::{PaginationQuery, PaginationRequest};
pub use result::{PaginationResult, page_count};
