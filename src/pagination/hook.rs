use async_trait::async_trait;
use std::future::Future;

use crate::pagination::{BoxError, Paginate, PaginationError, PaginationRequest, PaginationResult};

/// A transform applied to every page a paginator produces.
///
/// Any `Fn(PaginationResult<E>) -> impl Future<Output = Result<PaginationResult<E>, BoxError>>`
/// is a hook; wrap synchronous transforms with [`sync_hook`].
#[async_trait]
pub trait ResultHook<E>: Send + Sync {
    async fn after_pagination(&self, result: PaginationResult<E>) -> Result<PaginationResult<E>, BoxError>;
}

#[async_trait]
impl<E, F, Fut> ResultHook<E> for F
where
    E: Send + 'static,
    F: Fn(PaginationResult<E>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<PaginationResult<E>, BoxError>> + Send + 'static,
{
    async fn after_pagination(&self, result: PaginationResult<E>) -> Result<PaginationResult<E>, BoxError> {
        self(result).await
    }
}

/// Hook built from a synchronous transform, see [`sync_hook`].
#[derive(Debug, Clone)]
pub struct SyncHook<F>(F);

pub fn sync_hook<F>(transform: F) -> SyncHook<F> {
    SyncHook(transform)
}

#[async_trait]
impl<E, F> ResultHook<E> for SyncHook<F>
where
    E: Send + 'static,
    F: Fn(PaginationResult<E>) -> Result<PaginationResult<E>, BoxError> + Send + Sync,
{
    async fn after_pagination(&self, result: PaginationResult<E>) -> Result<PaginationResult<E>, BoxError> {
        (self.0)(result)
    }
}

/// A paginator whose results pass through a hook before reaching the caller.
///
/// Hooks attached one after another nest, so the first attached runs first.
#[derive(Debug, Clone)]
pub struct Hooked<P, H> {
    inner: P,
    hook: H,
}

/// Wraps `paginator` so every result it produces goes through `hook`.
///
/// A failed page never reaches the hook. A failing hook discards the page
/// and its error is returned as `PaginationError::Hook`.
pub fn attach_hook<P, H>(paginator: P, hook: H) -> Hooked<P, H> {
    Hooked {
        inner: paginator,
        hook,
    }
}

impl<P, H> Hooked<P, H> {
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<E, P, H> Paginate<E> for Hooked<P, H>
where
    E: Send + 'static,
    P: Paginate<E>,
    H: ResultHook<E>,
{
    fn method_name(&self) -> &str {
        self.inner.method_name()
    }

    async fn paginate(&self, request: PaginationRequest) -> Result<PaginationResult<E>, PaginationError> {
        let result = self.inner.paginate(request).await?;
        self.hook
            .after_pagination(result)
            .await
            .map_err(PaginationError::Hook)
    }
}
