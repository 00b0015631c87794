pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures surfaced by a pagination call.
///
/// Collection and hook failures are carried as-is: their `Display` is the
/// original message and the original error can be recovered with
/// [`PaginationError::downcast_ref`].
#[derive(Debug, thiserror::Error)]
pub enum PaginationError {
    #[error(
        "page index under zero-base < 0: page_index = {page_index}, zero_base_index = {zero_base_index}"
    )]
    InvalidPageIndex { page_index: i64, zero_base_index: i64 },
    #[error(transparent)]
    Collection(BoxError),
    #[error(transparent)]
    Hook(BoxError),
    #[error("no pagination method named '{0}'")]
    UnknownMethod(String),
}

impl PaginationError {
    pub(crate) fn collection(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        PaginationError::Collection(Box::new(error))
    }

    /// The collection or hook error this wraps, if it is a `T`.
    pub fn downcast_ref<T: std::error::Error + 'static>(&self) -> Option<&T> {
        match self {
            PaginationError::Collection(error) | PaginationError::Hook(error) => error.downcast_ref(),
            _ => None,
        }
    }
}
