use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::collection::Collection;
use crate::pagination::{
    Paginate, PaginationConfig, PaginationError, PaginationRequest, PaginationResult, Paginator,
    ResultHook, attach_hook,
};

/// Named pagination operations over one entity type.
///
/// Binding registers a paginator under its config's `method_name`; binding
/// the same name again replaces the earlier operation. Hooks replace the
/// named operation with a wrapped one.
pub struct PaginationMethods<E> {
    methods: HashMap<String, Arc<dyn Paginate<E>>>,
}

impl<E> Default for PaginationMethods<E> {
    fn default() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }
}

impl<E> Debug for PaginationMethods<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("PaginationMethods").field("methods", &names).finish()
    }
}

impl<E: Send + 'static> PaginationMethods<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `config` to `collection` and registers the paginator under
    /// `config.method_name`.
    pub fn bind<C>(&mut self, config: PaginationConfig, collection: Arc<C>)
    where
        C: Collection<Entity = E> + 'static,
    {
        self.insert(Paginator::bind_shared(config, collection));
    }

    /// Registers any paginating operation under its own method name.
    pub fn insert(&mut self, paginator: impl Paginate<E> + 'static) {
        let name = paginator.method_name().to_string();
        tracing::debug!(method = %name, "registering pagination method");
        self.methods.insert(name, Arc::new(paginator));
    }

    /// Replaces the operation registered as `method_name` with one whose
    /// results pass through `hook`.
    ///
    /// # Errors
    /// Returns `UnknownMethod` if nothing is registered under `method_name`.
    pub fn attach_hook<H>(&mut self, method_name: &str, hook: H) -> Result<(), PaginationError>
    where
        H: ResultHook<E> + 'static,
    {
        let original = self
            .methods
            .remove(method_name)
            .ok_or_else(|| PaginationError::UnknownMethod(method_name.to_string()))?;
        self.methods
            .insert(method_name.to_string(), Arc::new(attach_hook(original, hook)));
        Ok(())
    }

    pub fn get(&self, method_name: &str) -> Option<Arc<dyn Paginate<E>>> {
        self.methods.get(method_name).cloned()
    }

    pub fn contains(&self, method_name: &str) -> bool {
        self.methods.contains_key(method_name)
    }

    /// Runs the operation registered as `method_name`.
    ///
    /// # Errors
    /// `UnknownMethod` if nothing is registered under that name, otherwise
    /// whatever the operation returns.
    pub async fn paginate(
        &self,
        method_name: &str,
        request: PaginationRequest,
    ) -> Result<PaginationResult<E>, PaginationError> {
        let method = self
            .get(method_name)
            .ok_or_else(|| PaginationError::UnknownMethod(method_name.to_string()))?;
        method.paginate(request).await
    }
}
