use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::Attributes;
use crate::hook_error::HookError;

/// A user-supplied step that runs before an adapter call.
///
/// Closures `Fn(Attributes) -> impl Future<Output = Result<(), HookError>>`
/// implement this trait directly.
#[async_trait]
pub trait LifecycleHook: Send + Sync {
    async fn run(&self, attributes: &Attributes) -> Result<(), HookError>;
}

#[async_trait]
impl<F, Fut> LifecycleHook for F
where
    F: Fn(Attributes) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HookError>> + Send + 'static,
{
    async fn run(&self, attributes: &Attributes) -> Result<(), HookError> {
        (self)(attributes.clone()).await
    }
}

/// The optional hooks of a record type. Unset hooks are skipped.
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    before_create: Option<Arc<dyn LifecycleHook>>,
    before_update: Option<Arc<dyn LifecycleHook>>,
    before_save: Option<Arc<dyn LifecycleHook>>,
    before_fetch: Option<Arc<dyn LifecycleHook>>,
    before_remove: Option<Arc<dyn LifecycleHook>>,
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before_create(mut self, hook: impl LifecycleHook + 'static) -> Self {
        self.before_create = Some(Arc::new(hook));
        self
    }

    pub fn before_update(mut self, hook: impl LifecycleHook + 'static) -> Self {
        self.before_update = Some(Arc::new(hook));
        self
    }

    pub fn before_save(mut self, hook: impl LifecycleHook + 'static) -> Self {
        self.before_save = Some(Arc::new(hook));
        self
    }

    pub fn before_fetch(mut self, hook: impl LifecycleHook + 'static) -> Self {
        self.before_fetch = Some(Arc::new(hook));
        self
    }

    pub fn before_remove(mut self, hook: impl LifecycleHook + 'static) -> Self {
        self.before_remove = Some(Arc::new(hook));
        self
    }

    /// Number of hooks that are set
    pub fn len(&self) -> usize {
        [
            &self.before_create,
            &self.before_update,
            &self.before_save,
            &self.before_fetch,
            &self.before_remove,
        ]
        .iter()
        .filter(|hook| hook.is_some())
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub async fn run_create_flow(&self, attributes: &Attributes) -> Result<(), HookError> {
        // beforeCreate -> beforeSave
        run_optional(&self.before_create, attributes).await?;
        run_optional(&self.before_save, attributes).await
    }

    pub async fn run_update_flow(&self, attributes: &Attributes) -> Result<(), HookError> {
        // beforeUpdate -> beforeSave
        run_optional(&self.before_update, attributes).await?;
        run_optional(&self.before_save, attributes).await
    }

    pub async fn run_fetch_flow(&self, attributes: &Attributes) -> Result<(), HookError> {
        run_optional(&self.before_fetch, attributes).await
    }

    pub async fn run_remove_flow(&self, attributes: &Attributes) -> Result<(), HookError> {
        run_optional(&self.before_remove, attributes).await
    }
}

impl std::fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("before_create", &self.before_create.is_some())
            .field("before_update", &self.before_update.is_some())
            .field("before_save", &self.before_save.is_some())
            .field("before_fetch", &self.before_fetch.is_some())
            .field("before_remove", &self.before_remove.is_some())
            .finish()
    }
}

async fn run_optional(
    hook: &Option<Arc<dyn LifecycleHook>>,
    attributes: &Attributes,
) -> Result<(), HookError> {
    match hook {
        Some(hook) => hook.run(attributes).await,
        None => Ok(()),
    }
}
