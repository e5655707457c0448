//! Hook recorders - Lifecycle hooks that log their invocations

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use relic_record::{Attributes, HookError, LifecycleHooks};

/// One recorded hook invocation
#[derive(Debug, Clone, PartialEq)]
pub struct HookCall {
    pub hook: &'static str,
    pub attributes: Attributes,
}

/// Builds `LifecycleHooks` whose every hook records its call.
///
/// Clones share the log, so the recorder can be inspected after the hooks
/// have been moved into a registry.
#[derive(Debug, Clone, Default)]
pub struct HookRecorder {
    calls: Arc<RwLock<Vec<HookCall>>>,
    failures: Arc<DashMap<&'static str, String>>,
}

impl HookRecorder {
    pub const BEFORE_CREATE: &'static str = "beforeCreate";
    pub const BEFORE_UPDATE: &'static str = "beforeUpdate";
    pub const BEFORE_SAVE: &'static str = "beforeSave";
    pub const BEFORE_FETCH: &'static str = "beforeFetch";
    pub const BEFORE_REMOVE: &'static str = "beforeRemove";

    pub fn new() -> Self {
        Self::default()
    }

    /// Make `hook` fail with a validation error every time it runs
    pub fn fail(&self, hook: &'static str, message: impl Into<String>) {
        self.failures.insert(hook, message.into());
    }

    /// All five hooks, recording into this recorder
    pub fn hooks(&self) -> LifecycleHooks {
        LifecycleHooks::new()
            .before_create(self.hook(Self::BEFORE_CREATE))
            .before_update(self.hook(Self::BEFORE_UPDATE))
            .before_save(self.hook(Self::BEFORE_SAVE))
            .before_fetch(self.hook(Self::BEFORE_FETCH))
            .before_remove(self.hook(Self::BEFORE_REMOVE))
    }

    /// A single recording hook named `name`
    pub fn hook(
        &self,
        name: &'static str,
    ) -> impl Fn(Attributes) -> std::future::Ready<Result<(), HookError>> + Send + Sync + 'static
    {
        let calls = Arc::clone(&self.calls);
        let failures = Arc::clone(&self.failures);
        move |attributes: Attributes| {
            calls.write().push(HookCall {
                hook: name,
                attributes,
            });
            let result = match failures.get(name) {
                Some(message) => Err(HookError::validation(message.value())),
                None => Ok(()),
            };
            std::future::ready(result)
        }
    }

    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.read().clone()
    }

    /// Hook names in invocation order
    pub fn names(&self) -> Vec<&'static str> {
        self.calls.read().iter().map(|call| call.hook).collect()
    }

    pub fn clear(&self) {
        self.calls.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[tokio::test]
    async fn test_records_flow_order() {
        let recorder = HookRecorder::new();
        let hooks = recorder.hooks();

        hooks.run_create_flow(&Map::new()).await.unwrap();
        hooks.run_fetch_flow(&Map::new()).await.unwrap();

        assert_eq!(
            recorder.names(),
            vec![
                HookRecorder::BEFORE_CREATE,
                HookRecorder::BEFORE_SAVE,
                HookRecorder::BEFORE_FETCH
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_hook_stops_flow() {
        let recorder = HookRecorder::new();
        recorder.fail(HookRecorder::BEFORE_UPDATE, "read only");
        let hooks = recorder.hooks();

        let result = hooks.run_update_flow(&Map::new()).await;

        assert!(matches!(result, Err(HookError::Validation { .. })));
        assert_eq!(recorder.names(), vec![HookRecorder::BEFORE_UPDATE]);
    }
}
