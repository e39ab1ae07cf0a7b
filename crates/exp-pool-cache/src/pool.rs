use std::sync::Arc;

use exp_pool_core::{ExpPoolConfig, ExpPoolError, ExperienceManager};
use exp_pool_manager::InMemoryExperienceManager;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::ExpCache;
use crate::hooks::SerdeHooks;

/// Process-level experience pool: configuration plus the default manager.
///
/// Build one at startup and hand it to whatever wraps functions. Every
/// [`ExpCache`] created from it shares the same manager unless overridden.
#[derive(Clone)]
pub struct ExpPool {
    config: ExpPoolConfig,
    manager: Arc<dyn ExperienceManager>,
}

impl ExpPool {
    /// A pool backed by an [`InMemoryExperienceManager`].
    pub fn new(config: ExpPoolConfig) -> Self {
        let manager = Arc::new(InMemoryExperienceManager::new(config.clone()));
        Self { config, manager }
    }

    pub fn with_manager(config: ExpPoolConfig, manager: Arc<dyn ExperienceManager>) -> Self {
        Self { config, manager }
    }

    /// A pool configured from the `EXP_POOL_*` environment variables.
    pub fn from_env() -> Result<Self, ExpPoolError> {
        Ok(Self::new(ExpPoolConfig::from_env()?))
    }

    pub fn config(&self) -> &ExpPoolConfig {
        &self.config
    }

    pub fn manager(&self) -> Arc<dyn ExperienceManager> {
        self.manager.clone()
    }

    /// Start wrapping a function whose responses round-trip through serde.
    pub fn cache<T>(&self) -> ExpCache<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        ExpCache::new(self.manager.clone(), self.config.read_enabled())
    }

    /// Start wrapping a function returning `String`, stored as plain text.
    pub fn text_cache(&self) -> ExpCache<String> {
        ExpCache::text(self.manager.clone(), self.config.read_enabled())
    }

    /// Start wrapping a function with custom serialization hooks.
    pub fn cache_with_hooks<T: Send + 'static>(&self, hooks: SerdeHooks<T>) -> ExpCache<T> {
        ExpCache::with_hooks(self.manager.clone(), self.config.read_enabled(), hooks)
    }
}

impl std::fmt::Debug for ExpPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpPool")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
