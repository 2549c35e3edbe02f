//! Session services shared by every resolution in a build.

use std::sync::Arc;

use crate::cache::{
    BuildCommencedTimeProvider, CachePolicy, InMemoryCachedRepositoryFactory,
    InMemoryModuleCacheStore, ModuleCacheStore, TimeProvider,
};
use crate::config::QuarryConfig;
use crate::factory::{ResolutionConfiguration, ResolveFactory};
use crate::legacy::LegacySettings;
use crate::lock::{CacheLockingManager, DefaultCacheLockingManager};
use crate::repository::ResolutionOverride;
use crate::version::{DefaultVersionMatcher, LatestStrategy, SemverLatestStrategy, VersionMatcher};

/// Build-scoped collaborators of the chain factory.
///
/// Frontends create this once per build and ask it for a [`ResolveFactory`]
/// per resolution. Clones share every service.
#[derive(Clone)]
pub struct ResolutionServices {
    lock: Arc<dyn CacheLockingManager>,
    store: Arc<dyn ModuleCacheStore>,
    time_provider: Arc<dyn TimeProvider>,
    in_memory_cache: Arc<InMemoryCachedRepositoryFactory>,
    legacy_settings: LegacySettings,
    matcher: Arc<dyn VersionMatcher>,
    latest: Arc<dyn LatestStrategy>,
    resolution_override: ResolutionOverride,
    cache_policy: CachePolicy,
}

impl ResolutionServices {
    /// Services with an in-process lock and cache store.
    pub fn new(resolution_override: ResolutionOverride, cache_policy: CachePolicy) -> Self {
        Self {
            lock: Arc::new(DefaultCacheLockingManager::new()),
            store: Arc::new(InMemoryModuleCacheStore::new()),
            time_provider: Arc::new(BuildCommencedTimeProvider::new()),
            in_memory_cache: Arc::new(InMemoryCachedRepositoryFactory::new()),
            legacy_settings: LegacySettings::new(),
            matcher: Arc::new(DefaultVersionMatcher),
            latest: Arc::new(SemverLatestStrategy),
            resolution_override,
            cache_policy,
        }
    }

    pub fn from_config(config: &QuarryConfig) -> Self {
        Self::new(config.resolution, config.cache.clone())
    }

    pub fn with_lock(mut self, lock: Arc<dyn CacheLockingManager>) -> Self {
        self.lock = lock;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ModuleCacheStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_time_provider(mut self, time_provider: Arc<dyn TimeProvider>) -> Self {
        self.time_provider = time_provider;
        self
    }

    pub fn lock(&self) -> &Arc<dyn CacheLockingManager> {
        &self.lock
    }

    pub fn store(&self) -> &Arc<dyn ModuleCacheStore> {
        &self.store
    }

    pub fn in_memory_cache(&self) -> &Arc<InMemoryCachedRepositoryFactory> {
        &self.in_memory_cache
    }

    pub fn legacy_settings(&self) -> &LegacySettings {
        &self.legacy_settings
    }

    pub fn resolution_override(&self) -> ResolutionOverride {
        self.resolution_override
    }

    pub fn resolve_factory(&self) -> ResolveFactory {
        ResolveFactory::new(
            Arc::clone(&self.store),
            Arc::clone(&self.lock),
            self.resolution_override,
            Arc::clone(&self.time_provider),
            Arc::clone(&self.in_memory_cache),
            Arc::clone(&self.matcher),
            Arc::clone(&self.latest),
            self.legacy_settings.clone(),
        )
    }

    /// Configuration named `name` using the configured cache policy.
    pub fn resolution_configuration(&self, name: impl Into<String>) -> ResolutionConfiguration {
        ResolutionConfiguration::new(name, self.cache_policy.clone())
    }

    /// Drop build-scoped memoization.
    pub fn finish_build(&self) {
        self.in_memory_cache.clear();
    }
}

impl Default for ResolutionServices {
    fn default() -> Self {
        Self::new(ResolutionOverride::default(), CachePolicy::default())
    }
}
