//! Assembles the repository chain for a resolution.
//!
//! Each declared repository yields a connector, which is wrapped in a fixed
//! stack of decorators and appended to a [`UserResolverChain`]. The stack for a
//! repository is its layer plan, computed by [`layer_plan`] and applied
//! outermost-last.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};

use serde::Serialize;

use crate::cache::{
    CachePolicy, CachingModuleComponentRepository, InMemoryCachedRepositoryFactory,
    ModuleCacheStore, ModuleIdExtractor, TimeProvider,
};
use crate::chain::{ParentModuleLookupResolver, RepositoryChain, UserResolverChain};
use crate::error::ResolveError;
use crate::legacy::{
    LOOPBACK_RESOLVER_NAME, LegacyEngineRepository, LegacyResolveData, LegacySettings,
    LoopbackDependencyResolver,
};
use crate::lock::CacheLockingManager;
use crate::model::RepositoryId;
use crate::repository::{
    CacheLockReleasingModuleComponentRepository, ConfiguredModuleComponentRepository,
    DynamicResolveModuleComponentRepository, LocalModuleComponentRepository,
    ModuleComponentRepository, ModuleMetadataProcessor, ResolutionAwareRepository,
    ResolutionOverride,
};
use crate::version::{LatestStrategy, VersionMatcher};

/// One decorator in a repository's stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepositoryLayer {
    LocalMetadata,
    LockReleasing,
    ResolutionOverride,
    PersistentCache(ModuleIdExtractor),
    DynamicResolve,
    InMemoryCache,
}

impl fmt::Display for RepositoryLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryLayer::LocalMetadata => write!(f, "local-metadata"),
            RepositoryLayer::LockReleasing => write!(f, "lock-releasing"),
            RepositoryLayer::ResolutionOverride => write!(f, "resolution-override"),
            RepositoryLayer::PersistentCache(ModuleIdExtractor::PerModule) => {
                write!(f, "persistent-cache")
            }
            RepositoryLayer::PersistentCache(ModuleIdExtractor::PerVersion) => {
                write!(f, "persistent-cache(per-version)")
            }
            RepositoryLayer::DynamicResolve => write!(f, "dynamic-resolve"),
            RepositoryLayer::InMemoryCache => write!(f, "in-memory-cache"),
        }
    }
}

/// Decorators wrapped around one registered repository, innermost first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryStack {
    pub id: RepositoryId,
    pub name: String,
    pub layers: Vec<RepositoryLayer>,
}

/// Decorator order for a connector, innermost first.
///
/// Local connectors only get metadata processing. Remote connectors release
/// the cache lock around network calls, then honour the session overrides,
/// then get the persistent cache; legacy engines only list what matches the
/// request, so their listings are cached per version.
pub fn layer_plan(is_local: bool, legacy: bool, dynamic_resolve: bool) -> Vec<RepositoryLayer> {
    let mut layers = if is_local {
        vec![RepositoryLayer::LocalMetadata]
    } else {
        let extractor = if legacy {
            ModuleIdExtractor::PerVersion
        } else {
            ModuleIdExtractor::PerModule
        };
        vec![
            RepositoryLayer::LockReleasing,
            RepositoryLayer::ResolutionOverride,
            RepositoryLayer::PersistentCache(extractor),
        ]
    };
    if dynamic_resolve {
        layers.push(RepositoryLayer::DynamicResolve);
    }
    layers.push(RepositoryLayer::InMemoryCache);
    layers
}

/// What the factory needs to know about the configuration being resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionConfiguration {
    pub name: String,
    pub cache_policy: CachePolicy,
}

impl ResolutionConfiguration {
    pub fn new(name: impl Into<String>, cache_policy: CachePolicy) -> Self {
        Self {
            name: name.into(),
            cache_policy,
        }
    }
}

/// Builds repository chains for a session.
pub struct ResolveFactory {
    store: Arc<dyn ModuleCacheStore>,
    lock: Arc<dyn CacheLockingManager>,
    resolution_override: ResolutionOverride,
    time_provider: Arc<dyn TimeProvider>,
    in_memory_cache: Arc<InMemoryCachedRepositoryFactory>,
    matcher: Arc<dyn VersionMatcher>,
    latest: Arc<dyn LatestStrategy>,
    legacy_settings: LegacySettings,
}

impl ResolveFactory {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn ModuleCacheStore>,
        lock: Arc<dyn CacheLockingManager>,
        resolution_override: ResolutionOverride,
        time_provider: Arc<dyn TimeProvider>,
        in_memory_cache: Arc<InMemoryCachedRepositoryFactory>,
        matcher: Arc<dyn VersionMatcher>,
        latest: Arc<dyn LatestStrategy>,
        legacy_settings: LegacySettings,
    ) -> Self {
        Self {
            store,
            lock,
            resolution_override,
            time_provider,
            in_memory_cache,
            matcher,
            latest,
            legacy_settings,
        }
    }

    /// Assemble the chain for `configuration` over `repositories`, in order.
    ///
    /// Fails when two repositories share an id; nothing is registered in the
    /// legacy settings in that case.
    pub fn create(
        &self,
        configuration: &ResolutionConfiguration,
        repositories: &[Arc<dyn ResolutionAwareRepository>],
        processor: Arc<dyn ModuleMetadataProcessor>,
    ) -> Result<Arc<UserResolverChain>, ResolveError> {
        let mut policy = configuration.cache_policy.clone();
        self.resolution_override.apply_to_policy(&mut policy);

        let chain = Arc::new(UserResolverChain::new(
            Arc::clone(&self.matcher),
            Arc::clone(&self.latest),
        ));
        let handle: Arc<dyn RepositoryChain> = chain.clone();
        let weak_chain = Arc::downgrade(&handle);
        drop(handle);
        let parent: Arc<dyn RepositoryChain> = Arc::new(ParentModuleLookupResolver::new(
            weak_chain.clone(),
            Arc::clone(&self.lock),
        ));

        // Reject duplicate ids before any session-shared state is touched.
        let mut declared = HashSet::new();
        let mut bases = Vec::with_capacity(repositories.len());
        for repository in repositories {
            let base = repository.create_resolver();
            if !declared.insert(base.id().clone()) {
                return Err(ResolveError::DuplicateRepository(base.id().clone()));
            }
            bases.push(base);
        }

        for mut base in bases {
            let legacy = match base.as_legacy_engine() {
                Some(engine) => {
                    self.contextualize(engine, &weak_chain, &configuration.name);
                    true
                }
                None => false,
            };
            if let Some(aware) = base.as_chain_aware() {
                aware.set_repository_chain(Arc::clone(&parent));
            }

            let stack = RepositoryStack {
                id: base.id().clone(),
                name: base.name().to_string(),
                layers: layer_plan(base.is_local(), legacy, base.is_dynamic_resolve_mode()),
            };
            tracing::debug!(
                repository = %stack.id,
                configuration = %configuration.name,
                layers = ?stack.layers,
                "assembling repository"
            );

            let base: Arc<dyn ConfiguredModuleComponentRepository> = Arc::from(base);
            let mut decorated: Arc<dyn ModuleComponentRepository> = base;
            for layer in &stack.layers {
                decorated = self.wrap(*layer, decorated, &policy, &processor);
            }
            chain.add(decorated, stack)?;
        }

        tracing::debug!(
            configuration = %configuration.name,
            repositories = chain.repository_ids().len(),
            "repository chain ready"
        );
        Ok(chain)
    }

    /// Give a legacy engine its session context and route its internal
    /// lookups back through the chain.
    fn contextualize(
        &self,
        engine: &mut dyn LegacyEngineRepository,
        chain: &Weak<dyn RepositoryChain>,
        configuration: &str,
    ) {
        let loopback = LoopbackDependencyResolver::new(
            LOOPBACK_RESOLVER_NAME,
            chain.clone(),
            Arc::clone(&self.lock),
        );
        self.legacy_settings.add_resolver(Arc::new(loopback));
        self.legacy_settings
            .set_default_resolver(LOOPBACK_RESOLVER_NAME);

        engine.set_settings(self.legacy_settings.clone());
        engine.set_resolve_data(LegacyResolveData::for_configuration(configuration));
    }

    fn wrap(
        &self,
        layer: RepositoryLayer,
        delegate: Arc<dyn ModuleComponentRepository>,
        policy: &CachePolicy,
        processor: &Arc<dyn ModuleMetadataProcessor>,
    ) -> Arc<dyn ModuleComponentRepository> {
        match layer {
            RepositoryLayer::LocalMetadata => Arc::new(LocalModuleComponentRepository::new(
                delegate,
                Arc::clone(processor),
            )),
            RepositoryLayer::LockReleasing => Arc::new(
                CacheLockReleasingModuleComponentRepository::new(delegate, Arc::clone(&self.lock)),
            ),
            RepositoryLayer::ResolutionOverride => {
                self.resolution_override.override_repository(delegate)
            }
            RepositoryLayer::PersistentCache(extractor) => {
                Arc::new(CachingModuleComponentRepository::new(
                    delegate,
                    Arc::clone(&self.store),
                    policy.clone(),
                    Arc::clone(&self.time_provider),
                    Arc::clone(processor),
                    extractor,
                    Arc::clone(&self.lock),
                ))
            }
            RepositoryLayer::DynamicResolve => {
                Arc::new(DynamicResolveModuleComponentRepository::new(delegate))
            }
            RepositoryLayer::InMemoryCache => self.in_memory_cache.cached(delegate),
        }
    }
}
