//! Session context for legacy descriptor engines.
//!
//! A legacy engine resolves parent and imported descriptors through its own
//! resolver registry. The factory hands each engine the shared
//! [`LegacySettings`] and registers a [`LoopbackDependencyResolver`] as the
//! default resolver there, so those internal lookups re-enter the chain.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::chain::{ArtifactResolver, DependencyToComponentResolver, ParentModuleLookupResolver, RepositoryChain};
use crate::error::ResolveError;
use crate::lock::CacheLockingManager;
use crate::model::{
    ArtifactResult, ArtifactSetResult, ComponentArtifactMetadata, ComponentMetadata,
    ComponentMetadataResult, ComponentUsage, DependencyMetadata, ModuleSource,
};

/// Name under which the loopback resolver is registered.
pub const LOOPBACK_RESOLVER_NAME: &str = "main";

/// Per-resolution options handed to a legacy engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyResolveData {
    /// Configuration being resolved
    pub configuration: String,
    /// Whether the engine may download artifacts itself; always false, the
    /// chain downloads
    pub download: bool,
}

impl LegacyResolveData {
    pub fn for_configuration(configuration: impl Into<String>) -> Self {
        Self {
            configuration: configuration.into(),
            download: false,
        }
    }
}

/// A resolver a legacy engine can look up by name.
pub trait LegacyDependencyResolver: Send + Sync {
    fn name(&self) -> &str;

    fn get_dependency(
        &self,
        dependency: &DependencyMetadata,
        result: &mut ComponentMetadataResult,
    ) -> Result<(), ResolveError>;

    fn resolve_module_artifacts(
        &self,
        component: &ComponentMetadata,
        usage: &ComponentUsage,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError>;

    fn download(
        &self,
        artifact: &ComponentArtifactMetadata,
        source: Option<&ModuleSource>,
        result: &mut ArtifactResult,
    ) -> Result<(), ResolveError>;
}

/// Connector backed by a legacy descriptor engine.
pub trait LegacyEngineRepository {
    fn set_settings(&mut self, settings: LegacySettings);

    fn set_resolve_data(&mut self, data: LegacyResolveData);
}

#[derive(Default)]
struct SettingsState {
    resolvers: BTreeMap<String, Arc<dyn LegacyDependencyResolver>>,
    default_resolver: Option<String>,
}

/// Shared resolver registry of the legacy engines in a session.
///
/// Clones are handles onto the same registry.
#[derive(Clone, Default)]
pub struct LegacySettings {
    state: Arc<RwLock<SettingsState>>,
}

impl LegacySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolver, replacing any resolver with the same name.
    pub fn add_resolver(&self, resolver: Arc<dyn LegacyDependencyResolver>) {
        let name = resolver.name().to_string();
        if self.state.write().resolvers.insert(name.clone(), resolver).is_some() {
            tracing::debug!(resolver = %name, "replaced legacy resolver");
        }
    }

    pub fn set_default_resolver(&self, name: impl Into<String>) {
        self.state.write().default_resolver = Some(name.into());
    }

    pub fn resolver(&self, name: &str) -> Option<Arc<dyn LegacyDependencyResolver>> {
        self.state.read().resolvers.get(name).cloned()
    }

    pub fn default_resolver_name(&self) -> Option<String> {
        self.state.read().default_resolver.clone()
    }

    pub fn default_resolver(&self) -> Option<Arc<dyn LegacyDependencyResolver>> {
        let state = self.state.read();
        let name = state.default_resolver.as_deref()?;
        state.resolvers.get(name).cloned()
    }

    pub fn resolver_names(&self) -> Vec<String> {
        self.state.read().resolvers.keys().cloned().collect()
    }
}

/// Routes a legacy engine's lookups back into the repository chain, under
/// the cache lock.
pub struct LoopbackDependencyResolver {
    name: String,
    parent: ParentModuleLookupResolver,
}

impl LoopbackDependencyResolver {
    pub fn new(
        name: impl Into<String>,
        chain: Weak<dyn RepositoryChain>,
        lock: Arc<dyn CacheLockingManager>,
    ) -> Self {
        Self {
            name: name.into(),
            parent: ParentModuleLookupResolver::new(chain, lock),
        }
    }
}

impl LegacyDependencyResolver for LoopbackDependencyResolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_dependency(
        &self,
        dependency: &DependencyMetadata,
        result: &mut ComponentMetadataResult,
    ) -> Result<(), ResolveError> {
        self.parent.resolve(dependency, result)
    }

    fn resolve_module_artifacts(
        &self,
        component: &ComponentMetadata,
        usage: &ComponentUsage,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        self.parent
            .resolve_module_artifacts_by_usage(component, usage, result)
    }

    fn download(
        &self,
        artifact: &ComponentArtifactMetadata,
        source: Option<&ModuleSource>,
        result: &mut ArtifactResult,
    ) -> Result<(), ResolveError> {
        self.parent.resolve_artifact(artifact, source, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl LegacyDependencyResolver for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn get_dependency(
            &self,
            _dependency: &DependencyMetadata,
            result: &mut ComponentMetadataResult,
        ) -> Result<(), ResolveError> {
            result.missing();
            Ok(())
        }

        fn resolve_module_artifacts(
            &self,
            _component: &ComponentMetadata,
            _usage: &ComponentUsage,
            _result: &mut ArtifactSetResult,
        ) -> Result<(), ResolveError> {
            Ok(())
        }

        fn download(
            &self,
            _artifact: &ComponentArtifactMetadata,
            _source: Option<&ModuleSource>,
            _result: &mut ArtifactResult,
        ) -> Result<(), ResolveError> {
            Ok(())
        }
    }

    #[test]
    fn same_name_replaces_resolver() {
        let settings = LegacySettings::new();
        let first: Arc<dyn LegacyDependencyResolver> = Arc::new(Named("main"));
        let second: Arc<dyn LegacyDependencyResolver> = Arc::new(Named("main"));
        settings.add_resolver(Arc::clone(&first));
        settings.add_resolver(Arc::clone(&second));

        assert_eq!(settings.resolver_names(), vec!["main".to_string()]);
        let registered = settings.resolver("main").unwrap();
        assert!(Arc::ptr_eq(&registered, &second));
    }

    #[test]
    fn default_resolver_requires_registration() {
        let settings = LegacySettings::new();
        settings.set_default_resolver("main");
        assert!(settings.default_resolver().is_none());

        settings.add_resolver(Arc::new(Named("main")));
        assert_eq!(settings.default_resolver().unwrap().name(), "main");
    }

    #[test]
    fn clones_share_registry() {
        let settings = LegacySettings::new();
        let handle = settings.clone();
        handle.add_resolver(Arc::new(Named("ivy")));
        assert!(settings.resolver("ivy").is_some());
    }

    #[test]
    fn loopback_reports_released_chain() {
        use crate::chain::UserResolverChain;
        use crate::lock::DefaultCacheLockingManager;
        use crate::model::ModuleVersionSelector;
        use crate::version::{DefaultVersionMatcher, SemverLatestStrategy};

        let chain: Arc<dyn RepositoryChain> = Arc::new(UserResolverChain::new(
            Arc::new(DefaultVersionMatcher),
            Arc::new(SemverLatestStrategy),
        ));
        let loopback = LoopbackDependencyResolver::new(
            LOOPBACK_RESOLVER_NAME,
            Arc::downgrade(&chain),
            Arc::new(DefaultCacheLockingManager::new()),
        );
        drop(chain);

        let dependency = DependencyMetadata::new(ModuleVersionSelector::new("org", "parent", "1.0"));
        let mut result = ComponentMetadataResult::new();
        assert_eq!(
            loopback.get_dependency(&dependency, &mut result),
            Err(ResolveError::ChainReleased)
        );
    }
}
