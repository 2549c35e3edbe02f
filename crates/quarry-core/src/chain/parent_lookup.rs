use std::sync::{Arc, Weak};

use crate::error::ResolveError;
use crate::lock::CacheLockingManager;
use crate::model::{
    ArtifactResult, ArtifactSetResult, ArtifactType, ComponentArtifactMetadata,
    ComponentMetadata, ComponentMetadataResult, ComponentUsage, DependencyMetadata, ModuleSource,
};

use super::{ArtifactResolver, DependencyToComponentResolver, RepositoryChain};

/// Gives connectors access to the chain they belong to, for looking up
/// parent modules while parsing descriptors.
///
/// Connectors call this from inside their own long-running operations, so
/// every request re-acquires the cache lock before entering the chain. The
/// chain owns the connectors, hence the weak reference.
pub struct ParentModuleLookupResolver {
    chain: Weak<dyn RepositoryChain>,
    lock: Arc<dyn CacheLockingManager>,
}

impl ParentModuleLookupResolver {
    pub fn new(chain: Weak<dyn RepositoryChain>, lock: Arc<dyn CacheLockingManager>) -> Self {
        Self { chain, lock }
    }

    fn chain(&self) -> Result<Arc<dyn RepositoryChain>, ResolveError> {
        self.chain.upgrade().ok_or(ResolveError::ChainReleased)
    }
}

impl DependencyToComponentResolver for ParentModuleLookupResolver {
    fn resolve(
        &self,
        dependency: &DependencyMetadata,
        result: &mut ComponentMetadataResult,
    ) -> Result<(), ResolveError> {
        let chain = self.chain()?;
        self.lock
            .use_cache(&format!("Resolve {}", dependency), &mut || {
                chain.resolve(dependency, result)
            })
    }
}

impl ArtifactResolver for ParentModuleLookupResolver {
    fn resolve_module_artifacts_by_type(
        &self,
        component: &ComponentMetadata,
        artifact_type: ArtifactType,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        let chain = self.chain()?;
        self.lock.use_cache(
            &format!("Resolve {} for {}", artifact_type, component),
            &mut || chain.resolve_module_artifacts_by_type(component, artifact_type, result),
        )
    }

    fn resolve_module_artifacts_by_usage(
        &self,
        component: &ComponentMetadata,
        usage: &ComponentUsage,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        let chain = self.chain()?;
        self.lock.use_cache(
            &format!("Resolve {} for {}", usage, component),
            &mut || chain.resolve_module_artifacts_by_usage(component, usage, result),
        )
    }

    fn resolve_artifact(
        &self,
        artifact: &ComponentArtifactMetadata,
        source: Option<&ModuleSource>,
        result: &mut ArtifactResult,
    ) -> Result<(), ResolveError> {
        let chain = self.chain()?;
        self.lock.use_cache(&format!("Resolve {}", artifact), &mut || {
            chain.resolve_artifact(artifact, source, result)
        })
    }
}
