//! The aggregate repository chain.
//!
//! Repositories are registered in declaration order. Dependency resolution
//! walks them in that order; artifact resolution dispatches straight to the
//! repository named by the component's [`ModuleSource`] tag.

mod artifacts;
mod dependencies;
mod parent_lookup;

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ResolveError;
use crate::factory::RepositoryStack;
use crate::model::{
    ArtifactResult, ArtifactSetResult, ArtifactType, ComponentArtifactMetadata,
    ComponentMetadata, ComponentMetadataResult, ComponentUsage, DependencyMetadata, ModuleSource,
    RepositoryId,
};
use crate::repository::ModuleComponentRepository;
use crate::version::{LatestStrategy, VersionMatcher};

pub use artifacts::RepositoryChainArtifactResolver;
pub use dependencies::RepositoryChainDependencyResolver;
pub use parent_lookup::ParentModuleLookupResolver;

/// Resolves a dependency declaration to component metadata.
pub trait DependencyToComponentResolver: Send + Sync {
    fn resolve(
        &self,
        dependency: &DependencyMetadata,
        result: &mut ComponentMetadataResult,
    ) -> Result<(), ResolveError>;
}

/// Resolves artifacts of components produced by a chain.
pub trait ArtifactResolver: Send + Sync {
    fn resolve_module_artifacts_by_type(
        &self,
        component: &ComponentMetadata,
        artifact_type: ArtifactType,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError>;

    fn resolve_module_artifacts_by_usage(
        &self,
        component: &ComponentMetadata,
        usage: &ComponentUsage,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError>;

    fn resolve_artifact(
        &self,
        artifact: &ComponentArtifactMetadata,
        source: Option<&ModuleSource>,
        result: &mut ArtifactResult,
    ) -> Result<(), ResolveError>;
}

/// Everything a resolution needs from a set of repositories.
pub trait RepositoryChain: DependencyToComponentResolver + ArtifactResolver {}

impl<T> RepositoryChain for T where T: DependencyToComponentResolver + ArtifactResolver + ?Sized {}

/// The chain of user-declared repositories for one resolution.
pub struct UserResolverChain {
    dependency_resolver: RepositoryChainDependencyResolver,
    artifact_resolver: RepositoryChainArtifactResolver,
    layout: RwLock<Vec<RepositoryStack>>,
}

impl UserResolverChain {
    pub fn new(matcher: Arc<dyn VersionMatcher>, latest: Arc<dyn LatestStrategy>) -> Self {
        Self {
            dependency_resolver: RepositoryChainDependencyResolver::new(matcher, latest),
            artifact_resolver: RepositoryChainArtifactResolver::new(),
            layout: RwLock::new(Vec::new()),
        }
    }

    /// Append a fully decorated repository.
    ///
    /// `stack` records the decorators wrapped around it. Fails without
    /// changing the chain when the repository id is already registered.
    pub fn add(
        &self,
        repository: Arc<dyn ModuleComponentRepository>,
        stack: RepositoryStack,
    ) -> Result<(), ResolveError> {
        self.artifact_resolver.add(Arc::clone(&repository))?;
        self.dependency_resolver.add(repository);
        self.layout.write().push(stack);
        Ok(())
    }

    /// Registered repository ids in declaration order.
    pub fn repository_ids(&self) -> Vec<RepositoryId> {
        self.layout.read().iter().map(|stack| stack.id.clone()).collect()
    }

    /// Decorator layout of every registered repository, in declaration order.
    pub fn layout(&self) -> Vec<RepositoryStack> {
        self.layout.read().clone()
    }
}

impl DependencyToComponentResolver for UserResolverChain {
    fn resolve(
        &self,
        dependency: &DependencyMetadata,
        result: &mut ComponentMetadataResult,
    ) -> Result<(), ResolveError> {
        self.dependency_resolver.resolve(dependency, result)
    }
}

impl ArtifactResolver for UserResolverChain {
    fn resolve_module_artifacts_by_type(
        &self,
        component: &ComponentMetadata,
        artifact_type: ArtifactType,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        self.artifact_resolver
            .resolve_module_artifacts_by_type(component, artifact_type, result)
    }

    fn resolve_module_artifacts_by_usage(
        &self,
        component: &ComponentMetadata,
        usage: &ComponentUsage,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        self.artifact_resolver
            .resolve_module_artifacts_by_usage(component, usage, result)
    }

    fn resolve_artifact(
        &self,
        artifact: &ComponentArtifactMetadata,
        source: Option<&ModuleSource>,
        result: &mut ArtifactResult,
    ) -> Result<(), ResolveError> {
        self.artifact_resolver.resolve_artifact(artifact, source, result)
    }
}
