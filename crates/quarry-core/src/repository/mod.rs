//! Repository capability traits and the decorators the chain factory composes.
//!
//! A repository exposes two access facets with the same surface:
//! - local access: answers from caches only and never touches the network
//! - remote access: may block on network I/O
//!
//! Decorators implement [`ModuleComponentRepository`] themselves and hold the
//! next repository as their delegate.

mod dynamic;
mod local;
mod lock_releasing;
mod overrides;

use std::sync::Arc;

use crate::chain::RepositoryChain;
use crate::error::ResolveError;
use crate::legacy::LegacyEngineRepository;
use crate::model::{
    ArtifactResult, ArtifactSetResult, ArtifactType, ComponentArtifactMetadata,
    ComponentMetadata, ComponentMetadataResult, ComponentUsage, DependencyMetadata,
    ModuleComponentIdentifier, ModuleSource, ModuleVersionListingResult, RepositoryId,
};

pub use dynamic::DynamicResolveModuleComponentRepository;
pub use local::{LocalModuleComponentRepository, ModuleMetadataProcessor, NoOpMetadataProcessor};
pub use lock_releasing::CacheLockReleasingModuleComponentRepository;
pub use overrides::{OfflineModuleComponentRepository, ResolutionOverride};

/// One facet (local or remote) of a repository.
///
/// Each operation fills `result` or leaves it untouched when this facet has
/// no answer. `Err` is reserved for failures that must abort the request.
pub trait ModuleComponentRepositoryAccess: Send + Sync {
    fn list_module_versions(
        &self,
        dependency: &DependencyMetadata,
        result: &mut ModuleVersionListingResult,
    ) -> Result<(), ResolveError>;

    fn resolve_component_metadata(
        &self,
        dependency: &DependencyMetadata,
        component_id: &ModuleComponentIdentifier,
        result: &mut ComponentMetadataResult,
    ) -> Result<(), ResolveError>;

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
}

/// A repository as seen by the aggregate chain.
pub trait ModuleComponentRepository: Send + Sync {
    fn id(&self) -> &RepositoryId;

    fn name(&self) -> &str;

    fn local_access(&self) -> &dyn ModuleComponentRepositoryAccess;

    fn remote_access(&self) -> &dyn ModuleComponentRepositoryAccess;

    /// Resolve a single artifact; the repository decides how to reach it.
    ///
    /// `source` is the source this repository produced for the owning component.
    fn resolve_artifact(
        &self,
        artifact: &ComponentArtifactMetadata,
        source: Option<&ModuleSource>,
        result: &mut ArtifactResult,
    ) -> Result<(), ResolveError>;
}

/// A raw connector created from a declared repository, before any decoration.
pub trait ConfiguredModuleComponentRepository: ModuleComponentRepository {
    /// Whether the repository has no network facet worth guarding.
    fn is_local(&self) -> bool;

    fn is_dynamic_resolve_mode(&self) -> bool {
        false
    }

    /// The legacy engine hooks, if this connector is backed by one.
    fn as_legacy_engine(&mut self) -> Option<&mut dyn LegacyEngineRepository> {
        None
    }

    /// The chain wiring hook, if this connector resolves references through the chain.
    fn as_chain_aware(&mut self) -> Option<&mut dyn ChainAwareRepository> {
        None
    }
}

/// A connector that looks up referenced modules (e.g. parent descriptors) through the chain.
pub trait ChainAwareRepository {
    fn set_repository_chain(&mut self, chain: Arc<dyn RepositoryChain>);
}

/// A declared repository able to create its connector for a resolution session.
pub trait ResolutionAwareRepository: Send + Sync {
    fn create_resolver(&self) -> Box<dyn ConfiguredModuleComponentRepository>;
}

/// Which access facet of a repository a decorator forwards to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Facet {
    Local,
    Remote,
}

impl Facet {
    pub(crate) fn select<'a>(
        self,
        repository: &'a dyn ModuleComponentRepository,
    ) -> &'a dyn ModuleComponentRepositoryAccess {
        match self {
            Facet::Local => repository.local_access(),
            Facet::Remote => repository.remote_access(),
        }
    }
}

/// Access facet that never answers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRepositoryAccess;

impl ModuleComponentRepositoryAccess for NoRepositoryAccess {
    fn list_module_versions(
        &self,
        _dependency: &DependencyMetadata,
        _result: &mut ModuleVersionListingResult,
    ) -> Result<(), ResolveError> {
        Ok(())
    }

    fn resolve_component_metadata(
        &self,
        _dependency: &DependencyMetadata,
        _component_id: &ModuleComponentIdentifier,
        _result: &mut ComponentMetadataResult,
    ) -> Result<(), ResolveError> {
        Ok(())
    }

    fn resolve_module_artifacts_by_type(
        &self,
        _component: &ComponentMetadata,
        _artifact_type: ArtifactType,
        _result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        Ok(())
    }

    fn resolve_module_artifacts_by_usage(
        &self,
        _component: &ComponentMetadata,
        _usage: &ComponentUsage,
        _result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        Ok(())
    }
}
