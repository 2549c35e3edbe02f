//! Decorator for repositories without a meaningful network facet.

use std::sync::Arc;

use crate::error::ResolveError;
use crate::model::{
    ArtifactResult, ArtifactSetResult, ArtifactType, ComponentArtifactMetadata,
    ComponentMetadata, ComponentMetadataResult, ComponentUsage, DependencyMetadata,
    ModuleComponentIdentifier, ModuleSource, ModuleVersionListingResult, RepositoryId,
};

use super::{ModuleComponentRepository, ModuleComponentRepositoryAccess, NoRepositoryAccess};

/// Applies component metadata rules to freshly resolved metadata.
pub trait ModuleMetadataProcessor: Send + Sync {
    fn process(&self, metadata: &mut ComponentMetadata);
}

/// Leaves metadata as the repository produced it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpMetadataProcessor;

impl ModuleMetadataProcessor for NoOpMetadataProcessor {
    fn process(&self, _metadata: &mut ComponentMetadata) {}
}

/// Folds both facets of a local repository into its local facet.
///
/// Local repositories never block, so the chain treats everything they know
/// as a local answer. The remote facet answers nothing.
pub struct LocalModuleComponentRepository {
    delegate: Arc<dyn ModuleComponentRepository>,
    local: LocalAccess,
}

impl LocalModuleComponentRepository {
    pub fn new(
        delegate: Arc<dyn ModuleComponentRepository>,
        processor: Arc<dyn ModuleMetadataProcessor>,
    ) -> Self {
        let local = LocalAccess {
            delegate: Arc::clone(&delegate),
            processor,
        };
        Self { delegate, local }
    }
}

impl ModuleComponentRepository for LocalModuleComponentRepository {
    fn id(&self) -> &RepositoryId {
        self.delegate.id()
    }

    fn name(&self) -> &str {
        self.delegate.name()
    }

    fn local_access(&self) -> &dyn ModuleComponentRepositoryAccess {
        &self.local
    }

    fn remote_access(&self) -> &dyn ModuleComponentRepositoryAccess {
        &NoRepositoryAccess
    }

    fn resolve_artifact(
        &self,
        artifact: &ComponentArtifactMetadata,
        source: Option<&ModuleSource>,
        result: &mut ArtifactResult,
    ) -> Result<(), ResolveError> {
        self.delegate.resolve_artifact(artifact, source, result)
    }
}

struct LocalAccess {
    delegate: Arc<dyn ModuleComponentRepository>,
    processor: Arc<dyn ModuleMetadataProcessor>,
}

impl ModuleComponentRepositoryAccess for LocalAccess {
    fn list_module_versions(
        &self,
        dependency: &DependencyMetadata,
        result: &mut ModuleVersionListingResult,
    ) -> Result<(), ResolveError> {
        self.delegate
            .local_access()
            .list_module_versions(dependency, result)?;
        if !result.has_result() {
            self.delegate
                .remote_access()
                .list_module_versions(dependency, result)?;
        }
        Ok(())
    }

    fn resolve_component_metadata(
        &self,
        dependency: &DependencyMetadata,
        component_id: &ModuleComponentIdentifier,
        result: &mut ComponentMetadataResult,
    ) -> Result<(), ResolveError> {
        self.delegate
            .local_access()
            .resolve_component_metadata(dependency, component_id, result)?;
        if !result.has_result() {
            self.delegate
                .remote_access()
                .resolve_component_metadata(dependency, component_id, result)?;
        }
        if let Some(metadata) = result.value_mut() {
            self.processor.process(metadata);
        }
        Ok(())
    }

    fn resolve_module_artifacts_by_type(
        &self,
        component: &ComponentMetadata,
        artifact_type: ArtifactType,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        self.delegate
            .local_access()
            .resolve_module_artifacts_by_type(component, artifact_type, result)?;
        if !result.has_result() {
            self.delegate
                .remote_access()
                .resolve_module_artifacts_by_type(component, artifact_type, result)?;
        }
        Ok(())
    }

    fn resolve_module_artifacts_by_usage(
        &self,
        component: &ComponentMetadata,
        usage: &ComponentUsage,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        self.delegate
            .local_access()
            .resolve_module_artifacts_by_usage(component, usage, result)?;
        if !result.has_result() {
            self.delegate
                .remote_access()
                .resolve_module_artifacts_by_usage(component, usage, result)?;
        }
        Ok(())
    }
}
