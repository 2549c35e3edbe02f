//! Dynamic-resolve mode for legacy descriptors.

use std::sync::Arc;

use crate::error::ResolveError;
use crate::model::{
    ArtifactResult, ArtifactSetResult, ArtifactType, ComponentArtifactMetadata,
    ComponentMetadata, ComponentMetadataResult, ComponentUsage, DependencyMetadata,
    ModuleComponentIdentifier, ModuleSource, ModuleVersionListingResult, RepositoryId,
};

use super::{Facet, ModuleComponentRepository, ModuleComponentRepositoryAccess};

/// Makes resolved components request the dynamic constraints their
/// descriptors declared instead of the fixed versions recorded at publication.
pub struct DynamicResolveModuleComponentRepository {
    delegate: Arc<dyn ModuleComponentRepository>,
    local: DynamicResolveAccess,
    remote: DynamicResolveAccess,
}

impl DynamicResolveModuleComponentRepository {
    pub fn new(delegate: Arc<dyn ModuleComponentRepository>) -> Self {
        Self {
            local: DynamicResolveAccess {
                delegate: Arc::clone(&delegate),
                facet: Facet::Local,
            },
            remote: DynamicResolveAccess {
                delegate: Arc::clone(&delegate),
                facet: Facet::Remote,
            },
            delegate,
        }
    }
}

impl ModuleComponentRepository for DynamicResolveModuleComponentRepository {
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
        &self.remote
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

struct DynamicResolveAccess {
    delegate: Arc<dyn ModuleComponentRepository>,
    facet: Facet,
}

impl DynamicResolveAccess {
    fn access(&self) -> &dyn ModuleComponentRepositoryAccess {
        self.facet.select(self.delegate.as_ref())
    }
}

impl ModuleComponentRepositoryAccess for DynamicResolveAccess {
    fn list_module_versions(
        &self,
        dependency: &DependencyMetadata,
        result: &mut ModuleVersionListingResult,
    ) -> Result<(), ResolveError> {
        self.access().list_module_versions(dependency, result)
    }

    fn resolve_component_metadata(
        &self,
        dependency: &DependencyMetadata,
        component_id: &ModuleComponentIdentifier,
        result: &mut ComponentMetadataResult,
    ) -> Result<(), ResolveError> {
        self.access()
            .resolve_component_metadata(dependency, component_id, result)?;
        if let Some(metadata) = result.value_mut() {
            for declared in &mut metadata.dependencies {
                if let Some(constraint) = &declared.dynamic_constraint {
                    declared.requested.version = constraint.clone();
                }
            }
        }
        Ok(())
    }

    fn resolve_module_artifacts_by_type(
        &self,
        component: &ComponentMetadata,
        artifact_type: ArtifactType,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        self.access()
            .resolve_module_artifacts_by_type(component, artifact_type, result)
    }

    fn resolve_module_artifacts_by_usage(
        &self,
        component: &ComponentMetadata,
        usage: &ComponentUsage,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        self.access()
            .resolve_module_artifacts_by_usage(component, usage, result)
    }
}
