use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ResolveError;
use crate::model::{
    ArtifactResult, ArtifactSetResult, ArtifactType, ComponentArtifactMetadata,
    ComponentMetadata, ComponentUsage, ModuleSource, RepositoryId,
};
use crate::repository::ModuleComponentRepository;

use super::ArtifactResolver;

/// Dispatches artifact requests to the repository that resolved the component.
///
/// The component's source must be a chain tag naming a registered repository.
/// The target sees the component with the source it produced itself, and is
/// asked through its local facet before its remote facet. No other repository
/// is ever consulted.
#[derive(Default)]
pub struct RepositoryChainArtifactResolver {
    repositories: RwLock<HashMap<RepositoryId, Arc<dyn ModuleComponentRepository>>>,
}

impl RepositoryChainArtifactResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, repository: Arc<dyn ModuleComponentRepository>) -> Result<(), ResolveError> {
        let mut repositories = self.repositories.write();
        let id = repository.id().clone();
        if repositories.contains_key(&id) {
            return Err(ResolveError::DuplicateRepository(id));
        }
        repositories.insert(id, repository);
        Ok(())
    }

    fn repository(
        &self,
        id: &RepositoryId,
    ) -> Result<Arc<dyn ModuleComponentRepository>, ResolveError> {
        self.repositories
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| ResolveError::UnknownRepository(id.clone()))
    }

    /// Find the owning repository and strip the chain tag from the component.
    fn target(
        &self,
        component: &ComponentMetadata,
    ) -> Result<(Arc<dyn ModuleComponentRepository>, ComponentMetadata), ResolveError> {
        let source = ModuleSource::unpack(component.source(), component)?;
        let repository = self.repository(source.repository_id())?;
        let unpacked = component.with_source(source.delegate().cloned());
        Ok((repository, unpacked))
    }
}

impl ArtifactResolver for RepositoryChainArtifactResolver {
    fn resolve_module_artifacts_by_type(
        &self,
        component: &ComponentMetadata,
        artifact_type: ArtifactType,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        let (repository, component) = self.target(component)?;
        tracing::trace!(repository = %repository.id(), component = %component, kind = %artifact_type, "resolving artifacts");
        repository
            .local_access()
            .resolve_module_artifacts_by_type(&component, artifact_type, result)?;
        if !result.has_result() {
            repository
                .remote_access()
                .resolve_module_artifacts_by_type(&component, artifact_type, result)?;
        }
        Ok(())
    }

    fn resolve_module_artifacts_by_usage(
        &self,
        component: &ComponentMetadata,
        usage: &ComponentUsage,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        let (repository, component) = self.target(component)?;
        tracing::trace!(repository = %repository.id(), component = %component, configuration = %usage.configuration, "resolving artifacts");
        repository
            .local_access()
            .resolve_module_artifacts_by_usage(&component, usage, result)?;
        if !result.has_result() {
            repository
                .remote_access()
                .resolve_module_artifacts_by_usage(&component, usage, result)?;
        }
        Ok(())
    }

    fn resolve_artifact(
        &self,
        artifact: &ComponentArtifactMetadata,
        source: Option<&ModuleSource>,
        result: &mut ArtifactResult,
    ) -> Result<(), ResolveError> {
        let source = ModuleSource::unpack(source, artifact)?;
        let repository = self.repository(source.repository_id())?;
        repository.resolve_artifact(artifact, source.delegate(), result)
    }
}
