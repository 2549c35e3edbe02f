//! Session-wide resolution overrides (offline, refresh).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::CachePolicy;
use crate::error::ResolveError;
use crate::model::{
    ArtifactResult, ArtifactSetResult, ArtifactType, ComponentArtifactMetadata,
    ComponentMetadata, ComponentMetadataResult, ComponentUsage, DependencyMetadata,
    ModuleComponentIdentifier, ModuleSource, ModuleVersionListingResult, RepositoryId,
};

use super::{ModuleComponentRepository, ModuleComponentRepositoryAccess};

/// Overrides requested for the whole build, from `[resolution]` in quarry.toml.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionOverride {
    /// Never contact remote repositories; answer from caches only
    #[serde(default)]
    pub offline: bool,

    /// Treat every cached entry as expired
    #[serde(default)]
    pub refresh_dependencies: bool,
}

impl ResolutionOverride {
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn refresh() -> Self {
        Self {
            refresh_dependencies: true,
            ..Self::default()
        }
    }

    /// Fold the overrides into a configuration's cache policy.
    pub fn apply_to_policy(&self, policy: &mut CachePolicy) {
        if self.refresh_dependencies {
            policy.refresh_all = true;
        }
        if self.offline {
            policy.offline = true;
        }
    }

    /// Substitute the backing repository when the overrides require it.
    pub fn override_repository(
        &self,
        repository: Arc<dyn ModuleComponentRepository>,
    ) -> Arc<dyn ModuleComponentRepository> {
        if self.offline {
            Arc::new(OfflineModuleComponentRepository::new(repository))
        } else {
            repository
        }
    }
}

/// Answers every remote request with an offline failure.
pub struct OfflineModuleComponentRepository {
    delegate: Arc<dyn ModuleComponentRepository>,
    remote: OfflineAccess,
}

impl OfflineModuleComponentRepository {
    pub fn new(delegate: Arc<dyn ModuleComponentRepository>) -> Self {
        Self {
            delegate,
            remote: OfflineAccess,
        }
    }
}

impl ModuleComponentRepository for OfflineModuleComponentRepository {
    fn id(&self) -> &RepositoryId {
        self.delegate.id()
    }

    fn name(&self) -> &str {
        self.delegate.name()
    }

    fn local_access(&self) -> &dyn ModuleComponentRepositoryAccess {
        self.delegate.local_access()
    }

    fn remote_access(&self) -> &dyn ModuleComponentRepositoryAccess {
        &self.remote
    }

    fn resolve_artifact(
        &self,
        artifact: &ComponentArtifactMetadata,
        _source: Option<&ModuleSource>,
        result: &mut ArtifactResult,
    ) -> Result<(), ResolveError> {
        result.failed(ResolveError::Offline(artifact.to_string()));
        Ok(())
    }
}

struct OfflineAccess;

impl ModuleComponentRepositoryAccess for OfflineAccess {
    fn list_module_versions(
        &self,
        dependency: &DependencyMetadata,
        result: &mut ModuleVersionListingResult,
    ) -> Result<(), ResolveError> {
        result.failed(ResolveError::Offline(dependency.to_string()));
        Ok(())
    }

    fn resolve_component_metadata(
        &self,
        _dependency: &DependencyMetadata,
        component_id: &ModuleComponentIdentifier,
        result: &mut ComponentMetadataResult,
    ) -> Result<(), ResolveError> {
        result.failed(ResolveError::Offline(component_id.to_string()));
        Ok(())
    }

    fn resolve_module_artifacts_by_type(
        &self,
        component: &ComponentMetadata,
        artifact_type: ArtifactType,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        result.failed(ResolveError::Offline(format!(
            "{} for {}",
            artifact_type, component
        )));
        Ok(())
    }

    fn resolve_module_artifacts_by_usage(
        &self,
        component: &ComponentMetadata,
        usage: &ComponentUsage,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        result.failed(ResolveError::Offline(format!("{} for {}", usage, component)));
        Ok(())
    }
}
